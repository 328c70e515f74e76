//! GPU resource creation behind a narrow trait.
//!
//! Everything that allocates or frees GPU memory goes through [`GpuBackend`].
//! Drawing does not: primitives record commands into a
//! [`Frame`](crate::render::Frame) that a backend replays later. The
//! production backend is [`WgpuBackend`]; tests provide an in-memory one.

use std::collections::HashMap;

pub mod wgpu_backend;

pub use wgpu_backend::WgpuBackend;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

handle!(
    /// A vertex, texture-coordinate or index buffer.
    BufferId
);
handle!(
    /// A compiled but unlinked shader stage.
    StageId
);
handle!(
    /// A linked shader program.
    ProgramId
);
handle!(
    /// The binding description tying buffers to attribute slots.
    VertexArrayId
);
handle!(
    /// A 2D RGBA texture.
    TextureId
);

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Per-vertex attribute data.
    Vertex,
    /// `u32` indices.
    Index,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Topology {
    TriangleList,
    TriangleFan,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Attribute binding of a vertex array.
///
/// Slot 0 is the position (3 × f32, tightly packed), slot 1 the optional
/// texture coordinate (2 × f32, tightly packed).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexLayout {
    pub positions: BufferId,
    pub tex_coords: Option<BufferId>,
    pub indices: Option<BufferId>,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl VertexLayout {
    pub const POSITION_SLOT: u32 = 0;
    pub const TEX_COORD_SLOT: u32 = 1;
    pub const POSITION_STRIDE: u64 = 3 * std::mem::size_of::<f32>() as u64;
    pub const TEX_COORD_STRIDE: u64 = 2 * std::mem::size_of::<f32>() as u64;
}

/// Resource creation and release.
///
/// Implementations must never hand out an id twice, so that a released
/// handle cannot alias a later resource.
pub trait GpuBackend {
    fn create_buffer(&mut self, usage: BufferUsage, label: &str, contents: &[u8]) -> BufferId;
    fn delete_buffer(&mut self, id: BufferId);

    /// Compile one stage. The error is the compiler's diagnostic text.
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<StageId, String>;
    fn delete_stage(&mut self, id: StageId);
    /// Link a vertex and a fragment stage. The stages stay alive; the caller
    /// releases them afterwards.
    fn link_program(&mut self, vertex: StageId, fragment: StageId) -> Result<ProgramId, String>;
    fn delete_program(&mut self, id: ProgramId);

    fn create_vertex_array(&mut self, layout: &VertexLayout) -> VertexArrayId;
    fn delete_vertex_array(&mut self, id: VertexArrayId);

    /// Upload `rgba` (tightly packed, 4 bytes per pixel) as level 0 of a 2D texture.
    fn create_texture(&mut self, label: &str, width: u32, height: u32, rgba: &[u8]) -> TextureId;
    fn delete_texture(&mut self, id: TextureId);
}

/// A value owning one or more GPU resources.
///
/// `release` must be idempotent: the first call frees, later calls do nothing.
pub trait GpuResource {
    fn release(&mut self, gpu: &mut dyn GpuBackend);
    fn is_released(&self) -> bool;
}

/// Single-owner buffer handle.
#[derive(Debug)]
pub struct GpuBuffer {
    id: Option<BufferId>,
}

impl GpuBuffer {
    pub fn new(gpu: &mut dyn GpuBackend, usage: BufferUsage, label: &str, contents: &[u8]) -> Self {
        Self {
            id: Some(gpu.create_buffer(usage, label, contents)),
        }
    }

    pub fn id(&self) -> Option<BufferId> {
        self.id
    }
}

impl GpuResource for GpuBuffer {
    fn release(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(id) = self.id.take() {
            gpu.delete_buffer(id);
        }
    }

    fn is_released(&self) -> bool {
        self.id.is_none()
    }
}

/// Single-owner vertex array handle.
#[derive(Debug)]
pub struct VertexArray {
    id: Option<VertexArrayId>,
    layout: VertexLayout,
}

impl VertexArray {
    pub fn new(gpu: &mut dyn GpuBackend, layout: VertexLayout) -> Self {
        let id = gpu.create_vertex_array(&layout);
        Self {
            id: Some(id),
            layout,
        }
    }

    pub fn id(&self) -> Option<VertexArrayId> {
        self.id
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}

impl GpuResource for VertexArray {
    fn release(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(id) = self.id.take() {
            gpu.delete_vertex_array(id);
        }
    }

    fn is_released(&self) -> bool {
        self.id.is_none()
    }
}

/// Expand triangle-fan indices into triangle-list indices.
///
/// `[c, a, b, d]` becomes `[c, a, b, c, b, d]`. Fewer than three indices
/// produce no triangles.
pub fn fan_to_list(fan: &[u32]) -> Vec<u32> {
    if fan.len() < 3 {
        return Vec::new();
    }
    let center = fan[0];
    fan[1..]
        .windows(2)
        .flat_map(|edge| [center, edge[0], edge[1]])
        .collect()
}

/// Number of list indices that draw the first `fan_count` indices of a fan
/// whose full expansion holds `expanded_len` indices.
pub fn fan_list_count(fan_count: u32, expanded_len: u32) -> u32 {
    (3 * fan_count.saturating_sub(2)).min(expanded_len)
}

/// Expanded fan index buffers, keyed by the index buffer they came from.
///
/// An entry lives until its source buffer is deleted.
#[derive(Debug)]
pub struct FanCache<B> {
    entries: HashMap<BufferId, (B, u32)>,
}

impl<B> Default for FanCache<B> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<B> FanCache<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand `fan` and hand the list to `upload` unless `source` is cached
    /// already. Returns whether an entry was created.
    pub fn ensure(
        &mut self,
        source: BufferId,
        fan: &[u32],
        upload: impl FnOnce(&[u32]) -> B,
    ) -> bool {
        if self.entries.contains_key(&source) {
            return false;
        }
        let list = fan_to_list(fan);
        let buffer = upload(&list);
        self.entries.insert(source, (buffer, list.len() as u32));
        true
    }

    /// The expanded buffer for `source` and its index count.
    pub fn get(&self, source: BufferId) -> Option<(&B, u32)> {
        self.entries.get(&source).map(|(buffer, len)| (buffer, *len))
    }

    pub fn remove(&mut self, source: BufferId) -> Option<B> {
        self.entries.remove(&source).map(|(buffer, _)| buffer)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
