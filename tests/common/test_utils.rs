use std::collections::{BTreeSet, HashMap};

use prim_ngin::gpu::{
    BufferId, BufferUsage, GpuBackend, ProgramId, ShaderStage, StageId, TextureId, VertexArrayId,
    VertexLayout,
};

/// In-memory [`GpuBackend`] that hands out ids and remembers what happened
/// to them.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u32,
    live: BTreeSet<u32>,
    released: Vec<u32>,
    buffers: HashMap<BufferId, (BufferUsage, Vec<u8>)>,
    stages: HashMap<StageId, ShaderStage>,
    vertex_arrays: HashMap<VertexArrayId, VertexLayout>,
    textures: HashMap<TextureId, (u32, u32, Vec<u8>)>,
    /// Fail compiling this stage with the given log.
    pub fail_compile: Option<(ShaderStage, String)>,
    /// Fail every link with the given log.
    pub fail_link: Option<String>,
    pub buffers_created: u32,
    pub stages_compiled: u32,
    pub programs_linked: u32,
    pub vertex_arrays_created: u32,
    pub textures_created: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_compile(stage: ShaderStage, log: &str) -> Self {
        Self {
            fail_compile: Some((stage, log.to_string())),
            ..Self::default()
        }
    }

    pub fn failing_link(log: &str) -> Self {
        Self {
            fail_link: Some(log.to_string()),
            ..Self::default()
        }
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.live.insert(self.next_id);
        self.next_id
    }

    fn free(&mut self, id: u32) {
        assert!(self.live.remove(&id), "id {} released twice or never allocated", id);
        self.released.push(id);
    }

    /// Ids allocated and not yet released, of any kind.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, id: u32) -> bool {
        self.live.contains(&id)
    }

    /// Every release, in order.
    pub fn released(&self) -> &[u32] {
        &self.released
    }

    pub fn times_released(&self, id: u32) -> usize {
        self.released.iter().filter(|&&r| r == id).count()
    }

    pub fn buffers_with_usage(&self, usage: BufferUsage) -> usize {
        self.buffers.values().filter(|(u, _)| *u == usage).count()
    }

    pub fn buffer_contents(&self, id: BufferId) -> Option<&[u8]> {
        self.buffers.get(&id).map(|(_, contents)| contents.as_slice())
    }

    pub fn vertex_array_layout(&self, id: VertexArrayId) -> Option<&VertexLayout> {
        self.vertex_arrays.get(&id)
    }

    pub fn texture(&self, id: TextureId) -> Option<&(u32, u32, Vec<u8>)> {
        self.textures.get(&id)
    }

    pub fn live_stages(&self) -> usize {
        self.stages.len()
    }
}

impl GpuBackend for RecordingBackend {
    fn create_buffer(&mut self, usage: BufferUsage, _label: &str, contents: &[u8]) -> BufferId {
        self.buffers_created += 1;
        let id = BufferId(self.allocate());
        self.buffers.insert(id, (usage, contents.to_vec()));
        id
    }

    fn delete_buffer(&mut self, id: BufferId) {
        self.buffers.remove(&id);
        self.free(id.0);
    }

    fn compile_stage(&mut self, stage: ShaderStage, _source: &str) -> Result<StageId, String> {
        if let Some((failing, log)) = &self.fail_compile {
            if *failing == stage {
                return Err(log.clone());
            }
        }
        self.stages_compiled += 1;
        let id = StageId(self.allocate());
        self.stages.insert(id, stage);
        Ok(id)
    }

    fn delete_stage(&mut self, id: StageId) {
        self.stages.remove(&id);
        self.free(id.0);
    }

    fn link_program(&mut self, vertex: StageId, fragment: StageId) -> Result<ProgramId, String> {
        assert_eq!(self.stages.get(&vertex), Some(&ShaderStage::Vertex));
        assert_eq!(self.stages.get(&fragment), Some(&ShaderStage::Fragment));
        if let Some(log) = &self.fail_link {
            return Err(log.clone());
        }
        self.programs_linked += 1;
        Ok(ProgramId(self.allocate()))
    }

    fn delete_program(&mut self, id: ProgramId) {
        self.free(id.0);
    }

    fn create_vertex_array(&mut self, layout: &VertexLayout) -> VertexArrayId {
        self.vertex_arrays_created += 1;
        let id = VertexArrayId(self.allocate());
        self.vertex_arrays.insert(id, *layout);
        id
    }

    fn delete_vertex_array(&mut self, id: VertexArrayId) {
        self.vertex_arrays.remove(&id);
        self.free(id.0);
    }

    fn create_texture(&mut self, _label: &str, width: u32, height: u32, rgba: &[u8]) -> TextureId {
        self.textures_created += 1;
        let id = TextureId(self.allocate());
        self.textures.insert(id, (width, height, rgba.to_vec()));
        id
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
        self.free(id.0);
    }
}

/// Write a PNG into a fresh temp directory and return its path.
///
/// `pixels` is listed top row first, as image files store it.
pub fn write_png(name: &str, width: u32, height: u32, pixels: &[[u8; 4]]) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("prim-ngin-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("cannot create temp dir");
    let path = dir.join(name);
    let raw: Vec<u8> = pixels.iter().flatten().copied().collect();
    let img = image::RgbaImage::from_raw(width, height, raw).expect("pixel count must match size");
    img.save(&path).expect("cannot write png fixture");
    path
}
