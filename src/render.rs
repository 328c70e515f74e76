//! Frame command recording.
//!
//! [`Primitive::draw`](crate::data_structures::primitive::Primitive::draw)
//! never touches the GPU. It appends [`Command`]s to a [`Frame`], which the
//! backend later prepares (uniform uploads, pipeline creation) and replays
//! into a render pass. Every bind a draw depends on is recorded by the same
//! `draw` call, in a fixed order, so nothing relies on state left behind by
//! another primitive.

use crate::gpu::{FilterMode, ProgramId, TextureId, Topology, VertexArrayId};

/// One recorded GPU operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Min/mag filter used by subsequent texture binds.
    SetTextureFilter { min: FilterMode, mag: FilterMode },
    /// Make `program` current.
    UseProgram(ProgramId),
    /// Upload a column-major 4×4 matrix to `program`'s `transform` uniform.
    SetTransform {
        program: ProgramId,
        matrix: [[f32; 4]; 4],
    },
    BindVertexArray(VertexArrayId),
    BindTexture(TextureId),
    /// Consume `count` vertices sequentially, no index buffer.
    Draw { topology: Topology, count: u32 },
    /// Consume `count` indices from the bound vertex array's index buffer.
    DrawIndexed { topology: Topology, count: u32 },
}

impl Command {
    pub fn is_draw(&self) -> bool {
        matches!(self, Command::Draw { .. } | Command::DrawIndexed { .. })
    }
}

/// The draw call a mesh resolves to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawCall {
    Indexed { topology: Topology, count: u32 },
    Sequential { topology: Topology, count: u32 },
}

impl From<DrawCall> for Command {
    fn from(call: DrawCall) -> Self {
        match call {
            DrawCall::Indexed { topology, count } => Command::DrawIndexed { topology, count },
            DrawCall::Sequential { topology, count } => Command::Draw { topology, count },
        }
    }
}

/// Ordered list of commands for one presented frame.
#[derive(Debug, Default, Clone)]
pub struct Frame {
    commands: Vec<Command>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| c.is_draw())
    }

    /// Number of commands for which `predicate` holds.
    pub fn count(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }
}

/// Bind state in effect at some point of a frame, as a backend walking the
/// commands in order sees it.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct BindState {
    pub program: Option<ProgramId>,
    pub vertex_array: Option<VertexArrayId>,
    pub texture: Option<TextureId>,
    pub filter: Option<FilterMode>,
}

impl BindState {
    /// Fold `command` in. Making a program current unbinds the texture.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::SetTextureFilter { mag, .. } => self.filter = Some(*mag),
            Command::UseProgram(id) => {
                self.program = Some(*id);
                self.texture = None;
            }
            Command::BindVertexArray(id) => self.vertex_array = Some(*id),
            Command::BindTexture(id) => self.texture = Some(*id),
            Command::SetTransform { .. } | Command::Draw { .. } | Command::DrawIndexed { .. } => (),
        }
    }

    /// Sampler filter for the bound texture: the last recorded mag filter,
    /// linear if none was recorded.
    pub fn sampler_filter(&self) -> FilterMode {
        self.filter.unwrap_or(FilterMode::Linear)
    }
}
