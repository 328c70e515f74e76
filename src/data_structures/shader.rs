//! Linked vertex + fragment shader programs.

use crate::{
    error::Error,
    gpu::{GpuBackend, GpuResource, ProgramId, ShaderStage, StageId},
    pipelines::ShaderSources,
    render::{Command, Frame},
};

/// Single-owner handle to a linked program.
///
/// Keeps the sources it was built from. The intermediate per-stage objects
/// are released as soon as linking is done.
#[derive(Debug)]
pub struct ShaderProgram {
    id: Option<ProgramId>,
    sources: ShaderSources,
}

impl ShaderProgram {
    /// Compile both stages and link them.
    ///
    /// On error nothing stays allocated: a stage compiled before the failure
    /// is released again.
    pub fn compile(gpu: &mut dyn GpuBackend, sources: ShaderSources) -> Result<Self, Error> {
        let vertex = compile_stage(gpu, ShaderStage::Vertex, &sources.vertex)?;
        let fragment = match compile_stage(gpu, ShaderStage::Fragment, &sources.fragment) {
            Ok(fragment) => fragment,
            Err(e) => {
                gpu.delete_stage(vertex);
                return Err(e);
            }
        };

        let linked = gpu.link_program(vertex, fragment);
        gpu.delete_stage(vertex);
        gpu.delete_stage(fragment);

        let id = linked.map_err(|log| Error::Link { log })?;
        Ok(Self {
            id: Some(id),
            sources,
        })
    }

    pub fn id(&self) -> Option<ProgramId> {
        self.id
    }

    pub fn sources(&self) -> &ShaderSources {
        &self.sources
    }

    /// Record this program as current. Does nothing once released.
    pub fn use_program(&self, frame: &mut Frame) {
        if let Some(id) = self.id {
            frame.push(Command::UseProgram(id));
        }
    }

    /// Record an upload of `matrix` to the `transform` uniform.
    pub fn set_transform(&self, frame: &mut Frame, matrix: [[f32; 4]; 4]) {
        if let Some(program) = self.id {
            frame.push(Command::SetTransform { program, matrix });
        }
    }

    pub fn dispose(&mut self, gpu: &mut dyn GpuBackend) {
        self.release(gpu);
    }
}

impl GpuResource for ShaderProgram {
    fn release(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(id) = self.id.take() {
            gpu.delete_program(id);
        }
    }

    fn is_released(&self) -> bool {
        self.id.is_none()
    }
}

fn compile_stage(gpu: &mut dyn GpuBackend, stage: ShaderStage, source: &str) -> Result<StageId, Error> {
    gpu.compile_stage(stage, source)
        .map_err(|log| Error::Compile { stage, log })
}
