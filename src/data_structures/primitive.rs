//! A drawable shape: mesh, shader program, optional texture and transform.
//!
//! # Lifecycle
//!
//! 1. [`Primitive::new`] builds the CPU-side description; nothing touches the GPU
//! 2. [`Primitive::load`] creates every GPU resource once
//! 3. each frame: [`Primitive::update`] then [`Primitive::draw`]
//! 4. [`Primitive::dispose`] releases everything; calling it again is a no-op
//!
//! `update` and `draw` outside the loaded state return
//! [`Error::ResourceMisuse`].

use std::{path::PathBuf, time::Duration};

use cgmath::{Matrix4, SquareMatrix};

use crate::{
    data_structures::{
        mesh::Mesh,
        shader::ShaderProgram,
        shapes::Shape,
        texture::{DecodedImage, Texture},
        transform::{Transform, UpdatePolicy},
    },
    error::{Error, LoadState},
    gpu::{BufferUsage, FilterMode, GpuBackend, GpuBuffer, GpuResource, VertexArray, VertexLayout},
    pipelines::{ShaderSources, shader::ShaderInputs},
    render::{Command, Frame},
};

/// Everything `load` allocates.
#[derive(Debug)]
struct GpuResources {
    vertex_buffer: GpuBuffer,
    tex_coord_buffer: Option<GpuBuffer>,
    index_buffer: Option<GpuBuffer>,
    vertex_array: VertexArray,
    /// `None` when the shader failed to compile or link: the primitive then draws nothing.
    program: Option<ShaderProgram>,
    texture: Option<Texture>,
}

impl GpuResource for GpuResources {
    fn release(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(texture) = &mut self.texture {
            texture.release(gpu);
        }
        if let Some(program) = &mut self.program {
            program.release(gpu);
        }
        self.vertex_array.release(gpu);
        if let Some(indices) = &mut self.index_buffer {
            indices.release(gpu);
        }
        if let Some(tex_coords) = &mut self.tex_coord_buffer {
            tex_coords.release(gpu);
        }
        self.vertex_buffer.release(gpu);
    }

    fn is_released(&self) -> bool {
        self.vertex_buffer.is_released() && self.vertex_array.is_released()
    }
}

#[derive(Debug)]
pub struct Primitive {
    label: String,
    mesh: Mesh,
    shader: ShaderSources,
    texture_path: Option<PathBuf>,
    policy: UpdatePolicy,
    initial_transform: Transform,
    transform: Transform,
    model: Matrix4<f32>,
    state: LoadState,
    resources: Option<GpuResources>,
}

impl Primitive {
    /// A flat-shaded, static instance of `shape`.
    pub fn new(shape: Shape) -> Result<Self, Error> {
        Ok(Self {
            label: shape.name().to_string(),
            mesh: shape.mesh()?,
            shader: ShaderSources::FLAT,
            texture_path: None,
            policy: UpdatePolicy::Static,
            initial_transform: Transform::identity(),
            transform: Transform::identity(),
            model: Matrix4::identity(),
            state: LoadState::Unloaded,
            resources: None,
        })
    }

    /// Sample the image at `path`. Switches to the textured shader unless a
    /// custom one was set.
    pub fn with_texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture_path = Some(path.into());
        if self.shader == ShaderSources::FLAT {
            self.shader = ShaderSources::TEXTURED;
        }
        self
    }

    pub fn with_shader(mut self, shader: ShaderSources) -> Self {
        self.shader = shader;
        self
    }

    pub fn with_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Transform applied at `load`, before any update.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.initial_transform = transform;
        self.transform = transform;
        self.model = transform.model();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Composed model matrix as of the last `load` or `update`.
    pub fn model(&self) -> Matrix4<f32> {
        self.model
    }

    pub fn program(&self) -> Option<&ShaderProgram> {
        self.resources.as_ref().and_then(|r| r.program.as_ref())
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.resources.as_ref().and_then(|r| r.texture.as_ref())
    }

    pub fn vertex_array(&self) -> Option<&VertexArray> {
        self.resources.as_ref().map(|r| &r.vertex_array)
    }

    /// Create all GPU resources.
    ///
    /// The texture is decoded before anything is allocated, so a missing or
    /// corrupt image leaves the primitive untouched. The same holds when the
    /// shader reads texture coordinates the mesh lacks, or samples a texture
    /// the primitive does not have. A shader that fails to compile or link is
    /// logged and the primitive loads without a program.
    ///
    /// Loading an already loaded primitive releases the old resources first.
    pub fn load(&mut self, gpu: &mut dyn GpuBackend) -> Result<(), Error> {
        if self.state == LoadState::Disposed {
            return Err(self.misuse("load"));
        }
        self.check_shader_inputs()?;
        let image = match &self.texture_path {
            Some(path) => {
                if !self.mesh.has_tex_coords() {
                    return Err(Error::InvalidMesh(format!(
                        "{} has a texture but no texture coordinates",
                        self.label
                    )));
                }
                Some(DecodedImage::open(path)?)
            }
            None => None,
        };

        if let Some(mut previous) = self.resources.take() {
            log::warn!("{} loaded twice, replacing its GPU resources", self.label);
            previous.release(gpu);
        }

        let vertex_buffer = GpuBuffer::new(
            gpu,
            BufferUsage::Vertex,
            &format!("{} Vertex Buffer", self.label),
            bytemuck::cast_slice(self.mesh.positions()),
        );
        let tex_coord_buffer = self.mesh.has_tex_coords().then(|| {
            GpuBuffer::new(
                gpu,
                BufferUsage::Vertex,
                &format!("{} Tex Coord Buffer", self.label),
                bytemuck::cast_slice(self.mesh.tex_coords()),
            )
        });
        let index_buffer = self.mesh.is_indexed().then(|| {
            GpuBuffer::new(
                gpu,
                BufferUsage::Index,
                &format!("{} Index Buffer", self.label),
                bytemuck::cast_slice(self.mesh.indices()),
            )
        });

        let mut layout = VertexLayout {
            positions: vertex_buffer.id().ok_or_else(|| self.misuse("load"))?,
            tex_coords: None,
            indices: None,
            vertex_count: self.mesh.vertex_count(),
            index_count: self.mesh.indices().len() as u32,
        };
        layout.tex_coords = tex_coord_buffer.as_ref().and_then(GpuBuffer::id);
        layout.indices = index_buffer.as_ref().and_then(GpuBuffer::id);
        let vertex_array = VertexArray::new(gpu, layout);

        let program = match ShaderProgram::compile(gpu, self.shader.clone()) {
            Ok(program) => Some(program),
            Err(e) => {
                log::error!("{}: {}", self.label, e);
                None
            }
        };

        let texture = image.map(|image| Texture::upload(gpu, &image, &format!("{} Texture", self.label)));

        self.resources = Some(GpuResources {
            vertex_buffer,
            tex_coord_buffer,
            index_buffer,
            vertex_array,
            program,
            texture,
        });
        self.transform = self.initial_transform;
        self.model = self.transform.model();
        self.state = LoadState::Loaded;
        log::info!("loaded {}", self.label);
        Ok(())
    }

    /// Advance the transform by one tick of length `dt` and recompose the
    /// model matrix.
    pub fn update(&mut self, dt: Duration) -> Result<(), Error> {
        if self.state != LoadState::Loaded {
            return Err(self.misuse("update"));
        }
        self.transform = self.policy.advance(self.transform, dt);
        self.model = self.transform.model();
        Ok(())
    }

    /// Record this primitive's binds and its single draw call into `frame`.
    ///
    /// The transform is recomposed from its parts and not scaled by `_dt`.
    pub fn draw(&mut self, frame: &mut Frame, _dt: Duration) -> Result<(), Error> {
        if self.state != LoadState::Loaded {
            return Err(self.misuse("draw"));
        }
        let Some(resources) = &self.resources else {
            return Err(self.misuse("draw"));
        };
        let Some(program) = &resources.program else {
            log::trace!("{} has no usable shader program, skipping", self.label);
            return Ok(());
        };
        let Some(vertex_array) = resources.vertex_array.id() else {
            return Err(self.misuse("draw"));
        };

        frame.push(Command::SetTextureFilter {
            min: FilterMode::Nearest,
            mag: FilterMode::Nearest,
        });
        program.use_program(frame);
        self.model = self.transform.model();
        program.set_transform(frame, self.model.into());
        frame.push(Command::BindVertexArray(vertex_array));
        if let Some(texture) = &resources.texture {
            texture.use_texture(frame);
        }
        frame.push(self.mesh.draw_call().into());
        Ok(())
    }

    /// Release every GPU resource. Safe to call more than once.
    pub fn dispose(&mut self, gpu: &mut dyn GpuBackend) {
        if let Some(mut resources) = self.resources.take() {
            resources.release(gpu);
            log::info!("disposed {}", self.label);
        }
        self.state = LoadState::Disposed;
    }

    fn check_shader_inputs(&self) -> Result<(), Error> {
        // Sources that do not compile are reported by `ShaderProgram::compile`
        let Ok(inputs) = ShaderInputs::of_sources(&self.shader) else {
            return Ok(());
        };
        if inputs.tex_coords && !self.mesh.has_tex_coords() {
            return Err(Error::InvalidMesh(format!(
                "the shader of {} reads texture coordinates the mesh does not have",
                self.label
            )));
        }
        if inputs.texture && self.texture_path.is_none() {
            return Err(Error::InvalidMesh(format!(
                "the shader of {} samples a texture but none was given",
                self.label
            )));
        }
        Ok(())
    }

    fn misuse(&self, operation: &'static str) -> Error {
        Error::ResourceMisuse {
            operation,
            state: self.state,
        }
    }
}
