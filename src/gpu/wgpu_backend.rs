//! [`GpuBackend`] on top of wgpu.
//!
//! Resources live in id-keyed tables. Drawing happens in two steps: `prepare`
//! runs before the render pass (uniform uploads, lazy pipeline and fan-index
//! creation), `replay` runs inside it and only reads.

use std::collections::HashMap;

use cgmath::SquareMatrix;
use wgpu::util::DeviceExt;

use crate::{
    gpu::{
        BufferId, BufferUsage, FanCache, FilterMode, GpuBackend, ProgramId, ShaderStage, StageId,
        TextureId, Topology, VertexArrayId, VertexLayout, fan_list_count,
    },
    pipelines::{
        primitive::{PipelineKey, mk_primitive_pipeline, texture_layout, transform_layout},
        shader::{ShaderInputs, TEXTURE_GROUP, check_entry_point, compile_wgsl},
    },
    render::{BindState, Command, Frame},
};

struct BufferEntry {
    buffer: wgpu::Buffer,
    /// CPU copy of index data, needed to expand fans.
    indices: Option<Vec<u32>>,
}

struct StageEntry {
    stage: ShaderStage,
    module: wgpu::ShaderModule,
    ir: naga::Module,
}

struct ProgramEntry {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    inputs: ShaderInputs,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct TextureEntry {
    texture: wgpu::Texture,
    nearest: wgpu::BindGroup,
    linear: wgpu::BindGroup,
}

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    color_format: wgpu::TextureFormat,
    transform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    next_id: u32,
    buffers: HashMap<BufferId, BufferEntry>,
    stages: HashMap<StageId, StageEntry>,
    programs: HashMap<ProgramId, ProgramEntry>,
    vertex_arrays: HashMap<VertexArrayId, VertexLayout>,
    textures: HashMap<TextureId, TextureEntry>,
    pipelines: HashMap<(ProgramId, PipelineKey), wgpu::RenderPipeline>,
    fans: FanCache<wgpu::Buffer>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("color_format", &self.color_format)
            .field("buffers", &self.buffers.len())
            .field("programs", &self.programs.len())
            .field("vertex_arrays", &self.vertex_arrays.len())
            .field("textures", &self.textures.len())
            .field("pipelines", &self.pipelines.len())
            .field("fans", &self.fans.len())
            .finish()
    }
}

impl WgpuBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, color_format: wgpu::TextureFormat) -> Self {
        let transform_layout = transform_layout(&device);
        let texture_layout = texture_layout(&device);
        Self {
            device,
            queue,
            color_format,
            transform_layout,
            texture_layout,
            next_id: 1,
            buffers: HashMap::new(),
            stages: HashMap::new(),
            programs: HashMap::new(),
            vertex_arrays: HashMap::new(),
            textures: HashMap::new(),
            pipelines: HashMap::new(),
            fans: FanCache::new(),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn pipeline_key(&self, binds: &BindState, topology: Topology) -> Option<(ProgramId, PipelineKey)> {
        let program = binds.program?;
        let layout = self.vertex_arrays.get(&binds.vertex_array?)?;
        Some((
            program,
            PipelineKey {
                topology,
                tex_coords: layout.tex_coords.is_some(),
                textured: binds.texture.is_some(),
            },
        ))
    }

    /// Upload uniforms and create whatever pipelines and fan index buffers
    /// `frame` needs. Must run before [`replay`](Self::replay).
    pub fn prepare(&mut self, frame: &Frame) {
        let mut binds = BindState::default();
        for command in frame.commands() {
            binds.apply(command);
            match command {
                Command::SetTransform { program, matrix } => match self.programs.get(program) {
                    Some(entry) => {
                        self.queue
                            .write_buffer(&entry.uniform, 0, bytemuck::cast_slice(&[*matrix]))
                    }
                    None => log::warn!("transform upload to unknown program {:?}", program),
                },
                Command::Draw { topology, .. } => self.ensure_pipeline(&binds, *topology),
                Command::DrawIndexed { topology, .. } => {
                    self.ensure_pipeline(&binds, *topology);
                    if *topology == Topology::TriangleFan {
                        self.ensure_fan(&binds);
                    }
                }
                _ => (),
            }
        }
    }

    fn ensure_pipeline(&mut self, binds: &BindState, topology: Topology) {
        let Some(key) = self.pipeline_key(binds, topology) else {
            return;
        };
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(program) = self.programs.get(&key.0) else {
            return;
        };
        if !program.inputs.satisfied_by(key.1) {
            log::warn!(
                "{:?} needs {:?} but the draw supplies {:?}, skipping",
                key.0,
                program.inputs,
                key.1
            );
            return;
        }
        let pipeline = mk_primitive_pipeline(
            &self.device,
            self.color_format,
            &self.transform_layout,
            &self.texture_layout,
            &program.vertex,
            &program.fragment,
            key.1,
        );
        log::debug!("created pipeline for {:?} {:?}", key.0, key.1);
        self.pipelines.insert(key, pipeline);
    }

    fn ensure_fan(&mut self, binds: &BindState) {
        let Some(source) = binds
            .vertex_array
            .and_then(|va| self.vertex_arrays.get(&va))
            .and_then(|layout| layout.indices)
        else {
            return;
        };
        let Some(fan) = self.buffers.get(&source).and_then(|b| b.indices.as_ref()) else {
            return;
        };
        let device = &self.device;
        self.fans.ensure(source, fan, |list| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Fan Index Buffer"),
                contents: bytemuck::cast_slice(list),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
    }

    /// Issue the recorded commands into `render_pass`.
    ///
    /// Draws whose program, vertex array or pipeline is missing are skipped,
    /// as are topologies the recorder never produces: sequential fans and
    /// indexed lists.
    pub fn replay(&self, frame: &Frame, render_pass: &mut wgpu::RenderPass<'_>) {
        let mut binds = BindState::default();
        for command in frame.commands() {
            binds.apply(command);
            match command {
                Command::Draw {
                    topology: Topology::TriangleList,
                    count,
                } => {
                    if self.bind_draw_state(&binds, Topology::TriangleList, render_pass) {
                        render_pass.draw(0..*count, 0..1);
                    }
                }
                Command::DrawIndexed {
                    topology: Topology::TriangleFan,
                    count,
                } => {
                    let Some(source) = binds
                        .vertex_array
                        .and_then(|va| self.vertex_arrays.get(&va))
                        .and_then(|layout| layout.indices)
                    else {
                        log::warn!("indexed draw on a vertex array without indices");
                        continue;
                    };
                    let Some((fan, len)) = self.fans.get(source) else {
                        continue;
                    };
                    if self.bind_draw_state(&binds, Topology::TriangleFan, render_pass) {
                        render_pass.set_index_buffer(fan.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..fan_list_count(*count, len), 0, 0..1);
                    }
                }
                Command::Draw { .. } | Command::DrawIndexed { .. } => {
                    log::warn!("unsupported draw {:?}, skipping", command)
                }
                _ => (),
            }
        }
    }

    fn bind_draw_state(
        &self,
        binds: &BindState,
        topology: Topology,
        render_pass: &mut wgpu::RenderPass<'_>,
    ) -> bool {
        let Some(key) = self.pipeline_key(binds, topology) else {
            return false;
        };
        let (Some(pipeline), Some(program)) = (self.pipelines.get(&key), self.programs.get(&key.0))
        else {
            return false;
        };
        let Some(layout) = binds.vertex_array.and_then(|va| self.vertex_arrays.get(&va)) else {
            return false;
        };
        let Some(positions) = self.buffers.get(&layout.positions) else {
            return false;
        };

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &program.bind_group, &[]);
        if let Some(texture) = binds.texture.and_then(|t| self.textures.get(&t)) {
            let group = match binds.sampler_filter() {
                FilterMode::Nearest => &texture.nearest,
                FilterMode::Linear => &texture.linear,
            };
            render_pass.set_bind_group(TEXTURE_GROUP, group, &[]);
        }
        render_pass.set_vertex_buffer(VertexLayout::POSITION_SLOT, positions.buffer.slice(..));
        if let Some(tex_coords) = layout.tex_coords.and_then(|id| self.buffers.get(&id)) {
            render_pass.set_vertex_buffer(VertexLayout::TEX_COORD_SLOT, tex_coords.buffer.slice(..));
        }
        true
    }

    fn mk_sampler(&self, filter: wgpu::FilterMode) -> wgpu::Sampler {
        self.device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        })
    }

    fn mk_texture_bind_group(
        &self,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        label: &str,
    ) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(label),
        })
    }
}

impl GpuBackend for WgpuBackend {
    fn create_buffer(&mut self, usage: BufferUsage, label: &str, contents: &[u8]) -> BufferId {
        let id = BufferId(self.next_id());
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: match usage {
                    BufferUsage::Vertex => wgpu::BufferUsages::VERTEX,
                    BufferUsage::Index => wgpu::BufferUsages::INDEX,
                },
            });
        let indices = match usage {
            BufferUsage::Index => Some(
                contents
                    .chunks_exact(4)
                    .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            BufferUsage::Vertex => None,
        };
        self.buffers.insert(id, BufferEntry { buffer, indices });
        id
    }

    fn delete_buffer(&mut self, id: BufferId) {
        if let Some(entry) = self.buffers.remove(&id) {
            entry.buffer.destroy();
        }
        if let Some(fan) = self.fans.remove(id) {
            fan.destroy();
        }
    }

    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<StageId, String> {
        let ir = compile_wgsl(source)?;
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(match stage {
                ShaderStage::Vertex => "Primitive Vertex Shader",
                ShaderStage::Fragment => "Primitive Fragment Shader",
            }),
            source: wgpu::ShaderSource::Wgsl(source.to_owned().into()),
        });
        let id = StageId(self.next_id());
        self.stages.insert(id, StageEntry { stage, module, ir });
        Ok(id)
    }

    fn delete_stage(&mut self, id: StageId) {
        self.stages.remove(&id);
    }

    fn link_program(&mut self, vertex: StageId, fragment: StageId) -> Result<ProgramId, String> {
        let (Some(vs), Some(fs)) = (self.stages.get(&vertex), self.stages.get(&fragment)) else {
            return Err("cannot link a released shader stage".to_string());
        };
        if vs.stage != ShaderStage::Vertex || fs.stage != ShaderStage::Fragment {
            return Err(format!(
                "expected a vertex and a fragment stage, got {:?} and {:?}",
                vs.stage, fs.stage
            ));
        }
        check_entry_point(&vs.ir, ShaderStage::Vertex)?;
        check_entry_point(&fs.ir, ShaderStage::Fragment)?;
        let inputs = ShaderInputs::of(&vs.ir, &fs.ir)?;

        let (vs_module, fs_module) = (vs.module.clone(), fs.module.clone());
        let identity: [[f32; 4]; 4] = cgmath::Matrix4::<f32>::identity().into();
        let uniform = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Transform Buffer"),
                contents: bytemuck::cast_slice(&[identity]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.transform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
            label: Some("transform_bind_group"),
        });
        let id = ProgramId(self.next_id());
        self.programs.insert(
            id,
            ProgramEntry {
                vertex: vs_module,
                fragment: fs_module,
                inputs,
                uniform,
                bind_group,
            },
        );
        Ok(id)
    }

    fn delete_program(&mut self, id: ProgramId) {
        if let Some(entry) = self.programs.remove(&id) {
            entry.uniform.destroy();
        }
        self.pipelines.retain(|(program, _), _| *program != id);
    }

    fn create_vertex_array(&mut self, layout: &VertexLayout) -> VertexArrayId {
        let id = VertexArrayId(self.next_id());
        self.vertex_arrays.insert(id, *layout);
        id
    }

    fn delete_vertex_array(&mut self, id: VertexArrayId) {
        self.vertex_arrays.remove(&id);
    }

    fn create_texture(&mut self, label: &str, width: u32, height: u32, rgba: &[u8]) -> TextureId {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let nearest = self.mk_sampler(wgpu::FilterMode::Nearest);
        let linear = self.mk_sampler(wgpu::FilterMode::Linear);
        let entry = TextureEntry {
            nearest: self.mk_texture_bind_group(&view, &nearest, label),
            linear: self.mk_texture_bind_group(&view, &linear, label),
            texture,
        };
        let id = TextureId(self.next_id());
        self.textures.insert(id, entry);
        id
    }

    fn delete_texture(&mut self, id: TextureId) {
        if let Some(entry) = self.textures.remove(&id) {
            entry.texture.destroy();
        }
    }
}
