//! WGSL front-end checks.
//!
//! wgpu reports invalid shader modules through its uncaptured-error handler,
//! which panics by default. Running the source through naga first turns a
//! broken shader into a diagnostic string instead.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use crate::{
    gpu::{ShaderStage, VertexLayout},
    pipelines::{ShaderSources, primitive::PipelineKey},
};

/// Entry point every vertex-stage source must provide.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point every fragment-stage source must provide.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Parse and validate `source`. On failure the rendered diagnostic is returned.
pub fn compile_wgsl(source: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| e.to_string())?;
    Ok(module)
}

pub fn entry_point_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => VERTEX_ENTRY,
        ShaderStage::Fragment => FRAGMENT_ENTRY,
    }
}

/// Check that `module` has the entry point `stage` needs.
pub fn check_entry_point(module: &naga::Module, stage: ShaderStage) -> Result<(), String> {
    let wanted = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let name = entry_point_name(stage);
    if module
        .entry_points
        .iter()
        .any(|ep| ep.stage == wanted && ep.name == name)
    {
        Ok(())
    } else {
        Err(format!("{:?} stage has no `{}` entry point", stage, name))
    }
}

/// Bind group a texture and its sampler are expected at.
pub const TEXTURE_GROUP: u32 = 1;

/// What a linked program reads beyond the position attribute and the
/// transform uniform.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ShaderInputs {
    /// The vertex stage reads texture coordinates at location 1.
    pub tex_coords: bool,
    /// A stage declares a resource in [`TEXTURE_GROUP`].
    pub texture: bool,
}

impl ShaderInputs {
    /// Inspect the vertex entry point's input locations and the resource
    /// bindings of both stages. Locations other than the position and
    /// texture coordinate slots are rejected.
    pub fn of(vertex: &naga::Module, fragment: &naga::Module) -> Result<Self, String> {
        let entry = vertex
            .entry_points
            .iter()
            .find(|ep| ep.stage == naga::ShaderStage::Vertex && ep.name == VERTEX_ENTRY)
            .ok_or_else(|| format!("vertex stage has no `{}` entry point", VERTEX_ENTRY))?;

        let mut locations = Vec::new();
        for argument in &entry.function.arguments {
            match &argument.binding {
                Some(binding) => locations.extend(location(binding)),
                None => {
                    if let naga::TypeInner::Struct { members, .. } = &vertex.types[argument.ty].inner
                    {
                        locations.extend(
                            members
                                .iter()
                                .filter_map(|m| m.binding.as_ref().and_then(location)),
                        );
                    }
                }
            }
        }

        let mut inputs = Self::default();
        for slot in locations {
            match slot {
                VertexLayout::POSITION_SLOT => {}
                VertexLayout::TEX_COORD_SLOT => inputs.tex_coords = true,
                other => return Err(format!("vertex input at location {} has no attribute", other)),
            }
        }
        inputs.texture = [vertex, fragment].iter().any(|module| {
            module.global_variables.iter().any(|(_, global)| {
                global
                    .binding
                    .as_ref()
                    .is_some_and(|b| b.group == TEXTURE_GROUP)
            })
        });
        Ok(inputs)
    }

    /// Parse both sources and inspect them. Fails if either does not compile.
    pub fn of_sources(sources: &ShaderSources) -> Result<Self, String> {
        let vertex = compile_wgsl(&sources.vertex)?;
        let fragment = compile_wgsl(&sources.fragment)?;
        Self::of(&vertex, &fragment)
    }

    /// Whether a pipeline built for `key` feeds every input.
    pub fn satisfied_by(&self, key: PipelineKey) -> bool {
        (!self.tex_coords || key.tex_coords) && (!self.texture || key.textured)
    }
}

fn location(binding: &naga::Binding) -> Option<u32> {
    match binding {
        naga::Binding::Location { location, .. } => Some(*location),
        _ => None,
    }
}
