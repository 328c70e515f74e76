//! Render pipeline construction and the embedded shader sources.

use std::borrow::Cow;

pub mod primitive;
pub mod shader;

/// One vertex-stage and one fragment-stage source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ShaderSources {
    /// Untextured, solid orange.
    pub const FLAT: ShaderSources = ShaderSources {
        vertex: Cow::Borrowed(include_str!("shaders/flat.vert.wgsl")),
        fragment: Cow::Borrowed(include_str!("shaders/flat.frag.wgsl")),
    };

    /// Samples the texture bound at group 1 with the vertex UVs.
    pub const TEXTURED: ShaderSources = ShaderSources {
        vertex: Cow::Borrowed(include_str!("shaders/textured.vert.wgsl")),
        fragment: Cow::Borrowed(include_str!("shaders/textured.frag.wgsl")),
    };

    pub fn new(vertex: impl Into<Cow<'static, str>>, fragment: impl Into<Cow<'static, str>>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}
