//! Static geometry: positions, optional texture coordinates, optional indices.

use crate::{
    error::Error,
    gpu::Topology,
    render::DrawCall,
};

/// CPU-side geometry of a primitive.
///
/// Invariants, checked by [`Mesh::new`]:
/// - at least one position
/// - texture coordinates are either absent or one per position
/// - every index addresses an existing position
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(
        positions: Vec<[f32; 3]>,
        tex_coords: Vec<[f32; 2]>,
        indices: Vec<u32>,
    ) -> Result<Self, Error> {
        if positions.is_empty() {
            return Err(Error::InvalidMesh("mesh has no positions".to_string()));
        }
        if !tex_coords.is_empty() && tex_coords.len() != positions.len() {
            return Err(Error::InvalidMesh(format!(
                "{} texture coordinates for {} positions",
                tex_coords.len(),
                positions.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(Error::InvalidMesh(format!(
                "index {} out of range for {} positions",
                bad,
                positions.len()
            )));
        }
        Ok(Self {
            positions,
            tex_coords,
            indices,
        })
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn tex_coords(&self) -> &[[f32; 2]] {
        &self.tex_coords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn has_tex_coords(&self) -> bool {
        !self.tex_coords.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }

    /// Indexed meshes draw as a triangle fan over all indices, the rest as a
    /// triangle list over all vertices. Never both.
    pub fn draw_call(&self) -> DrawCall {
        if self.is_indexed() {
            DrawCall::Indexed {
                topology: Topology::TriangleFan,
                count: self.indices.len() as u32,
            }
        } else {
            DrawCall::Sequential {
                topology: Topology::TriangleList,
                count: self.vertex_count(),
            }
        }
    }
}
