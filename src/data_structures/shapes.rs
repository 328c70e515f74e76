//! The built-in shapes and their literal geometry.

use crate::{data_structures::mesh::Mesh, error::Error};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Shape {
    Triangle,
    Quad,
    Cube,
    Pyramid,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Triangle => "triangle",
            Shape::Quad => "quad",
            Shape::Cube => "cube",
            Shape::Pyramid => "pyramid",
        }
    }

    pub fn mesh(&self) -> Result<Mesh, Error> {
        match self {
            Shape::Triangle => Mesh::new(TRIANGLE_POSITIONS.to_vec(), Vec::new(), vec![0, 1, 2]),
            Shape::Quad => Mesh::new(
                QUAD_POSITIONS.to_vec(),
                QUAD_TEX_COORDS.to_vec(),
                vec![0, 1, 3, 1, 2, 3],
            ),
            Shape::Cube => {
                let (positions, tex_coords): (Vec<_>, Vec<_>) = CUBE.iter().map(|(p, t)| (*p, *t)).unzip();
                Mesh::new(positions, tex_coords, Vec::new())
            }
            Shape::Pyramid => {
                let (positions, tex_coords): (Vec<_>, Vec<_>) = PYRAMID.iter().map(|(p, t)| (*p, *t)).unzip();
                Mesh::new(positions, tex_coords, Vec::new())
            }
        }
    }
}

const TRIANGLE_POSITIONS: [[f32; 3]; 3] = [
    [-0.5, -0.5, 0.0], // BL
    [0.5, -0.5, 0.0],  // BR
    [0.0, 0.5, 0.0],   // T
];

const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.5, 0.5, 0.0],   // TR
    [0.5, -0.5, 0.0],  // BR
    [-0.5, -0.5, 0.0], // BL
    [-0.5, 0.5, 0.0],  // TL
];

const QUAD_TEX_COORDS: [[f32; 2]; 4] = [[1.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0]];

// 6 faces, 2 triangles each, no shared vertices
const CUBE: [([f32; 3], [f32; 2]); 36] = [
    // back
    ([-0.5, -0.5, -0.5], [0.0, 0.0]),
    ([0.5, -0.5, -0.5], [1.0, 0.0]),
    ([0.5, 0.5, -0.5], [1.0, 1.0]),
    ([0.5, 0.5, -0.5], [1.0, 1.0]),
    ([-0.5, 0.5, -0.5], [0.0, 1.0]),
    ([-0.5, -0.5, -0.5], [0.0, 0.0]),
    // front
    ([-0.5, -0.5, 0.5], [0.0, 0.0]),
    ([0.5, -0.5, 0.5], [1.0, 0.0]),
    ([0.5, 0.5, 0.5], [1.0, 1.0]),
    ([0.5, 0.5, 0.5], [1.0, 1.0]),
    ([-0.5, 0.5, 0.5], [0.0, 1.0]),
    ([-0.5, -0.5, 0.5], [0.0, 0.0]),
    // left
    ([-0.5, 0.5, 0.5], [1.0, 0.0]),
    ([-0.5, 0.5, -0.5], [1.0, 1.0]),
    ([-0.5, -0.5, -0.5], [0.0, 1.0]),
    ([-0.5, -0.5, -0.5], [0.0, 1.0]),
    ([-0.5, -0.5, 0.5], [0.0, 0.0]),
    ([-0.5, 0.5, 0.5], [1.0, 0.0]),
    // right
    ([0.5, 0.5, 0.5], [1.0, 0.0]),
    ([0.5, 0.5, -0.5], [1.0, 1.0]),
    ([0.5, -0.5, -0.5], [0.0, 1.0]),
    ([0.5, -0.5, -0.5], [0.0, 1.0]),
    ([0.5, -0.5, 0.5], [0.0, 0.0]),
    ([0.5, 0.5, 0.5], [1.0, 0.0]),
    // bottom
    ([-0.5, -0.5, -0.5], [0.0, 1.0]),
    ([0.5, -0.5, -0.5], [1.0, 1.0]),
    ([0.5, -0.5, 0.5], [1.0, 0.0]),
    ([0.5, -0.5, 0.5], [1.0, 0.0]),
    ([-0.5, -0.5, 0.5], [0.0, 0.0]),
    ([-0.5, -0.5, -0.5], [0.0, 1.0]),
    // top
    ([-0.5, 0.5, -0.5], [0.0, 1.0]),
    ([0.5, 0.5, -0.5], [1.0, 1.0]),
    ([0.5, 0.5, 0.5], [1.0, 0.0]),
    ([0.5, 0.5, 0.5], [1.0, 0.0]),
    ([-0.5, 0.5, 0.5], [0.0, 0.0]),
    ([-0.5, 0.5, -0.5], [0.0, 1.0]),
];

// Square base split in two, four sides meeting at the apex
const PYRAMID: [([f32; 3], [f32; 2]); 18] = [
    // base
    ([-0.5, -0.5, -0.5], [0.0, 0.0]),
    ([0.5, -0.5, -0.5], [1.0, 0.0]),
    ([0.5, -0.5, 0.5], [1.0, 1.0]),
    ([0.5, -0.5, 0.5], [1.0, 1.0]),
    ([-0.5, -0.5, 0.5], [0.0, 1.0]),
    ([-0.5, -0.5, -0.5], [0.0, 0.0]),
    // front
    ([-0.5, -0.5, 0.5], [0.0, 0.0]),
    ([0.5, -0.5, 0.5], [1.0, 0.0]),
    ([0.0, 0.5, 0.0], [0.5, 1.0]),
    // right
    ([0.5, -0.5, 0.5], [0.0, 0.0]),
    ([0.5, -0.5, -0.5], [1.0, 0.0]),
    ([0.0, 0.5, 0.0], [0.5, 1.0]),
    // back
    ([0.5, -0.5, -0.5], [0.0, 0.0]),
    ([-0.5, -0.5, -0.5], [1.0, 0.0]),
    ([0.0, 0.5, 0.0], [0.5, 1.0]),
    // left
    ([-0.5, -0.5, -0.5], [0.0, 0.0]),
    ([-0.5, -0.5, 0.5], [1.0, 0.0]),
    ([0.0, 0.5, 0.0], [0.5, 1.0]),
];
