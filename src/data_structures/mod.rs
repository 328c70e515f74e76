//! Engine data structures: meshes, shapes, shaders, textures and primitives.
//!
//! - `mesh` holds validated CPU-side geometry
//! - `shapes` is the closed set of built-in shapes and their literal vertices
//! - `shader` wraps a linked shader program
//! - `texture` decodes images and owns texture handles
//! - `transform` has the rotation/scale/translation triple and update policies
//! - `primitive` ties all of the above into something drawable

pub mod mesh;
pub mod primitive;
pub mod shader;
pub mod shapes;
pub mod texture;
pub mod transform;
