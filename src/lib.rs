//! prim-ngin
//!
//! A minimal rendering sandbox: a window host drawing a small, closed set of
//! hard-coded primitives (triangle, quad, cube, pyramid), each with its own
//! shader program, optional texture and a per-frame transform update.
//!
//! High-level modules
//! - `context`: window, surface and GPU device owned by the host
//! - `data_structures`: meshes, shapes, shaders, textures and primitives
//! - `error`: the crate's error type and primitive load states
//! - `flow`: host configuration, the scene and the event loop
//! - `gpu`: the resource-creation trait and its wgpu implementation
//! - `pipelines`: embedded shaders and render pipeline construction
//! - `render`: frame command recording
//! - `resources`: asset path resolution
//!

pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod gpu;
pub mod pipelines;
pub mod render;
pub mod resources;

pub use data_structures::{
    primitive::Primitive,
    shapes::Shape,
    transform::{Transform, UpdatePolicy},
};
pub use error::Error;
pub use flow::{HostConfig, Scene, run};
