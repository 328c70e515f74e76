//! Error taxonomy for primitive loading and drawing.
//!
//! Library operations return [`Error`]. The host boundary (`flow::run`,
//! context creation) wraps these into `anyhow::Error`.

use std::fmt;

use crate::gpu::ShaderStage;

/// Lifecycle state of a [`Primitive`](crate::data_structures::primitive::Primitive).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadState {
    Unloaded,
    Loaded,
    Disposed,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::Unloaded => f.write_str("unloaded"),
            LoadState::Loaded => f.write_str("loaded"),
            LoadState::Disposed => f.write_str("disposed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A shader stage failed to compile. `log` is the compiler diagnostic.
    Compile { stage: ShaderStage, log: String },
    /// The compiled stages could not be linked into one program.
    Link { log: String },
    /// The image file is missing, unreadable or not a decodable image.
    Decode { path: String, reason: String },
    /// Geometry that violates the mesh invariants, or that lacks an input
    /// the shader or texture needs.
    InvalidMesh(String),
    /// An update policy parameter that would break the transform.
    InvalidPolicy(String),
    /// An operation was called in a lifecycle state that does not allow it.
    ResourceMisuse {
        operation: &'static str,
        state: LoadState,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compile { stage, log } => {
                write!(f, "{:?} shader failed to compile: {}", stage, log)
            }
            Error::Link { log } => write!(f, "shader program failed to link: {}", log),
            Error::Decode { path, reason } => {
                write!(f, "could not decode image {}: {}", path, reason)
            }
            Error::InvalidMesh(msg) => write!(f, "invalid mesh: {}", msg),
            Error::InvalidPolicy(msg) => write!(f, "invalid update policy: {}", msg),
            Error::ResourceMisuse { operation, state } => {
                write!(f, "`{}` called on a {} primitive", operation, state)
            }
        }
    }
}

impl std::error::Error for Error {}
