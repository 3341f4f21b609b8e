//! Error types for the recoverable failures of the crate: reading
//! meshes from disk and parsing an accelerator name. Degenerate
//! geometry is never an error, and querying an accelerator that was
//! never built is a programming mistake which panics instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Underlying I/O failure (file missing, unreadable, truncated PLY)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mesh file with an extension no reader exists for
    #[error("Unsupported mesh file format: {0}")]
    UnsupportedMeshFormat(PathBuf),

    /// Mesh file parsed but its contents make no sense
    #[error("Invalid mesh {path}: {reason}")]
    InvalidMesh { path: PathBuf, reason: String },

    /// Accelerator name that does not match any structure
    #[error("Unknown accelerator type \"{0}\" (expected kdtree, bbvh or qbvh)")]
    UnknownAccelerator(String),
}

pub type Result<T> = std::result::Result<T, Error>;
