//! File export
//!
//! Wavefront OBJ meshes, 8-bit voxel volumes with a plain-text header
//! companion, and JSON scene trees. All writers stream through buffered
//! I/O; a failed write removes the partial output file.

pub mod json;
pub mod obj;
pub mod volume;

pub use json::{load_tree_json, save_tree_json};
pub use obj::{export_obj, ObjWriter};
pub use volume::{export_volume, rasterize_volume, value_range, VolumeHeader};

use thiserror::Error;

/// File export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid sampling setup
    #[error(transparent)]
    Grid(#[from] crate::grid::GridError),
}
