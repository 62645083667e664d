//! # isofield
//!
//! Implicit-function scene graphs with isosurface extraction.
//!
//! A scene is a tree of signed-distance nodes: leaf primitives, n-ary CSG
//! operators, single-child affine transforms and a numeric-gradient
//! wrapper, held in an arena addressed by stable handles. The zero level
//! set of the root field is extracted over a sampling box with marching
//! cubes or dual contouring into an indexed, deduplicated mesh, and can be
//! exported as OBJ, as an 8-bit voxel volume, or persisted as JSON.
//!
//! ## Example
//!
//! ```rust
//! use isofield::prelude::*;
//!
//! // A sphere with a box carved out
//! let mut tree = SceneTree::new();
//! let diff = tree.create_node("difference").unwrap();
//! let sphere = tree.create_node("sphere").unwrap();
//! let cube = tree.create_node("box").unwrap();
//! tree.node_mut(cube).unwrap().kind = NodeKind::Box3d {
//!     half_extents: glam::Vec3::splat(0.8),
//! };
//! tree.append_child(diff, sphere).unwrap();
//! tree.append_child(diff, cube).unwrap();
//! tree.set_root(diff).unwrap();
//!
//! // Evaluate the field
//! let d = eval(&tree, diff, glam::Vec3::ZERO);
//!
//! // Extract the surface
//! let bounds = Aabb::new(glam::Vec3::splat(-1.5), glam::Vec3::splat(1.5));
//! let mesh = extract(
//!     &tree,
//!     diff,
//!     bounds,
//!     32,
//!     ContouringType::MarchingCubes,
//!     &ContouringParams::default(),
//! )
//! .unwrap();
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]

pub mod contour;
pub mod eval;
pub mod export;
pub mod grid;
pub mod mesh;
pub mod primitives;
pub mod scene;
pub mod types;

/// Everything needed for typical use
pub mod prelude {
    pub use crate::contour::{
        extract, extract_with_diagnostics, ContouringParams, ContouringType, NormalComputation,
    };
    pub use crate::eval::{eval, eval_color, eval_gradient, normal};
    pub use crate::export::{
        export_obj, export_volume, load_tree_json, save_tree_json, ExportError,
    };
    pub use crate::grid::{GridError, GridSampler};
    pub use crate::mesh::{Diagnostics, Mesh, MeshBuilder, Vertex};
    pub use crate::scene::{SceneTree, TreeError};
    pub use crate::types::{Aabb, ColorMode, Node, NodeCategory, NodeKind, NodeRef};
    pub use glam::{Vec3, Vec4};
}

// Re-exports for convenience
pub use contour::{extract, extract_with_diagnostics};
pub use eval::{eval, eval_gradient};
pub use scene::SceneTree;
pub use types::{Aabb, Node, NodeKind, NodeRef};
