//! Isosurface extraction
//!
//! Two contouring back ends over the same sampled lattice: classical
//! marching cubes and dual contouring with QEF vertex placement. Both emit
//! through [`MeshBuilder`](crate::mesh::MeshBuilder) so vertices shared
//! between cells are shared in the output.

mod dual_contouring;
mod marching_cubes;
mod tables;

pub use dual_contouring::dual_contouring;
pub use marching_cubes::marching_cubes;

use crate::grid::{GridError, GridSampler};
use crate::mesh::{Diagnostics, Mesh};
use crate::scene::SceneTree;
use crate::types::{Aabb, NodeRef};

/// Which contouring algorithm to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContouringType {
    /// Table-driven per-cell triangulation
    #[default]
    MarchingCubes,
    /// One QEF-placed vertex per cell, quads over sign-change edges
    DualContouring,
}

/// How marching cubes computes vertex normals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalComputation {
    /// Field gradient evaluated at the crossing point
    #[default]
    Gradient,
    /// Accumulated area-weighted triangle normals
    Face,
    /// Corner gradients interpolated at the crossing parameter
    Corner,
    /// Average of the two adjacent corner gradients
    CornerGradient,
}

/// Tuning knobs shared by both contouring back ends
#[derive(Debug, Clone, Copy)]
pub struct ContouringParams {
    /// Normal policy for marching cubes
    pub normal_computation: NormalComputation,
    /// Minimum cosine between a gradient normal and its face normal before
    /// falling back to the face normal
    pub normal_threshold: f32,
    /// Dual contouring: stop refining when the improvement drops below this
    pub consistency_threshold: f32,
    /// Dual contouring: refinement iteration cap
    pub max_nr_iters: u32,
    /// Absolute surface tolerance
    pub epsilon: f32,
    /// Surface tolerance relative to the cell size
    pub grid_epsilon: f32,
}

impl Default for ContouringParams {
    fn default() -> Self {
        ContouringParams {
            normal_computation: NormalComputation::Gradient,
            normal_threshold: 0.73,
            consistency_threshold: 0.01,
            max_nr_iters: 8,
            epsilon: 1e-8,
            grid_epsilon: 0.01,
        }
    }
}

/// Extract the zero isosurface of `root` over `bounds` at resolution `res`
pub fn extract(
    tree: &SceneTree,
    root: NodeRef,
    bounds: Aabb,
    res: usize,
    contouring_type: ContouringType,
    params: &ContouringParams,
) -> Result<Mesh, GridError> {
    extract_with_diagnostics(tree, root, bounds, res, contouring_type, params)
        .map(|(mesh, _)| mesh)
}

/// Like [`extract`], also reporting extraction statistics
pub fn extract_with_diagnostics(
    tree: &SceneTree,
    root: NodeRef,
    bounds: Aabb,
    res: usize,
    contouring_type: ContouringType,
    params: &ContouringParams,
) -> Result<(Mesh, Diagnostics), GridError> {
    let grid = GridSampler::new(bounds, res)?;
    let (mesh, mut diag) = match contouring_type {
        ContouringType::MarchingCubes => marching_cubes(tree, root, &grid, params),
        ContouringType::DualContouring => dual_contouring(tree, root, &grid, params),
    };
    diag.nr_vertices = mesh.vertex_count();
    diag.nr_faces = mesh.triangle_count();
    Ok((mesh, diag))
}
