//! Marching cubes contouring
//!
//! Classical table-driven triangulation. Crossing vertices are keyed by
//! their global lattice edge (`3 * point_index + axis`) so adjacent cells
//! reuse the same vertex and the mesh comes out indexed and watertight.
//! Cells touching a lattice value of exactly zero are skipped; the surface
//! there belongs to the neighboring cells.

use std::collections::HashSet;

use glam::Vec3;

use super::tables::{CORNER_OFFSETS, EDGE_CONNECTIONS, EDGE_TABLE, TRI_TABLE};
use super::{ContouringParams, NormalComputation};
use crate::eval::{eval_color, eval_gradient, GRADIENT_EPSILON};
use crate::grid::GridSampler;
use crate::mesh::{accumulate_face_normals, face_normal, Diagnostics, Mesh, MeshBuilder, Vertex};
use crate::scene::SceneTree;
use crate::types::NodeRef;

/// Linear crossing parameter on an edge: `t = fa / (fa - fb)`
#[inline(always)]
fn crossing_t(fa: f32, fb: f32) -> f32 {
    (fa / (fa - fb)).clamp(0.0, 1.0)
}

/// Run marching cubes over the lattice
pub fn marching_cubes(
    tree: &SceneTree,
    root: NodeRef,
    grid: &GridSampler,
    params: &ContouringParams,
) -> (Mesh, Diagnostics) {
    let res = grid.res();
    let values = grid.sample_scalars(tree, root);
    let corner_grads = matches!(
        params.normal_computation,
        NormalComputation::Corner | NormalComputation::CornerGradient
    )
    .then(|| grid.sample_gradients(tree, root));

    let mut builder = MeshBuilder::new();
    let mut diag = Diagnostics::default();
    let mut adjusted: HashSet<u32> = HashSet::new();

    for k in 0..res - 1 {
        for j in 0..res - 1 {
            for i in 0..res - 1 {
                process_cell(
                    tree,
                    root,
                    grid,
                    &values,
                    corner_grads.as_deref(),
                    i,
                    j,
                    k,
                    params,
                    &mut builder,
                    &mut diag,
                    &mut adjusted,
                );
            }
        }
    }

    let mut mesh = builder.build();
    if params.normal_computation == NormalComputation::Face {
        let normals = accumulate_face_normals(&mesh);
        for (v, n) in mesh.vertices.iter_mut().zip(normals) {
            v.normal = n;
        }
    }
    (mesh, diag)
}

/// Global dedup key of the lattice edge leaving `(i, j, k)` along `axis`
#[inline(always)]
fn edge_key(grid: &GridSampler, i: usize, j: usize, k: usize, axis: usize) -> u64 {
    (grid.index(i, j, k) * 3 + axis) as u64
}

#[allow(clippy::too_many_arguments)]
fn process_cell(
    tree: &SceneTree,
    root: NodeRef,
    grid: &GridSampler,
    values: &[f32],
    corner_grads: Option<&[Vec3]>,
    x: usize,
    y: usize,
    z: usize,
    params: &ContouringParams,
    builder: &mut MeshBuilder,
    diag: &mut Diagnostics,
    adjusted: &mut HashSet<u32>,
) {
    let mut corner_values = [0.0_f32; 8];
    let mut corner_positions = [Vec3::ZERO; 8];
    let mut corner_coords = [[0_usize; 3]; 8];

    for c in 0..8 {
        let gi = x + CORNER_OFFSETS[c][0];
        let gj = y + CORNER_OFFSETS[c][1];
        let gk = z + CORNER_OFFSETS[c][2];
        corner_coords[c] = [gi, gj, gk];
        corner_values[c] = values[grid.index(gi, gj, gk)];
        corner_positions[c] = grid.position(gi, gj, gk);
    }

    // A corner exactly on the surface would make the crossing parameter
    // ill-defined; such cells contribute nothing
    if corner_values.iter().any(|&v| v == 0.0) {
        return;
    }

    let mut cube_index = 0_usize;
    for c in 0..8 {
        if corner_values[c] < 0.0 {
            cube_index |= 1 << c;
        }
    }
    if EDGE_TABLE[cube_index] == 0 {
        return;
    }

    // One deduplicated vertex per crossed edge
    let mut edge_indices = [0_u32; 12];
    for e in 0..12 {
        if EDGE_TABLE[cube_index] & (1 << e) == 0 {
            continue;
        }
        let c0 = EDGE_CONNECTIONS[e][0];
        let c1 = EDGE_CONNECTIONS[e][1];
        // Key the edge by its lower lattice endpoint and axis
        let (lo, hi, axis) = {
            let a = corner_coords[c0];
            let b = corner_coords[c1];
            let axis = (0..3).find(|&ax| a[ax] != b[ax]).unwrap_or(0);
            if a[axis] < b[axis] {
                (c0, c1, axis)
            } else {
                (c1, c0, axis)
            }
        };
        let key = edge_key(
            grid,
            corner_coords[lo][0],
            corner_coords[lo][1],
            corner_coords[lo][2],
            axis,
        );
        if let Some(idx) = builder.index_of(key) {
            edge_indices[e] = idx;
            continue;
        }

        let fa = corner_values[lo];
        let fb = corner_values[hi];
        let t = crossing_t(fa, fb);
        let pos = corner_positions[lo] + (corner_positions[hi] - corner_positions[lo]) * t;

        // Zero marks a pending face-normal fallback
        let normal = match params.normal_computation {
            NormalComputation::Gradient => eval_gradient(tree, root, pos),
            NormalComputation::Face => Vec3::ZERO,
            NormalComputation::Corner | NormalComputation::CornerGradient => {
                let grads = corner_grads.unwrap_or(&[]);
                let ga = grads[grid.index(
                    corner_coords[lo][0],
                    corner_coords[lo][1],
                    corner_coords[lo][2],
                )];
                let gb = grads[grid.index(
                    corner_coords[hi][0],
                    corner_coords[hi][1],
                    corner_coords[hi][2],
                )];
                if params.normal_computation == NormalComputation::Corner {
                    ga + (gb - ga) * t
                } else {
                    (ga + gb) * 0.5
                }
            }
        };
        let len = normal.length();
        let normal = if len > GRADIENT_EPSILON && len.is_finite() {
            normal / len
        } else {
            Vec3::ZERO
        };

        let color = eval_color(tree, root, pos);
        edge_indices[e] = builder.vertex(key, Vertex::new(pos, normal, color));
    }

    // Table rows wind inward for this corner layout; swap the last two
    // indices so face normals point along the gradient
    let row = &TRI_TABLE[cube_index];
    let mut t = 0;
    while row[t] != -1 {
        let a = edge_indices[row[t] as usize];
        let b = edge_indices[row[t + 2] as usize];
        let c = edge_indices[row[t + 1] as usize];
        t += 3;
        if a == b || b == c || a == c {
            continue;
        }
        let fnorm = face_normal(
            builder.vertex_mut(a).position,
            builder.vertex_mut(b).position,
            builder.vertex_mut(c).position,
        );
        builder.triangle(a, b, c);
        if params.normal_computation == NormalComputation::Face || fnorm == Vec3::ZERO {
            continue;
        }
        for idx in [a, b, c] {
            if adjusted.contains(&idx) {
                continue;
            }
            let n = builder.vertex_mut(idx).normal;
            if n == Vec3::ZERO || n.dot(fnorm) < params.normal_threshold {
                builder.vertex_mut(idx).normal = fnorm;
                diag.degenerate_normals += 1;
                adjusted.insert(idx);
            }
        }
    }
}
