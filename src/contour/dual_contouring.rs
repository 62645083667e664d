//! Dual contouring
//!
//! One vertex per active cell, placed by minimizing the quadric error
//! `sum((n_i . (x - p_i))^2)` over the cell's Hermite edge crossings, then
//! refined with Newton steps along the field gradient. Quads are stitched
//! over every interior lattice edge with a sign change, one from each of
//! the four cells sharing the edge, and split to triangles oriented by the
//! edge sign.
//!
//! Per-cell placement runs in parallel; stitching is a sequential join.

use glam::Vec3;
use rayon::prelude::*;

use super::ContouringParams;
use crate::eval::{eval, eval_color, eval_gradient, GRADIENT_EPSILON};
use crate::grid::GridSampler;
use crate::mesh::{Diagnostics, Mesh, MeshBuilder, Vertex};
use crate::scene::SceneTree;
use crate::types::NodeRef;

/// Cube edges as corner pair plus lattice offsets of both endpoints
const EDGES: [(usize, usize, [usize; 3], [usize; 3]); 12] = [
    // Bottom face (k=0)
    (0, 1, [0, 0, 0], [1, 0, 0]),
    (2, 3, [0, 1, 0], [1, 1, 0]),
    (0, 2, [0, 0, 0], [0, 1, 0]),
    (1, 3, [1, 0, 0], [1, 1, 0]),
    // Top face (k=1)
    (4, 5, [0, 0, 1], [1, 0, 1]),
    (6, 7, [0, 1, 1], [1, 1, 1]),
    (4, 6, [0, 0, 1], [0, 1, 1]),
    (5, 7, [1, 0, 1], [1, 1, 1]),
    // Vertical edges
    (0, 4, [0, 0, 0], [0, 0, 1]),
    (1, 5, [1, 0, 0], [1, 0, 1]),
    (2, 6, [0, 1, 0], [0, 1, 1]),
    (3, 7, [1, 1, 0], [1, 1, 1]),
];

/// Per-cell placement result gathered in the parallel phase
struct CellVertex {
    cell: usize,
    position: Vec3,
    singular: bool,
    unconverged: bool,
}

/// Run dual contouring over the lattice
pub fn dual_contouring(
    tree: &SceneTree,
    root: NodeRef,
    grid: &GridSampler,
    params: &ContouringParams,
) -> (Mesh, Diagnostics) {
    let res = grid.res();
    let ncells = res - 1;
    let values = grid.sample_scalars(tree, root);

    let cell_idx = |i: usize, j: usize, k: usize| -> usize { (k * ncells + j) * ncells + i };

    // Parallel phase: one QEF solve + refinement per active cell
    let placed: Vec<CellVertex> = (0..ncells * ncells * ncells)
        .into_par_iter()
        .filter_map(|ci| {
            let i = ci % ncells;
            let j = (ci / ncells) % ncells;
            let k = ci / (ncells * ncells);
            place_cell_vertex(tree, root, grid, &values, i, j, k, params).map(
                |(position, singular, unconverged)| CellVertex {
                    cell: ci,
                    position,
                    singular,
                    unconverged,
                },
            )
        })
        .collect();

    // Sequential join: emit vertices keyed by cell, count diagnostics
    let mut builder = MeshBuilder::new();
    let mut diag = Diagnostics::default();
    for cv in &placed {
        let g = eval_gradient(tree, root, cv.position);
        let len = g.length();
        let normal = if len > GRADIENT_EPSILON && len.is_finite() {
            g / len
        } else {
            diag.degenerate_normals += 1;
            Vec3::ZERO
        };
        let color = eval_color(tree, root, cv.position);
        builder.vertex(cv.cell as u64, Vertex::new(cv.position, normal, color));
        diag.singular_cells += cv.singular as usize;
        diag.unconverged_cells += cv.unconverged as usize;
    }

    // Stitch quads over interior sign-change edges
    for k in 0..res {
        for j in 0..res {
            for i in 0..res {
                let d0 = values[grid.index(i, j, k)];

                // X-edge (i,j,k) -> (i+1,j,k), shared by 4 cells in j/k
                if i + 1 < res && j > 0 && j + 1 < res && k > 0 && k + 1 < res {
                    let d1 = values[grid.index(i + 1, j, k)];
                    if (d0 > 0.0) != (d1 > 0.0) {
                        let quad = [
                            cell_idx(i, j - 1, k - 1),
                            cell_idx(i, j, k - 1),
                            cell_idx(i, j, k),
                            cell_idx(i, j - 1, k),
                        ];
                        emit_quad(&mut builder, &quad, d0 <= 0.0);
                    }
                }

                // Y-edge (i,j,k) -> (i,j+1,k), shared by 4 cells in i/k
                if j + 1 < res && i > 0 && i + 1 < res && k > 0 && k + 1 < res {
                    let d1 = values[grid.index(i, j + 1, k)];
                    if (d0 > 0.0) != (d1 > 0.0) {
                        let quad = [
                            cell_idx(i - 1, j, k - 1),
                            cell_idx(i, j, k - 1),
                            cell_idx(i, j, k),
                            cell_idx(i - 1, j, k),
                        ];
                        // Y-edges wind the other way
                        emit_quad(&mut builder, &quad, d0 > 0.0);
                    }
                }

                // Z-edge (i,j,k) -> (i,j,k+1), shared by 4 cells in i/j
                if k + 1 < res && i > 0 && i + 1 < res && j > 0 && j + 1 < res {
                    let d1 = values[grid.index(i, j, k + 1)];
                    if (d0 > 0.0) != (d1 > 0.0) {
                        let quad = [
                            cell_idx(i - 1, j - 1, k),
                            cell_idx(i, j - 1, k),
                            cell_idx(i, j, k),
                            cell_idx(i - 1, j, k),
                        ];
                        emit_quad(&mut builder, &quad, d0 <= 0.0);
                    }
                }
            }
        }
    }

    (builder.build(), diag)
}

/// Split a quad of cell-dual vertices into two triangles
///
/// Skipped when any of the four cells placed no vertex (possible when a
/// neighboring cell saw no crossing on its own edges).
fn emit_quad(builder: &mut MeshBuilder, cells: &[usize; 4], flip: bool) {
    let mut v = [0_u32; 4];
    for (slot, &c) in v.iter_mut().zip(cells) {
        match builder.index_of(c as u64) {
            Some(idx) => *slot = idx,
            None => return,
        }
    }
    let [v0, v1, v2, v3] = v;
    if flip {
        builder.triangle(v0, v1, v2);
        builder.triangle(v0, v2, v3);
    } else {
        builder.triangle(v0, v2, v1);
        builder.triangle(v0, v3, v2);
    }
}

/// Place the dual vertex of cell `(i, j, k)`, if it is active
///
/// Returns the position plus whether the QEF was singular and whether the
/// refinement failed to converge.
#[allow(clippy::too_many_arguments)]
fn place_cell_vertex(
    tree: &SceneTree,
    root: NodeRef,
    grid: &GridSampler,
    values: &[f32],
    i: usize,
    j: usize,
    k: usize,
    params: &ContouringParams,
) -> Option<(Vec3, bool, bool)> {
    let corners = [
        values[grid.index(i, j, k)],
        values[grid.index(i + 1, j, k)],
        values[grid.index(i, j + 1, k)],
        values[grid.index(i + 1, j + 1, k)],
        values[grid.index(i, j, k + 1)],
        values[grid.index(i + 1, j, k + 1)],
        values[grid.index(i, j + 1, k + 1)],
        values[grid.index(i + 1, j + 1, k + 1)],
    ];

    let sign0 = corners[0] > 0.0;
    if corners[1..].iter().all(|&v| (v > 0.0) == sign0) {
        return None;
    }

    // Hermite data: linear crossing plus field gradient per crossed edge
    let mut hermite: Vec<(Vec3, Vec3)> = Vec::with_capacity(12);
    for &(c0, c1, off_a, off_b) in &EDGES {
        let da = corners[c0];
        let db = corners[c1];
        if (da > 0.0) == (db > 0.0) {
            continue;
        }
        let pa = grid.position(i + off_a[0], j + off_a[1], k + off_a[2]);
        let pb = grid.position(i + off_b[0], j + off_b[1], k + off_b[2]);
        let t = (da / (da - db)).clamp(0.0, 1.0);
        let p = pa + (pb - pa) * t;
        hermite.push((p, eval_gradient(tree, root, p)));
    }
    if hermite.is_empty() {
        return None;
    }

    let cell_min = grid.position(i, j, k);
    let cell_max = grid.position(i + 1, j + 1, k + 1);
    let (qef_pos, singular) = qef_solve(&hermite);
    let mut x = qef_pos.clamp(cell_min, cell_max);

    // Newton refinement toward the surface along the gradient
    let tolerance = params.epsilon + params.grid_epsilon * grid.step().length();
    let mut best = x;
    let mut best_err = eval(tree, root, x).abs();
    let mut unconverged = best_err > tolerance;
    for _ in 0..params.max_nr_iters {
        if best_err <= tolerance {
            unconverged = false;
            break;
        }
        let f = eval(tree, root, x);
        let g = eval_gradient(tree, root, x);
        let g2 = g.length_squared();
        if g2 < GRADIENT_EPSILON {
            break;
        }
        x = (x - g * (f / g2)).clamp(cell_min, cell_max);
        let err = eval(tree, root, x).abs();
        let improvement = best_err - err;
        if err < best_err {
            best = x;
            best_err = err;
        }
        if improvement < params.consistency_threshold {
            break;
        }
    }
    if best_err <= tolerance {
        unconverged = false;
    }

    Some((best, singular, unconverged))
}

/// Minimize the quadric error over the Hermite samples
///
/// The system is shifted to the mass point for conditioning and solved by
/// Cramer's rule with Tikhonov regularization; a still-singular system
/// falls back to the mass point and reports it.
fn qef_solve(intersections: &[(Vec3, Vec3)]) -> (Vec3, bool) {
    let mass_point =
        intersections.iter().map(|(p, _)| *p).sum::<Vec3>() / intersections.len() as f32;

    let mut ata = [[0.0_f32; 3]; 3];
    let mut atb = [0.0_f32; 3];
    for &(point, normal) in intersections {
        let n = [normal.x, normal.y, normal.z];
        let rhs = normal.dot(point - mass_point);
        for r in 0..3 {
            for c in 0..3 {
                ata[r][c] += n[r] * n[c];
            }
            atb[r] += n[r] * rhs;
        }
    }

    match solve_3x3_regularized(&ata, &atb) {
        Some(v) => (mass_point + Vec3::new(v[0], v[1], v[2]), false),
        None => (mass_point, true),
    }
}

/// Solve a 3x3 system with Tikhonov regularization (lambda = 0.01)
///
/// Returns `None` if still degenerate after regularization.
#[inline(always)]
fn solve_3x3_regularized(ata: &[[f32; 3]; 3], atb: &[f32; 3]) -> Option<[f32; 3]> {
    let lambda = 0.01_f32;
    let a = [
        [ata[0][0] + lambda, ata[0][1], ata[0][2]],
        [ata[1][0], ata[1][1] + lambda, ata[1][2]],
        [ata[2][0], ata[2][1], ata[2][2] + lambda],
    ];

    let det = a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0]);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;

    let x = (atb[0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (atb[1] * a[2][2] - a[1][2] * atb[2])
        + a[0][2] * (atb[1] * a[2][1] - a[1][1] * atb[2]))
        * inv_det;
    let y = (a[0][0] * (atb[1] * a[2][2] - a[1][2] * atb[2])
        - atb[0] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * atb[2] - atb[1] * a[2][0]))
        * inv_det;
    let z = (a[0][0] * (a[1][1] * atb[2] - atb[1] * a[2][1])
        - a[0][1] * (a[1][0] * atb[2] - atb[1] * a[2][0])
        + atb[0] * (a[1][0] * a[2][1] - a[1][1] * a[2][0]))
        * inv_det;

    if x.is_finite() && y.is_finite() && z.is_finite() {
        Some([x, y, z])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Aabb, Node, NodeKind};

    fn extract_sphere(res: usize) -> Mesh {
        let mut tree = SceneTree::new();
        let s = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
        let grid = GridSampler::new(Aabb::new(Vec3::splat(-1.3), Vec3::splat(1.3)), res).unwrap();
        dual_contouring(&tree, s, &grid, &ContouringParams::default()).0
    }

    #[test]
    fn test_qef_planar_samples() {
        // All samples on the plane y = 0.5 with normal +Y
        let samples = vec![
            (Vec3::new(0.0, 0.5, 0.0), Vec3::Y),
            (Vec3::new(1.0, 0.5, 0.0), Vec3::Y),
            (Vec3::new(0.0, 0.5, 1.0), Vec3::Y),
        ];
        let (p, singular) = qef_solve(&samples);
        assert!(!singular);
        assert!((p.y - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_qef_corner() {
        // Two orthogonal planes meeting at x = 1, y = 1
        let samples = vec![
            (Vec3::new(1.0, 0.0, 0.0), Vec3::X),
            (Vec3::new(1.0, 0.0, 1.0), Vec3::X),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::Y),
            (Vec3::new(0.0, 1.0, 1.0), Vec3::Y),
        ];
        let (p, singular) = qef_solve(&samples);
        assert!(!singular);
        assert!((p.x - 1.0).abs() < 0.1);
        assert!((p.y - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_sphere_produces_closed_mesh() {
        let mesh = extract_sphere(16);
        assert!(!mesh.is_empty());
        assert!(mesh.vertex_count() > 50);
    }

    #[test]
    fn test_vertices_near_surface() {
        let mesh = extract_sphere(20);
        for v in &mesh.vertices {
            let r = v.position.length();
            assert!((r - 1.0).abs() < 0.15, "vertex far from surface: r = {r}");
        }
    }

    #[test]
    fn test_vertices_inside_their_cells() {
        let mut tree = SceneTree::new();
        let s = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
        let bounds = Aabb::new(Vec3::splat(-1.3), Vec3::splat(1.3));
        let grid = GridSampler::new(bounds, 16).unwrap();
        let (mesh, _) = dual_contouring(&tree, s, &grid, &ContouringParams::default());

        // Recompute the active cells in lattice order; vertices are emitted
        // in that same order, one per active cell
        let values = grid.sample_scalars(&tree, s);
        let ncells = grid.res() - 1;
        let mut active = Vec::new();
        for k in 0..ncells {
            for j in 0..ncells {
                for i in 0..ncells {
                    let sign0 = values[grid.index(i, j, k)] > 0.0;
                    let mixed = (0..8).any(|c| {
                        let v = values[grid.index(i + (c & 1), j + (c >> 1 & 1), k + (c >> 2))];
                        (v > 0.0) != sign0
                    });
                    if mixed {
                        active.push((i, j, k));
                    }
                }
            }
        }
        assert_eq!(active.len(), mesh.vertex_count());
        for (v, &(i, j, k)) in mesh.vertices.iter().zip(&active) {
            let cell = Aabb::new(grid.position(i, j, k), grid.position(i + 1, j + 1, k + 1));
            assert!(
                cell.contains(v.position),
                "vertex {} escaped cell ({i}, {j}, {k})",
                v.position
            );
        }
    }

    #[test]
    fn test_normals_outward() {
        let mesh = extract_sphere(16);
        for v in &mesh.vertices {
            assert!(v.normal.dot(v.position) > 0.5);
        }
    }

    #[test]
    fn test_empty_field() {
        let mut tree = SceneTree::new();
        let u = tree.add(Node::new(NodeKind::Union));
        let grid =
            GridSampler::new(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)), 8).unwrap();
        let (mesh, diag) = dual_contouring(&tree, u, &grid, &ContouringParams::default());
        assert!(mesh.is_empty());
        assert_eq!(diag, Diagnostics::default());
    }
}
