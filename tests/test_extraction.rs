//! End-to-end isosurface extraction scenarios

mod common;

use common::*;
use isofield::prelude::*;

fn sphere_bounds() -> Aabb {
    Aabb::new(Vec3::splat(-1.2), Vec3::splat(1.2))
}

#[test]
fn sphere_mesh_is_closed_and_on_surface() {
    let (tree, root) = sphere_scene();
    let mesh = extract(
        &tree,
        root,
        sphere_bounds(),
        32,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap();

    assert!(!mesh.is_empty());
    assert_eq!(boundary_edge_count(&mesh), 0, "sphere mesh must be closed");
    assert_eq!(connected_components(&mesh), 1);
    for v in &mesh.vertices {
        let r = v.position.length();
        assert!(r > 0.95 && r < 1.05, "vertex off the unit sphere: r = {r}");
        // Emitted crossings sit on the zero set up to interpolation error
        assert!(eval(&tree, root, v.position).abs() < 0.01);
    }
}

#[test]
fn sphere_vertex_count_scales_quadratically() {
    let (tree, root) = sphere_scene();
    let counts: Vec<usize> = [16, 32]
        .iter()
        .map(|&res| {
            extract(
                &tree,
                root,
                sphere_bounds(),
                res,
                ContouringType::MarchingCubes,
                &ContouringParams::default(),
            )
            .unwrap()
            .vertex_count()
        })
        .collect();
    // Doubling the resolution roughly quadruples the surface vertices
    let ratio = counts[1] as f32 / counts[0] as f32;
    assert!(ratio > 2.5 && ratio < 6.0, "ratio {ratio}");
}

#[test]
fn overlapping_union_is_one_component() {
    let (tree, root) = overlapping_spheres();
    let bounds = Aabb::new(Vec3::new(-1.8, -1.3, -1.3), Vec3::new(1.8, 1.3, 1.3));
    let mesh = extract(
        &tree,
        root,
        bounds,
        32,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap();

    assert_eq!(connected_components(&mesh), 1);
    assert_eq!(boundary_edge_count(&mesh), 0);
}

#[test]
fn hollow_sphere_gives_two_shells() {
    let (tree, root) = hollow_sphere();
    let mesh = extract(
        &tree,
        root,
        sphere_bounds(),
        32,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap();

    assert_eq!(connected_components(&mesh), 2, "outer and inner shell");
    assert_eq!(boundary_edge_count(&mesh), 0);
    // Every vertex sits on one of the two spheres
    for v in &mesh.vertices {
        let r = v.position.length();
        let on_outer = (r - 1.0).abs() < 0.05;
        let on_inner = (r - 0.5).abs() < 0.05;
        assert!(on_outer || on_inner, "vertex on neither shell: r = {r}");
    }
}

#[test]
fn empty_operator_gives_empty_mesh() {
    let mut tree = SceneTree::new();
    let u = tree.create_node("union").unwrap();
    for ct in [ContouringType::MarchingCubes, ContouringType::DualContouring] {
        let (mesh, diag) = extract_with_diagnostics(
            &tree,
            u,
            sphere_bounds(),
            16,
            ct,
            &ContouringParams::default(),
        )
        .unwrap();
        assert!(mesh.is_empty());
        assert_eq!(diag.nr_vertices, 0);
        assert_eq!(diag.nr_faces, 0);
    }
}

#[test]
fn clipped_surface_opens_only_at_the_box() {
    // A unit sphere sampled in a box that cuts through it
    let (tree, root) = sphere_scene();
    let bounds = Aabb::new(Vec3::new(-1.2, -1.2, -1.2), Vec3::new(0.0, 1.2, 1.2));
    let mesh = extract(
        &tree,
        root,
        bounds,
        24,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap();

    assert!(boundary_edge_count(&mesh) > 0, "clipped mesh has a rim");
    // The interior stays watertight: every vertex is still on the sphere
    for v in &mesh.vertices {
        let r = v.position.length();
        assert!(r > 0.9 && r < 1.1);
    }
}

#[test]
fn dual_contouring_sphere_is_closed() {
    let (tree, root) = sphere_scene();
    let (mesh, diag) = extract_with_diagnostics(
        &tree,
        root,
        Aabb::new(Vec3::splat(-1.3), Vec3::splat(1.3)),
        24,
        ContouringType::DualContouring,
        &ContouringParams::default(),
    )
    .unwrap();

    assert!(!mesh.is_empty());
    assert_eq!(boundary_edge_count(&mesh), 0);
    assert_eq!(connected_components(&mesh), 1);
    assert_eq!(diag.nr_vertices, mesh.vertex_count());
    assert_eq!(diag.nr_faces, mesh.triangle_count());
    // Refinement pulls the dual vertices close to the surface
    for v in &mesh.vertices {
        assert!((v.position.length() - 1.0).abs() < 0.1);
    }
}

#[test]
fn both_backends_agree_on_topology() {
    let (tree, root) = hollow_sphere();
    let bounds = Aabb::new(Vec3::splat(-1.3), Vec3::splat(1.3));
    for ct in [ContouringType::MarchingCubes, ContouringType::DualContouring] {
        let mesh = extract(&tree, root, bounds, 28, ct, &ContouringParams::default()).unwrap();
        assert_eq!(connected_components(&mesh), 2, "{ct:?}");
    }
}

#[test]
fn triangles_face_along_the_field_gradient() {
    let (tree, root) = sphere_scene();
    for ct in [ContouringType::MarchingCubes, ContouringType::DualContouring] {
        let mesh = extract(
            &tree,
            root,
            sphere_bounds(),
            24,
            ct,
            &ContouringParams::default(),
        )
        .unwrap();
        assert!(!mesh.is_empty());
        for tri in mesh.indices.chunks_exact(3) {
            let a = mesh.vertices[tri[0] as usize].position;
            let b = mesh.vertices[tri[1] as usize].position;
            let c = mesh.vertices[tri[2] as usize].position;
            let n = (b - a).cross(c - a);
            if n.length() < 1e-9 {
                continue;
            }
            // Counter-clockwise winding seen from outside: the face normal
            // points the same way as the field gradient
            let g = eval_gradient(&tree, root, (a + b + c) / 3.0);
            assert!(n.dot(g) > 0.0, "{ct:?}: triangle winds into the solid");
        }
    }
}

#[test]
fn invalid_sampling_setup_is_rejected() {
    let (tree, root) = sphere_scene();
    let err = extract(
        &tree,
        root,
        sphere_bounds(),
        1,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap_err();
    assert_eq!(err, GridError::ResolutionTooSmall(1));

    let flipped = Aabb::new(Vec3::splat(1.0), Vec3::splat(-1.0));
    let err = extract(
        &tree,
        root,
        flipped,
        16,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap_err();
    assert_eq!(err, GridError::InvalidBounds);
}

#[test]
fn transformed_scene_extracts_where_expected() {
    // A box scaled and rotated, extracted and checked against direct eval
    let mut tree = SceneTree::new();
    let rot = tree.add(Node::new(NodeKind::Rotate {
        axis: Vec3::Z,
        angle: std::f32::consts::FRAC_PI_4,
    }));
    let sc = tree.add(Node::new(NodeKind::UniformScale { factor: 0.8 }));
    let b = tree.add(Node::new(NodeKind::Box3d {
        half_extents: Vec3::new(1.0, 0.4, 0.4),
    }));
    tree.append_child(rot, sc).unwrap();
    tree.append_child(sc, b).unwrap();

    let mesh = extract(
        &tree,
        rot,
        Aabb::new(Vec3::splat(-1.5), Vec3::splat(1.5)),
        32,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap();
    assert!(!mesh.is_empty());
    let half_diag = Vec3::new(1.0, 0.4, 0.4).length() * 0.8;
    for v in &mesh.vertices {
        // Vertices lie near the zero set and inside the scaled box diagonal
        assert!(eval(&tree, rot, v.position).abs() < 0.05);
        assert!(v.position.length() < half_diag + 0.05);
    }
}

#[test]
fn vertex_colors_follow_the_tree() {
    let (mut tree, root) = overlapping_spheres();
    tree.node_mut(root).unwrap().color = Vec4::new(1.0, 0.2, 0.1, 1.0);

    let mesh = extract(
        &tree,
        root,
        Aabb::new(Vec3::new(-1.8, -1.3, -1.3), Vec3::new(1.8, 1.3, 1.3)),
        16,
        ContouringType::MarchingCubes,
        &ContouringParams::default(),
    )
    .unwrap();
    for v in &mesh.vertices {
        assert_eq!(v.color, Vec4::new(1.0, 0.2, 0.1, 1.0));
    }
}
