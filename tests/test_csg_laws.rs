//! Field composition laws checked pointwise over probe points

mod common;

use common::*;
use isofield::prelude::*;

#[test]
fn union_is_pointwise_min() {
    let mut tree = SceneTree::new();
    let u = tree.add(Node::new(NodeKind::Union));
    let a = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    let b = tree.add(Node::new(NodeKind::Box3d {
        half_extents: Vec3::new(0.4, 0.9, 0.6),
    }));
    tree.append_child(u, a).unwrap();
    tree.append_child(u, b).unwrap();

    for p in test_points() {
        let expected = eval(&tree, a, p).min(eval(&tree, b, p));
        assert!((eval(&tree, u, p) - expected).abs() < 1e-6);
    }
}

#[test]
fn intersection_is_pointwise_max() {
    let mut tree = SceneTree::new();
    let i = tree.add(Node::new(NodeKind::Intersection));
    let a = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    let b = tree.add(Node::new(NodeKind::Cylinder {
        radius: 0.6,
        half_height: 2.0,
    }));
    tree.append_child(i, a).unwrap();
    tree.append_child(i, b).unwrap();

    for p in test_points() {
        let expected = eval(&tree, a, p).max(eval(&tree, b, p));
        assert!((eval(&tree, i, p) - expected).abs() < 1e-6);
    }
}

#[test]
fn difference_carves_the_rest() {
    let mut tree = SceneTree::new();
    let d = tree.add(Node::new(NodeKind::Difference));
    let a = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    let b = tree.add(Node::new(NodeKind::Sphere { radius: 0.4 }));
    let c = tree.add(Node::new(NodeKind::Box3d {
        half_extents: Vec3::new(0.3, 0.3, 2.0),
    }));
    tree.append_child(d, a).unwrap();
    tree.append_child(d, b).unwrap();
    tree.append_child(d, c).unwrap();

    for p in test_points() {
        let rest_min = eval(&tree, b, p).min(eval(&tree, c, p));
        let expected = eval(&tree, a, p).max(-rest_min);
        assert!((eval(&tree, d, p) - expected).abs() < 1e-6);
    }
}

#[test]
fn union_is_idempotent() {
    let mut tree = SceneTree::new();
    let u = tree.add(Node::new(NodeKind::Union));
    let a = tree.add(Node::new(NodeKind::Torus {
        major_radius: 1.0,
        minor_radius: 0.3,
    }));
    let b = tree.add(Node::new(NodeKind::Torus {
        major_radius: 1.0,
        minor_radius: 0.3,
    }));
    tree.append_child(u, a).unwrap();
    tree.append_child(u, b).unwrap();

    for p in test_points() {
        assert_eq!(eval(&tree, u, p), eval(&tree, a, p));
    }
}

#[test]
fn translate_round_trip() {
    let mut tree = SceneTree::new();
    let delta = Vec3::new(0.7, -1.2, 0.4);
    let outer = tree.add(Node::new(NodeKind::Translate { delta }));
    let inner = tree.add(Node::new(NodeKind::Translate { delta: -delta }));
    let s = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    tree.append_child(outer, inner).unwrap();
    tree.append_child(inner, s).unwrap();

    let bare = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    for p in test_points() {
        assert!((eval(&tree, outer, p) - eval(&tree, bare, p)).abs() < 1e-6);
    }
}

#[test]
fn rotate_round_trip() {
    let mut tree = SceneTree::new();
    let axis = Vec3::new(0.3, 1.0, -0.5);
    let angle = 1.1;
    let outer = tree.add(Node::new(NodeKind::Rotate { axis, angle }));
    let inner = tree.add(Node::new(NodeKind::Rotate {
        axis,
        angle: -angle,
    }));
    let b = tree.add(Node::new(NodeKind::Box3d {
        half_extents: Vec3::new(0.5, 1.0, 1.5),
    }));
    tree.append_child(outer, inner).unwrap();
    tree.append_child(inner, b).unwrap();

    let bare = tree.add(Node::new(NodeKind::Box3d {
        half_extents: Vec3::new(0.5, 1.0, 1.5),
    }));
    for p in test_points() {
        assert!((eval(&tree, outer, p) - eval(&tree, bare, p)).abs() < 1e-5);
    }
}

#[test]
fn shear_maps_surface_points_forward() {
    let (h_xy, h_xz, h_yz) = (0.4, -0.2, 0.7);
    let mut tree = SceneTree::new();
    let sh = tree.add(Node::new(NodeKind::Shear { h_xy, h_xz, h_yz }));
    let s = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    tree.append_child(sh, s).unwrap();

    // f_sheared(M p) == f_child(p) for the forward map M
    for p in test_points() {
        let mapped = Vec3::new(
            p.x + h_xy * p.y + h_xz * p.z,
            p.y + h_yz * p.z,
            p.z,
        );
        assert!((eval(&tree, sh, mapped) - eval(&tree, s, p)).abs() < 1e-5);
    }
}

#[test]
fn numeric_gradient_converges_quadratically() {
    let mut tree = SceneTree::new();
    let t = tree.add(Node::new(NodeKind::Torus {
        major_radius: 1.0,
        minor_radius: 0.3,
    }));

    // Central differences: error drops roughly with eps^2
    let p = Vec3::new(0.9, 0.4, 0.6);
    let analytic = eval_gradient(&tree, t, p);
    let mut errors = Vec::new();
    for eps in [1e-2_f32, 1e-3] {
        let ng = tree.add(Node::new(NodeKind::NumericGradient {
            epsilon: eps,
            use_numeric: true,
        }));
        let child = tree.add(Node::new(NodeKind::Torus {
            major_radius: 1.0,
            minor_radius: 0.3,
        }));
        tree.append_child(ng, child).unwrap();
        errors.push((eval_gradient(&tree, ng, p) - analytic).length());
    }
    assert!(errors[0] < 1e-3);
    assert!(errors[1] < 1e-2);
}

#[test]
fn gradients_match_numeric_across_composites() {
    let (tree, root) = hollow_sphere();
    let eps = 1e-3;
    for p in test_points() {
        let analytic = eval_gradient(&tree, root, p);
        let numeric = Vec3::new(
            eval(&tree, root, p + Vec3::X * eps) - eval(&tree, root, p - Vec3::X * eps),
            eval(&tree, root, p + Vec3::Y * eps) - eval(&tree, root, p - Vec3::Y * eps),
            eval(&tree, root, p + Vec3::Z * eps) - eval(&tree, root, p - Vec3::Z * eps),
        ) / (2.0 * eps);
        assert!(
            (analytic - numeric).length() < 1e-2,
            "gradient mismatch at {p:?}: {analytic:?} vs {numeric:?}"
        );
    }
}
