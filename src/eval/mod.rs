//! Recursive evaluation of implicit scene trees
//!
//! All entry points are pure and total over the tree: they never mutate,
//! never panic, and never return NaN for finite input. Operators combine
//! their children pointwise; transforms map the query point into child
//! space by the inverse map and pull gradients back through the transpose
//! Jacobian of that same map.
//!
//! Sentinels keep partially-built trees evaluable: an operator with no
//! children is empty space (`+INFINITY`, zero gradient), a transform or
//! modifier with no child evaluates to `1.0` with zero gradient.

use glam::{Mat3, Vec3, Vec4};

use crate::primitives::{
    grad_box3d, grad_cylinder, grad_plane, grad_sphere, grad_torus, sdf_box3d, sdf_cylinder,
    sdf_plane, sdf_sphere, sdf_torus,
};
use crate::scene::SceneTree;
use crate::types::{ColorMode, NodeKind, NodeRef};

/// Gradients shorter than this are treated as degenerate
pub const GRADIENT_EPSILON: f32 = 1e-10;

/// Rotate `p` about `axis` by `angle` radians (Rodrigues)
#[inline(always)]
fn rotate_about(p: Vec3, axis: Vec3, angle: f32) -> Vec3 {
    let len = axis.length();
    if len < GRADIENT_EPSILON {
        return p;
    }
    let axis = axis / len;
    let a = axis * p.dot(axis);
    let x = p - a;
    let y = axis.cross(x);
    a + x * angle.cos() + y * angle.sin()
}

/// Exact inverse of the upper-triangular shear map
/// `x' = x + h_xy*y + h_xz*z, y' = y + h_yz*z, z' = z`
#[inline(always)]
fn shear_inverse(h_xy: f32, h_xz: f32, h_yz: f32) -> Mat3 {
    Mat3::from_cols(
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-h_xy, 1.0, 0.0),
        Vec3::new(h_xy * h_yz - h_xz, -h_yz, 1.0),
    )
}

/// Evaluate the implicit function value at `p`
pub fn eval(tree: &SceneTree, r: NodeRef, p: Vec3) -> f32 {
    let Ok(node) = tree.node(r) else {
        return f32::INFINITY;
    };
    let children = node.children();
    match node.kind {
        NodeKind::Sphere { radius } => sdf_sphere(p, radius),
        NodeKind::Box3d { half_extents } => sdf_box3d(p, half_extents),
        NodeKind::Cylinder {
            radius,
            half_height,
        } => sdf_cylinder(p, radius, half_height),
        NodeKind::Torus {
            major_radius,
            minor_radius,
        } => sdf_torus(p, major_radius, minor_radius),
        NodeKind::Plane { normal, distance } => sdf_plane(p, normal, distance),

        NodeKind::Union => children
            .iter()
            .map(|&c| eval(tree, c, p))
            .fold(f32::INFINITY, f32::min),
        NodeKind::Intersection => {
            if children.is_empty() {
                f32::INFINITY
            } else {
                children
                    .iter()
                    .map(|&c| eval(tree, c, p))
                    .fold(f32::NEG_INFINITY, f32::max)
            }
        }
        NodeKind::Difference => match children {
            [] => f32::INFINITY,
            [only] => eval(tree, *only, p),
            [first, rest @ ..] => {
                let f0 = eval(tree, *first, p);
                let rest_min = rest
                    .iter()
                    .map(|&c| eval(tree, c, p))
                    .fold(f32::INFINITY, f32::min);
                f0.max(-rest_min)
            }
        },

        NodeKind::Translate { delta } => match children {
            [child] => eval(tree, *child, p - delta),
            _ => 1.0,
        },
        NodeKind::Rotate { axis, angle } => match children {
            [child] => eval(tree, *child, rotate_about(p, axis, -angle)),
            _ => 1.0,
        },
        // A zero factor has no inverse map; such a scale is everywhere outside
        NodeKind::Scale { factors } => match children {
            [child] if factors.cmpne(Vec3::ZERO).all() => eval(tree, *child, p / factors),
            [_] => f32::INFINITY,
            _ => 1.0,
        },
        NodeKind::UniformScale { factor } => match children {
            [child] if factor != 0.0 => eval(tree, *child, p / factor),
            [_] => f32::INFINITY,
            _ => 1.0,
        },
        NodeKind::Shear { h_xy, h_xz, h_yz } => match children {
            [child] => eval(tree, *child, shear_inverse(h_xy, h_xz, h_yz) * p),
            _ => 1.0,
        },

        NodeKind::NumericGradient { .. } => match children {
            [child] => eval(tree, *child, p),
            _ => 1.0,
        },
    }
}

/// Evaluate the field gradient at `p`
///
/// Operators forward the gradient of the child that decides their value
/// (ties to the lowest child index), negated for the subtracted side of a
/// difference. Transforms pull the child gradient back through the
/// transpose Jacobian of their inverse map.
pub fn eval_gradient(tree: &SceneTree, r: NodeRef, p: Vec3) -> Vec3 {
    let Ok(node) = tree.node(r) else {
        return Vec3::ZERO;
    };
    let children = node.children();
    match node.kind {
        NodeKind::Sphere { .. } => grad_sphere(p),
        NodeKind::Box3d { half_extents } => grad_box3d(p, half_extents),
        NodeKind::Cylinder {
            radius,
            half_height,
        } => grad_cylinder(p, radius, half_height),
        NodeKind::Torus { major_radius, .. } => grad_torus(p, major_radius),
        NodeKind::Plane { normal, .. } => grad_plane(normal),

        NodeKind::Union => match argmin(tree, children, p) {
            Some((c, _)) => eval_gradient(tree, c, p),
            None => Vec3::ZERO,
        },
        NodeKind::Intersection => match argmax(tree, children, p) {
            Some((c, _)) => eval_gradient(tree, c, p),
            None => Vec3::ZERO,
        },
        NodeKind::Difference => match children {
            [] => Vec3::ZERO,
            [only] => eval_gradient(tree, *only, p),
            [first, rest @ ..] => {
                let f0 = eval(tree, *first, p);
                // Unwrap is fine: rest is non-empty here
                let (active, rest_min) = argmin(tree, rest, p).unwrap_or((*first, f0));
                if f0 >= -rest_min {
                    eval_gradient(tree, *first, p)
                } else {
                    -eval_gradient(tree, active, p)
                }
            }
        },

        NodeKind::Translate { delta } => match children {
            [child] => eval_gradient(tree, *child, p - delta),
            _ => Vec3::ZERO,
        },
        NodeKind::Rotate { axis, angle } => match children {
            [child] => {
                let g = eval_gradient(tree, *child, rotate_about(p, axis, -angle));
                rotate_about(g, axis, angle)
            }
            _ => Vec3::ZERO,
        },
        NodeKind::Scale { factors } => match children {
            [child] if factors.cmpne(Vec3::ZERO).all() => {
                eval_gradient(tree, *child, p / factors) / factors
            }
            _ => Vec3::ZERO,
        },
        NodeKind::UniformScale { factor } => match children {
            [child] if factor != 0.0 => eval_gradient(tree, *child, p / factor) / factor,
            _ => Vec3::ZERO,
        },
        NodeKind::Shear { h_xy, h_xz, h_yz } => match children {
            [child] => {
                let inv = shear_inverse(h_xy, h_xz, h_yz);
                inv.transpose() * eval_gradient(tree, *child, inv * p)
            }
            _ => Vec3::ZERO,
        },

        NodeKind::NumericGradient {
            epsilon,
            use_numeric,
        } => match children {
            [child] => {
                if use_numeric {
                    let inv_2_eps = 0.5 / epsilon;
                    let child = *child;
                    Vec3::new(
                        eval(tree, child, p + Vec3::X * epsilon)
                            - eval(tree, child, p - Vec3::X * epsilon),
                        eval(tree, child, p + Vec3::Y * epsilon)
                            - eval(tree, child, p - Vec3::Y * epsilon),
                        eval(tree, child, p + Vec3::Z * epsilon)
                            - eval(tree, child, p - Vec3::Z * epsilon),
                    ) * inv_2_eps
                } else {
                    eval_gradient(tree, *child, p)
                }
            }
            _ => Vec3::ZERO,
        },
    }
}

/// Evaluate the surface color at `p` following each node's color mode
pub fn eval_color(tree: &SceneTree, r: NodeRef, p: Vec3) -> Vec4 {
    let Ok(node) = tree.node(r) else {
        return Vec4::ONE;
    };
    let children = node.children();
    match node.color_mode {
        ColorMode::Replace => node.color,
        ColorMode::Compose => {
            if children.is_empty() {
                node.color
            } else {
                let sum: Vec4 = children.iter().map(|&c| eval_color(tree, c, p)).sum();
                sum / children.len() as f32
            }
        }
        ColorMode::Child(i) => match children.get(i as usize) {
            Some(&c) => eval_color(tree, c, p),
            None => node.color,
        },
    }
}

/// Unit surface normal at `p`, or `None` when the gradient is degenerate
pub fn normal(tree: &SceneTree, r: NodeRef, p: Vec3) -> Option<Vec3> {
    let g = eval_gradient(tree, r, p);
    let len = g.length();
    if len < GRADIENT_EPSILON || !len.is_finite() {
        None
    } else {
        Some(g / len)
    }
}

/// Child with the smallest value; ties go to the lowest index
fn argmin(tree: &SceneTree, children: &[NodeRef], p: Vec3) -> Option<(NodeRef, f32)> {
    let mut best: Option<(NodeRef, f32)> = None;
    for &c in children {
        let f = eval(tree, c, p);
        match best {
            Some((_, fb)) if f >= fb => {}
            _ => best = Some((c, f)),
        }
    }
    best
}

/// Child with the largest value; ties go to the lowest index
fn argmax(tree: &SceneTree, children: &[NodeRef], p: Vec3) -> Option<(NodeRef, f32)> {
    let mut best: Option<(NodeRef, f32)> = None;
    for &c in children {
        let f = eval(tree, c, p);
        match best {
            Some((_, fb)) if f <= fb => {}
            _ => best = Some((c, f)),
        }
    }
    best
}
