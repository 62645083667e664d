//! Common test helpers for isofield integration tests

#![allow(dead_code)]

use isofield::prelude::*;

// ============================================================================
// Standard test scenes
// ============================================================================

/// Unit sphere at origin
pub fn sphere_scene() -> (SceneTree, NodeRef) {
    let mut tree = SceneTree::new();
    let s = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    tree.set_root(s).unwrap();
    (tree, s)
}

/// A sphere translated along X
pub fn translated_sphere(tree: &mut SceneTree, dx: f32, radius: f32) -> NodeRef {
    let t = tree.add(Node::new(NodeKind::Translate {
        delta: Vec3::new(dx, 0.0, 0.0),
    }));
    let s = tree.add(Node::new(NodeKind::Sphere { radius }));
    tree.append_child(t, s).unwrap();
    t
}

/// Two overlapping unit spheres under a union
pub fn overlapping_spheres() -> (SceneTree, NodeRef) {
    let mut tree = SceneTree::new();
    let u = tree.add(Node::new(NodeKind::Union));
    let a = translated_sphere(&mut tree, -0.5, 1.0);
    let b = translated_sphere(&mut tree, 0.5, 1.0);
    tree.append_child(u, a).unwrap();
    tree.append_child(u, b).unwrap();
    tree.set_root(u).unwrap();
    (tree, u)
}

/// Concentric spheres: radius 1 minus radius 0.5
pub fn hollow_sphere() -> (SceneTree, NodeRef) {
    let mut tree = SceneTree::new();
    let d = tree.add(Node::new(NodeKind::Difference));
    let outer = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
    let inner = tree.add(Node::new(NodeKind::Sphere { radius: 0.5 }));
    tree.append_child(d, outer).unwrap();
    tree.append_child(d, inner).unwrap();
    tree.set_root(d).unwrap();
    (tree, d)
}

// ============================================================================
// Standard test points
// ============================================================================

/// Probe points off the symmetry planes of the standard shapes
pub fn test_points() -> Vec<Vec3> {
    vec![
        Vec3::new(0.3, 0.2, 0.1),
        Vec3::new(-0.7, 0.4, 0.9),
        Vec3::new(1.3, -0.6, 0.2),
        Vec3::new(0.1, 1.7, -1.1),
        Vec3::new(-2.1, 0.8, 1.4),
    ]
}

// ============================================================================
// Mesh checks
// ============================================================================

/// Count mesh edges that belong to exactly one triangle
pub fn boundary_edge_count(mesh: &Mesh) -> usize {
    use std::collections::HashMap;
    let mut edges: HashMap<(u32, u32), usize> = HashMap::new();
    for tri in mesh.indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (a.min(b), a.max(b));
            *edges.entry(key).or_insert(0) += 1;
        }
    }
    edges.values().filter(|&&c| c == 1).count()
}

/// Number of connected components over shared vertices
pub fn connected_components(mesh: &Mesh) -> usize {
    let n = mesh.vertex_count();
    if n == 0 {
        return 0;
    }
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut Vec<usize>, mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    for tri in mesh.indices.chunks_exact(3) {
        let a = find(&mut parent, tri[0] as usize);
        let b = find(&mut parent, tri[1] as usize);
        let c = find(&mut parent, tri[2] as usize);
        parent[b] = a;
        parent[c] = a;
    }
    let mut roots: Vec<usize> = (0..n).map(|i| find(&mut parent, i)).collect();
    roots.sort_unstable();
    roots.dedup();
    roots.len()
}
