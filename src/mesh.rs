//! Indexed mesh assembly
//!
//! Contouring emits vertices keyed by a stable `u64` id (global lattice-edge
//! id for marching cubes, cell id for dual contouring); [`MeshBuilder`]
//! deduplicates on that key so shared vertices are shared in the output and
//! the mesh is watertight wherever the field is.

use std::collections::HashMap;

use glam::{Vec3, Vec4};

/// Vertex with position, normal and color
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    /// Position in 3D space
    pub position: Vec3,
    /// Surface normal
    pub normal: Vec3,
    /// Surface color (RGBA)
    pub color: Vec4,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(position: Vec3, normal: Vec3, color: Vec4) -> Self {
        Vertex {
            position,
            normal,
            color,
        }
    }
}

/// Indexed triangle mesh
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Mesh vertices
    pub vertices: Vec<Vertex>,
    /// Triangle indices, three per face
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Mesh::default()
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh has no faces
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Extraction statistics reported alongside the mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Vertices in the output
    pub nr_vertices: usize,
    /// Triangles in the output
    pub nr_faces: usize,
    /// Gradient normals that fell back to the face normal
    pub degenerate_normals: usize,
    /// Dual-contouring cells whose QEF was singular
    pub singular_cells: usize,
    /// Dual-contouring cells whose refinement hit the iteration cap
    pub unconverged_cells: usize,
}

/// Builds an indexed mesh with key-based vertex deduplication
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: Mesh,
    lookup: HashMap<u64, u32>,
}

impl MeshBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        MeshBuilder::default()
    }

    /// Insert a vertex under `key`, or return the existing index for that key
    pub fn vertex(&mut self, key: u64, vertex: Vertex) -> u32 {
        if let Some(&idx) = self.lookup.get(&key) {
            return idx;
        }
        let idx = self.mesh.vertices.len() as u32;
        self.mesh.vertices.push(vertex);
        self.lookup.insert(key, idx);
        idx
    }

    /// Fetch the index previously assigned to `key`
    pub fn index_of(&self, key: u64) -> Option<u32> {
        self.lookup.get(&key).copied()
    }

    /// Mutable access to an emitted vertex
    pub fn vertex_mut(&mut self, idx: u32) -> &mut Vertex {
        &mut self.mesh.vertices[idx as usize]
    }

    /// Append a triangle; faces with a repeated index are dropped
    pub fn triangle(&mut self, a: u32, b: u32, c: u32) {
        if a == b || b == c || a == c {
            return;
        }
        self.mesh.indices.extend_from_slice(&[a, b, c]);
    }

    /// Number of vertices emitted so far
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertices.len()
    }

    /// Finish, returning the mesh
    pub fn build(self) -> Mesh {
        self.mesh
    }
}

/// Area-weighted face normals accumulated per vertex, normalized at the end
///
/// Used by the face-normal policy and as the fallback target for degenerate
/// or inconsistent gradient normals.
pub fn accumulate_face_normals(mesh: &Mesh) -> Vec<Vec3> {
    let mut acc = vec![Vec3::ZERO; mesh.vertices.len()];
    for tri in mesh.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = mesh.vertices[a].position;
        let cross = (mesh.vertices[b].position - pa).cross(mesh.vertices[c].position - pa);
        acc[a] += cross;
        acc[b] += cross;
        acc[c] += cross;
    }
    for n in &mut acc {
        let len = n.length();
        if len > 1e-10 {
            *n /= len;
        }
    }
    acc
}

/// Face normal of a triangle, zero when degenerate
#[inline(always)]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let n = (b - a).cross(c - a);
    let len = n.length();
    if len > 1e-10 {
        n / len
    } else {
        Vec3::ZERO
    }
}
