//! Wavefront OBJ export
//!
//! Streams `v`/`vn`/`f` records through a `BufWriter` as they arrive, so a
//! mesh never needs a second in-memory copy. OBJ indices are 1-based.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::Vec3;

use super::ExportError;
use crate::mesh::Mesh;

/// Incremental OBJ writer
///
/// Vertices and normals are written as they are pushed; faces reference
/// them by 1-based position order.
pub struct ObjWriter<W: Write> {
    w: W,
    nr_vertices: u32,
}

impl<W: Write> ObjWriter<W> {
    /// Wrap a writer
    pub fn new(w: W) -> Self {
        ObjWriter { w, nr_vertices: 0 }
    }

    /// Write a vertex with its normal, returning its 1-based OBJ index
    pub fn vertex(&mut self, position: Vec3, normal: Vec3) -> Result<u32, ExportError> {
        writeln!(self.w, "v {} {} {}", position.x, position.y, position.z)?;
        writeln!(self.w, "vn {} {} {}", normal.x, normal.y, normal.z)?;
        self.nr_vertices += 1;
        Ok(self.nr_vertices)
    }

    /// Write a triangle over 1-based vertex indices
    pub fn face(&mut self, a: u32, b: u32, c: u32) -> Result<(), ExportError> {
        writeln!(self.w, "f {a}//{a} {b}//{b} {c}//{c}")?;
        Ok(())
    }

    /// Flush and return the inner writer
    pub fn finish(mut self) -> Result<W, ExportError> {
        self.w.flush()?;
        Ok(self.w)
    }
}

/// Export a mesh to a Wavefront OBJ file
///
/// The partial file is removed when any write fails.
pub fn export_obj(mesh: &Mesh, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let result = write_obj(mesh, path);
    if result.is_err() {
        let _ = std::fs::remove_file(path);
    }
    result
}

fn write_obj(mesh: &Mesh, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut w = ObjWriter::new(BufWriter::new(file));
    for v in &mesh.vertices {
        w.vertex(v.position, v.normal)?;
    }
    for tri in mesh.indices.chunks_exact(3) {
        w.face(tri[0] + 1, tri[1] + 1, tri[2] + 1)?;
    }
    w.finish()?;
    Ok(())
}
