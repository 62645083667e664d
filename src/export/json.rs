//! JSON scene tree persistence
//!
//! Streams the whole arena through `serde_json` over buffered file I/O, so
//! handles held by the caller stay valid across a save/load round trip.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::ExportError;
use crate::scene::SceneTree;

/// Save a scene tree as pretty-printed JSON
pub fn save_tree_json(tree: &SceneTree, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let result = serde_json::to_writer_pretty(writer, tree)
        .map_err(|e| ExportError::Serialization(e.to_string()));
    if result.is_err() {
        let _ = std::fs::remove_file(path);
    }
    result
}

/// Load a scene tree from JSON
pub fn load_tree_json(path: impl AsRef<Path>) -> Result<SceneTree, ExportError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| ExportError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::eval;
    use glam::Vec3;

    #[test]
    fn test_round_trip() {
        let mut tree = SceneTree::new();
        let u = tree.create_node("union").unwrap();
        let s = tree.create_node("sphere").unwrap();
        let t = tree.create_node("translate").unwrap();
        let b = tree.create_node("box").unwrap();
        tree.append_child(u, s).unwrap();
        tree.append_child(u, t).unwrap();
        tree.append_child(t, b).unwrap();
        tree.set_root(u).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        save_tree_json(&tree, &path).unwrap();
        let loaded = load_tree_json(&path).unwrap();

        assert_eq!(loaded.node_count(), tree.node_count());
        assert_eq!(loaded.root(), tree.root());
        // Same field after the round trip
        let p = Vec3::new(0.4, -0.2, 0.8);
        assert_eq!(eval(&loaded, u, p), eval(&tree, u, p));
    }
}
