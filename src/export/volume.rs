//! 8-bit voxel volume export
//!
//! Rasterizes the field over the sampling lattice into bytes, remapping
//! `[map_to_zero, map_to_one]` onto `[0, 255]`. The range may be reversed
//! to put large field values at zero. The raw bytes go to the chosen path
//! and a plain-text `.hd` companion records size and sample spacing.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::Vec3;

use super::ExportError;
use crate::grid::GridSampler;
use crate::scene::SceneTree;
use crate::types::{Aabb, NodeRef};

/// Size and spacing of an exported volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeHeader {
    /// Samples per axis
    pub size: usize,
    /// Distance between adjacent samples per axis
    pub spacing: Vec3,
}

/// Minimum and maximum field value over the lattice
///
/// The usual way to pick the remap endpoints before rasterizing.
pub fn value_range(
    tree: &SceneTree,
    root: NodeRef,
    bounds: Aabb,
    res: usize,
) -> Result<(f32, f32), ExportError> {
    let grid = GridSampler::new(bounds, res)?;
    let values = grid.sample_scalars(tree, root);
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in &values {
        if v.is_finite() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    Ok((lo, hi))
}

/// Remap one field value to a byte
#[inline(always)]
fn map_value(v: f32, map_to_zero: f32, map_to_one: f32) -> u8 {
    if map_to_zero < map_to_one {
        if v <= map_to_zero {
            0
        } else if v >= map_to_one {
            255
        } else {
            (255.0 * (v - map_to_zero) / (map_to_one - map_to_zero)) as u8
        }
    } else if v >= map_to_zero {
        0
    } else if v <= map_to_one {
        255
    } else {
        (255.0 * (map_to_zero - v) / (map_to_zero - map_to_one)) as u8
    }
}

/// Rasterize the field into bytes in lattice order
pub fn rasterize_volume(
    tree: &SceneTree,
    root: NodeRef,
    bounds: Aabb,
    res: usize,
    map_to_zero: f32,
    map_to_one: f32,
) -> Result<(Vec<u8>, VolumeHeader), ExportError> {
    let grid = GridSampler::new(bounds, res)?;
    let values = grid.sample_scalars(tree, root);
    let data = values
        .iter()
        .map(|&v| map_value(v, map_to_zero, map_to_one))
        .collect();
    Ok((
        data,
        VolumeHeader {
            size: res,
            spacing: grid.step(),
        },
    ))
}

/// Export the field as a raw byte volume plus a `.hd` header file
///
/// Partial outputs are removed when any write fails.
#[allow(clippy::too_many_arguments)]
pub fn export_volume(
    tree: &SceneTree,
    root: NodeRef,
    bounds: Aabb,
    res: usize,
    map_to_zero: f32,
    map_to_one: f32,
    path: impl AsRef<Path>,
) -> Result<VolumeHeader, ExportError> {
    let path = path.as_ref();
    let hd_path = path.with_extension("hd");
    let (data, header) = rasterize_volume(tree, root, bounds, res, map_to_zero, map_to_one)?;

    let result = write_files(&data, header, path, &hd_path);
    if result.is_err() {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(&hd_path);
    }
    result.map(|()| header)
}

fn write_files(
    data: &[u8],
    header: VolumeHeader,
    path: &Path,
    hd_path: &Path,
) -> Result<(), ExportError> {
    let mut hd = BufWriter::new(File::create(hd_path)?);
    writeln!(
        hd,
        "Size:      {}, {}, {}",
        header.size, header.size, header.size
    )?;
    writeln!(
        hd,
        "Spacing:   {}, {}, {}",
        header.spacing.x, header.spacing.y, header.spacing.z
    )?;
    hd.flush()?;

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(data)?;
    out.flush()?;
    Ok(())
}
