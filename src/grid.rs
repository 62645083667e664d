//! Regular lattice sampling of an implicit function
//!
//! A [`GridSampler`] lays `res`³ samples over an axis-aligned box, one at
//! each lattice corner, indexed `(k*res + j)*res + i` with `i` fastest.
//! Sampling is parallelized by k-slab; the tree is only read.

use glam::Vec3;
use rayon::prelude::*;
use thiserror::Error;

use crate::eval::{eval, eval_gradient};
use crate::scene::SceneTree;
use crate::types::{Aabb, NodeRef};

/// Errors raised when constructing a [`GridSampler`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Fewer than two lattice points per axis
    #[error("grid resolution must be at least 2, got {0}")]
    ResolutionTooSmall(usize),

    /// Degenerate or inverted sampling box
    #[error("sampling bounds must satisfy min < max on every axis")]
    InvalidBounds,
}

/// Uniform `res`³ sampling lattice over a bounding box
#[derive(Debug, Clone, Copy)]
pub struct GridSampler {
    bounds: Aabb,
    res: usize,
    step: Vec3,
}

impl GridSampler {
    /// Create a sampler; `res` counts lattice points per axis, so the box
    /// is divided into `res - 1` cells per axis
    pub fn new(bounds: Aabb, res: usize) -> Result<Self, GridError> {
        if res < 2 {
            return Err(GridError::ResolutionTooSmall(res));
        }
        if !bounds.is_valid() {
            return Err(GridError::InvalidBounds);
        }
        let step = bounds.extent() / (res - 1) as f32;
        Ok(GridSampler { bounds, res, step })
    }

    /// Lattice points per axis
    #[inline]
    pub fn res(&self) -> usize {
        self.res
    }

    /// The sampled box
    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Spacing between adjacent lattice points per axis
    #[inline]
    pub fn step(&self) -> Vec3 {
        self.step
    }

    /// World position of lattice point `(i, j, k)`
    #[inline(always)]
    pub fn position(&self, i: usize, j: usize, k: usize) -> Vec3 {
        self.bounds.min
            + Vec3::new(
                i as f32 * self.step.x,
                j as f32 * self.step.y,
                k as f32 * self.step.z,
            )
    }

    /// Flat index of lattice point `(i, j, k)`
    #[inline(always)]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.res + j) * self.res + i
    }

    /// Evaluate the field at every lattice point, parallel over k-slabs
    pub fn sample_scalars(&self, tree: &SceneTree, root: NodeRef) -> Vec<f32> {
        let res = self.res;
        let mut values = vec![0.0_f32; res * res * res];
        values
            .par_chunks_mut(res * res)
            .enumerate()
            .for_each(|(k, slab)| {
                for j in 0..res {
                    for i in 0..res {
                        slab[j * res + i] = eval(tree, root, self.position(i, j, k));
                    }
                }
            });
        values
    }

    /// Evaluate the field gradient at every lattice point, parallel over
    /// k-slabs
    pub fn sample_gradients(&self, tree: &SceneTree, root: NodeRef) -> Vec<Vec3> {
        let res = self.res;
        let mut grads = vec![Vec3::ZERO; res * res * res];
        grads
            .par_chunks_mut(res * res)
            .enumerate()
            .for_each(|(k, slab)| {
                for j in 0..res {
                    for i in 0..res {
                        slab[j * res + i] = eval_gradient(tree, root, self.position(i, j, k));
                    }
                }
            });
        grads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Node, NodeKind};

    #[test]
    fn test_validation() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(
            GridSampler::new(aabb, 1).unwrap_err(),
            GridError::ResolutionTooSmall(1)
        );
        let flipped = Aabb::new(Vec3::splat(1.0), Vec3::splat(-1.0));
        assert_eq!(
            GridSampler::new(flipped, 8).unwrap_err(),
            GridError::InvalidBounds
        );
        let flat = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(
            GridSampler::new(flat, 8).unwrap_err(),
            GridError::InvalidBounds
        );
    }

    #[test]
    fn test_lattice_geometry() {
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let grid = GridSampler::new(aabb, 3).unwrap();
        assert_eq!(grid.step(), Vec3::splat(1.0));
        assert_eq!(grid.position(0, 0, 0), Vec3::splat(-1.0));
        assert_eq!(grid.position(2, 2, 2), Vec3::splat(1.0));
        assert_eq!(grid.position(1, 0, 2), Vec3::new(0.0, -1.0, 1.0));
    }

    #[test]
    fn test_index_order() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::splat(1.0));
        let grid = GridSampler::new(aabb, 4).unwrap();
        // i fastest, then j, then k
        assert_eq!(grid.index(1, 0, 0), 1);
        assert_eq!(grid.index(0, 1, 0), 4);
        assert_eq!(grid.index(0, 0, 1), 16);
        assert_eq!(grid.index(3, 3, 3), 63);
    }

    #[test]
    fn test_sample_sphere() {
        let mut tree = SceneTree::new();
        let s = tree.add(Node::new(NodeKind::Sphere { radius: 1.0 }));
        let aabb = Aabb::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        let grid = GridSampler::new(aabb, 5).unwrap();
        let values = grid.sample_scalars(&tree, s);
        assert_eq!(values.len(), 125);
        // Center lattice point is the sphere center
        assert!((values[grid.index(2, 2, 2)] + 1.0).abs() < 1e-6);
        // Corner is outside
        assert!(values[grid.index(0, 0, 0)] > 0.0);

        let grads = grid.sample_gradients(&tree, s);
        let g = grads[grid.index(4, 2, 2)];
        assert!((g - Vec3::X).length() < 1e-5);
    }
}
