//! Infinite plane primitive

use glam::Vec3;

/// Signed distance to an infinite plane
///
/// # Arguments
/// * `point` - Point to evaluate
/// * `normal` - Plane normal (should be normalized)
/// * `distance` - Distance from origin to plane along normal
///
/// # Returns
/// Signed distance (negative below plane, positive above)
#[inline(always)]
pub fn sdf_plane(point: Vec3, normal: Vec3, distance: f32) -> f32 {
    point.dot(normal) - distance
}

/// Gradient of the plane distance: the normal itself, everywhere
#[inline(always)]
pub fn grad_plane(normal: Vec3) -> Vec3 {
    normal
}
