//! XZ-plane torus primitive

use glam::{Vec2, Vec3};

/// Signed distance to a torus in the XZ plane centered at origin
///
/// # Arguments
/// * `point` - Point to evaluate
/// * `major_radius` - Distance from center of torus to center of tube
/// * `minor_radius` - Radius of the tube
///
/// # Returns
/// Signed distance (negative inside, positive outside)
#[inline(always)]
pub fn sdf_torus(point: Vec3, major_radius: f32, minor_radius: f32) -> f32 {
    let q = Vec2::new(Vec2::new(point.x, point.z).length() - major_radius, point.y);
    q.length() - minor_radius
}

/// Gradient of the torus distance: direction away from the tube center circle
#[inline(always)]
pub fn grad_torus(point: Vec3, major_radius: f32) -> Vec3 {
    let r_xz = (point.x * point.x + point.z * point.z).sqrt().max(1e-10);
    let qx = r_xz - major_radius;
    let q_len = (qx * qx + point.y * point.y).sqrt().max(1e-10);
    Vec3::new(
        qx * point.x / (q_len * r_xz),
        point.y / q_len,
        qx * point.z / (q_len * r_xz),
    )
}
