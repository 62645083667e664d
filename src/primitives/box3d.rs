//! Axis-aligned box primitive

use glam::Vec3;

/// Signed distance to an axis-aligned box centered at origin
///
/// # Arguments
/// * `point` - Point to evaluate
/// * `half_extents` - Half the box size along each axis
///
/// # Returns
/// Exact signed distance (negative inside, positive outside)
#[inline(always)]
pub fn sdf_box3d(point: Vec3, half_extents: Vec3) -> f32 {
    let q = point.abs() - half_extents;
    q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
}

/// Gradient of the box distance, piecewise by nearest face/edge/corner
#[inline(always)]
pub fn grad_box3d(point: Vec3, half_extents: Vec3) -> Vec3 {
    let q = point.abs() - half_extents;
    let signs = Vec3::new(
        if point.x >= 0.0 { 1.0 } else { -1.0 },
        if point.y >= 0.0 { 1.0 } else { -1.0 },
        if point.z >= 0.0 { 1.0 } else { -1.0 },
    );

    if q.x > 0.0 || q.y > 0.0 || q.z > 0.0 {
        // Outside: gradient of max(q,0).length()
        let clamped = q.max(Vec3::ZERO);
        let len = clamped.length();
        if len < 1e-10 {
            return Vec3::Y;
        }
        clamped * signs / len
    } else {
        // Inside: gradient points toward nearest face
        if q.x >= q.y && q.x >= q.z {
            Vec3::new(signs.x, 0.0, 0.0)
        } else if q.y >= q.z {
            Vec3::new(0.0, signs.y, 0.0)
        } else {
            Vec3::new(0.0, 0.0, signs.z)
        }
    }
}
