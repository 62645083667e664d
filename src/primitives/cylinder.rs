//! Y-axis cylinder primitive

use glam::{Vec2, Vec3};

/// Signed distance to a finite cylinder along the Y-axis, centered at origin
///
/// # Arguments
/// * `point` - Point to evaluate
/// * `radius` - Cylinder radius
/// * `half_height` - Half the cylinder height
///
/// # Returns
/// Exact signed distance (negative inside, positive outside)
#[inline(always)]
pub fn sdf_cylinder(point: Vec3, radius: f32, half_height: f32) -> f32 {
    let d = Vec2::new(
        Vec2::new(point.x, point.z).length() - radius,
        point.y.abs() - half_height,
    );
    d.x.max(d.y).min(0.0) + d.max(Vec2::ZERO).length()
}

/// Gradient of the cylinder distance, combining radial (XZ) and axial (Y)
/// components by nearest feature
#[inline(always)]
pub fn grad_cylinder(point: Vec3, radius: f32, half_height: f32) -> Vec3 {
    let r_xz = (point.x * point.x + point.z * point.z).sqrt();
    let dr = r_xz - radius;
    let dy = point.y.abs() - half_height;

    if dr > 0.0 && dy > 0.0 {
        // Outside the rim
        let len = (dr * dr + dy * dy).sqrt().max(1e-10);
        let radial = if r_xz > 1e-10 {
            Vec3::new(point.x / r_xz * dr, 0.0, point.z / r_xz * dr)
        } else {
            Vec3::ZERO
        };
        let axial = Vec3::new(0.0, if point.y >= 0.0 { dy } else { -dy }, 0.0);
        (radial + axial) / len
    } else if dr > dy {
        // Nearest to side
        if r_xz > 1e-10 {
            Vec3::new(point.x / r_xz, 0.0, point.z / r_xz)
        } else {
            Vec3::X
        }
    } else {
        // Nearest to cap
        Vec3::new(0.0, if point.y >= 0.0 { 1.0 } else { -1.0 }, 0.0)
    }
}
