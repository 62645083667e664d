//! Sphere primitive

use glam::Vec3;

/// Signed distance to a sphere centered at origin
///
/// # Arguments
/// * `point` - Point to evaluate
/// * `radius` - Sphere radius
///
/// # Returns
/// Signed distance (negative inside, positive outside)
#[inline(always)]
pub fn sdf_sphere(point: Vec3, radius: f32) -> f32 {
    point.length() - radius
}

/// Gradient of the sphere distance: `p / |p|`
///
/// Undefined at the center; returns `+Y` there so callers never see NaN.
#[inline(always)]
pub fn grad_sphere(point: Vec3) -> Vec3 {
    let len = point.length();
    if len < 1e-10 {
        return Vec3::Y;
    }
    point / len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_center() {
        assert!((sdf_sphere(Vec3::ZERO, 1.0) + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_surface() {
        assert!(sdf_sphere(Vec3::new(1.0, 0.0, 0.0), 1.0).abs() < 0.0001);
        assert!(sdf_sphere(Vec3::new(0.0, 1.0, 0.0), 1.0).abs() < 0.0001);
        assert!(sdf_sphere(Vec3::new(0.0, 0.0, 1.0), 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_outside() {
        let d = sdf_sphere(Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert!((d - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_inside() {
        let d = sdf_sphere(Vec3::new(0.5, 0.0, 0.0), 1.0);
        assert!((d + 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_gradient_radial() {
        let g = grad_sphere(Vec3::new(0.0, 0.0, 3.0));
        assert!((g - Vec3::Z).length() < 0.0001);
        // Gradient direction is the same inside and outside
        let g = grad_sphere(Vec3::new(0.0, 0.0, 0.25));
        assert!((g - Vec3::Z).length() < 0.0001);
    }

    #[test]
    fn test_sphere_gradient_degenerate() {
        let g = grad_sphere(Vec3::ZERO);
        assert!(g.is_finite());
        assert!((g.length() - 1.0).abs() < 0.0001);
    }
}
