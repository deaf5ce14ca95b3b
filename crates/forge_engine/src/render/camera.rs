//! Camera with on-demand view/projection derivation
//!
//! World convention is Y-down (gravity is +Y), so the default up vector
//! points along -Y. Projection matrices target Vulkan's 0..1 depth range.

use crate::foundation::math::{Mat4, Vec3};

/// Camera holding explicitly-set projection and view matrices
#[derive(Debug, Clone)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    inverse_view: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            view: Mat4::identity(),
            inverse_view: Mat4::identity(),
        }
    }
}

impl Camera {
    /// Orthographic projection mapping the box to Vulkan clip space
    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) {
        let mut proj = Mat4::identity();
        proj[(0, 0)] = 2.0 / (right - left);
        proj[(1, 1)] = 2.0 / (bottom - top);
        proj[(2, 2)] = 1.0 / (far - near);
        proj[(0, 3)] = -(right + left) / (right - left);
        proj[(1, 3)] = -(bottom + top) / (bottom - top);
        proj[(2, 3)] = -near / (far - near);
        self.projection = proj;
    }

    /// Perspective projection with depth mapped to [0, 1]
    pub fn set_perspective_projection(&mut self, fovy: f32, aspect: f32, near: f32, far: f32) {
        assert!(aspect.abs() > f32::EPSILON, "Perspective projection requires a non-zero aspect ratio");

        let tan_half_fovy = (fovy / 2.0).tan();

        let mut proj = Mat4::zeros();
        proj[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        proj[(1, 1)] = 1.0 / tan_half_fovy;
        proj[(2, 2)] = far / (far - near);
        proj[(2, 3)] = -(far * near) / (far - near);
        proj[(3, 2)] = 1.0;
        self.projection = proj;
    }

    /// Orient the camera along an explicit direction
    pub fn set_view_direction(&mut self, position: Vec3, direction: Vec3, up: Vec3) {
        assert!(
            direction.magnitude_squared() > f32::EPSILON,
            "View direction must be non-zero"
        );

        let w = direction.normalize();
        let u = w.cross(&up).normalize();
        let v = w.cross(&u);

        self.set_view_basis(position, u, v, w);
    }

    /// Point the camera at a target position
    pub fn set_view_target(&mut self, position: Vec3, target: Vec3, up: Vec3) {
        self.set_view_direction(position, target - position, up);
    }

    /// Orient the camera from YXZ Euler angles (the transform convention)
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let (s1, c1) = rotation.y.sin_cos();
        let (s2, c2) = rotation.x.sin_cos();
        let (s3, c3) = rotation.z.sin_cos();

        let u = Vec3::new(c1 * c3 + s1 * s2 * s3, c2 * s3, c1 * s2 * s3 - c3 * s1);
        let v = Vec3::new(c3 * s1 * s2 - c1 * s3, c2 * c3, c1 * c3 * s2 + s1 * s3);
        let w = Vec3::new(c2 * s1, -s2, c1 * c2);

        self.set_view_basis(position, u, v, w);
    }

    fn set_view_basis(&mut self, position: Vec3, u: Vec3, v: Vec3, w: Vec3) {
        let mut view = Mat4::identity();
        view[(0, 0)] = u.x;
        view[(0, 1)] = u.y;
        view[(0, 2)] = u.z;
        view[(1, 0)] = v.x;
        view[(1, 1)] = v.y;
        view[(1, 2)] = v.z;
        view[(2, 0)] = w.x;
        view[(2, 1)] = w.y;
        view[(2, 2)] = w.z;
        view[(0, 3)] = -u.dot(&position);
        view[(1, 3)] = -v.dot(&position);
        view[(2, 3)] = -w.dot(&position);
        self.view = view;

        let mut inverse = Mat4::identity();
        inverse[(0, 0)] = u.x;
        inverse[(1, 0)] = u.y;
        inverse[(2, 0)] = u.z;
        inverse[(0, 1)] = v.x;
        inverse[(1, 1)] = v.y;
        inverse[(2, 1)] = v.z;
        inverse[(0, 2)] = w.x;
        inverse[(1, 2)] = w.y;
        inverse[(2, 2)] = w.z;
        inverse[(0, 3)] = position.x;
        inverse[(1, 3)] = position.y;
        inverse[(2, 3)] = position.z;
        self.inverse_view = inverse;
    }

    /// Current projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Current view matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Camera-to-world matrix; its last column is the camera position
    pub fn inverse_view(&self) -> &Mat4 {
        &self.inverse_view
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        Vec3::new(
            self.inverse_view[(0, 3)],
            self.inverse_view[(1, 3)],
            self.inverse_view[(2, 3)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    fn up() -> Vec3 {
        Vec3::new(0.0, -1.0, 0.0)
    }

    #[test]
    fn test_view_target_moves_target_onto_view_axis() {
        let mut camera = Camera::default();
        camera.set_view_target(Vec3::new(0.0, 0.0, -5.0), Vec3::zeros(), up());

        let target_view = camera.view() * Vec4::new(0.0, 0.0, 0.0, 1.0);

        assert_relative_eq!(target_view.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(target_view.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(target_view.z, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_view_is_inverse_of_inverse_view() {
        let mut camera = Camera::default();
        camera.set_view_yxz(Vec3::new(1.0, -2.0, 3.0), Vec3::new(0.3, 1.2, -0.4));

        let product = camera.view() * camera.inverse_view();

        assert_relative_eq!(product, Mat4::identity(), epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_depth_range() {
        let mut camera = Camera::default();
        let (near, far) = (0.1, 100.0);
        camera.set_perspective_projection(std::f32::consts::FRAC_PI_2, 1.0, near, far);

        let near_clip = camera.projection() * Vec4::new(0.0, 0.0, near, 1.0);
        let far_clip = camera.projection() * Vec4::new(0.0, 0.0, far, 1.0);

        assert_relative_eq!(near_clip.z / near_clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far_clip.z / far_clip.w, 1.0, epsilon = 1e-4);
        // Perspective divide comes from the view-space depth
        assert_relative_eq!(near_clip.w, near, epsilon = 1e-6);
    }

    #[test]
    fn test_orthographic_maps_corners_to_clip_space() {
        let mut camera = Camera::default();
        camera.set_orthographic_projection(-2.0, 2.0, -1.0, 1.0, 0.0, 10.0);

        let corner = camera.projection() * Vec4::new(2.0, 1.0, 10.0, 1.0);

        assert_relative_eq!(corner.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(corner.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(corner.z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_camera_position_roundtrip() {
        let mut camera = Camera::default();
        let position = Vec3::new(4.0, -3.0, 7.5);
        camera.set_view_yxz(position, Vec3::new(0.1, 0.6, 0.0));

        assert_relative_eq!(camera.position(), position, epsilon = 1e-6);
    }
}
