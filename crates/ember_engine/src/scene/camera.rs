//! Scene camera
//!
//! Holds projection and view matrices for rendering. The world is right
//! handed with +Y up; projections map depth to Vulkan's [0, 1] range. View
//! matrices can be set from a direction, a target point, or YXZ Euler angles
//! as the camera controller produces them.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Camera with cached projection, view and inverse view matrices
#[derive(Debug, Clone)]
pub struct Camera {
    projection: Mat4,
    view: Mat4,
    inverse_view: Mat4,
    position: Vec3,
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Mat4::identity(),
            view: Mat4::identity(),
            inverse_view: Mat4::identity(),
            position: Vec3::zeros(),
            fov_y: utils::deg_to_rad(50.0),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Creates a camera with identity matrices and default projection
    /// parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a perspective projection and remembers its parameters so later
    /// aspect or field-of-view changes can rebuild it.
    pub fn set_perspective_projection(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) {
        self.fov_y = fov_y;
        self.aspect = aspect;
        self.near = near;
        self.far = far;
        self.projection = Mat4::perspective_vk(fov_y, aspect, near, far);
    }

    /// Sets an orthographic projection.
    pub fn set_orthographic_projection(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) {
        self.projection = Mat4::orthographic_vk(left, right, top, bottom, near, far);
    }

    /// Rebuilds the perspective projection for a new aspect ratio.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("camera aspect ratio {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.set_perspective_projection(self.fov_y, aspect, self.near, self.far);
    }

    /// Rebuilds the perspective projection for a new vertical field of view,
    /// given in radians.
    pub fn set_fov_y(&mut self, fov_y: f32) {
        self.set_perspective_projection(fov_y, self.aspect, self.near, self.far);
    }

    /// Current vertical field of view in radians
    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    /// Points the camera from `eye` along `direction`.
    pub fn set_view_direction(&mut self, eye: Vec3, direction: Vec3, up: Vec3) {
        let w = direction.normalize();
        let u = w.cross(&up).normalize();
        let v = w.cross(&u);
        self.set_view_basis(eye, u, v, w);
    }

    /// Points the camera from `eye` at `target`.
    pub fn set_view_target(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.set_view_direction(eye, target - eye, up);
    }

    /// Orients the camera from a position and YXZ Euler angles in radians.
    ///
    /// Zero rotation looks down +Z. Negative X rotation pitches the view
    /// upward, positive Y rotation yaws toward +X.
    pub fn set_view_yxz(&mut self, position: Vec3, rotation: Vec3) {
        let orientation = Mat4::rotation_y(rotation.y)
            * Mat4::rotation_x(rotation.x)
            * Mat4::rotation_z(rotation.z);
        let direction = orientation.transform_vector(&Vec3::z());
        let up = orientation.transform_vector(&Vec3::y());
        self.set_view_direction(position, direction, up);
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// View matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Inverse view matrix; its last column is the camera position.
    pub fn inverse_view(&self) -> &Mat4 {
        &self.inverse_view
    }

    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    fn set_view_basis(&mut self, eye: Vec3, u: Vec3, v: Vec3, w: Vec3) {
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
        view[(0, 3)] = -u.dot(&eye);
        view[(1, 3)] = -v.dot(&eye);
        view[(2, 3)] = -w.dot(&eye);

        // The basis is orthonormal, so the inverse is the transposed rotation
        // with the eye as translation.
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
        inverse[(0, 3)] = eye.x;
        inverse[(1, 3)] = eye.y;
        inverse[(2, 3)] = eye.z;

        self.view = view;
        self.inverse_view = inverse;
        self.position = eye;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec4;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_view_target_puts_target_on_the_view_axis() {
        let mut camera = Camera::new();
        camera.set_view_target(
            Vec3::new(2.0, 3.0, -5.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::y(),
        );

        let target = camera.view() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(target.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(target.y, 0.0, epsilon = EPSILON);
        assert!(target.z > 0.0);
    }

    #[test]
    fn test_inverse_view_inverts_view() {
        let mut camera = Camera::new();
        camera.set_view_yxz(Vec3::new(1.0, -2.0, 4.0), Vec3::new(0.2, 1.3, 0.0));

        let product = camera.view() * camera.inverse_view();
        let identity = Mat4::identity();
        for row in 0..4 {
            for col in 0..4 {
                assert_relative_eq!(product[(row, col)], identity[(row, col)], epsilon = EPSILON);
            }
        }
    }

    #[test]
    fn test_position_tracks_the_eye() {
        let mut camera = Camera::new();
        let eye = Vec3::new(-3.0, 1.5, 8.0);
        camera.set_view_yxz(eye, Vec3::zeros());

        assert_relative_eq!(camera.position().x, eye.x, epsilon = EPSILON);
        assert_relative_eq!(camera.position().y, eye.y, epsilon = EPSILON);
        assert_relative_eq!(camera.position().z, eye.z, epsilon = EPSILON);
    }

    #[test]
    fn test_fov_change_rebuilds_projection() {
        let mut camera = Camera::new();
        camera.set_perspective_projection(utils::deg_to_rad(60.0), 1.0, 0.1, 100.0);
        let before = camera.projection()[(1, 1)];

        camera.set_fov_y(utils::deg_to_rad(30.0));
        let after = camera.projection()[(1, 1)];

        // A narrower field of view magnifies, so the focal term grows.
        assert!(after > before);
        assert_relative_eq!(camera.fov_y(), utils::deg_to_rad(30.0), epsilon = EPSILON);
    }
}
