//! Math utilities and types
//!
//! Provides fundamental math types for 3D graphics and game development.
//! Projection helpers follow Vulkan conventions: depth mapped to [0, 1],
//! Y pointing down in clip space.

pub use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Wrap an angle into the [0, TAU) range
    pub fn wrap_angle(angle: f32) -> f32 {
        angle.rem_euclid(constants::TAU)
    }
}

/// Extension trait for Mat4 with projection and view matrix constructors
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a perspective projection matrix with [0, 1] depth
    fn perspective_vk(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Create an orthographic projection matrix with [0, 1] depth
    fn orthographic_vk(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Mat4;

    /// Create a view matrix from an eye position looking toward a direction
    fn view_direction(eye: Vec3, direction: Vec3, up: Vec3) -> Mat4;

    /// Create a look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn perspective_vk(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        // Depth maps to [0, 1]; w row triggers the perspective divide.
        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }

    fn orthographic_vk(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Mat4 {
        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / (right - left);
        result[(1, 1)] = 2.0 / (bottom - top);
        result[(2, 2)] = 1.0 / (far - near);
        result[(0, 3)] = -(right + left) / (right - left);
        result[(1, 3)] = -(bottom + top) / (bottom - top);
        result[(2, 3)] = -near / (far - near);
        result
    }

    fn view_direction(eye: Vec3, direction: Vec3, up: Vec3) -> Mat4 {
        let w = direction.normalize();
        let u = w.cross(&up).normalize();
        let v = w.cross(&u);

        let mut result = Mat4::identity();
        result[(0, 0)] = u.x;
        result[(0, 1)] = u.y;
        result[(0, 2)] = u.z;
        result[(1, 0)] = v.x;
        result[(1, 1)] = v.y;
        result[(1, 2)] = v.z;
        result[(2, 0)] = w.x;
        result[(2, 1)] = w.y;
        result[(2, 2)] = w.z;
        result[(0, 3)] = -u.dot(&eye);
        result[(1, 3)] = -v.dot(&eye);
        result[(2, 3)] = -w.dot(&eye);
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::view_direction(eye, target - eye, up)
    }
}
