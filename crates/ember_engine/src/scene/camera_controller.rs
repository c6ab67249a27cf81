//! Keyboard camera controller
//!
//! Moves a camera entity's transform through the XZ plane from held keys and
//! tracks a scroll-wheel zoom factor. The scene applies the transform to the
//! camera with [`Camera::set_view_yxz`] after each update.
//!
//! [`Camera::set_view_yxz`]: crate::scene::Camera::set_view_yxz

use crate::ecs::components::Transform;
use crate::events::{InputState, KeyCode};
use crate::foundation::math::{constants, utils, Vec3};

/// Smallest field of view the zoom may reach, in radians
pub const MIN_FOV_Y: f32 = 15.0 * constants::DEG_TO_RAD;

/// Largest field of view the zoom may reach, in radians
pub const MAX_FOV_Y: f32 = 100.0 * constants::DEG_TO_RAD;

const MIN_ZOOM: f32 = 0.3;
const MAX_ZOOM: f32 = 2.0;
const MAX_PITCH: f32 = 1.5;

/// WASD + QE movement, arrow-key look, scroll zoom
#[derive(Debug, Clone)]
pub struct CameraController {
    /// Movement speed in world units per second
    pub move_speed: f32,
    /// Look speed in radians per second
    pub look_speed: f32,
    base_fov_y: f32,
    zoom_factor: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            look_speed: 1.5,
            base_fov_y: utils::deg_to_rad(50.0),
            zoom_factor: 1.0,
        }
    }
}

impl CameraController {
    /// Creates a controller with default speeds and zoom.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies held keys to `transform`, scaled by `dt`.
    ///
    /// W/S move along the view direction projected into the XZ plane, A/D
    /// strafe, E/Q move vertically. Arrow keys turn; pitch is clamped so the
    /// view cannot flip over.
    pub fn move_in_plane_xz(&self, input: &InputState, dt: f32, transform: &mut Transform) {
        let mut rotate = Vec3::zeros();
        // Positive Y rotation yaws counterclockwise seen from above, so
        // looking right subtracts; same reasoning for pitch and the X axis.
        if input.is_held(KeyCode::Right) {
            rotate.y -= 1.0;
        }
        if input.is_held(KeyCode::Left) {
            rotate.y += 1.0;
        }
        if input.is_held(KeyCode::Up) {
            rotate.x -= 1.0;
        }
        if input.is_held(KeyCode::Down) {
            rotate.x += 1.0;
        }

        if rotate.norm_squared() > f32::EPSILON {
            let mut rotation = transform.rotation() + self.look_speed * dt * rotate.normalize();
            rotation.x = rotation.x.clamp(-MAX_PITCH, MAX_PITCH);
            rotation.y = utils::wrap_angle(rotation.y);
            transform.set_rotation(rotation);
        }

        let yaw = transform.rotation().y;
        let forward = Vec3::new(yaw.sin(), 0.0, yaw.cos());
        let right = Vec3::new(-yaw.cos(), 0.0, yaw.sin());

        let mut direction = Vec3::zeros();
        if input.is_held(KeyCode::W) {
            direction += forward;
        }
        if input.is_held(KeyCode::S) {
            direction -= forward;
        }
        if input.is_held(KeyCode::D) {
            direction += right;
        }
        if input.is_held(KeyCode::A) {
            direction -= right;
        }
        if input.is_held(KeyCode::E) {
            direction.y += 1.0;
        }
        if input.is_held(KeyCode::Q) {
            direction.y -= 1.0;
        }

        if direction.norm_squared() > f32::EPSILON {
            transform.add_translation(self.move_speed * dt * direction.normalize());
        }
    }

    /// Adjusts the zoom factor from a scroll offset; positive `dy` zooms in.
    pub fn zoom(&mut self, dy: f32) {
        self.zoom_factor = (self.zoom_factor - dy * 0.1).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Resets the zoom to neutral.
    pub fn reset_zoom(&mut self) {
        self.zoom_factor = 1.0;
    }

    /// Current zoom factor
    pub fn zoom_factor(&self) -> f32 {
        self.zoom_factor
    }

    /// Vertical field of view after zoom, clamped to sane bounds
    pub fn fov_y(&self) -> f32 {
        (self.base_fov_y * self.zoom_factor).clamp(MIN_FOV_Y, MAX_FOV_Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn holding(keys: &[KeyCode]) -> InputState {
        let mut input = InputState::new();
        for &key in keys {
            input.observe(&Event::KeyPressed { key, repeat: false });
        }
        input
    }

    #[test]
    fn test_w_moves_forward_along_positive_z_at_zero_yaw() {
        let controller = CameraController::new();
        let mut transform = Transform::identity();

        controller.move_in_plane_xz(&holding(&[KeyCode::W]), 0.5, &mut transform);

        let t = transform.translation();
        assert_relative_eq!(t.x, 0.0, epsilon = EPSILON);
        assert_relative_eq!(t.y, 0.0, epsilon = EPSILON);
        assert_relative_eq!(t.z, controller.move_speed * 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_diagonal_movement_is_normalized() {
        let controller = CameraController::new();
        let mut transform = Transform::identity();

        controller.move_in_plane_xz(&holding(&[KeyCode::W, KeyCode::D]), 1.0, &mut transform);

        assert_relative_eq!(
            transform.translation().norm(),
            controller.move_speed,
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_pitch_is_clamped() {
        let controller = CameraController::new();
        let mut transform = Transform::identity();
        let input = holding(&[KeyCode::Down]);

        for _ in 0..100 {
            controller.move_in_plane_xz(&input, 0.1, &mut transform);
        }

        assert!(transform.rotation().x <= 1.5 + EPSILON);
    }

    #[test]
    fn test_no_keys_leaves_the_transform_alone() {
        let controller = CameraController::new();
        let mut transform = Transform::identity();

        controller.move_in_plane_xz(&InputState::new(), 1.0, &mut transform);

        assert_relative_eq!(transform.translation().norm(), 0.0, epsilon = EPSILON);
        assert_relative_eq!(transform.rotation().norm(), 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_zoom_clamps_the_field_of_view() {
        let mut controller = CameraController::new();

        for _ in 0..100 {
            controller.zoom(1.0);
        }
        assert_relative_eq!(controller.fov_y(), MIN_FOV_Y, epsilon = EPSILON);

        for _ in 0..200 {
            controller.zoom(-1.0);
        }
        assert_relative_eq!(controller.fov_y(), MAX_FOV_Y, epsilon = EPSILON);
    }
}
