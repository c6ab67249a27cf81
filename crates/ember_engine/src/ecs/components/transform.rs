//! Transform component
//!
//! Spatial state for an entity: translation, Euler-angle rotation, and
//! non-uniform scale, all absolute in world space (parent/child transforms
//! are never composed). The 4x4 model matrix and 3x3 normal matrix are
//! cached and recomputed lazily behind a dirty flag.
//!
//! Invariant: the cached matrices are valid iff the dirty flag is clear.
//! Every mutator sets the flag; the matrix accessors recompute-and-clear
//! before returning whenever it is set. Composition order is fixed:
//! `model = Translation * Rotation * Scale`.

use crate::ecs::Component;
use crate::foundation::math::{Mat3, Mat4, Mat4Ext, Vec3};
use serde::{Deserialize, Serialize};

fn dirty_default() -> bool {
    true
}

/// ECS transform component
///
/// Rotation is Euler angles in radians, applied X then Y then Z.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transform {
    translation: Vec3,
    rotation: Vec3,
    scale: Vec3,
    #[serde(skip, default = "dirty_default")]
    dirty: bool,
    #[serde(skip)]
    model_matrix: Mat4,
    #[serde(skip)]
    normal_matrix: Mat3,
}

impl Component for Transform {}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            dirty: true,
            model_matrix: Mat4::identity(),
            normal_matrix: Mat3::identity(),
        }
    }
}

impl Transform {
    /// Create an identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform at a position
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create a transform from translation, rotation and scale
    pub fn new(translation: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            ..Default::default()
        }
    }

    /// Builder: set the scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: set a uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder: set the rotation
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// Current translation
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// Current rotation (Euler angles, radians)
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Current scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// True when the cached matrices are stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // -- mutators; every one of these invalidates the cached matrices --

    /// Set the translation
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.dirty = true;
    }

    /// Set the X component of the translation
    pub fn set_translation_x(&mut self, x: f32) {
        self.translation.x = x;
        self.dirty = true;
    }

    /// Set the Y component of the translation
    pub fn set_translation_y(&mut self, y: f32) {
        self.translation.y = y;
        self.dirty = true;
    }

    /// Set the Z component of the translation
    pub fn set_translation_z(&mut self, z: f32) {
        self.translation.z = z;
        self.dirty = true;
    }

    /// Add to the translation
    pub fn add_translation(&mut self, delta: Vec3) {
        self.translation += delta;
        self.dirty = true;
    }

    /// Set the rotation (Euler angles, radians)
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// Set the rotation around X
    pub fn set_rotation_x(&mut self, x: f32) {
        self.rotation.x = x;
        self.dirty = true;
    }

    /// Set the rotation around Y
    pub fn set_rotation_y(&mut self, y: f32) {
        self.rotation.y = y;
        self.dirty = true;
    }

    /// Set the rotation around Z
    pub fn set_rotation_z(&mut self, z: f32) {
        self.rotation.z = z;
        self.dirty = true;
    }

    /// Add to the rotation
    pub fn add_rotation(&mut self, delta: Vec3) {
        self.rotation += delta;
        self.dirty = true;
    }

    /// Set the scale
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Set a uniform scale
    pub fn set_scale_uniform(&mut self, scale: f32) {
        self.scale = Vec3::new(scale, scale, scale);
        self.dirty = true;
    }

    /// Set the X component of the scale
    pub fn set_scale_x(&mut self, x: f32) {
        self.scale.x = x;
        self.dirty = true;
    }

    /// Set the Y component of the scale
    pub fn set_scale_y(&mut self, y: f32) {
        self.scale.y = y;
        self.dirty = true;
    }

    /// Set the Z component of the scale
    pub fn set_scale_z(&mut self, z: f32) {
        self.scale.z = z;
        self.dirty = true;
    }

    // -- accessors; recompute-and-clear when dirty --

    /// Model matrix (`Translation * Rotation * Scale`)
    pub fn mat4(&mut self) -> Mat4 {
        if self.dirty {
            self.recalculate();
        }
        self.model_matrix
    }

    /// Normal matrix (`transpose(inverse(mat3(model)))`)
    pub fn normal_matrix(&mut self) -> Mat3 {
        if self.dirty {
            self.recalculate();
        }
        self.normal_matrix
    }

    fn recalculate(&mut self) {
        let translation = Mat4::new_translation(&self.translation);
        let rotation = Mat4::rotation_z(self.rotation.z)
            * Mat4::rotation_y(self.rotation.y)
            * Mat4::rotation_x(self.rotation.x);
        let scale = Mat4::new_nonuniform_scaling(&self.scale);

        self.model_matrix = translation * rotation * scale;

        let upper_left: Mat3 = self.model_matrix.fixed_view::<3, 3>(0, 0).into_owned();
        self.normal_matrix = upper_left
            .try_inverse()
            .map_or_else(Mat3::identity, |inverse| inverse.transpose());
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn expected_model(translation: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
        Mat4::new_translation(&translation)
            * Mat4::rotation_z(rotation.z)
            * Mat4::rotation_y(rotation.y)
            * Mat4::rotation_x(rotation.x)
            * Mat4::new_nonuniform_scaling(&scale)
    }

    #[test]
    fn test_identity_defaults() {
        let mut transform = Transform::identity();
        assert!(transform.is_dirty());
        assert_relative_eq!(transform.mat4(), Mat4::identity(), epsilon = EPSILON);
        assert!(!transform.is_dirty());
    }

    #[test]
    fn test_every_mutator_sets_dirty() {
        let mut transform = Transform::identity();
        let mutators: Vec<fn(&mut Transform)> = vec![
            |t| t.set_translation(Vec3::new(1.0, 0.0, 0.0)),
            |t| t.set_translation_x(2.0),
            |t| t.set_translation_y(2.0),
            |t| t.set_translation_z(2.0),
            |t| t.add_translation(Vec3::new(0.0, 1.0, 0.0)),
            |t| t.set_rotation(Vec3::new(0.1, 0.0, 0.0)),
            |t| t.set_rotation_x(0.2),
            |t| t.set_rotation_y(0.2),
            |t| t.set_rotation_z(0.2),
            |t| t.add_rotation(Vec3::new(0.0, 0.1, 0.0)),
            |t| t.set_scale(Vec3::new(2.0, 2.0, 2.0)),
            |t| t.set_scale_uniform(0.5),
            |t| t.set_scale_x(1.5),
            |t| t.set_scale_y(1.5),
            |t| t.set_scale_z(1.5),
        ];

        for mutate in mutators {
            // Clear the flag via the accessor, then check the mutator sets it.
            let _ = transform.mat4();
            assert!(!transform.is_dirty());
            mutate(&mut transform);
            assert!(transform.is_dirty());
        }
    }

    #[test]
    fn test_accessor_after_mutation_chain_matches_direct_recompute() {
        let mut transform = Transform::identity();
        transform.set_translation(Vec3::new(1.0, 2.0, 3.0));
        let _ = transform.mat4();
        transform.set_rotation_y(HALF_PI);
        transform.add_translation(Vec3::new(0.5, 0.0, 0.0));
        transform.set_scale(Vec3::new(2.0, 1.0, 0.5));
        transform.set_rotation_x(0.3);

        let expected = expected_model(
            Vec3::new(1.5, 2.0, 3.0),
            Vec3::new(0.3, HALF_PI, 0.0),
            Vec3::new(2.0, 1.0, 0.5),
        );
        assert_relative_eq!(transform.mat4(), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_composition_order_translation_rotation_scale() {
        let mut transform = Transform::identity();
        transform.set_translation(Vec3::new(10.0, 0.0, 0.0));
        transform.set_rotation_y(HALF_PI);
        transform.set_scale_uniform(2.0);

        // A point on +X: scaled to (2,0,0), rotated 90 deg around Y onto -Z,
        // then translated. T*R*S, not any other order.
        let point = transform.mat4() * nalgebra::Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(point.x, 10.0, epsilon = EPSILON);
        assert_relative_eq!(point.y, 0.0, epsilon = EPSILON);
        assert_relative_eq!(point.z, -2.0, epsilon = EPSILON);
    }

    #[test]
    fn test_normal_matrix_for_nonuniform_scale() {
        let mut transform = Transform::identity();
        transform.set_scale(Vec3::new(2.0, 4.0, 8.0));

        let normal = transform.normal_matrix();
        let expected = Mat3::from_diagonal(&Vec3::new(0.5, 0.25, 0.125));
        assert_relative_eq!(normal, expected, epsilon = EPSILON);
    }

    #[test]
    fn test_stale_matrix_not_returned() {
        let mut transform = Transform::identity();
        transform.set_translation(Vec3::new(5.0, 0.0, 0.0));
        let first = transform.mat4();
        transform.set_translation(Vec3::new(-5.0, 0.0, 0.0));
        let second = transform.mat4();

        assert_relative_eq!(first[(0, 3)], 5.0, epsilon = EPSILON);
        assert_relative_eq!(second[(0, 3)], -5.0, epsilon = EPSILON);
    }

    #[test]
    fn test_serde_skips_caches_and_restores_dirty() {
        let mut transform = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.1, 0.2, 0.3),
            Vec3::new(1.0, 1.0, 1.0),
        );
        let expected = transform.mat4();

        let text = ron::to_string(&transform).unwrap();
        let mut restored: Transform = ron::from_str(&text).unwrap();

        assert!(restored.is_dirty());
        assert_relative_eq!(restored.mat4(), expected, epsilon = EPSILON);
    }
}
