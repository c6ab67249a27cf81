//! Light components
//!
//! Lights are ordinary entities carrying one of these components plus a
//! [`Transform`](super::Transform) for position. The render passes re-derive
//! the active light set each frame by querying the registry; no separate
//! light list is maintained anywhere.

use crate::ecs::Component;
use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// Point light radiating from the entity's transform position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointLight {
    /// RGB color in the 0.0 to 1.0 range
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Billboard radius used by the transparency pass
    pub radius: f32,
}

impl Component for PointLight {}

impl PointLight {
    /// Create a point light
    pub fn new(color: Vec3, intensity: f32, radius: f32) -> Self {
        Self {
            color,
            intensity,
            radius,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            radius: 0.1,
        }
    }
}

/// Directional light with parallel rays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// World-space direction the light travels, normalized
    pub direction: Vec3,
    /// RGB color in the 0.0 to 1.0 range
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Index of the shadow render pass that produces this light's shadow
    /// map; lights past the shadow caster cap never render shadows
    pub shadow_pass: u32,
}

impl Component for DirectionalLight {}

impl DirectionalLight {
    /// Create a directional light assigned to a shadow pass
    pub fn new(direction: Vec3, color: Vec3, intensity: f32, shadow_pass: u32) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            intensity,
            shadow_pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_point_light_preserves_parameters() {
        let light = PointLight::new(Vec3::new(1.0, 0.5, 0.2), 2.5, 0.05);
        assert_relative_eq!(light.color, Vec3::new(1.0, 0.5, 0.2), epsilon = EPSILON);
        assert_relative_eq!(light.intensity, 2.5, epsilon = EPSILON);
        assert_relative_eq!(light.radius, 0.05, epsilon = EPSILON);
    }

    #[test]
    fn test_directional_light_normalizes_direction() {
        let light = DirectionalLight::new(Vec3::new(0.0, -2.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 0);
        assert_relative_eq!(light.direction, Vec3::new(0.0, -1.0, 0.0), epsilon = EPSILON);
        assert_eq!(light.shadow_pass, 0);
    }

    #[test]
    fn test_light_serde_round_trip() {
        let light = PointLight::new(Vec3::new(0.9, 0.1, 0.1), 1.25, 0.1);
        let text = ron::to_string(&light).unwrap();
        let restored: PointLight = ron::from_str(&text).unwrap();
        assert_relative_eq!(restored.color, light.color, epsilon = EPSILON);
        assert_relative_eq!(restored.intensity, light.intensity, epsilon = EPSILON);
    }
}
