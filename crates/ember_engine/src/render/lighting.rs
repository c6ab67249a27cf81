//! Per-frame light gathering
//!
//! Each frame the renderer rebuilds the active light set from the registry
//! instead of maintaining a separate light list. Point lights are sorted by
//! descending squared camera distance (ties broken by entity handle) so the
//! transparency pass can draw them back to front and the uniform array
//! order is reproducible for a given camera and light set.

use crate::ecs::components::{DirectionalLight, PointLight, Transform};
use crate::ecs::{Entity, Registry};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::ubo::{
    DirectionalLightUbo, GlobalUbo, PointLightUbo, MAX_LIGHTS, MAX_SHADOW_CASTERS,
};
use bytemuck::Zeroable;

// Light-space frustum for directional shadows. The island scene fits in a
// box of this size around the origin.
const SHADOW_HALF_EXTENT: f32 = 16.0;
const SHADOW_EYE_DISTANCE: f32 = 20.0;
const SHADOW_NEAR: f32 = 0.1;
const SHADOW_FAR: f32 = 45.0;

/// One point light gathered for the current frame
#[derive(Debug, Clone)]
pub struct PointLightEntry {
    /// Owning entity
    pub entity: Entity,
    /// World position from the entity transform
    pub position: Vec3,
    /// RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Billboard radius for the transparency pass
    pub radius: f32,
    /// Squared distance to the camera, the sort key
    pub distance_sq: f32,
}

/// One shadow-casting directional light gathered for the current frame
#[derive(Debug, Clone)]
pub struct DirectionalLightEntry {
    /// Owning entity
    pub entity: Entity,
    /// Normalized direction the light travels
    pub direction: Vec3,
    /// RGB color
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
}

impl DirectionalLightEntry {
    /// Light-space view-projection used for rendering and sampling this
    /// caster's shadow map.
    pub fn shadow_matrix(&self) -> Mat4 {
        let up = if self.direction.x.abs() < 1e-4 && self.direction.z.abs() < 1e-4 {
            Vec3::new(0.0, 0.0, 1.0)
        } else {
            Vec3::new(0.0, 1.0, 0.0)
        };
        let eye = -self.direction * SHADOW_EYE_DISTANCE;
        let view = Mat4::look_at(eye, Vec3::zeros(), up);
        let projection = Mat4::orthographic_vk(
            -SHADOW_HALF_EXTENT,
            SHADOW_HALF_EXTENT,
            -SHADOW_HALF_EXTENT,
            SHADOW_HALF_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
        projection * view
    }
}

/// The light set for one frame, pre-sorted and capped
#[derive(Debug, Default)]
pub struct FrameLights {
    point: Vec<PointLightEntry>,
    directional: [Option<DirectionalLightEntry>; MAX_SHADOW_CASTERS],
}

impl FrameLights {
    /// Collects every light entity that carries a transform.
    ///
    /// Point lights past the `MAX_LIGHTS` cap are dropped from the tail of
    /// the sorted order and a single warning is logged for the frame.
    /// Directional lights claim the shadow-caster slot named by their
    /// `shadow_pass` index; out-of-range or doubly-claimed slots are
    /// ignored.
    pub fn gather(registry: &Registry, camera_position: Vec3) -> Self {
        let mut point: Vec<PointLightEntry> = registry
            .iter::<PointLight>()
            .filter_map(|(entity, light)| {
                let transform = registry.get::<Transform>(entity).ok()?;
                let position = transform.translation();
                Some(PointLightEntry {
                    entity,
                    position,
                    color: light.color,
                    intensity: light.intensity,
                    radius: light.radius,
                    distance_sq: (position - camera_position).norm_squared(),
                })
            })
            .collect();

        point.sort_by(|a, b| {
            b.distance_sq
                .total_cmp(&a.distance_sq)
                .then_with(|| a.entity.cmp(&b.entity))
        });
        if point.len() > MAX_LIGHTS {
            log::warn!(
                "{} point lights active, uniform array holds {}; skipping the {} nearest",
                point.len(),
                MAX_LIGHTS,
                point.len() - MAX_LIGHTS
            );
            point.truncate(MAX_LIGHTS);
        }

        let mut directional: [Option<DirectionalLightEntry>; MAX_SHADOW_CASTERS] =
            Default::default();
        for (entity, light) in registry.iter::<DirectionalLight>() {
            let slot = light.shadow_pass as usize;
            if slot >= MAX_SHADOW_CASTERS {
                log::debug!(
                    "directional light {entity} names shadow pass {slot}, only {MAX_SHADOW_CASTERS} exist; ignored"
                );
                continue;
            }
            if directional[slot].is_some() {
                log::debug!("shadow pass {slot} already claimed; ignoring directional light {entity}");
                continue;
            }
            directional[slot] = Some(DirectionalLightEntry {
                entity,
                direction: light.direction,
                color: light.color,
                intensity: light.intensity,
            });
        }

        Self { point, directional }
    }

    /// Point lights, farthest from the camera first
    pub fn point_lights(&self) -> &[PointLightEntry] {
        &self.point
    }

    /// Shadow caster occupying `slot`, if any
    pub fn caster(&self, slot: usize) -> Option<&DirectionalLightEntry> {
        self.directional.get(slot).and_then(Option::as_ref)
    }

    /// True when at least one shadow caster is active this frame.
    pub fn has_shadow_casters(&self) -> bool {
        self.directional.iter().any(Option::is_some)
    }

    /// Copies the gathered lights into the per-frame uniform block.
    pub fn write_into(&self, ubo: &mut GlobalUbo) {
        for (slot, light) in self.point.iter().enumerate() {
            ubo.point_lights[slot] = PointLightUbo {
                position: [light.position.x, light.position.y, light.position.z, 0.0],
                color: [light.color.x, light.color.y, light.color.z, light.intensity],
            };
        }
        ubo.num_point_lights = self.point.len() as i32;

        let mut active = 0;
        for (slot, entry) in self.directional.iter().enumerate() {
            match entry {
                Some(light) => {
                    ubo.directional_lights[slot] = DirectionalLightUbo {
                        direction: [light.direction.x, light.direction.y, light.direction.z, 0.0],
                        color: [light.color.x, light.color.y, light.color.z, light.intensity],
                    };
                    ubo.shadow_view_projection[slot] = light.shadow_matrix().into();
                    active = slot + 1;
                }
                None => {
                    ubo.directional_lights[slot] = DirectionalLightUbo::zeroed();
                }
            }
        }
        ubo.num_directional_lights = active as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn point_light_at(registry: &mut Registry, position: Vec3, intensity: f32) -> Entity {
        let entity = registry.create().unwrap();
        registry
            .attach(entity, Transform::from_translation(position))
            .unwrap();
        registry
            .attach(entity, PointLight::new(Vec3::new(1.0, 1.0, 1.0), intensity, 0.1))
            .unwrap();
        entity
    }

    #[test]
    fn test_point_lights_sort_farthest_first() {
        let mut registry = Registry::new();
        let near = point_light_at(&mut registry, Vec3::new(1.0, 0.0, 0.0), 1.0);
        let far = point_light_at(&mut registry, Vec3::new(9.0, 0.0, 0.0), 1.0);
        let mid = point_light_at(&mut registry, Vec3::new(4.0, 0.0, 0.0), 1.0);

        let lights = FrameLights::gather(&registry, Vec3::zeros());
        let order: Vec<Entity> = lights.point_lights().iter().map(|l| l.entity).collect();

        assert_eq!(order, vec![far, mid, near]);
    }

    #[test]
    fn test_distance_ties_break_by_entity_handle() {
        let mut registry = Registry::new();
        let first = point_light_at(&mut registry, Vec3::new(0.0, 3.0, 0.0), 1.0);
        let second = point_light_at(&mut registry, Vec3::new(0.0, 3.0, 0.0), 1.0);

        let lights = FrameLights::gather(&registry, Vec3::zeros());
        let order: Vec<Entity> = lights.point_lights().iter().map(|l| l.entity).collect();

        assert_eq!(order, vec![first, second]);
    }

    #[test]
    fn test_moving_the_camera_reorders_next_gather() {
        let mut registry = Registry::new();
        let left = point_light_at(&mut registry, Vec3::new(-5.0, 0.0, 0.0), 1.0);
        let right = point_light_at(&mut registry, Vec3::new(5.0, 0.0, 0.0), 1.0);

        let from_left = FrameLights::gather(&registry, Vec3::new(-4.0, 0.0, 0.0));
        assert_eq!(from_left.point_lights()[0].entity, right);

        let from_right = FrameLights::gather(&registry, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(from_right.point_lights()[0].entity, left);
    }

    #[test]
    fn test_overflow_drops_the_nearest_lights() {
        let mut registry = Registry::new();
        let mut entities = Vec::new();
        for i in 0..=MAX_LIGHTS {
            let x = (i + 1) as f32;
            entities.push(point_light_at(&mut registry, Vec3::new(x, 0.0, 0.0), 1.0));
        }

        let lights = FrameLights::gather(&registry, Vec3::zeros());

        assert_eq!(lights.point_lights().len(), MAX_LIGHTS);
        // The light at x = 1 is nearest and falls past the cap.
        let survivors: Vec<Entity> = lights.point_lights().iter().map(|l| l.entity).collect();
        assert!(!survivors.contains(&entities[0]));
        assert!(survivors.contains(&entities[MAX_LIGHTS]));
        assert_relative_eq!(
            lights.point_lights().last().unwrap().position.x,
            2.0,
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_lights_without_transforms_are_skipped() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry
            .attach(entity, PointLight::new(Vec3::new(1.0, 0.0, 0.0), 1.0, 0.1))
            .unwrap();

        let lights = FrameLights::gather(&registry, Vec3::zeros());
        assert!(lights.point_lights().is_empty());
    }

    #[test]
    fn test_zero_directional_lights_means_no_casters() {
        let registry = Registry::new();
        let lights = FrameLights::gather(&registry, Vec3::zeros());

        assert!(!lights.has_shadow_casters());
        let mut ubo = GlobalUbo::default();
        lights.write_into(&mut ubo);
        assert_eq!(ubo.num_directional_lights, 0);
    }

    #[test]
    fn test_directional_slot_follows_shadow_pass_index() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry
            .attach(
                entity,
                DirectionalLight::new(Vec3::new(0.3, -1.0, 0.2), Vec3::new(0.6, 0.7, 1.0), 0.4, 1),
            )
            .unwrap();

        let lights = FrameLights::gather(&registry, Vec3::zeros());

        assert!(lights.caster(0).is_none());
        assert!(lights.caster(1).is_some());

        let mut ubo = GlobalUbo::default();
        lights.write_into(&mut ubo);
        assert_eq!(ubo.num_directional_lights, 2);
        assert_relative_eq!(ubo.directional_lights[0].color[3], 0.0, epsilon = EPSILON);
        assert_relative_eq!(ubo.directional_lights[1].color[3], 0.4, epsilon = EPSILON);
    }

    #[test]
    fn test_out_of_range_shadow_pass_is_ignored() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry
            .attach(
                entity,
                DirectionalLight::new(Vec3::new(0.0, -1.0, 0.1), Vec3::new(1.0, 1.0, 1.0), 1.0, 7),
            )
            .unwrap();

        let lights = FrameLights::gather(&registry, Vec3::zeros());
        assert!(!lights.has_shadow_casters());
    }

    #[test]
    fn test_second_claim_on_a_slot_loses() {
        let mut registry = Registry::new();
        let winner = registry.create().unwrap();
        registry
            .attach(
                winner,
                DirectionalLight::new(Vec3::new(0.2, -1.0, 0.0), Vec3::new(1.0, 0.9, 0.8), 2.0, 0),
            )
            .unwrap();
        let loser = registry.create().unwrap();
        registry
            .attach(
                loser,
                DirectionalLight::new(Vec3::new(-0.2, -1.0, 0.0), Vec3::new(0.2, 0.2, 0.9), 1.0, 0),
            )
            .unwrap();

        let lights = FrameLights::gather(&registry, Vec3::zeros());
        let caster = lights.caster(0).unwrap();
        assert_eq!(caster.entity, winner);
    }

    #[test]
    fn test_write_into_packs_position_and_intensity() {
        let mut registry = Registry::new();
        point_light_at(&mut registry, Vec3::new(2.0, 3.0, -1.0), 2.5);

        let lights = FrameLights::gather(&registry, Vec3::zeros());
        let mut ubo = GlobalUbo::default();
        lights.write_into(&mut ubo);

        assert_eq!(ubo.num_point_lights, 1);
        assert_relative_eq!(ubo.point_lights[0].position[0], 2.0, epsilon = EPSILON);
        assert_relative_eq!(ubo.point_lights[0].position[1], 3.0, epsilon = EPSILON);
        assert_relative_eq!(ubo.point_lights[0].position[2], -1.0, epsilon = EPSILON);
        assert_relative_eq!(ubo.point_lights[0].color[3], 2.5, epsilon = EPSILON);
    }

    #[test]
    fn test_shadow_matrix_maps_the_origin_into_the_depth_range() {
        let entry = DirectionalLightEntry {
            entity: {
                let mut registry = Registry::new();
                registry.create().unwrap()
            },
            direction: Vec3::new(0.25, -1.0, 0.15).normalize(),
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        };

        let clip = entry.shadow_matrix() * nalgebra::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;

        assert!(depth > 0.0 && depth < 1.0, "depth {depth} outside (0, 1)");
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
    }

    #[test]
    fn test_shadow_matrix_survives_a_straight_down_light() {
        let entry = DirectionalLightEntry {
            entity: {
                let mut registry = Registry::new();
                registry.create().unwrap()
            },
            direction: Vec3::new(0.0, -1.0, 0.0),
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        };

        let matrix = entry.shadow_matrix();
        assert!(matrix.iter().all(|v| v.is_finite()));
    }
}
