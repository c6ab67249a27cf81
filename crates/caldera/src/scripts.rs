//! Native script behaviors for the island

use ember_engine::ecs::EcsError;
use ember_engine::foundation::math::{utils, Vec2};
use ember_engine::physics::{ColliderBuilder, RigidBodyBuilder};
use ember_engine::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::components::{EmberLight, Flicker, LavaRock};

/// Carries every [`EmberLight`]-tagged entity in a circle around the crater
/// rim.
pub struct OrbitLights {
    center: Vec3,
    radius: f32,
    height: f32,
    speed: f32,
    angle: f32,
}

impl OrbitLights {
    /// Creates an orbit with the given ring shape and angular speed.
    pub fn new(center: Vec3, radius: f32, height: f32, speed: f32) -> Self {
        Self {
            center,
            radius,
            height,
            speed,
            angle: 0.0,
        }
    }
}

impl NativeScript for OrbitLights {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>) {
        let mut members: Vec<Entity> = ctx
            .registry
            .iter::<EmberLight>()
            .map(|(entity, _)| entity)
            .collect();
        if members.is_empty() {
            return;
        }
        // Tag iteration order is unspecified; sort so each light keeps its
        // ring slot across frames.
        members.sort_unstable();

        self.angle = utils::wrap_angle(self.angle + self.speed * ctx.dt);
        let step = std::f32::consts::TAU / members.len() as f32;

        for (index, entity) in members.into_iter().enumerate() {
            let angle = self.angle + step * index as f32;
            let position = self.center
                + Vec3::new(angle.cos() * self.radius, self.height, angle.sin() * self.radius);
            if let Ok(transform) = ctx.registry.get_mut::<Transform>(entity) {
                transform.set_translation(position);
            }
        }
    }
}

/// Periodically hurls glowing rocks out of the crater.
///
/// Rocks are plain registry entities: a mesh, a small point light, a dynamic
/// physics body and a [`LavaRock`] age. They never enter the hierarchy, so a
/// saved scene contains only the island itself.
pub struct Eruption {
    vent: Vec3,
    rock_mesh: MeshHandle,
    interval: f32,
    countdown: f32,
    rocks_per_burst: u32,
    rng: StdRng,
}

impl Eruption {
    /// Creates an eruption at `vent`, bursting every `interval` seconds.
    pub fn new(vent: Vec3, rock_mesh: MeshHandle, interval: f32, rocks_per_burst: u32) -> Self {
        Self {
            vent,
            rock_mesh,
            interval,
            countdown: interval,
            rocks_per_burst,
            rng: StdRng::from_entropy(),
        }
    }

    fn erupt(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), EcsError> {
        for _ in 0..self.rocks_per_burst {
            let scale = self.rng.gen_range(0.12..0.3);
            let spawn = self.vent
                + Vec3::new(
                    self.rng.gen_range(-0.3..0.3),
                    0.0,
                    self.rng.gen_range(-0.3..0.3),
                );
            let velocity = Vec2::new(self.rng.gen_range(-2.5..2.5), self.rng.gen_range(6.0..9.5));

            let entity = ctx.registry.create()?;
            let mut transform = Transform::from_translation(spawn);
            transform.set_scale_uniform(scale);
            ctx.registry.attach(entity, transform)?;
            ctx.registry
                .attach(entity, MeshComponent::new("lava_rock", self.rock_mesh))?;
            ctx.registry.attach(
                entity,
                PointLight::new(Vec3::new(1.0, 0.35, 0.08), 1.6, 0.06),
            )?;
            ctx.registry
                .attach(entity, LavaRock::new(self.rng.gen_range(4.0..7.0)))?;

            let body = ctx.physics.add_body(
                RigidBodyBuilder::dynamic()
                    .translation(Vec2::new(spawn.x, spawn.y))
                    .linvel(velocity)
                    .build(),
            );
            ctx.physics
                .add_collider(ColliderBuilder::ball(scale).restitution(0.4).build(), body);
            ctx.registry.attach(entity, RigidBody2D(body))?;
        }
        log::debug!("eruption: {} rocks launched", self.rocks_per_burst);
        Ok(())
    }

    fn reclaim(&mut self, ctx: &mut ScriptContext<'_>) {
        let rocks: Vec<Entity> = ctx
            .registry
            .iter::<LavaRock>()
            .map(|(entity, _)| entity)
            .collect();

        for entity in rocks {
            let expired = match ctx.registry.get_mut::<LavaRock>(entity) {
                Ok(rock) => {
                    rock.age += ctx.dt;
                    rock.expired()
                }
                Err(_) => continue,
            };
            if !expired {
                continue;
            }
            if let Ok(body) = ctx.registry.get::<RigidBody2D>(entity) {
                let handle = body.0;
                ctx.physics.remove_body(handle);
            }
            if let Err(err) = ctx.registry.destroy(entity) {
                log::warn!("failed to reclaim rock {entity}: {err}");
            }
        }
    }
}

impl NativeScript for Eruption {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>) {
        self.countdown -= ctx.dt;
        if self.countdown <= 0.0 {
            self.countdown = self.interval * self.rng.gen_range(0.75..1.25);
            if let Err(err) = self.erupt(ctx) {
                log::warn!("eruption burst failed: {err}");
            }
        }
        self.reclaim(ctx);
    }
}

/// Wobbles the point light on its own entity, tuned by a [`Flicker`]
/// component.
#[derive(Default)]
pub struct CraterFlicker {
    time: f32,
}

impl CraterFlicker {
    /// Creates a flicker starting at phase zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NativeScript for CraterFlicker {
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>) {
        self.time += ctx.dt;
        let Ok(flicker) = ctx.registry.get::<Flicker>(ctx.entity) else {
            return;
        };
        let flicker = flicker.clone();

        let cycle = self.time * flicker.frequency;
        // Two incommensurate sines read less mechanical than one.
        let wobble = 0.6 * cycle.sin() + 0.4 * (cycle * 2.7).sin();
        if let Ok(light) = ctx.registry.get_mut::<PointLight>(ctx.entity) {
            light.intensity = flicker.base_intensity * (1.0 + flicker.amplitude * wobble);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_engine::physics::PhysicsWorld2D;
    use ember_engine::scene::Dictionary;

    fn context<'a>(
        entity: Entity,
        registry: &'a mut Registry,
        dictionary: &'a Dictionary,
        physics: &'a mut PhysicsWorld2D,
        dt: f32,
    ) -> ScriptContext<'a> {
        ScriptContext {
            entity,
            registry,
            dictionary,
            physics,
            dt,
        }
    }

    #[test]
    fn test_eruption_spawns_rocks_with_bodies() {
        let mut registry = Registry::new();
        let dictionary = Dictionary::new();
        let mut physics = PhysicsWorld2D::new();
        let mut meshes = MeshLibrary::new();
        let rock_mesh = meshes.load_primitive(PrimitiveShape::Sphere, Vec3::new(0.8, 0.2, 0.1));

        let volcano = registry.create().unwrap();
        let mut script = Eruption::new(Vec3::new(0.0, 3.0, 0.0), rock_mesh, 1.0, 4);

        // First second elapses in one step, so the burst fires immediately.
        let mut ctx = context(volcano, &mut registry, &dictionary, &mut physics, 1.0);
        script.on_update(&mut ctx);

        let rocks: Vec<Entity> = registry.iter::<LavaRock>().map(|(e, _)| e).collect();
        assert_eq!(rocks.len(), 4);
        assert_eq!(physics.bodies.len(), 4);
        for rock in &rocks {
            assert!(registry.get::<RigidBody2D>(*rock).is_ok());
            assert!(registry.get::<MeshComponent>(*rock).is_ok());
            assert!(registry.get::<PointLight>(*rock).is_ok());
        }
    }

    #[test]
    fn test_expired_rocks_release_entity_and_body() {
        let mut registry = Registry::new();
        let dictionary = Dictionary::new();
        let mut physics = PhysicsWorld2D::new();
        let mut meshes = MeshLibrary::new();
        let rock_mesh = meshes.load_primitive(PrimitiveShape::Sphere, Vec3::new(0.8, 0.2, 0.1));

        let volcano = registry.create().unwrap();
        let mut script = Eruption::new(Vec3::new(0.0, 3.0, 0.0), rock_mesh, 100.0, 3);

        let mut ctx = context(volcano, &mut registry, &dictionary, &mut physics, 100.0);
        script.on_update(&mut ctx);
        let spawned = registry.iter::<LavaRock>().count();
        assert_eq!(spawned, 3);

        // Age every rock past the longest possible lifetime.
        let mut ctx = context(volcano, &mut registry, &dictionary, &mut physics, 8.0);
        script.reclaim(&mut ctx);

        assert_eq!(registry.iter::<LavaRock>().count(), 0);
        assert_eq!(physics.bodies.len(), 0);
        assert_eq!(physics.colliders.len(), 0);
    }

    #[test]
    fn test_orbit_places_tagged_lights_on_the_ring() {
        let mut registry = Registry::new();
        let dictionary = Dictionary::new();
        let mut physics = PhysicsWorld2D::new();

        let rig = registry.create().unwrap();
        let ember = registry.create().unwrap();
        registry.attach(ember, Transform::identity()).unwrap();
        registry.attach(ember, EmberLight).unwrap();

        let center = Vec3::new(0.0, 3.0, 0.0);
        let mut script = OrbitLights::new(center, 2.0, 0.5, 1.0);
        let mut ctx = context(rig, &mut registry, &dictionary, &mut physics, 0.25);
        script.on_update(&mut ctx);

        let transform = registry.get::<Transform>(ember).unwrap();
        let offset = transform.translation() - center;
        let ring_distance = (offset.x * offset.x + offset.z * offset.z).sqrt();
        assert!((ring_distance - 2.0).abs() < 1e-4);
        assert!((offset.y - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_orbit_spaces_members_evenly_and_skips_untagged() {
        let mut registry = Registry::new();
        let dictionary = Dictionary::new();
        let mut physics = PhysicsWorld2D::new();

        let rig = registry.create().unwrap();
        let mut embers = Vec::new();
        for _ in 0..3 {
            let ember = registry.create().unwrap();
            registry.attach(ember, Transform::identity()).unwrap();
            registry.attach(ember, EmberLight).unwrap();
            embers.push(ember);
        }
        let bystander = registry.create().unwrap();
        registry.attach(bystander, Transform::identity()).unwrap();

        let mut script = OrbitLights::new(Vec3::zeros(), 4.0, 1.0, 0.0);
        let mut ctx = context(rig, &mut registry, &dictionary, &mut physics, 0.1);
        script.on_update(&mut ctx);

        // Evenly spaced ring positions cancel around the center.
        let mut sum = Vec3::zeros();
        for &ember in &embers {
            let position = registry.get::<Transform>(ember).unwrap().translation();
            let ring_distance = (position.x * position.x + position.z * position.z).sqrt();
            assert!((ring_distance - 4.0).abs() < 1e-3);
            assert!((position.y - 1.0).abs() < 1e-3);
            sum += position;
        }
        assert!(sum.x.abs() < 1e-3);
        assert!(sum.z.abs() < 1e-3);

        let parked = registry.get::<Transform>(bystander).unwrap().translation();
        assert_eq!(parked, Vec3::zeros());
    }

    #[test]
    fn test_flicker_wobbles_intensity_around_the_base() {
        let mut registry = Registry::new();
        let dictionary = Dictionary::new();
        let mut physics = PhysicsWorld2D::new();

        let glow = registry.create().unwrap();
        registry
            .attach(glow, PointLight::new(Vec3::new(1.0, 0.4, 0.1), 3.0, 0.1))
            .unwrap();
        registry.attach(glow, Flicker::default()).unwrap();

        let mut script = CraterFlicker::new();
        let mut lowest = f32::MAX;
        let mut highest = f32::MIN;
        for _ in 0..60 {
            let mut ctx = context(glow, &mut registry, &dictionary, &mut physics, 0.016);
            script.on_update(&mut ctx);
            let intensity = registry.get::<PointLight>(glow).unwrap().intensity;
            lowest = lowest.min(intensity);
            highest = highest.max(intensity);
        }

        let base = Flicker::default().base_intensity;
        assert!(highest > lowest);
        assert!(highest <= base * 2.0);
        assert!(lowest >= 0.0);
    }
}
