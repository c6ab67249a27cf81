//! 2D physics integration
//!
//! Wraps rapier2d's solver state in a [`PhysicsWorld2D`] owned by the scene.
//! Entities that physics drives carry a [`RigidBody2D`] handle component;
//! after each step the world writes dynamic and kinematic body isometries
//! back into the entity's `Transform` (X/Y translation, Z-axis rotation).
//! The solver itself is opaque; only world setup, stepping and write-back
//! live here.

use bitflags::bitflags;
use rapier2d::prelude::{
    BroadPhase, CCDSolver, Collider, ColliderHandle, ColliderSet, Group, ImpulseJointSet,
    IntegrationParameters, InteractionGroups, IslandManager, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, RigidBody, RigidBodyHandle, RigidBodySet,
};

pub use rapier2d::prelude::{ColliderBuilder, RigidBodyBuilder};

use crate::ecs::components::Transform;
use crate::ecs::{Component, Entity, Registry};
use crate::foundation::math::Vec2;

bitflags! {
    /// Collision layer masks; a collider carries a membership set and a
    /// filter of layers it interacts with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CollisionLayers: u32 {
        /// Static world geometry
        const TERRAIN = 1 << 0;
        /// Movable props
        const PROP = 1 << 1;
        /// Short-lived launched bodies
        const PROJECTILE = 1 << 2;
        /// Overlap-only volumes
        const TRIGGER = 1 << 3;
    }
}

impl CollisionLayers {
    /// Builds rapier interaction groups from membership and filter sets.
    pub fn interaction_groups(memberships: Self, filter: Self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(memberships.bits()),
            Group::from_bits_truncate(filter.bits()),
        )
    }
}

/// Component tying an entity to a rapier rigid body
#[derive(Debug, Clone, Copy)]
pub struct RigidBody2D(pub RigidBodyHandle);

impl Component for RigidBody2D {}

/// All rapier 2D solver state for one scene
pub struct PhysicsWorld2D {
    /// World gravity; defaults to (0, -9.81)
    pub gravity: Vec2,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    /// Rigid bodies, addressable through [`RigidBody2D`] handles
    pub bodies: RigidBodySet,
    /// Colliders attached to bodies or free-standing
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl Default for PhysicsWorld2D {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }
}

impl PhysicsWorld2D {
    /// Creates a world with default gravity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world with the given gravity.
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Default::default()
        }
    }

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Inserts a rigid body and returns its handle.
    pub fn add_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    /// Inserts a collider attached to `parent`.
    pub fn add_collider(&mut self, collider: Collider, parent: RigidBodyHandle) -> ColliderHandle {
        self.colliders
            .insert_with_parent(collider, parent, &mut self.bodies)
    }

    /// Inserts a collider with no parent body.
    pub fn add_free_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.colliders.insert(collider)
    }

    /// Removes a body together with its attached colliders.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Copies dynamic and kinematic body isometries back into transforms.
    ///
    /// X/Y translation and the Z-axis Euler angle are overwritten; the Z
    /// translation and the other rotation axes are left as the transform
    /// has them. Entities without a `Transform` are skipped.
    pub fn sync_transforms(&self, registry: &mut Registry) {
        let driven: Vec<(Entity, RigidBodyHandle)> = registry
            .iter::<RigidBody2D>()
            .map(|(entity, body)| (entity, body.0))
            .collect();

        for (entity, handle) in driven {
            let Some(body) = self.bodies.get(handle) else {
                continue;
            };
            if !(body.is_dynamic() || body.is_kinematic()) {
                continue;
            }
            let position = body.position();
            let translation = position.translation;
            let angle = position.rotation.angle();
            if let Ok(transform) = registry.get_mut::<Transform>(entity) {
                transform.set_translation_x(translation.x);
                transform.set_translation_y(translation.y);
                transform.set_rotation_z(angle);
            }
        }
    }
}
