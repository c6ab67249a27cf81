//! Per-entity behavior hooks
//!
//! A [`Script`] component names a behavior and optionally carries a boxed
//! [`NativeScript`] implementing it. The scene invokes `on_start` once when
//! it starts running and `on_update` every frame. A script left without a
//! behavior is reported once per entity and then ignored.

use crate::ecs::{Component, Entity, Registry};
use crate::physics::PhysicsWorld2D;
use crate::scene::dictionary::Dictionary;

/// Everything a script hook may touch while it runs.
///
/// The script's own component is temporarily detached while its hook runs,
/// so the registry can be borrowed mutably here without aliasing it.
pub struct ScriptContext<'a> {
    /// Entity the script is attached to
    pub entity: Entity,
    /// Scene registry, free to create entities and mutate components
    pub registry: &'a mut Registry,
    /// Long-name lookup for the scene hierarchy
    pub dictionary: &'a Dictionary,
    /// Physics world, for applying impulses or repositioning bodies
    pub physics: &'a mut PhysicsWorld2D,
    /// Seconds since the previous frame; zero inside `on_start`
    pub dt: f32,
}

/// Behavior attached to an entity through a [`Script`] component
pub trait NativeScript: Send + Sync {
    /// Runs once when the scene transitions to running.
    fn on_start(&mut self, _ctx: &mut ScriptContext<'_>) {}

    /// Runs every frame while the scene is running.
    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) {}
}

/// Component binding an entity to a named behavior
pub struct Script {
    name: String,
    behavior: Option<Box<dyn NativeScript>>,
}

impl Component for Script {}

impl Script {
    /// Creates a script slot with no behavior bound yet.
    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: None,
        }
    }

    /// Creates a script with its behavior bound.
    pub fn new(name: impl Into<String>, behavior: Box<dyn NativeScript>) -> Self {
        Self {
            name: name.into(),
            behavior: Some(behavior),
        }
    }

    /// Behavior name, for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when a behavior is bound.
    pub fn is_bound(&self) -> bool {
        self.behavior.is_some()
    }

    /// Binds (or replaces) the behavior.
    pub fn bind(&mut self, behavior: Box<dyn NativeScript>) {
        self.behavior = Some(behavior);
    }

    /// Detaches the behavior so it can run against the registry.
    pub(crate) fn take_behavior(&mut self) -> Option<Box<dyn NativeScript>> {
        self.behavior.take()
    }

    /// Reattaches a behavior after its hook ran.
    pub(crate) fn put_behavior(&mut self, behavior: Box<dyn NativeScript>) {
        self.behavior = Some(behavior);
    }
}

impl std::fmt::Debug for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Script")
            .field("name", &self.name)
            .field("bound", &self.behavior.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        starts: u32,
        updates: u32,
    }

    impl NativeScript for Counter {
        fn on_start(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.starts += 1;
        }

        fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.updates += 1;
        }
    }

    #[test]
    fn test_unbound_script_reports_no_behavior() {
        let script = Script::unbound("rotate_lights");
        assert_eq!(script.name(), "rotate_lights");
        assert!(!script.is_bound());
    }

    #[test]
    fn test_take_and_put_round_trip_the_behavior() {
        let mut script = Script::new(
            "rotate_lights",
            Box::new(Counter {
                starts: 0,
                updates: 0,
            }),
        );

        let behavior = script.take_behavior();
        assert!(behavior.is_some());
        assert!(!script.is_bound());

        script.put_behavior(behavior.unwrap());
        assert!(script.is_bound());
    }
}
