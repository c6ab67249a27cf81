//! Entity registry
//!
//! Owns the entity allocator and one typed sparse-set store per component
//! type, erased behind `TypeId` keys. All game-object state flows through
//! here; render passes and scene systems query it every frame and never
//! keep component lists of their own.

use super::entity::EntityAllocator;
use super::query::{ComponentSet, View};
use super::storage::{AnyStore, ComponentStore};
use super::{Component, EcsError, EcsResult, Entity};
use std::any::TypeId;
use std::collections::HashMap;

/// Default entity capacity for [`Registry::new`]
pub const DEFAULT_ENTITY_CAPACITY: u32 = 10_000;

/// ECS registry containing all entities and components
pub struct Registry {
    allocator: EntityAllocator,
    stores: HashMap<TypeId, Box<dyn AnyStore>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with the default entity capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ENTITY_CAPACITY)
    }

    /// Create a registry with an explicit entity capacity
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            allocator: EntityAllocator::new(capacity),
            stores: HashMap::new(),
        }
    }

    /// Create a new entity
    ///
    /// Fails with [`EcsError::ResourceExhausted`] once the capacity is
    /// reached.
    pub fn create(&mut self) -> EcsResult<Entity> {
        self.allocator.allocate()
    }

    /// Destroy an entity, removing every component attached to it
    ///
    /// The slot is recycled with a bumped generation; handles issued before
    /// the destroy are rejected by all subsequent registry calls.
    pub fn destroy(&mut self, entity: Entity) -> EcsResult<()> {
        self.allocator.deallocate(entity)?;
        for store in self.stores.values_mut() {
            store.remove_entity(entity);
        }
        Ok(())
    }

    /// True when the handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.allocator.live_count()
    }

    /// Attach a component value to an entity
    ///
    /// Overwrites an existing value of the same type; last write wins.
    pub fn attach<T: Component>(&mut self, entity: Entity, value: T) -> EcsResult<()> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity(entity));
        }
        self.store_mut::<T>().insert(entity, value);
        Ok(())
    }

    /// Detach and return a component value from an entity
    pub fn detach<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<T>>())
            .and_then(|store| store.remove(entity))
    }

    /// True when the entity carries a component of type `T`
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.store::<T>()
            .map_or(false, |store| store.contains(entity))
    }

    /// Borrow a component of type `T` from an entity
    ///
    /// Fails with [`EcsError::MissingComponent`] when absent; callers either
    /// pre-check with a view or rely on co-occurrence guaranteed elsewhere.
    pub fn get<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.store::<T>()
            .and_then(|store| store.get(entity))
            .ok_or_else(|| EcsError::MissingComponent {
                entity,
                component: std::any::type_name::<T>(),
            })
    }

    /// Mutably borrow a component of type `T` from an entity
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        let missing = EcsError::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        };
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<T>>())
            .and_then(|store| store.get_mut(entity))
            .ok_or(missing)
    }

    /// Iterate over every (entity, component) pair of a single type
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.store::<T>().into_iter().flat_map(ComponentStore::iter)
    }

    /// Iterate over every (entity, component) pair with mutable values
    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<T>>())
            .into_iter()
            .flat_map(ComponentStore::iter_mut)
    }

    /// Lazily enumerate entities possessing ALL component types in `Q`
    ///
    /// `Q` is a tuple of component types, e.g.
    /// `registry.view::<(Transform, Mesh)>()`. Handles come out in the dense
    /// order of the smallest participating store. To mutate components while
    /// walking the result, collect the handles first:
    ///
    /// ```ignore
    /// let entities: Vec<Entity> = registry.view::<(Transform, Mesh)>().collect();
    /// for entity in entities {
    ///     let transform = registry.get_mut::<Transform>(entity)?;
    ///     // ...
    /// }
    /// ```
    pub fn view<Q: ComponentSet>(&self) -> View<'_, Q> {
        let mut driver: &[Entity] = &[];
        let mut smallest = usize::MAX;
        for id in Q::type_ids() {
            match self.stores.get(&id) {
                Some(store) if store.count() < smallest => {
                    smallest = store.count();
                    driver = store.entity_slice();
                }
                Some(_) => {}
                // A listed type with no store can match nothing.
                None => return View::new(self, &[]),
            }
        }
        View::new(self, driver)
    }

    /// Number of components of type `T` currently stored
    pub fn count<T: Component>(&self) -> usize {
        self.store::<T>().map_or(0, ComponentStore::len)
    }

    fn store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.as_any().downcast_ref::<ComponentStore<T>>())
    }

    fn store_mut<T: Component>(&mut self) -> &mut ComponentStore<T> {
        let store = self
            .stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStore::<T>::new()));
        store
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .unwrap_or_else(|| unreachable!("store registered under mismatched TypeId"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(f32, f32);
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Velocity(f32, f32);
    impl Component for Velocity {}

    struct Frozen;
    impl Component for Frozen {}

    #[test]
    fn test_create_and_attach() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry.attach(entity, Position(1.0, 2.0)).unwrap();

        assert_eq!(registry.get::<Position>(entity).unwrap(), &Position(1.0, 2.0));
    }

    #[test]
    fn test_attach_overwrites_last_write_wins() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry.attach(entity, Position(1.0, 1.0)).unwrap();
        registry.attach(entity, Position(9.0, 9.0)).unwrap();

        assert_eq!(registry.count::<Position>(), 1);
        assert_eq!(registry.get::<Position>(entity).unwrap(), &Position(9.0, 9.0));
    }

    #[test]
    fn test_get_missing_component() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();

        let err = registry.get::<Position>(entity).unwrap_err();
        assert!(matches!(err, EcsError::MissingComponent { entity: e, .. } if e == entity));
    }

    #[test]
    fn test_attach_to_stale_handle() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry.destroy(entity).unwrap();

        assert_eq!(
            registry.attach(entity, Position(0.0, 0.0)),
            Err(EcsError::StaleEntity(entity))
        );
    }

    #[test]
    fn test_destroy_removes_all_components() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry.attach(entity, Position(1.0, 1.0)).unwrap();
        registry.attach(entity, Velocity(0.5, 0.0)).unwrap();

        registry.destroy(entity).unwrap();
        assert_eq!(registry.count::<Position>(), 0);
        assert_eq!(registry.count::<Velocity>(), 0);
        assert!(!registry.is_alive(entity));
    }

    #[test]
    fn test_recycled_slot_does_not_inherit_components() {
        let mut registry = Registry::new();
        let old = registry.create().unwrap();
        registry.attach(old, Position(1.0, 1.0)).unwrap();
        registry.destroy(old).unwrap();

        let new = registry.create().unwrap();
        assert_eq!(new.index(), old.index());
        assert!(!registry.has::<Position>(new));
        assert!(registry.get::<Position>(new).is_err());
    }

    #[test]
    fn test_view_requires_all_components() {
        let mut registry = Registry::new();
        let a = registry.create().unwrap();
        let b = registry.create().unwrap();
        let c = registry.create().unwrap();

        registry.attach(a, Position(0.0, 0.0)).unwrap();
        registry.attach(a, Velocity(1.0, 0.0)).unwrap();
        registry.attach(b, Position(0.0, 0.0)).unwrap();
        registry.attach(c, Velocity(0.0, 1.0)).unwrap();

        let matched: Vec<Entity> = registry.view::<(Position, Velocity)>().collect();
        assert_eq!(matched, vec![a]);
    }

    #[test]
    fn test_view_with_absent_type_is_empty() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry.attach(entity, Position(0.0, 0.0)).unwrap();

        assert_eq!(registry.view::<(Position, Frozen)>().count(), 0);
    }

    #[test]
    fn test_view_then_mutate_collected_handles() {
        let mut registry = Registry::new();
        for i in 0..4 {
            let entity = registry.create().unwrap();
            registry.attach(entity, Position(i as f32, 0.0)).unwrap();
            registry.attach(entity, Velocity(1.0, 0.0)).unwrap();
        }

        let entities: Vec<Entity> = registry.view::<(Position, Velocity)>().collect();
        for entity in entities {
            let velocity_x = registry.get::<Velocity>(entity).unwrap().0;
            let position = registry.get_mut::<Position>(entity).unwrap();
            position.0 += velocity_x;
        }

        let moved: Vec<f32> = registry.iter::<Position>().map(|(_, p)| p.0).collect();
        assert_eq!(moved, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_capacity_exhaustion_surfaces() {
        let mut registry = Registry::with_capacity(1);
        registry.create().unwrap();
        assert_eq!(
            registry.create(),
            Err(EcsError::ResourceExhausted { capacity: 1 })
        );
    }

    #[test]
    fn test_detach_returns_value() {
        let mut registry = Registry::new();
        let entity = registry.create().unwrap();
        registry.attach(entity, Position(3.0, 4.0)).unwrap();

        assert_eq!(registry.detach::<Position>(entity), Some(Position(3.0, 4.0)));
        assert_eq!(registry.detach::<Position>(entity), None);
    }
}
