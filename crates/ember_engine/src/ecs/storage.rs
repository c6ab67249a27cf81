//! Typed component storage
//!
//! Each component type lives in its own sparse set: a sparse array indexed
//! by entity slot pointing into densely packed parallel arrays of entities
//! and component values. Iteration touches only the dense arrays.

use super::{Component, Entity};
use std::any::Any;

const TOMBSTONE: u32 = u32::MAX;

/// Sparse-set storage for a single component type
pub struct ComponentStore<T: Component> {
    sparse: Vec<u32>,
    entities: Vec<Entity>,
    data: Vec<T>,
}

impl<T: Component> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentStore<T> {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            entities: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Attach a value to an entity. An existing value for the same entity
    /// slot is overwritten; last write wins.
    pub fn insert(&mut self, entity: Entity, value: T) {
        let slot = entity.index() as usize;
        if slot >= self.sparse.len() {
            self.sparse.resize(slot + 1, TOMBSTONE);
        }

        let dense = self.sparse[slot];
        if dense != TOMBSTONE {
            self.entities[dense as usize] = entity;
            self.data[dense as usize] = value;
        } else {
            self.sparse[slot] = self.entities.len() as u32;
            self.entities.push(entity);
            self.data.push(value);
        }
    }

    /// Remove and return the value attached to an entity
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = entity.index() as usize;
        let dense = *self.sparse.get(slot)?;
        if dense == TOMBSTONE || self.entities[dense as usize] != entity {
            return None;
        }

        self.sparse[slot] = TOMBSTONE;
        let last = self.entities.len() - 1;
        self.entities.swap_remove(dense as usize);
        let value = self.data.swap_remove(dense as usize);
        if (dense as usize) < last {
            // The former tail moved into the vacated dense slot.
            let moved = self.entities[dense as usize];
            self.sparse[moved.index() as usize] = dense;
        }
        Some(value)
    }

    /// True when the exact handle (index and generation) is present
    pub fn contains(&self, entity: Entity) -> bool {
        self.get(entity).is_some()
    }

    /// Borrow the value attached to an entity
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let dense = *self.sparse.get(entity.index() as usize)?;
        if dense == TOMBSTONE {
            return None;
        }
        let dense = dense as usize;
        (self.entities[dense] == entity).then(|| &self.data[dense])
    }

    /// Mutably borrow the value attached to an entity
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let dense = *self.sparse.get(entity.index() as usize)?;
        if dense == TOMBSTONE {
            return None;
        }
        let dense = dense as usize;
        (self.entities[dense] == entity).then(|| &mut self.data[dense])
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no components are stored
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Entities holding this component, in dense (insertion-ish) order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Iterate over (entity, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entities.iter().copied().zip(self.data.iter())
    }

    /// Iterate over (entity, value) pairs with mutable values
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.entities.iter().copied().zip(self.data.iter_mut())
    }
}

/// Type-erased view of a store, for registry-wide operations
pub(super) trait AnyStore: Any {
    fn remove_entity(&mut self, entity: Entity);
    fn contains_entity(&self, entity: Entity) -> bool;
    fn entity_slice(&self) -> &[Entity];
    fn count(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) {
        self.remove(entity);
    }

    fn contains_entity(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn entity_slice(&self) -> &[Entity] {
        self.entities()
    }

    fn count(&self) -> usize {
        self.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(i32);
    impl Component for Health {}

    fn entity(index: u32) -> Entity {
        Entity::new(index, 0)
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = ComponentStore::new();
        store.insert(entity(3), Health(10));
        assert_eq!(store.get(entity(3)).map(|h| h.0), Some(10));
        assert!(store.get(entity(4)).is_none());
    }

    #[test]
    fn test_insert_overwrites() {
        let mut store = ComponentStore::new();
        store.insert(entity(0), Health(1));
        store.insert(entity(0), Health(2));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(entity(0)).map(|h| h.0), Some(2));
    }

    #[test]
    fn test_remove_swaps_tail() {
        let mut store = ComponentStore::new();
        store.insert(entity(0), Health(0));
        store.insert(entity(1), Health(1));
        store.insert(entity(2), Health(2));

        let removed = store.remove(entity(0));
        assert_eq!(removed.map(|h| h.0), Some(0));
        assert_eq!(store.len(), 2);

        // Remaining entries stay addressable after the swap.
        assert_eq!(store.get(entity(1)).map(|h| h.0), Some(1));
        assert_eq!(store.get(entity(2)).map(|h| h.0), Some(2));
        assert!(store.get(entity(0)).is_none());
    }

    #[test]
    fn test_generation_mismatch_is_absent() {
        let mut store = ComponentStore::new();
        store.insert(Entity::new(5, 1), Health(7));
        assert!(store.get(Entity::new(5, 0)).is_none());
        assert!(store.contains(Entity::new(5, 1)));
    }

    #[test]
    fn test_iter_matches_entities() {
        let mut store = ComponentStore::new();
        store.insert(entity(2), Health(20));
        store.insert(entity(7), Health(70));

        let collected: Vec<(u32, i32)> = store.iter().map(|(e, h)| (e.index(), h.0)).collect();
        assert_eq!(collected, vec![(2, 20), (7, 70)]);
    }
}
