//! Long-name lookup for scene entities
//!
//! Every node inserted into the hierarchy registers here under its long name,
//! so game code can retrieve entities by path (`"caldera::lights::point0"`)
//! and diagnostics can name an entity when all they hold is its handle.

use std::collections::HashMap;

use crate::ecs::Entity;
use crate::scene::{SceneError, SceneResult};

/// Bidirectional map between long names and entities
#[derive(Debug, Default)]
pub struct Dictionary {
    by_name: HashMap<String, Entity>,
    by_entity: HashMap<Entity, String>,
}

impl Dictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `entity` under `long_name`.
    ///
    /// Fails with [`SceneError::DuplicateName`] when the name is taken; the
    /// dictionary is unchanged in that case.
    pub fn insert(&mut self, long_name: String, entity: Entity) -> SceneResult<()> {
        if self.by_name.contains_key(&long_name) {
            return Err(SceneError::DuplicateName(long_name));
        }
        self.by_entity.insert(entity, long_name.clone());
        self.by_name.insert(long_name, entity);
        Ok(())
    }

    /// Looks up the entity registered under `long_name`.
    pub fn retrieve(&self, long_name: &str) -> Option<Entity> {
        self.by_name.get(long_name).copied()
    }

    /// Looks up the long name an entity was registered under.
    pub fn long_name(&self, entity: Entity) -> Option<&str> {
        self.by_entity.get(&entity).map(String::as_str)
    }

    /// True when `long_name` is registered.
    pub fn contains(&self, long_name: &str) -> bool {
        self.by_name.contains_key(long_name)
    }

    /// Number of registered names
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Removes the entry for `entity`, if any, returning its long name.
    pub fn remove_entity(&mut self, entity: Entity) -> Option<String> {
        let long_name = self.by_entity.remove(&entity)?;
        self.by_name.remove(&long_name);
        Some(long_name)
    }

    /// Logs every registered name with its entity, sorted by name.
    pub fn list(&self) {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        log::debug!("dictionary: {} entries", names.len());
        for name in names {
            if let Some(entity) = self.retrieve(name) {
                log::debug!("  {entity} -> '{name}'");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Registry;

    #[test]
    fn test_retrieve_returns_what_insert_registered() {
        let mut registry = Registry::new();
        let lava = registry.create().unwrap();
        let mut dictionary = Dictionary::new();

        dictionary
            .insert("caldera::lava".to_string(), lava)
            .unwrap();

        assert_eq!(dictionary.retrieve("caldera::lava"), Some(lava));
        assert_eq!(dictionary.retrieve("caldera::missing"), None);
    }

    #[test]
    fn test_duplicate_name_keeps_the_first_entry() {
        let mut registry = Registry::new();
        let first = registry.create().unwrap();
        let second = registry.create().unwrap();
        let mut dictionary = Dictionary::new();

        dictionary.insert("caldera::rock".to_string(), first).unwrap();
        let result = dictionary.insert("caldera::rock".to_string(), second);

        assert!(matches!(result, Err(SceneError::DuplicateName(_))));
        assert_eq!(dictionary.retrieve("caldera::rock"), Some(first));
        assert_eq!(dictionary.len(), 1);
    }

    #[test]
    fn test_long_name_is_the_reverse_of_retrieve() {
        let mut registry = Registry::new();
        let smoke = registry.create().unwrap();
        let unregistered = registry.create().unwrap();
        let mut dictionary = Dictionary::new();

        dictionary
            .insert("caldera::smoke".to_string(), smoke)
            .unwrap();

        assert_eq!(dictionary.long_name(smoke), Some("caldera::smoke"));
        assert_eq!(dictionary.long_name(unregistered), None);
    }

    #[test]
    fn test_remove_entity_clears_both_directions() {
        let mut registry = Registry::new();
        let smoke = registry.create().unwrap();
        let mut dictionary = Dictionary::new();

        dictionary
            .insert("caldera::smoke".to_string(), smoke)
            .unwrap();
        let removed = dictionary.remove_entity(smoke);

        assert_eq!(removed.as_deref(), Some("caldera::smoke"));
        assert!(dictionary.is_empty());
        assert_eq!(dictionary.long_name(smoke), None);
    }
}
