//! Entity handles and slot allocation

use super::{EcsError, EcsResult};

/// Entity identifier
///
/// An opaque handle with no inherent data. The index addresses a slot in the
/// owning registry; the generation rejects handles that outlived their slot.
/// Ordering is total (index first, then generation) so handles can serve as
/// deterministic tie-breakers in sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(super) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the owning registry
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot at the time this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Slot allocator backing a registry
///
/// Freed slots are recycled with a bumped generation, so handles issued
/// before the free are rejected by [`EntityAllocator::is_alive`].
pub(super) struct EntityAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    capacity: u32,
}

impl EntityAllocator {
    pub fn new(capacity: u32) -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free: Vec::new(),
            capacity,
        }
    }

    pub fn allocate(&mut self) -> EcsResult<Entity> {
        if let Some(index) = self.free.pop() {
            self.alive[index as usize] = true;
            return Ok(Entity::new(index, self.generations[index as usize]));
        }

        let index = self.generations.len() as u32;
        if index >= self.capacity {
            return Err(EcsError::ResourceExhausted {
                capacity: self.capacity,
            });
        }
        self.generations.push(0);
        self.alive.push(true);
        Ok(Entity::new(index, 0))
    }

    pub fn deallocate(&mut self, entity: Entity) -> EcsResult<()> {
        if !self.is_alive(entity) {
            return Err(EcsError::StaleEntity(entity));
        }
        let index = entity.index() as usize;
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.alive[index] = false;
        self.free.push(entity.index());
        Ok(())
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        let index = entity.index() as usize;
        index < self.generations.len()
            && self.alive[index]
            && self.generations[index] == entity.generation()
    }

    pub fn live_count(&self) -> usize {
        self.generations.len() - self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_unique_handles() {
        let mut allocator = EntityAllocator::new(16);
        let a = allocator.allocate().unwrap();
        let b = allocator.allocate().unwrap();
        assert_ne!(a, b);
        assert!(allocator.is_alive(a));
        assert!(allocator.is_alive(b));
    }

    #[test]
    fn test_stale_handle_rejected_after_recycle() {
        let mut allocator = EntityAllocator::new(16);
        let first = allocator.allocate().unwrap();
        allocator.deallocate(first).unwrap();

        // Slot is recycled with a new generation.
        let second = allocator.allocate().unwrap();
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(!allocator.is_alive(first));
        assert!(allocator.is_alive(second));
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut allocator = EntityAllocator::new(2);
        allocator.allocate().unwrap();
        allocator.allocate().unwrap();
        let err = allocator.allocate().unwrap_err();
        assert_eq!(err, EcsError::ResourceExhausted { capacity: 2 });
    }

    #[test]
    fn test_double_free_rejected() {
        let mut allocator = EntityAllocator::new(4);
        let entity = allocator.allocate().unwrap();
        allocator.deallocate(entity).unwrap();
        assert_eq!(
            allocator.deallocate(entity),
            Err(EcsError::StaleEntity(entity))
        );
    }

    #[test]
    fn test_handle_ordering_is_total() {
        let a = Entity::new(1, 0);
        let b = Entity::new(2, 0);
        let c = Entity::new(1, 3);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }
}
