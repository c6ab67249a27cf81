//! Views over entities possessing a set of component types
//!
//! A [`View`] is a lazy iterator of entity handles driven by the smallest
//! participating store. It borrows the registry immutably; callers that
//! need to mutate components while walking the result collect the handles
//! into a `Vec` first, then go through `get_mut` per entity.

use super::registry::Registry;
use super::{Component, Entity};
use std::any::TypeId;
use std::marker::PhantomData;

/// A set of component types usable as a view filter
pub trait ComponentSet {
    /// Type ids of every component type in the set
    fn type_ids() -> Vec<TypeId>;

    /// True when the entity carries every component type in the set
    fn all_present(registry: &Registry, entity: Entity) -> bool;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(TypeId::of::<$name>()),+]
            }

            fn all_present(registry: &Registry, entity: Entity) -> bool {
                $(registry.has::<$name>(entity))&&+
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);

/// Lazy iterator over entities matching a [`ComponentSet`]
///
/// Yields handles in the dense order of the smallest participating store.
/// Creating or destroying entities of the queried types mid-iteration is
/// not supported; mutate component values instead, or collect the handles
/// first.
pub struct View<'a, Q: ComponentSet> {
    registry: &'a Registry,
    driver: std::slice::Iter<'a, Entity>,
    _marker: PhantomData<Q>,
}

impl<'a, Q: ComponentSet> View<'a, Q> {
    pub(super) fn new(registry: &'a Registry, driver: &'a [Entity]) -> Self {
        Self {
            registry,
            driver: driver.iter(),
            _marker: PhantomData,
        }
    }
}

impl<Q: ComponentSet> Iterator for View<'_, Q> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        for &entity in self.driver.by_ref() {
            if Q::all_present(self.registry, entity) {
                return Some(entity);
            }
        }
        None
    }
}
