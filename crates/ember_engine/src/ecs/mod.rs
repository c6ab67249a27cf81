//! Entity-Component-System implementation
//!
//! Entities are opaque generational handles; components are plain data
//! records stored in typed sparse sets. A [`Registry`] owns both. Views
//! enumerate entities possessing a set of component types lazily.

pub mod components;
pub mod entity;
pub mod query;
pub mod registry;
pub mod storage;

pub use entity::Entity;
pub use query::{ComponentSet, View};
pub use registry::Registry;
pub use storage::ComponentStore;

use thiserror::Error;

/// Marker trait for components
pub trait Component: 'static + Send + Sync {}

/// Errors produced by registry operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Entity capacity reached; no more handles can be created
    #[error("entity capacity of {capacity} reached")]
    ResourceExhausted {
        /// The configured entity capacity
        capacity: u32,
    },

    /// A handle referring to a destroyed (or never created) entity slot
    #[error("stale entity handle {0:?}")]
    StaleEntity(Entity),

    /// The entity exists but does not carry the requested component
    #[error("entity {entity:?} has no {component} component")]
    MissingComponent {
        /// The entity that was queried
        entity: Entity,
        /// Type name of the missing component
        component: &'static str,
    },
}

/// Result alias for registry operations
pub type EcsResult<T> = Result<T, EcsError>;
