//! Scenes: hierarchy, lifecycle, cameras, scripting and persistence
//!
//! A [`Scene`] owns the entity registry, the named node hierarchy with its
//! lookup dictionary, the camera and controller, and the 2D physics world.
//! Scene state lives in a RON file; `load` populates the registry from it
//! and `stop` writes the live state back.

pub mod camera;
pub mod camera_controller;
pub mod dictionary;
pub mod scene;
pub mod script;
pub mod serial;
pub mod tree;

pub use camera::Camera;
pub use camera_controller::CameraController;
pub use dictionary::Dictionary;
pub use scene::{Scene, SceneState};
pub use script::{NativeScript, Script, ScriptContext};
pub use serial::SceneDescription;
pub use tree::TreeNode;

use crate::ecs::EcsError;
use thiserror::Error;

/// Errors produced by scene operations
#[derive(Debug, Error)]
pub enum SceneError {
    /// `load` called on a scene that already holds loaded state
    #[error("scene '{0}' is already loaded")]
    AlreadyLoaded(String),

    /// Lifecycle call out of order (e.g. `start` before `load`)
    #[error("scene '{name}' is {state:?}, expected {expected:?}")]
    InvalidState {
        /// Scene name
        name: String,
        /// State the scene is actually in
        state: SceneState,
        /// State the operation requires
        expected: SceneState,
    },

    /// A hierarchy long name collided with an existing entry
    #[error("duplicate node name '{0}' in scene hierarchy")]
    DuplicateName(String),

    /// The named parent node does not exist in the hierarchy
    #[error("no hierarchy node named '{0}'")]
    NoSuchNode(String),

    /// Registry operation failed
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Scene file could not be read or written
    #[error("scene file i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Scene file could not be parsed
    #[error("scene file parse: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Scene state could not be serialized
    #[error("scene serialize: {0}")]
    Serialize(#[from] ron::Error),
}

/// Result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
