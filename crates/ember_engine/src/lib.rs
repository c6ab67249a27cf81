//! # Ember Engine
//!
//! A scene-based 3D game engine with a deferred Vulkan renderer.
//!
//! ## Features
//!
//! - **Deferred Rendering**: Vulkan G-buffer pipeline with shadow mapping,
//!   point-light billboards and a screen-space overlay
//! - **ECS Registry**: sparse component storage with typed queries
//! - **Scene Hierarchy**: named tree with `parent::child` long-name lookup
//! - **Scene Files**: RON scene descriptions, saved back on stop
//! - **Scripts**: native per-entity behaviors with start/update hooks
//! - **2D Physics**: rigid bodies and colliders driving entity transforms
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ember_engine::prelude::*;
//!
//! struct MyGame;
//!
//! impl Application for MyGame {
//!     fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
//!         // Bind script behaviors, spawn entities
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut Engine, _dt: f32) -> Result<(), AppError> {
//!         // Per-frame game logic
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = EngineSettings::default();
//!     let mut game = MyGame;
//!     Engine::run(settings, &mut game)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod ecs;
pub mod events;
pub mod physics;
pub mod config;
pub mod scene;
pub mod render;
pub mod window;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError, EngineResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        AppError, Application, Engine, EngineError, EngineResult,
        config::{Config, EngineSettings},
        ecs::{Component, Entity, Registry},
        ecs::components::{
            DirectionalLight, MeshComponent, PointLight, SpriteAnimation, Transform,
        },
        events::{Event, Handled, InputState, KeyCode, MouseButton},
        foundation::math::{Mat4, Vec3},
        foundation::time::FrameClock,
        physics::{PhysicsWorld2D, RigidBody2D},
        render::{MeshHandle, MeshLibrary, Overlay, OverlayQuad, PrimitiveShape},
        scene::{Camera, CameraController, NativeScript, Scene, Script, ScriptContext},
    };
}
