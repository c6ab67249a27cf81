//! Application trait and lifecycle hooks

use thiserror::Error;

use crate::ecs::EcsError;
use crate::engine::Engine;
use crate::events::{Event, Handled};
use crate::scene::SceneError;

/// Application lifecycle trait
///
/// Implement this trait to build a game on the engine. The engine owns the
/// window, renderer and scene; the application fills the scene with behavior
/// and reacts to input the engine and scene leave unhandled.
pub trait Application {
    /// Called once after the scene file has been loaded but before the scene
    /// starts running.
    ///
    /// Bind behaviors to scripts declared in the scene file, spawn extra
    /// entities, and tune the camera controller here.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called every frame after the scene update.
    fn update(&mut self, engine: &mut Engine, dt: f32) -> Result<(), AppError>;

    /// Called for events the engine and scene did not consume.
    fn handle_event(&mut self, _engine: &mut Engine, _event: &Event) -> Handled {
        Handled::No
    }

    /// Called once per frame to rebuild the screen-space overlay.
    ///
    /// The overlay has already been cleared; push quads through
    /// [`Engine::overlay`]. The default draws nothing.
    fn compose_overlay(&mut self, _engine: &mut Engine) {}

    /// Called after the main loop ends, before the engine tears down.
    fn cleanup(&mut self, _engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Scene error propagated to the application level
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// Registry error propagated to the application level
    #[error("registry error: {0}")]
    Ecs(#[from] EcsError),

    /// Custom application error
    #[error("application error: {0}")]
    Custom(String),
}
