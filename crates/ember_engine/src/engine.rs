//! Engine core: owns the window, renderer and scene, and runs the main loop

use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::application::Application;
use crate::config::EngineSettings;
use crate::events::{Event, Handled, InputState, KeyCode};
use crate::foundation::time::FrameClock;
use crate::render::{Overlay, RenderError, Renderer};
use crate::scene::{Scene, SceneError};
use crate::window::{Window, WindowError};

/// How long a paused engine sleeps between event polls
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Errors that can end the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Window or platform error
    #[error("window error: {0}")]
    Window(#[from] WindowError),

    /// Renderer error
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// Scene lifecycle error
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// Application hook error
    #[error("application error: {0}")]
    Application(String),
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Main engine struct
///
/// Subsystems the application works with directly are public; the window and
/// renderer stay behind the engine so their swapchain and pause bookkeeping
/// cannot be bypassed.
pub struct Engine {
    /// Active scene
    pub scene: Scene,

    /// Mesh library shared between the scene and the renderer
    pub meshes: crate::render::mesh::MeshLibrary,

    /// Held-key state sampled by the camera controller and scripts
    pub input: InputState,

    /// Screen-space overlay, rebuilt through [`Application::compose_overlay`]
    pub overlay: Overlay,

    // Renderer before window: the swapchain must go before the surface.
    renderer: Renderer,
    window: Window,
    clock: FrameClock,

    /// Set while the framebuffer has zero extent.
    paused: bool,
    /// Set when a resize means the swapchain no longer matches the surface.
    swapchain_stale: bool,
    running: bool,
}

impl Engine {
    /// Creates the window, renderer and an unloaded scene from settings.
    pub fn new(settings: &EngineSettings) -> EngineResult<Self> {
        log::info!("initializing engine");
        let mut window = Window::new(
            &settings.window.title,
            settings.window.width,
            settings.window.height,
        )?;
        let renderer = Renderer::new(&mut window, &settings.window.title, &settings.renderer)?;

        let scene_name = settings
            .scene
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("scene");
        let mut scene = Scene::new(scene_name, &settings.scene.path)?;
        scene.resize(window.aspect_ratio());

        Ok(Self {
            scene,
            meshes: crate::render::mesh::MeshLibrary::new(),
            input: InputState::new(),
            overlay: Overlay::new(),
            renderer,
            window,
            clock: FrameClock::new(),
            paused: false,
            swapchain_stale: false,
            running: true,
        })
    }

    /// Runs the main loop with the given application.
    ///
    /// Loads the scene, lets the application initialize, starts the scene,
    /// then loops: poll events, dispatch them through the engine, scene and
    /// application layers, update, render. A window close request or Escape
    /// breaks the loop; the scene is stopped and persisted before teardown.
    pub fn run<A: Application>(settings: EngineSettings, app: &mut A) -> EngineResult<()> {
        let mut engine = Self::new(&settings)?;

        engine.scene.load(&mut engine.meshes)?;
        app.initialize(&mut engine)
            .map_err(|err| EngineError::Application(format!("initialize: {err}")))?;
        engine.scene.start()?;

        log::info!("entering main loop");
        while engine.running && !engine.window.should_close() {
            engine.window.poll_events();
            for event in engine.window.drain_events() {
                engine.dispatch(&event, app);
            }

            if engine.paused {
                // Minimized: keep polling, skip simulation and rendering so
                // the frame clock does not accumulate the idle time.
                thread::sleep(PAUSE_POLL_INTERVAL);
                continue;
            }

            let dt = engine.clock.tick();
            engine.scene.on_update(dt, &engine.input)?;
            app.update(&mut engine, dt)
                .map_err(|err| EngineError::Application(format!("update: {err}")))?;

            engine.overlay.clear();
            app.compose_overlay(&mut engine);

            engine.draw(dt)?;
        }

        log::info!(
            "main loop ended after {} frames ({:.1} s)",
            engine.clock.frame_count(),
            engine.clock.total_time()
        );
        engine.renderer.wait_idle();
        engine.scene.stop(&engine.meshes)?;
        app.cleanup(&mut engine);
        Ok(())
    }

    /// Asks the main loop to end after the current frame.
    pub fn request_quit(&mut self) {
        self.running = false;
    }

    /// Current window size in screen coordinates
    pub fn window_size(&self) -> (u32, u32) {
        self.window.get_size()
    }

    /// Framebuffer aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        self.window.aspect_ratio()
    }

    /// Frames per second over the last frame
    pub fn fps(&self) -> f32 {
        self.clock.current_fps()
    }

    /// Seconds since the engine started ticking
    pub fn total_time(&self) -> f32 {
        self.clock.total_time()
    }

    fn dispatch<A: Application>(&mut self, event: &Event, app: &mut A) {
        self.input.observe(event);
        if self.handle_event(event) == Handled::Yes {
            return;
        }
        if self.scene.on_event(event) == Handled::Yes {
            return;
        }
        let _ = app.handle_event(self, event);
    }

    fn handle_event(&mut self, event: &Event) -> Handled {
        match *event {
            Event::WindowClose => {
                self.running = false;
                Handled::Yes
            }
            Event::KeyPressed {
                key: KeyCode::Escape,
                ..
            } => {
                self.running = false;
                Handled::Yes
            }
            Event::WindowResize { width, height } => {
                if width == 0 || height == 0 {
                    self.paused = true;
                } else {
                    self.paused = false;
                    self.swapchain_stale = true;
                }
                Handled::Yes
            }
            _ => Handled::No,
        }
    }

    fn draw(&mut self, dt: f32) -> EngineResult<()> {
        if self.swapchain_stale {
            self.recreate_surface()?;
            self.swapchain_stale = false;
        }

        self.renderer.release_unused_meshes(&self.meshes);

        let camera = self.scene.camera().clone();
        let outcome = self.renderer.draw_frame(
            self.scene.registry_mut(),
            &camera,
            &self.meshes,
            &self.overlay,
            dt,
        );
        match outcome {
            Ok(()) => Ok(()),
            Err(RenderError::SwapchainOutOfDate) => {
                // The frame was dropped; the next one renders at the new size.
                self.recreate_surface()
            }
            Err(err) => Err(err.into()),
        }
    }

    fn recreate_surface(&mut self) -> EngineResult<()> {
        self.renderer.recreate(&self.window)?;
        self.scene.resize(self.window.aspect_ratio());
        Ok(())
    }
}
