//! Application wiring for the volcano island

use ember_engine::prelude::*;

use crate::components::{EmberLight, Flicker, LavaRock};
use crate::scripts::{CraterFlicker, Eruption, OrbitLights};

const SMOKE_FRAMES: usize = 3;
const HUD_PANEL: [f32; 4] = [0.05, 0.05, 0.08, 0.65];
const HUD_BAR: [f32; 4] = [0.35, 0.85, 0.4, 0.9];
const HUD_PIP: [f32; 4] = [1.0, 0.45, 0.1, 0.9];

fn camera_home() -> Vec3 {
    Vec3::new(0.0, 1.0, -4.0)
}

fn crater_vent() -> Vec3 {
    Vec3::new(0.0, 3.4, 0.0)
}

/// The island demo: binds scene scripts, owns the HUD, handles game keys.
pub struct CalderaApp {
    hud_visible: bool,
    smoothed_fps: f32,
}

impl CalderaApp {
    /// Creates the app with the HUD shown.
    pub fn new() -> Self {
        Self {
            hud_visible: true,
            smoothed_fps: 0.0,
        }
    }

    /// Attaches a behavior to every script slot the scene file declares.
    fn bind_scripts(&self, engine: &mut Engine, rock_mesh: MeshHandle) {
        let scripted: Vec<(Entity, String)> = engine
            .scene
            .registry()
            .iter::<Script>()
            .map(|(entity, script)| (entity, script.name().to_string()))
            .collect();

        for (entity, name) in scripted {
            let behavior: Option<Box<dyn NativeScript>> = match name.as_str() {
                "eruption" => Some(Box::new(Eruption::new(crater_vent(), rock_mesh, 6.0, 5))),
                "orbit_lights" => Some(Box::new(OrbitLights::new(Vec3::zeros(), 3.2, 4.0, 0.6))),
                "crater_flicker" => Some(Box::new(CraterFlicker::new())),
                _ => None,
            };

            match behavior {
                Some(behavior) => {
                    if let Ok(script) = engine.scene.registry_mut().get_mut::<Script>(entity) {
                        script.bind(behavior);
                        log::debug!("bound script '{name}' on {entity}");
                    }
                }
                None => log::warn!("scene names script '{name}' but the game has no such behavior"),
            }
        }
    }

    /// Builds the pulsing smoke column above the crater.
    ///
    /// The puff entities persist in the scene file across runs; only the
    /// animation component has to be rebuilt every launch.
    fn raise_smoke(&self, engine: &mut Engine) -> Result<(), AppError> {
        let mut frames = Vec::new();
        for index in 0..SMOKE_FRAMES {
            let name = format!("puff{index}");
            let long_name = format!("volcano_island::volcano::{name}");
            let entity = match engine.scene.dictionary().retrieve(&long_name) {
                Some(existing) => existing,
                None => {
                    let entity = engine.scene.spawn_under("volcano_island::volcano", &name)?;
                    let spread = 1.2 + 0.5 * index as f32;
                    let handle = engine
                        .meshes
                        .load_primitive(PrimitiveShape::Quad, Vec3::new(0.45, 0.44, 0.46));
                    let mut transform =
                        Transform::from_translation(Vec3::new(0.0, 4.1 + 0.45 * index as f32, 0.0));
                    transform.set_scale(Vec3::new(spread, 1.0, spread));
                    engine.scene.registry_mut().attach(entity, transform)?;
                    let mut mesh = MeshComponent::new(name.clone(), handle);
                    mesh.enabled = index == 0;
                    engine.scene.registry_mut().attach(entity, mesh)?;
                    entity
                }
            };
            frames.push(entity);
        }

        let animator = match engine
            .scene
            .dictionary()
            .retrieve("volcano_island::volcano::smoke")
        {
            Some(existing) => existing,
            None => engine.scene.spawn_under("volcano_island::volcano", "smoke")?,
        };
        engine
            .scene
            .registry_mut()
            .attach(animator, SpriteAnimation::new(frames, 0.4))?;
        Ok(())
    }

    /// Tags the rig's lights so the orbit script picks them up.
    fn tag_ember_lights(engine: &mut Engine) -> Result<(), AppError> {
        for index in 0..3 {
            let long_name = format!("volcano_island::light_rig::ember{index}");
            match engine.scene.dictionary().retrieve(&long_name) {
                Some(entity) => {
                    engine.scene.registry_mut().attach(entity, EmberLight)?;
                }
                None => log::warn!("missing ember light '{long_name}'"),
            }
        }
        Ok(())
    }

    fn reset_camera(engine: &mut Engine) {
        let Some(camera_entity) = engine.scene.camera_entity() else {
            return;
        };
        if let Ok(transform) = engine.scene.registry_mut().get_mut::<Transform>(camera_entity) {
            transform.set_translation(camera_home());
            transform.set_rotation(Vec3::zeros());
        }
        engine.scene.controller_mut().reset_zoom();
        let fov_y = engine.scene.controller_mut().fov_y();
        engine.scene.camera_mut().set_fov_y(fov_y);
        log::debug!("camera reset");
    }
}

impl Default for CalderaApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Application for CalderaApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let rock_mesh = engine
            .meshes
            .load_primitive(PrimitiveShape::Sphere, Vec3::new(0.85, 0.25, 0.05));

        self.bind_scripts(engine, rock_mesh);
        Self::tag_ember_lights(engine)?;
        self.raise_smoke(engine)?;

        // The crater glow carries its wobble parameters as a component.
        if let Some(glow) = engine
            .scene
            .dictionary()
            .retrieve("volcano_island::crater_glow")
        {
            engine.scene.registry_mut().attach(glow, Flicker::default())?;
        }

        engine.scene.controller_mut().move_speed = 5.0;
        log::info!("island initialized");
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, dt: f32) -> Result<(), AppError> {
        let instant = engine.fps();
        let blend = dt / (dt + 0.25);
        self.smoothed_fps += (instant - self.smoothed_fps) * blend;
        Ok(())
    }

    fn handle_event(&mut self, engine: &mut Engine, event: &Event) -> Handled {
        match *event {
            Event::KeyPressed {
                key: KeyCode::R, ..
            } => {
                Self::reset_camera(engine);
                Handled::Yes
            }
            Event::KeyPressed {
                key: KeyCode::G, ..
            } => {
                self.hud_visible = !self.hud_visible;
                Handled::Yes
            }
            _ => Handled::No,
        }
    }

    fn compose_overlay(&mut self, engine: &mut Engine) {
        if !self.hud_visible {
            return;
        }
        let rocks = engine.scene.registry().iter::<LavaRock>().count();

        engine
            .overlay
            .push(OverlayQuad::new(12.0, 12.0, 220.0, 48.0, HUD_PANEL));

        // Frame-rate bar, full at 120 fps.
        let ratio = (self.smoothed_fps / 120.0).clamp(0.0, 1.0);
        engine
            .overlay
            .push(OverlayQuad::new(18.0, 18.0, 208.0 * ratio, 14.0, HUD_BAR));

        // One pip per airborne rock.
        for index in 0..rocks.min(24) {
            engine.overlay.push(OverlayQuad::new(
                18.0 + index as f32 * 8.5,
                40.0,
                6.0,
                14.0,
                HUD_PIP,
            ));
        }
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!("caldera shut down after {:.1} s", engine.total_time());
    }
}
