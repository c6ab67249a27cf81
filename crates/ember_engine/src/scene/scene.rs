//! Scene lifecycle and per-frame update
//!
//! A scene moves through `Unloaded -> Loaded -> Running -> Stopped`. `load`
//! instantiates the scene file into the registry and hierarchy, `start`
//! creates runtime-only entities and fires script start hooks, `on_update`
//! runs scripts, sprite animation, the camera controller and physics in that
//! order, and `stop` writes live state back to the scene file.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::ecs::components::{MeshComponent, SpriteAnimation, Transform};
use crate::ecs::{Entity, Registry};
use crate::events::{Event, Handled, InputState};
use crate::foundation::math::{Vec2, Vec3};
use crate::physics::{ColliderBuilder, PhysicsWorld2D, RigidBody2D, RigidBodyBuilder};
use crate::render::mesh::MeshLibrary;
use crate::scene::camera::Camera;
use crate::scene::camera_controller::CameraController;
use crate::scene::dictionary::Dictionary;
use crate::scene::script::{Script, ScriptContext};
use crate::scene::serial::{
    self, BodyDescription, BodyKind, ColliderShape, EntityDescription, SceneDescription,
};
use crate::scene::tree::{self, TreeNode};
use crate::scene::{SceneError, SceneResult};

/// Lifecycle states of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    /// Constructed; the registry is empty apart from the hierarchy root.
    Unloaded,
    /// Scene file instantiated into the registry.
    Loaded,
    /// Start hooks have run; updates are accepted.
    Running,
    /// Stopped and persisted; terminal.
    Stopped,
}

/// A scene: registry, hierarchy, camera, physics and lifecycle state
pub struct Scene {
    name: String,
    path: PathBuf,
    state: SceneState,
    registry: Registry,
    root: TreeNode,
    dictionary: Dictionary,
    camera: Camera,
    camera_entity: Option<Entity>,
    controller: CameraController,
    physics: PhysicsWorld2D,
    warned_unbound: HashSet<Entity>,
}

impl Scene {
    /// Creates an unloaded scene backed by the given scene file.
    ///
    /// The hierarchy root entity is created here; everything else waits for
    /// [`Scene::load`].
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> SceneResult<Self> {
        let name = name.into();
        let mut registry = Registry::new();
        let root_entity = registry.create()?;
        let root = TreeNode::root(root_entity, name.clone());
        Ok(Self {
            name,
            path: path.into(),
            state: SceneState::Unloaded,
            registry,
            root,
            dictionary: Dictionary::new(),
            camera: Camera::new(),
            camera_entity: None,
            controller: CameraController::new(),
            physics: PhysicsWorld2D::new(),
            warned_unbound: HashSet::new(),
        })
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> SceneState {
        self.state
    }

    /// True while updates are accepted.
    pub fn is_running(&self) -> bool {
        self.state == SceneState::Running
    }

    /// Entity registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Entity registry, mutably
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Long-name lookup
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Hierarchy root
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Render camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Render camera, mutably
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Camera entity, once [`Scene::start`] created it
    pub fn camera_entity(&self) -> Option<Entity> {
        self.camera_entity
    }

    /// Keyboard camera controller, mutably
    pub fn controller_mut(&mut self) -> &mut CameraController {
        &mut self.controller
    }

    /// Physics world, mutably
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld2D {
        &mut self.physics
    }

    /// Creates an entity and inserts it under `parent_path` in one step.
    ///
    /// The usual way for game code to add runtime entities that should be
    /// addressable by long name and included when the scene is saved.
    pub fn spawn_under(
        &mut self,
        parent_path: &str,
        name: &str,
    ) -> SceneResult<Entity> {
        let entity = self.registry.create()?;
        match self
            .root
            .add_child_at(parent_path, entity, name, &mut self.dictionary)
        {
            Ok(_) => Ok(entity),
            Err(err) => {
                // Keep the registry consistent with the hierarchy.
                let _ = self.registry.destroy(entity);
                Err(err)
            }
        }
    }

    /// Instantiates the scene file into the registry and hierarchy.
    ///
    /// Meshes are generated into `meshes`; physics bodies are created for
    /// entities with a body recipe. Fails with [`SceneError::AlreadyLoaded`]
    /// when called on anything but an unloaded scene, leaving earlier state
    /// untouched.
    pub fn load(&mut self, meshes: &mut MeshLibrary) -> SceneResult<()> {
        if self.state != SceneState::Unloaded {
            return Err(SceneError::AlreadyLoaded(self.name.clone()));
        }
        let description = serial::load_scene(&self.path)?;
        log::info!(
            "loading scene '{}' from {}",
            description.name,
            self.path.display()
        );

        for entity_description in &description.entities {
            instantiate(
                entity_description,
                &mut self.root,
                &mut self.registry,
                &mut self.dictionary,
                &mut self.physics,
                meshes,
            )?;
        }

        self.state = SceneState::Loaded;
        log::info!(
            "scene '{}' loaded: {} entities, {} named nodes",
            self.name,
            self.registry.entity_count(),
            self.dictionary.len()
        );
        Ok(())
    }

    /// Creates runtime-only entities and runs every script's start hook
    /// exactly once, then accepts updates.
    ///
    /// The order start hooks run in across entities follows registry
    /// iteration order and is unspecified. After the hooks, the hierarchy
    /// and dictionary are logged at debug severity.
    pub fn start(&mut self) -> SceneResult<()> {
        if self.state != SceneState::Loaded {
            return Err(SceneError::InvalidState {
                name: self.name.clone(),
                state: self.state,
                expected: SceneState::Loaded,
            });
        }

        let camera_entity = self.registry.create()?;
        self.registry
            .attach(camera_entity, Transform::from_translation(Vec3::new(0.0, 1.0, -4.0)))?;
        self.camera_entity = Some(camera_entity);
        self.sync_camera();

        self.run_scripts(0.0, ScriptPhase::Start);

        self.state = SceneState::Running;
        log::info!("scene '{}' running", self.name);
        tree::log_tree(&self.root);
        self.dictionary.list();
        Ok(())
    }

    /// Advances the scene by `dt` seconds.
    ///
    /// Runs script update hooks, steps sprite animations, applies the camera
    /// controller, then steps physics and writes body isometries back into
    /// transforms.
    pub fn on_update(&mut self, dt: f32, input: &InputState) -> SceneResult<()> {
        if self.state != SceneState::Running {
            return Err(SceneError::InvalidState {
                name: self.name.clone(),
                state: self.state,
                expected: SceneState::Running,
            });
        }

        self.run_scripts(dt, ScriptPhase::Update);
        self.advance_animations(dt);

        if let Some(camera_entity) = self.camera_entity {
            if let Ok(transform) = self.registry.get_mut::<Transform>(camera_entity) {
                self.controller.move_in_plane_xz(input, dt, transform);
            }
            self.sync_camera();
        }

        self.physics.step(dt);
        self.physics.sync_transforms(&mut self.registry);
        Ok(())
    }

    /// Reacts to window and input events the scene cares about.
    ///
    /// Scroll adjusts the camera zoom. Everything else passes through.
    pub fn on_event(&mut self, event: &Event) -> Handled {
        match *event {
            Event::MouseScrolled { dy, .. } => {
                self.controller.zoom(dy);
                self.camera.set_fov_y(self.controller.fov_y());
                Handled::Yes
            }
            _ => Handled::No,
        }
    }

    /// Rebuilds the camera projection for a new aspect ratio.
    pub fn resize(&mut self, aspect: f32) {
        self.camera.set_aspect_ratio(aspect);
    }

    /// Stops the scene and writes its live state back to the scene file.
    pub fn stop(&mut self, meshes: &MeshLibrary) -> SceneResult<()> {
        if self.state != SceneState::Running {
            return Err(SceneError::InvalidState {
                name: self.name.clone(),
                state: self.state,
                expected: SceneState::Running,
            });
        }

        let description = SceneDescription::from_scene(&self.root, &self.registry, meshes);
        serial::save_scene(&self.path, &description)?;
        self.state = SceneState::Stopped;
        log::info!(
            "scene '{}' stopped, state saved to {}",
            self.name,
            self.path.display()
        );
        Ok(())
    }

    fn sync_camera(&mut self) {
        let Some(camera_entity) = self.camera_entity else {
            return;
        };
        if let Ok(transform) = self.registry.get::<Transform>(camera_entity) {
            let (translation, rotation) = (transform.translation(), transform.rotation());
            self.camera.set_view_yxz(translation, rotation);
        }
    }

    fn run_scripts(&mut self, dt: f32, phase: ScriptPhase) {
        let scripted: Vec<Entity> = self
            .registry
            .iter::<Script>()
            .map(|(entity, _)| entity)
            .collect();

        for entity in scripted {
            // A hook that ran earlier this pass may have destroyed this
            // entity or removed its script.
            let behavior = match self.registry.get_mut::<Script>(entity) {
                Ok(script) => script.take_behavior(),
                Err(_) => continue,
            };

            match behavior {
                Some(mut behavior) => {
                    let mut ctx = ScriptContext {
                        entity,
                        registry: &mut self.registry,
                        dictionary: &self.dictionary,
                        physics: &mut self.physics,
                        dt,
                    };
                    match phase {
                        ScriptPhase::Start => behavior.on_start(&mut ctx),
                        ScriptPhase::Update => behavior.on_update(&mut ctx),
                    }
                    if let Ok(script) = self.registry.get_mut::<Script>(entity) {
                        script.put_behavior(behavior);
                    }
                }
                None => {
                    if self.warned_unbound.insert(entity) {
                        let long_name = self.dictionary.long_name(entity).unwrap_or("<unnamed>");
                        log::warn!("no behavior bound for script on {entity}, '{long_name}'");
                    }
                }
            }
        }
    }

    fn advance_animations(&mut self, dt: f32) {
        let animated: Vec<Entity> = self
            .registry
            .iter::<SpriteAnimation>()
            .map(|(entity, _)| entity)
            .collect();

        for entity in animated {
            let change = match self.registry.get_mut::<SpriteAnimation>(entity) {
                Ok(animation) => animation.advance(dt).map(|index| (animation.frames.clone(), index)),
                Err(_) => continue,
            };
            let Some((frames, current)) = change else {
                continue;
            };
            for (index, frame) in frames.iter().enumerate() {
                if let Ok(mesh) = self.registry.get_mut::<MeshComponent>(*frame) {
                    mesh.enabled = index == current;
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum ScriptPhase {
    Start,
    Update,
}

fn instantiate(
    description: &EntityDescription,
    parent: &mut TreeNode,
    registry: &mut Registry,
    dictionary: &mut Dictionary,
    physics: &mut PhysicsWorld2D,
    meshes: &mut MeshLibrary,
) -> SceneResult<()> {
    let entity = registry.create()?;

    if let Some(transform) = &description.transform {
        registry.attach(entity, transform.clone())?;
    }
    if let Some(mesh) = &description.mesh {
        let handle = meshes.load_primitive(mesh.shape, mesh.color);
        let mut component = MeshComponent::new(description.name.clone(), handle);
        component.enabled = mesh.enabled;
        registry.attach(entity, component)?;
    }
    if let Some(point_light) = &description.point_light {
        registry.attach(entity, point_light.clone())?;
    }
    if let Some(directional_light) = &description.directional_light {
        registry.attach(entity, directional_light.clone())?;
    }
    if let Some(script) = &description.script {
        registry.attach(entity, Script::unbound(script.clone()))?;
    }
    if let Some(body) = description.rigid_body {
        let translation = description
            .transform
            .as_ref()
            .map_or_else(Vec3::zeros, Transform::translation);
        attach_body(entity, body, translation, registry, physics)?;
    }

    let node = parent.add_child(entity, description.name.clone(), dictionary)?;
    for child in &description.children {
        instantiate(child, node, registry, dictionary, physics, meshes)?;
    }
    Ok(())
}

fn attach_body(
    entity: Entity,
    body: BodyDescription,
    translation: Vec3,
    registry: &mut Registry,
    physics: &mut PhysicsWorld2D,
) -> SceneResult<()> {
    let builder = match body.kind {
        BodyKind::Fixed => RigidBodyBuilder::fixed(),
        BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
    };
    let handle = physics.add_body(
        builder
            .translation(Vec2::new(translation.x, translation.y))
            .build(),
    );
    let collider = match body.shape {
        ColliderShape::Cuboid {
            half_width,
            half_height,
        } => ColliderBuilder::cuboid(half_width, half_height),
        ColliderShape::Ball { radius } => ColliderBuilder::ball(radius),
    };
    physics.add_collider(collider.build(), handle);

    registry.attach(entity, body)?;
    registry.attach(entity, RigidBody2D(handle))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::PointLight;
    use crate::render::mesh::PrimitiveShape;
    use crate::scene::script::NativeScript;
    use crate::scene::serial::MeshDescription;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn write_scene_file(tag: &str, description: &SceneDescription) -> PathBuf {
        let path = std::env::temp_dir().join(format!("ember_engine_scene_{tag}.ron"));
        serial::save_scene(&path, description).unwrap();
        path
    }

    fn two_entity_description() -> SceneDescription {
        SceneDescription {
            name: "caldera".to_string(),
            entities: vec![
                EntityDescription {
                    transform: Some(Transform::from_translation(Vec3::new(0.0, -1.0, 0.0))),
                    mesh: Some(MeshDescription {
                        shape: PrimitiveShape::Quad,
                        color: Vec3::new(0.3, 0.3, 0.3),
                        enabled: true,
                    }),
                    ..EntityDescription::named("island")
                },
                EntityDescription {
                    transform: Some(Transform::from_translation(Vec3::new(0.0, 2.0, -5.0))),
                    children: vec![EntityDescription {
                        point_light: Some(PointLight::default()),
                        transform: Some(Transform::identity()),
                        ..EntityDescription::named("glow")
                    }],
                    ..EntityDescription::named("volcano")
                },
            ],
        }
    }

    #[test]
    fn test_load_builds_registry_hierarchy_and_dictionary() {
        let path = write_scene_file("load", &two_entity_description());
        let mut meshes = MeshLibrary::new();
        let mut scene = Scene::new("caldera", &path).unwrap();

        scene.load(&mut meshes).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(scene.state(), SceneState::Loaded);
        // Root + three described entities.
        assert_eq!(scene.registry().entity_count(), 4);
        assert_eq!(meshes.len(), 1);

        let island = scene.dictionary().retrieve("caldera::island").unwrap();
        assert!(scene.registry().get::<MeshComponent>(island).is_ok());
        let glow = scene
            .dictionary()
            .retrieve("caldera::volcano::glow")
            .unwrap();
        assert!(scene.registry().get::<PointLight>(glow).is_ok());
    }

    #[test]
    fn test_second_load_is_rejected_and_state_survives() {
        let path = write_scene_file("double_load", &two_entity_description());
        let mut meshes = MeshLibrary::new();
        let mut scene = Scene::new("caldera", &path).unwrap();

        scene.load(&mut meshes).unwrap();
        let count_before = scene.registry().entity_count();
        let result = scene.load(&mut meshes);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(SceneError::AlreadyLoaded(_))));
        assert_eq!(scene.registry().entity_count(), count_before);
        assert_eq!(scene.state(), SceneState::Loaded);
    }

    #[test]
    fn test_start_before_load_is_rejected() {
        let mut scene = Scene::new("caldera", "does_not_matter.ron").unwrap();
        assert!(matches!(
            scene.start(),
            Err(SceneError::InvalidState { .. })
        ));
    }

    struct CountingScript {
        starts: Arc<AtomicU32>,
        updates: Arc<AtomicU32>,
    }

    impl NativeScript for CountingScript {
        fn on_start(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_update(&mut self, _ctx: &mut ScriptContext<'_>) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_start_runs_each_script_hook_exactly_once() {
        let path = write_scene_file("scripts", &two_entity_description());
        let mut meshes = MeshLibrary::new();
        let mut scene = Scene::new("caldera", &path).unwrap();
        scene.load(&mut meshes).unwrap();
        let _ = std::fs::remove_file(&path);

        let starts = Arc::new(AtomicU32::new(0));
        let updates = Arc::new(AtomicU32::new(0));
        let scripted = scene.spawn_under("caldera", "director").unwrap();
        scene
            .registry_mut()
            .attach(
                scripted,
                Script::new(
                    "director",
                    Box::new(CountingScript {
                        starts: Arc::clone(&starts),
                        updates: Arc::clone(&updates),
                    }),
                ),
            )
            .unwrap();

        scene.start().unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(updates.load(Ordering::SeqCst), 0);

        scene.on_update(0.016, &InputState::new()).unwrap();
        scene.on_update(0.016, &InputState::new()).unwrap();
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(updates.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unbound_scripts_warn_but_do_not_fail() {
        let path = write_scene_file("unbound", &two_entity_description());
        let mut meshes = MeshLibrary::new();
        let mut scene = Scene::new("caldera", &path).unwrap();
        scene.load(&mut meshes).unwrap();
        let _ = std::fs::remove_file(&path);

        let orphan = scene.spawn_under("caldera", "orphan").unwrap();
        scene
            .registry_mut()
            .attach(orphan, Script::unbound("missing"))
            .unwrap();

        scene.start().unwrap();
        scene.on_update(0.016, &InputState::new()).unwrap();
        assert!(scene.is_running());
    }

    #[test]
    fn test_sprite_animation_toggles_exactly_one_frame_mesh() {
        let path = write_scene_file("sprites", &two_entity_description());
        let mut meshes = MeshLibrary::new();
        let mut scene = Scene::new("caldera", &path).unwrap();
        scene.load(&mut meshes).unwrap();
        let _ = std::fs::remove_file(&path);

        let mut frames = Vec::new();
        for index in 0..3 {
            let frame = scene
                .spawn_under("caldera", &format!("smoke{index}"))
                .unwrap();
            let handle = meshes.load_primitive(PrimitiveShape::Quad, Vec3::zeros());
            let mut component = MeshComponent::new(format!("smoke{index}"), handle);
            component.enabled = index == 0;
            scene.registry_mut().attach(frame, component).unwrap();
            frames.push(frame);
        }
        let animator = scene.spawn_under("caldera", "smoke").unwrap();
        scene
            .registry_mut()
            .attach(animator, SpriteAnimation::new(frames.clone(), 0.1))
            .unwrap();

        scene.start().unwrap();
        scene.on_update(0.15, &InputState::new()).unwrap();

        let enabled: Vec<bool> = frames
            .iter()
            .map(|frame| {
                scene
                    .registry()
                    .get::<MeshComponent>(*frame)
                    .unwrap()
                    .enabled
            })
            .collect();
        assert_eq!(enabled.iter().filter(|&&e| e).count(), 1);
        assert!(enabled[1]);
    }

    #[test]
    fn test_stop_persists_runtime_changes() {
        let path = write_scene_file("stop", &two_entity_description());
        let mut meshes = MeshLibrary::new();
        let mut scene = Scene::new("caldera", &path).unwrap();
        scene.load(&mut meshes).unwrap();
        scene.start().unwrap();

        let spawned = scene.spawn_under("caldera", "runtime_rock").unwrap();
        scene
            .registry_mut()
            .attach(spawned, Transform::from_translation(Vec3::new(7.0, 0.0, 7.0)))
            .unwrap();

        scene.stop(&meshes).unwrap();
        assert_eq!(scene.state(), SceneState::Stopped);

        let description = serial::load_scene(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(description
            .entities
            .iter()
            .any(|entity| entity.name == "runtime_rock"));
    }

    #[test]
    fn test_scroll_zoom_is_consumed_and_narrows_the_fov() {
        let mut scene = Scene::new("caldera", "unused.ron").unwrap();
        let before = scene.camera().projection()[(1, 1)];

        let handled = scene.on_event(&Event::MouseScrolled { dx: 0.0, dy: 2.0 });

        assert_eq!(handled, Handled::Yes);
        assert!(scene.camera().projection()[(1, 1)] > before);
    }
}
