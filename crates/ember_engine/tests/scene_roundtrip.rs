//! Scene persistence round trip through the full lifecycle
//!
//! Runs load, start and stop against real files in the system temp
//! directory. Everything here is headless; no window or GPU is touched.

use std::path::PathBuf;

use approx::assert_relative_eq;

use ember_engine::prelude::*;
use ember_engine::scene::serial::{
    self, BodyDescription, BodyKind, ColliderShape, EntityDescription, MeshDescription,
    SceneDescription,
};
use ember_engine::scene::SceneState;

const EPSILON: f32 = 1e-5;

fn scene_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ember_engine_roundtrip_{tag}.ron"))
}

fn island_description() -> SceneDescription {
    SceneDescription {
        name: "island".to_string(),
        entities: vec![
            EntityDescription {
                transform: Some(Transform::from_translation(Vec3::new(0.0, -0.5, 0.0))),
                mesh: Some(MeshDescription {
                    shape: PrimitiveShape::Quad,
                    color: Vec3::new(0.4, 0.45, 0.35),
                    enabled: true,
                }),
                rigid_body: Some(BodyDescription {
                    kind: BodyKind::Fixed,
                    shape: ColliderShape::Cuboid {
                        half_width: 8.0,
                        half_height: 0.2,
                    },
                }),
                ..EntityDescription::named("ground")
            },
            EntityDescription {
                transform: Some(Transform::from_translation(Vec3::new(0.0, 2.0, 0.0))),
                script: Some("eruption".to_string()),
                children: vec![EntityDescription {
                    transform: Some(Transform::from_translation(Vec3::new(0.0, 1.5, 0.0))),
                    point_light: Some(PointLight::new(Vec3::new(1.0, 0.4, 0.1), 3.0, 0.15)),
                    ..EntityDescription::named("glow")
                }],
                ..EntityDescription::named("volcano")
            },
            EntityDescription {
                directional_light: Some(DirectionalLight::new(
                    Vec3::new(-0.4, -0.8, 0.45),
                    Vec3::new(1.0, 0.92, 0.78),
                    1.1,
                    0,
                )),
                ..EntityDescription::named("sun")
            },
        ],
    }
}

fn run_one_cycle(path: &PathBuf) {
    let mut meshes = MeshLibrary::new();
    let mut scene = Scene::new("island", path).unwrap();
    scene.load(&mut meshes).unwrap();
    scene.start().unwrap();
    scene.stop(&meshes).unwrap();
    assert_eq!(scene.state(), SceneState::Stopped);
}

#[test]
fn test_stopped_scene_reloads_equivalently() {
    let path = scene_path("reload");
    serial::save_scene(&path, &island_description()).unwrap();

    run_one_cycle(&path);

    let mut meshes = MeshLibrary::new();
    let mut scene = Scene::new("island", &path).unwrap();
    scene.load(&mut meshes).unwrap();
    let _ = std::fs::remove_file(&path);

    // Root plus the four described entities; the camera is runtime-only and
    // must not have leaked into the file.
    assert_eq!(scene.registry().entity_count(), 5);

    let ground = scene.dictionary().retrieve("island::ground").unwrap();
    let transform = scene.registry().get::<Transform>(ground).unwrap();
    assert_relative_eq!(
        transform.translation(),
        Vec3::new(0.0, -0.5, 0.0),
        epsilon = EPSILON
    );
    let mesh = scene.registry().get::<MeshComponent>(ground).unwrap();
    let data = meshes.get(mesh.mesh).unwrap();
    assert_relative_eq!(data.color(), Vec3::new(0.4, 0.45, 0.35), epsilon = EPSILON);

    let glow = scene.dictionary().retrieve("island::volcano::glow").unwrap();
    let light = scene.registry().get::<PointLight>(glow).unwrap();
    assert_relative_eq!(light.intensity, 3.0, epsilon = EPSILON);

    let sun = scene.dictionary().retrieve("island::sun").unwrap();
    let sunlight = scene.registry().get::<DirectionalLight>(sun).unwrap();
    assert_relative_eq!(sunlight.direction.norm(), 1.0, epsilon = EPSILON);
    assert_eq!(sunlight.shadow_pass, 0);

    let volcano = scene.dictionary().retrieve("island::volcano").unwrap();
    let script = scene.registry().get::<Script>(volcano).unwrap();
    assert_eq!(script.name(), "eruption");
}

#[test]
fn test_second_lifecycle_writes_identical_state() {
    let path = scene_path("stable");
    serial::save_scene(&path, &island_description()).unwrap();

    run_one_cycle(&path);
    let first = std::fs::read_to_string(&path).unwrap();

    run_one_cycle(&path);
    let second = std::fs::read_to_string(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(first, second);
}

#[test]
fn test_only_hierarchy_entities_persist() {
    let path = scene_path("spawned");
    serial::save_scene(&path, &island_description()).unwrap();

    let mut meshes = MeshLibrary::new();
    let mut scene = Scene::new("island", &path).unwrap();
    scene.load(&mut meshes).unwrap();
    scene.start().unwrap();

    // A named child joins the hierarchy and survives the save.
    let cairn = scene.spawn_under("island", "cairn").unwrap();
    let handle = meshes.load_primitive(PrimitiveShape::Cube, Vec3::new(0.5, 0.5, 0.5));
    scene
        .registry_mut()
        .attach(cairn, Transform::from_translation(Vec3::new(3.0, 0.0, 1.0)))
        .unwrap();
    scene
        .registry_mut()
        .attach(cairn, MeshComponent::new("cairn", handle))
        .unwrap();

    // A bare registry entity never reaches the file.
    let ghost = scene.registry_mut().create().unwrap();
    scene
        .registry_mut()
        .attach(ghost, Transform::identity())
        .unwrap();

    scene.stop(&meshes).unwrap();

    let description = serial::load_scene(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    let names: Vec<&str> = description
        .entities
        .iter()
        .map(|entity| entity.name.as_str())
        .collect();
    assert!(names.contains(&"cairn"));
    assert_eq!(description.entities.len(), 4);
}
