//! Scene file serialization
//!
//! Scenes persist as RON. The file mirrors the hierarchy: entities nest
//! their children, components are optional fields. `load` runs before the
//! registry is touched; [`SceneDescription::from_scene`] rebuilds a
//! description from live state so `stop` can write the file back.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::components::{DirectionalLight, MeshComponent, PointLight, Transform};
use crate::ecs::{Component, Registry};
use crate::foundation::math::Vec3;
use crate::render::mesh::{MeshLibrary, PrimitiveShape};
use crate::scene::script::Script;
use crate::scene::tree::TreeNode;
use crate::scene::SceneResult;

fn default_enabled() -> bool {
    true
}

/// Serialized form of a whole scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Scene name; becomes the hierarchy root's name
    pub name: String,
    /// Top-level entities, children nested inside
    pub entities: Vec<EntityDescription>,
}

/// Serialized form of one entity and its subtree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescription {
    /// Node name; must be unique among siblings
    pub name: String,
    /// World-space transform
    #[serde(default)]
    pub transform: Option<Transform>,
    /// Mesh recipe
    #[serde(default)]
    pub mesh: Option<MeshDescription>,
    /// Point light parameters
    #[serde(default)]
    pub point_light: Option<PointLight>,
    /// Directional light parameters
    #[serde(default)]
    pub directional_light: Option<DirectionalLight>,
    /// Script behavior name, bound by the game after load
    #[serde(default)]
    pub script: Option<String>,
    /// Physics body recipe
    #[serde(default)]
    pub rigid_body: Option<BodyDescription>,
    /// Child entities
    #[serde(default)]
    pub children: Vec<EntityDescription>,
}

impl EntityDescription {
    /// Creates a description with just a name; components default to none.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: None,
            mesh: None,
            point_light: None,
            directional_light: None,
            script: None,
            rigid_body: None,
            children: Vec::new(),
        }
    }
}

/// Mesh recipe: which primitive, what color
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshDescription {
    /// Primitive to generate
    pub shape: PrimitiveShape,
    /// Vertex color
    pub color: Vec3,
    /// Whether the mesh starts enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// How a rapier body moves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BodyKind {
    /// Immovable
    Fixed,
    /// Fully simulated
    Dynamic,
}

/// Collider geometry in the XY physics plane
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum ColliderShape {
    /// Axis-aligned box given by half extents
    Cuboid {
        /// Half width along X
        half_width: f32,
        /// Half height along Y
        half_height: f32,
    },
    /// Circle
    Ball {
        /// Radius
        radius: f32,
    },
}

/// Physics body recipe; also kept attached at runtime so saving a scene
/// can write the recipe back out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BodyDescription {
    /// Body mobility
    pub kind: BodyKind,
    /// Collider geometry
    pub shape: ColliderShape,
}

impl Component for BodyDescription {}

/// Reads and parses a scene file.
pub fn load_scene(path: &Path) -> SceneResult<SceneDescription> {
    let text = fs::read_to_string(path)?;
    let description = ron::from_str(&text)?;
    Ok(description)
}

/// Serializes `description` and writes it to `path`.
pub fn save_scene(path: &Path, description: &SceneDescription) -> SceneResult<()> {
    let pretty = ron::ser::PrettyConfig::new().depth_limit(8);
    let text = ron::ser::to_string_pretty(description, pretty)?;
    fs::write(path, text)?;
    Ok(())
}

impl SceneDescription {
    /// Rebuilds a description from a live scene.
    ///
    /// Components that cannot be represented in the file (bound script
    /// behaviors, physics handles) collapse to their serializable parts.
    /// Entities created at runtime appear in the output as long as they
    /// were inserted into the hierarchy.
    pub fn from_scene(root: &TreeNode, registry: &Registry, meshes: &MeshLibrary) -> Self {
        Self {
            name: root.name().to_string(),
            entities: root
                .children()
                .iter()
                .map(|child| describe_node(child, registry, meshes))
                .collect(),
        }
    }
}

fn describe_node(node: &TreeNode, registry: &Registry, meshes: &MeshLibrary) -> EntityDescription {
    let entity = node.entity();
    let mesh = registry.get::<MeshComponent>(entity).ok().map(|component| {
        let (shape, color) = meshes
            .get(component.mesh)
            .map_or((PrimitiveShape::Cube, Vec3::zeros()), |data| {
                (data.shape(), data.color())
            });
        MeshDescription {
            shape,
            color,
            enabled: component.enabled,
        }
    });

    EntityDescription {
        name: node.name().to_string(),
        transform: registry.get::<Transform>(entity).ok().cloned(),
        mesh,
        point_light: registry.get::<PointLight>(entity).ok().cloned(),
        directional_light: registry.get::<DirectionalLight>(entity).ok().cloned(),
        script: registry
            .get::<Script>(entity)
            .ok()
            .map(|script| script.name().to_string()),
        rigid_body: registry.get::<BodyDescription>(entity).ok().copied(),
        children: node
            .children()
            .iter()
            .map(|child| describe_node(child, registry, meshes))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::dictionary::Dictionary;

    fn sample_description() -> SceneDescription {
        SceneDescription {
            name: "caldera".to_string(),
            entities: vec![
                EntityDescription {
                    transform: Some(Transform::from_translation(Vec3::new(0.0, -1.0, 0.0))),
                    mesh: Some(MeshDescription {
                        shape: PrimitiveShape::Quad,
                        color: Vec3::new(0.3, 0.25, 0.2),
                        enabled: true,
                    }),
                    rigid_body: Some(BodyDescription {
                        kind: BodyKind::Fixed,
                        shape: ColliderShape::Cuboid {
                            half_width: 50.0,
                            half_height: 0.05,
                        },
                    }),
                    ..EntityDescription::named("island")
                },
                EntityDescription {
                    transform: Some(Transform::from_translation(Vec3::new(0.0, 0.0, -18.0))),
                    script: Some("fire_volcano".to_string()),
                    children: vec![EntityDescription {
                        point_light: Some(PointLight::new(
                            Vec3::new(1.0, 0.4, 0.1),
                            5.0,
                            0.2,
                        )),
                        ..EntityDescription::named("glow")
                    }],
                    ..EntityDescription::named("volcano")
                },
            ],
        }
    }

    #[test]
    fn test_scene_file_round_trips() {
        let description = sample_description();
        let path = std::env::temp_dir().join("ember_engine_serial_round_trip.scene.ron");

        save_scene(&path, &description).unwrap();
        let loaded = load_scene(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.name, description.name);
        assert_eq!(loaded.entities.len(), 2);
        assert_eq!(loaded.entities[1].children.len(), 1);
        assert_eq!(
            loaded.entities[0].rigid_body,
            description.entities[0].rigid_body
        );
        assert_eq!(
            loaded.entities[1].script.as_deref(),
            Some("fire_volcano")
        );
    }

    #[test]
    fn test_missing_component_fields_default_to_none() {
        let text = r#"(
            name: "minimal",
            entities: [
                (name: "empty"),
            ],
        )"#;
        let description: SceneDescription = ron::from_str(text).unwrap();

        assert_eq!(description.entities.len(), 1);
        let entity = &description.entities[0];
        assert!(entity.transform.is_none());
        assert!(entity.mesh.is_none());
        assert!(entity.children.is_empty());
    }

    #[test]
    fn test_from_scene_reflects_the_hierarchy_and_components() {
        let mut registry = Registry::new();
        let mut meshes = MeshLibrary::new();
        let mut dictionary = Dictionary::new();

        let root_entity = registry.create().unwrap();
        let mut root = TreeNode::root(root_entity, "caldera");

        let rock = registry.create().unwrap();
        let handle = meshes.load_primitive(PrimitiveShape::Sphere, Vec3::new(0.4, 0.4, 0.4));
        registry
            .attach(rock, Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        registry.attach(rock, MeshComponent::new("rock", handle)).unwrap();
        root.add_child(rock, "rock", &mut dictionary).unwrap();

        let description = SceneDescription::from_scene(&root, &registry, &meshes);

        assert_eq!(description.name, "caldera");
        assert_eq!(description.entities.len(), 1);
        let rock_description = &description.entities[0];
        assert_eq!(rock_description.name, "rock");
        let mesh = rock_description.mesh.as_ref().unwrap();
        assert_eq!(mesh.shape, PrimitiveShape::Sphere);
        assert!(mesh.enabled);
        assert!(rock_description.point_light.is_none());
    }
}
