//! Built-in component types

pub mod animation;
pub mod lighting;
pub mod mesh;
pub mod transform;

pub use animation::SpriteAnimation;
pub use lighting::{DirectionalLight, PointLight};
pub use mesh::MeshComponent;
pub use transform::Transform;
