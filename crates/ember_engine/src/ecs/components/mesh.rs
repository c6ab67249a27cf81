//! Mesh component

use crate::ecs::Component;
use crate::render::mesh::MeshHandle;
use std::sync::atomic::{AtomicU32, Ordering};

static UNNAMED_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Reference to GPU-resident geometry
///
/// `enabled` hides/shows the mesh without detaching the component; the
/// geometry passes skip disabled meshes during enumeration.
#[derive(Debug, Clone)]
pub struct MeshComponent {
    /// Display name, used in diagnostics
    pub name: String,
    /// Handle into the mesh library
    pub mesh: MeshHandle,
    /// Whether the geometry passes draw this mesh
    pub enabled: bool,
}

impl Component for MeshComponent {}

impl MeshComponent {
    /// Create an enabled mesh component
    pub fn new(name: impl Into<String>, mesh: MeshHandle) -> Self {
        Self {
            name: name.into(),
            mesh,
            enabled: true,
        }
    }

    /// Create an enabled mesh component with a generated name
    pub fn unnamed(mesh: MeshHandle) -> Self {
        let tag = UNNAMED_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("mesh-{tag}"), mesh)
    }

    /// Builder: start disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}
