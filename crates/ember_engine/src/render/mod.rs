//! Deferred renderer
//!
//! API-independent pieces live at this level: the mesh library, per-frame
//! light gathering, UBO/push-constant layouts and the pass orchestrator.
//! Everything that touches Vulkan directly sits under [`vulkan`], and the
//! five render passes under [`systems`].

pub mod frame_info;
pub mod lighting;
pub mod mesh;
pub mod renderer;
pub mod systems;
pub mod ubo;
pub mod vulkan;

pub use frame_info::FrameInfo;
pub use lighting::FrameLights;
pub use mesh::{MeshHandle, MeshLibrary, PrimitiveShape, Vertex};
pub use renderer::Renderer;
pub use systems::{Overlay, OverlayQuad};
pub use ubo::{GlobalUbo, PushConstantData};

use thiserror::Error;

/// Errors surfaced by the renderer
#[derive(Debug, Error)]
pub enum RenderError {
    /// A Vulkan layer call failed
    #[error(transparent)]
    Vulkan(#[from] vulkan::VulkanError),

    /// Window layer failed
    #[error("window: {0}")]
    Window(String),

    /// Swapchain no longer matches the surface; recreate and retry
    #[error("swapchain out of date")]
    SwapchainOutOfDate,
}

/// Result alias for render operations
pub type RenderResult<T> = Result<T, RenderError>;
