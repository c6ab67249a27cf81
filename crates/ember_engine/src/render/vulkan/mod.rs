//! Vulkan wrappers
//!
//! Thin RAII types over raw `ash` handles. Each wrapper owns exactly the
//! handles it creates and destroys them in its `Drop`; parents (instance,
//! device) must therefore be declared after their children in any struct
//! that owns both, so fields drop child-first.

pub mod buffer;
pub mod commands;
pub mod context;
pub mod descriptor;
pub mod device;
pub mod framebuffer;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;

pub use buffer::{Buffer, IndexBuffer, UniformBuffer, VertexBuffer};
pub use commands::{ActiveRenderPass, CommandPool, CommandRecorder};
pub use context::VulkanContext;
pub use descriptor::{
    DescriptorPool, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorSetWriter, Sampler,
};
pub use device::{LogicalDevice, PhysicalDeviceInfo};
pub use framebuffer::{AttachmentImage, Framebuffer};
pub use pipeline::{DepthBias, GraphicsPipeline, PipelineConfig};
pub use render_pass::RenderPass;
pub use shader::ShaderModule;
pub use swapchain::Swapchain;
pub use sync::{Fence, FrameSync, Semaphore};

use ash::vk;
use thiserror::Error;

/// Command buffer sets cycled by the renderer; one records while the
/// other may still be executing on the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Errors from the Vulkan layer
#[derive(Debug, Error)]
pub enum VulkanError {
    /// Raw API error code
    #[error("vulkan api error: {0:?}")]
    Api(vk::Result),

    /// Instance, device or surface setup failed
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    /// An operation was issued in the wrong state
    #[error("invalid operation: {reason}")]
    InvalidOperation {
        /// What made the operation invalid
        reason: String,
    },

    /// No memory type satisfies an allocation request
    #[error("no suitable memory type")]
    NoSuitableMemoryType,

    /// A SPIR-V binary could not be loaded
    #[error("shader '{path}': {message}")]
    Shader {
        /// Path of the SPIR-V binary
        path: String,
        /// What went wrong
        message: String,
    },

    /// I/O while reading shader binaries
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
