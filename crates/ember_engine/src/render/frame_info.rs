//! Per-frame context handed to the render passes

use crate::render::lighting::FrameLights;
use ash::vk;

/// Everything a pass needs beyond its own pipeline
///
/// Built once per frame by the renderer after light gathering and uniform
/// upload, then shared read-only by every pass that records into the frame's
/// command buffer.
#[derive(Clone, Copy)]
pub struct FrameInfo<'a> {
    /// Frame-in-flight slot, selects per-frame resources
    pub frame_index: usize,
    /// Seconds since the previous frame
    pub dt: f32,
    /// Swapchain extent for viewport and scissor
    pub extent: vk::Extent2D,
    /// Set 0: global UBO plus shadow map samplers
    pub global_set: vk::DescriptorSet,
    /// Lights gathered for this frame
    pub lights: &'a FrameLights,
}
