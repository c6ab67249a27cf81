//! GUI pass
//!
//! Final pass of the frame, drawing overlay quads over the composed image
//! and transitioning the swapchain image for presentation. Overlay space is
//! framebuffer pixels with the origin at the top left and +Y down.

use crate::foundation::math::{Mat4, Mat4Ext};
use crate::render::ubo::GuiPushConstant;
use crate::render::vulkan::{
    ActiveRenderPass, GraphicsPipeline, LogicalDevice, PipelineConfig, RenderPass, ShaderModule,
    VulkanResult,
};
use ash::vk;
use std::path::Path;

/// One solid-color overlay rectangle
#[derive(Debug, Clone, Copy)]
pub struct OverlayQuad {
    /// x, y, width, height in overlay pixels
    pub rect: [f32; 4],
    /// RGBA fill color, alpha blended over the scene
    pub color: [f32; 4],
}

impl OverlayQuad {
    /// Creates a quad from its top-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) -> Self {
        Self {
            rect: [x, y, width, height],
            color,
        }
    }
}

/// Overlay quads for one frame, rebuilt by the application each update
#[derive(Debug, Default)]
pub struct Overlay {
    quads: Vec<OverlayQuad>,
}

impl Overlay {
    /// Creates an empty overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all quads; call at the start of each compose step.
    pub fn clear(&mut self) {
        self.quads.clear();
    }

    /// Appends a quad. Quads draw in insertion order.
    pub fn push(&mut self, quad: OverlayQuad) {
        self.quads.push(quad);
    }

    /// Quads in draw order
    pub fn quads(&self) -> &[OverlayQuad] {
        &self.quads
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}

/// Pipeline and draw loop for overlay quads
pub struct GuiPass {
    pipeline: GraphicsPipeline,
}

impl GuiPass {
    /// Builds the overlay pipeline against the GUI render pass.
    pub fn new(device: &LogicalDevice, render_pass: &RenderPass, shader_dir: &Path) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(device.handle(), &shader_dir.join("gui.vert.spv"))?;
        let frag = ShaderModule::from_file(device.handle(), &shader_dir.join("gui.frag.spv"))?;

        let config = PipelineConfig {
            push_constant_size: std::mem::size_of::<GuiPushConstant>() as u32,
            push_constant_stages: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            alpha_blend: true,
            depth_test: false,
            depth_write: false,
            cull_mode: vk::CullModeFlags::NONE,
            ..Default::default()
        };

        let pipeline =
            GraphicsPipeline::new(device.handle(), render_pass.handle(), 0, &vert, &frag, &config)?;
        Ok(Self { pipeline })
    }

    /// Records one six-vertex quad per overlay entry.
    pub fn render(&self, pass: &mut ActiveRenderPass, extent: vk::Extent2D, overlay: &Overlay) {
        if overlay.is_empty() {
            return;
        }

        pass.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());

        let projection = Mat4::orthographic_vk(
            0.0,
            extent.width as f32,
            0.0,
            extent.height as f32,
            0.0,
            1.0,
        );

        for quad in overlay.quads() {
            let push = GuiPushConstant::new(projection, quad.rect, quad.color);
            pass.cmd_push_constants(
                self.pipeline.layout(),
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&push),
            );
            pass.cmd_draw(6, 1, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_keeps_insertion_order() {
        let mut overlay = Overlay::new();
        overlay.push(OverlayQuad::new(0.0, 0.0, 10.0, 10.0, [1.0, 0.0, 0.0, 1.0]));
        overlay.push(OverlayQuad::new(5.0, 5.0, 10.0, 10.0, [0.0, 1.0, 0.0, 1.0]));

        assert_eq!(overlay.quads().len(), 2);
        assert_eq!(overlay.quads()[0].color[0], 1.0);
        assert_eq!(overlay.quads()[1].color[1], 1.0);
    }

    #[test]
    fn test_clear_empties_the_overlay() {
        let mut overlay = Overlay::new();
        overlay.push(OverlayQuad::new(0.0, 0.0, 1.0, 1.0, [1.0; 4]));
        assert!(!overlay.is_empty());

        overlay.clear();
        assert!(overlay.is_empty());
        assert!(overlay.quads().is_empty());
    }

    #[test]
    fn test_quad_packs_rect_components() {
        let quad = OverlayQuad::new(4.0, 8.0, 100.0, 20.0, [0.0, 0.0, 0.0, 0.5]);
        assert_eq!(quad.rect, [4.0, 8.0, 100.0, 20.0]);
        assert_eq!(quad.color[3], 0.5);
    }
}
