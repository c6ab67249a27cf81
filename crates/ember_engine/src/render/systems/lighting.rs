//! Lighting pass
//!
//! Second deferred subpass. A single fullscreen triangle reads the
//! G-buffer through input attachments, evaluates ambient, directional and
//! point lights and samples the shadow maps. No vertex buffer is bound;
//! the vertex shader derives the triangle from `gl_VertexIndex`.

use crate::render::frame_info::FrameInfo;
use crate::render::vulkan::{
    ActiveRenderPass, GraphicsPipeline, LogicalDevice, PipelineConfig, RenderPass, ShaderModule,
    VulkanResult,
};
use ash::vk;
use std::path::Path;

/// Pipeline for deferred light composition
pub struct LightingPass {
    pipeline: GraphicsPipeline,
}

impl LightingPass {
    /// Builds the lighting pipeline against the deferred render pass.
    ///
    /// `attachment_layout` describes set 1, the G-buffer input attachments.
    pub fn new(
        device: &LogicalDevice,
        render_pass: &RenderPass,
        global_layout: vk::DescriptorSetLayout,
        attachment_layout: vk::DescriptorSetLayout,
        shader_dir: &Path,
    ) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(device.handle(), &shader_dir.join("lighting.vert.spv"))?;
        let frag = ShaderModule::from_file(device.handle(), &shader_dir.join("lighting.frag.spv"))?;

        let config = PipelineConfig {
            set_layouts: vec![global_layout, attachment_layout],
            depth_test: false,
            depth_write: false,
            cull_mode: vk::CullModeFlags::NONE,
            ..Default::default()
        };

        let pipeline = GraphicsPipeline::new(
            device.handle(),
            render_pass.handle(),
            RenderPass::SUBPASS_LIGHTING,
            &vert,
            &frag,
            &config,
        )?;
        Ok(Self { pipeline })
    }

    /// Records the fullscreen composition draw.
    pub fn render(
        &self,
        pass: &mut ActiveRenderPass,
        frame_info: &FrameInfo,
        attachment_set: vk::DescriptorSet,
    ) {
        pass.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        pass.cmd_bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline.layout(),
            0,
            &[frame_info.global_set, attachment_set],
        );
        pass.cmd_draw(3, 1, 0, 0);
    }
}
