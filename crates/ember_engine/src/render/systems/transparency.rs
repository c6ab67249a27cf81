//! Transparency pass
//!
//! Third deferred subpass. Draws one camera-facing billboard per point
//! light, alpha-blended over the lit image and depth-tested against the
//! geometry subpass without writing depth. The light list arrives sorted
//! farthest first, so blending composes back to front.

use crate::render::frame_info::FrameInfo;
use crate::render::ubo::BillboardPushConstant;
use crate::render::vulkan::{
    ActiveRenderPass, GraphicsPipeline, LogicalDevice, PipelineConfig, RenderPass, ShaderModule,
    VulkanResult,
};
use ash::vk;
use std::path::Path;

/// Pipeline and draw loop for point-light billboards
pub struct TransparencyPass {
    pipeline: GraphicsPipeline,
}

impl TransparencyPass {
    /// Builds the billboard pipeline against the deferred render pass.
    pub fn new(
        device: &LogicalDevice,
        render_pass: &RenderPass,
        global_layout: vk::DescriptorSetLayout,
        shader_dir: &Path,
    ) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(device.handle(), &shader_dir.join("billboard.vert.spv"))?;
        let frag = ShaderModule::from_file(device.handle(), &shader_dir.join("billboard.frag.spv"))?;

        let config = PipelineConfig {
            set_layouts: vec![global_layout],
            push_constant_size: std::mem::size_of::<BillboardPushConstant>() as u32,
            push_constant_stages: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            alpha_blend: true,
            depth_write: false,
            cull_mode: vk::CullModeFlags::NONE,
            ..Default::default()
        };

        let pipeline = GraphicsPipeline::new(
            device.handle(),
            render_pass.handle(),
            RenderPass::SUBPASS_TRANSPARENCY,
            &vert,
            &frag,
            &config,
        )?;
        Ok(Self { pipeline })
    }

    /// Records one six-vertex quad per gathered point light.
    pub fn render(&self, pass: &mut ActiveRenderPass, frame_info: &FrameInfo) {
        if frame_info.lights.point_lights().is_empty() {
            return;
        }

        pass.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        pass.cmd_bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline.layout(),
            0,
            &[frame_info.global_set],
        );

        for light in frame_info.lights.point_lights() {
            let push =
                BillboardPushConstant::new(light.position, light.color, light.intensity, light.radius);
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
