//! Shadow map pass
//!
//! Depth-only rendering of every enabled mesh from a directional light's
//! point of view. Runs once per active shadow caster before the deferred
//! pass; the lighting subpass samples the resulting maps.

use crate::ecs::components::{MeshComponent, Transform};
use crate::ecs::{Entity, Registry};
use crate::render::frame_info::FrameInfo;
use crate::render::mesh::MeshHandle;
use crate::render::systems::{vertex_layout, GpuMeshCache};
use crate::render::ubo::ShadowPushConstant;
use crate::render::vulkan::{
    ActiveRenderPass, DepthBias, GraphicsPipeline, LogicalDevice, PipelineConfig, RenderPass,
    ShaderModule, VulkanResult,
};
use ash::vk;
use std::path::Path;

// Matches the hardware depth bias the shadow shaders were tuned against.
const BIAS_CONSTANT: f32 = 8.0;
const BIAS_SLOPE: f32 = 3.0;

/// Pipeline and draw loop for directional shadow maps
pub struct ShadowPass {
    pipeline: GraphicsPipeline,
}

impl ShadowPass {
    /// Builds the shadow pipeline against the shadow render pass.
    pub fn new(
        device: &LogicalDevice,
        render_pass: &RenderPass,
        global_layout: vk::DescriptorSetLayout,
        shader_dir: &Path,
    ) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(device.handle(), &shader_dir.join("shadow.vert.spv"))?;
        let frag = ShaderModule::from_file(device.handle(), &shader_dir.join("shadow.frag.spv"))?;

        let (vertex_bindings, vertex_attributes) = vertex_layout();
        let config = PipelineConfig {
            set_layouts: vec![global_layout],
            push_constant_size: std::mem::size_of::<ShadowPushConstant>() as u32,
            push_constant_stages: vk::ShaderStageFlags::VERTEX,
            color_attachment_count: 0,
            // Cull nothing so single-sided geometry still casts.
            cull_mode: vk::CullModeFlags::NONE,
            depth_bias: Some(DepthBias {
                constant: BIAS_CONSTANT,
                slope: BIAS_SLOPE,
            }),
            vertex_bindings,
            vertex_attributes,
            ..Default::default()
        };

        let pipeline = GraphicsPipeline::new(device.handle(), render_pass.handle(), 0, &vert, &frag, &config)?;
        Ok(Self { pipeline })
    }

    /// Records every enabled mesh into the shadow map of `caster_index`.
    pub fn render(
        &self,
        pass: &mut ActiveRenderPass,
        frame_info: &FrameInfo,
        registry: &mut Registry,
        meshes: &GpuMeshCache,
        caster_index: u32,
    ) {
        pass.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        pass.cmd_bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline.layout(),
            0,
            &[frame_info.global_set],
        );

        let draws: Vec<(Entity, MeshHandle)> = registry
            .iter::<MeshComponent>()
            .filter(|(_, mesh)| mesh.enabled)
            .map(|(entity, mesh)| (entity, mesh.mesh))
            .collect();

        for (entity, handle) in draws {
            let Some(mesh) = meshes.get(&handle) else {
                continue;
            };
            let Ok(transform) = registry.get_mut::<Transform>(entity) else {
                continue;
            };
            let push = ShadowPushConstant::new(transform.mat4(), caster_index);
            pass.cmd_push_constants(
                self.pipeline.layout(),
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::bytes_of(&push),
            );
            mesh.bind(pass);
            mesh.draw(pass);
        }
    }
}
