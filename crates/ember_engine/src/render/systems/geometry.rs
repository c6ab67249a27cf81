//! Geometry pass
//!
//! First deferred subpass. Draws every enabled mesh and writes position,
//! normal, albedo and material parameters into the G-buffer; the lighting
//! subpass consumes them as input attachments.

use crate::ecs::components::{MeshComponent, Transform};
use crate::ecs::{Entity, Registry};
use crate::render::frame_info::FrameInfo;
use crate::render::mesh::MeshHandle;
use crate::render::systems::{vertex_layout, GpuMeshCache};
use crate::render::ubo::PushConstantData;
use crate::render::vulkan::{
    ActiveRenderPass, GraphicsPipeline, LogicalDevice, PipelineConfig, RenderPass, ShaderModule,
    VulkanResult,
};
use ash::vk;
use std::path::Path;

/// Pipeline and draw loop for G-buffer fill
pub struct GeometryPass {
    pipeline: GraphicsPipeline,
}

impl GeometryPass {
    /// Builds the geometry pipeline against the deferred render pass.
    pub fn new(
        device: &LogicalDevice,
        render_pass: &RenderPass,
        global_layout: vk::DescriptorSetLayout,
        shader_dir: &Path,
    ) -> VulkanResult<Self> {
        let vert = ShaderModule::from_file(device.handle(), &shader_dir.join("geometry.vert.spv"))?;
        let frag = ShaderModule::from_file(device.handle(), &shader_dir.join("geometry.frag.spv"))?;

        let (vertex_bindings, vertex_attributes) = vertex_layout();
        let config = PipelineConfig {
            set_layouts: vec![global_layout],
            push_constant_size: std::mem::size_of::<PushConstantData>() as u32,
            push_constant_stages: vk::ShaderStageFlags::VERTEX,
            // Position, normal, albedo and material targets.
            color_attachment_count: 4,
            vertex_bindings,
            vertex_attributes,
            ..Default::default()
        };

        let pipeline = GraphicsPipeline::new(
            device.handle(),
            render_pass.handle(),
            RenderPass::SUBPASS_GEOMETRY,
            &vert,
            &frag,
            &config,
        )?;
        Ok(Self { pipeline })
    }

    /// Records every enabled mesh into the G-buffer.
    pub fn render(
        &self,
        pass: &mut ActiveRenderPass,
        frame_info: &FrameInfo,
        registry: &mut Registry,
        meshes: &GpuMeshCache,
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
            let push = PushConstantData::new(transform.mat4(), transform.normal_matrix());
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
