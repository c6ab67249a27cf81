//! Graphics pipeline construction.
//!
//! One constructor covers every pass; `PipelineConfig` carries the parts
//! that differ between them. Viewport and scissor are always dynamic.

use ash::{vk, Device};

use super::{ShaderModule, VulkanError, VulkanResult};

/// Static depth bias applied during shadow rendering to avoid acne.
#[derive(Debug, Clone, Copy)]
pub struct DepthBias {
    pub constant: f32,
    pub slope: f32,
}

/// Fixed-function settings that vary between passes.
#[derive(Clone)]
pub struct PipelineConfig {
    pub set_layouts: Vec<vk::DescriptorSetLayout>,
    pub push_constant_size: u32,
    pub push_constant_stages: vk::ShaderStageFlags,
    pub color_attachment_count: u32,
    pub alpha_blend: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_bias: Option<DepthBias>,
    pub cull_mode: vk::CullModeFlags,
    pub vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    pub vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            set_layouts: Vec::new(),
            push_constant_size: 0,
            push_constant_stages: vk::ShaderStageFlags::VERTEX,
            color_attachment_count: 1,
            alpha_blend: false,
            depth_test: true,
            depth_write: true,
            depth_bias: None,
            cull_mode: vk::CullModeFlags::BACK,
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
        }
    }
}

/// Graphics pipeline with its layout, RAII cleanup.
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
    layout: vk::PipelineLayout,
}

impl GraphicsPipeline {
    pub fn new(
        device: &Device,
        render_pass: vk::RenderPass,
        subpass: u32,
        vertex_shader: &ShaderModule,
        fragment_shader: &ShaderModule,
        config: &PipelineConfig,
    ) -> VulkanResult<Self> {
        let shader_stages = [
            vertex_shader.create_stage_info(vk::ShaderStageFlags::VERTEX),
            fragment_shader.create_stage_info(vk::ShaderStageFlags::FRAGMENT),
        ];

        let vertex_input_info = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&config.vertex_bindings)
            .vertex_attribute_descriptions(&config.vertex_attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        // Projection leaves Y untouched, so Vulkan's Y-down clip space turns
        // counter-clockwise meshes clockwise on screen.
        let mut rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(config.cull_mode)
            .front_face(vk::FrontFace::CLOCKWISE);

        if let Some(bias) = config.depth_bias {
            rasterizer = rasterizer
                .depth_bias_enable(true)
                .depth_bias_constant_factor(bias.constant)
                .depth_bias_slope_factor(bias.slope)
                .depth_bias_clamp(0.0);
        }

        let multisampling = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(config.depth_test)
            .depth_write_enable(config.depth_write)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let blend_attachment = if config.alpha_blend {
            vk::PipelineColorBlendAttachmentState::builder()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .alpha_blend_op(vk::BlendOp::ADD)
                .build()
        } else {
            vk::PipelineColorBlendAttachmentState::builder()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false)
                .build()
        };

        let color_blend_attachments =
            vec![blend_attachment; config.color_attachment_count as usize];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let push_constant_ranges = if config.push_constant_size > 0 {
            vec![vk::PushConstantRange {
                stage_flags: config.push_constant_stages,
                offset: 0,
                size: config.push_constant_size,
            }]
        } else {
            Vec::new()
        };

        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&config.set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        let layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_info)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisampling)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(subpass);

        let pipelines = unsafe {
            device.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_info.build()],
                None,
            )
        };

        let pipeline = match pipelines {
            Ok(pipelines) => pipelines[0],
            Err((_, err)) => {
                unsafe {
                    device.destroy_pipeline_layout(layout, None);
                }
                return Err(VulkanError::Api(err));
            }
        };

        Ok(Self {
            device: device.clone(),
            pipeline,
            layout,
        })
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}
