//! Frame orchestration
//!
//! Owns the whole Vulkan object graph and drives one frame from fence wait
//! to present. Pass order is fixed: one shadow pass per caster slot, the
//! three-subpass deferred pass, then the GUI pass which hands the image to
//! the presentation engine. The shadow and GUI passes always run so their
//! layout transitions happen even on frames with nothing to draw.

use crate::config::RendererSettings;
use crate::ecs::Registry;
use crate::render::frame_info::FrameInfo;
use crate::render::lighting::FrameLights;
use crate::render::mesh::MeshLibrary;
use crate::render::systems::{
    GeometryPass, GpuMesh, GpuMeshCache, GuiPass, LightingPass, Overlay, ShadowPass,
    TransparencyPass,
};
use crate::render::ubo::{GlobalUbo, MAX_SHADOW_CASTERS};
use crate::render::vulkan::{
    AttachmentImage, CommandPool, CommandRecorder, DescriptorPool, DescriptorSetLayout,
    DescriptorSetLayoutBuilder, DescriptorSetWriter, Framebuffer, FrameSync, LogicalDevice,
    PhysicalDeviceInfo, RenderPass, Sampler, Swapchain, UniformBuffer, VulkanContext, VulkanError,
    VulkanResult, MAX_FRAMES_IN_FLIGHT,
};
use crate::render::{RenderError, RenderResult};
use crate::scene::Camera;
use crate::window::Window;
use ash::vk;
use std::path::PathBuf;

// Slot 0 is the primary caster and gets the detailed map.
const SHADOW_MAP_SIZES: [u32; MAX_SHADOW_CASTERS] = [4096, 1024];

/// The G-buffer targets, recreated on every resize
struct GBuffer {
    position: AttachmentImage,
    normal: AttachmentImage,
    albedo: AttachmentImage,
    material: AttachmentImage,
}

impl GBuffer {
    fn new(device: &LogicalDevice, extent: vk::Extent2D) -> VulkanResult<Self> {
        Ok(Self {
            position: AttachmentImage::color(device, extent, RenderPass::POSITION_FORMAT)?,
            normal: AttachmentImage::color(device, extent, RenderPass::NORMAL_FORMAT)?,
            albedo: AttachmentImage::color(device, extent, RenderPass::ALBEDO_FORMAT)?,
            material: AttachmentImage::color(device, extent, RenderPass::MATERIAL_FORMAT)?,
        })
    }

    /// Views in deferred-pass attachment order
    fn views(&self) -> [vk::ImageView; 4] {
        [
            self.position.image_view(),
            self.normal.image_view(),
            self.albedo.image_view(),
            self.material.image_view(),
        ]
    }
}

/// Vulkan renderer with a deferred pipeline and two shadow maps
///
/// Field order is drop order: pipelines and framebuffers go before the
/// images and render passes they reference, and everything goes before the
/// device and instance.
pub struct Renderer {
    shadow_pass: ShadowPass,
    geometry_pass: GeometryPass,
    lighting_pass: LightingPass,
    transparency_pass: TransparencyPass,
    gui_pass: GuiPass,

    shadow_framebuffers: Vec<Framebuffer>,
    deferred_framebuffers: Vec<Framebuffer>,
    gui_framebuffers: Vec<Framebuffer>,

    shadow_maps: Vec<AttachmentImage>,
    depth_image: AttachmentImage,
    g_buffer: GBuffer,
    shadow_sampler: Sampler,

    global_sets: Vec<vk::DescriptorSet>,
    attachment_set: vk::DescriptorSet,
    descriptor_pool: DescriptorPool,
    global_layout: DescriptorSetLayout,
    attachment_layout: DescriptorSetLayout,

    global_ubos: Vec<UniformBuffer<GlobalUbo>>,
    gpu_meshes: GpuMeshCache,

    shadow_render_pass: RenderPass,
    deferred_render_pass: RenderPass,
    gui_render_pass: RenderPass,

    command_buffers: Vec<vk::CommandBuffer>,
    command_pool: CommandPool,
    frame_sync: Vec<FrameSync>,
    current_frame: usize,
    vsync: bool,
    shader_dir: PathBuf,

    swapchain: Swapchain,
    device: LogicalDevice,
    context: VulkanContext,
}

impl Renderer {
    /// Brings up the full Vulkan stack for `window`.
    pub fn new(window: &mut Window, app_name: &str, settings: &RendererSettings) -> RenderResult<Self> {
        let context = VulkanContext::new(window, app_name)?;
        let physical = PhysicalDeviceInfo::select(&context)?;
        let device = LogicalDevice::new(&context, &physical)?;

        let (width, height) = window.get_framebuffer_size();
        let extent = vk::Extent2D { width, height };
        let swapchain = Swapchain::new(&context, &device, extent, settings.vsync)?;

        let command_pool = CommandPool::new(device.raw(), device.graphics_family())?;
        let command_buffers = command_pool.allocate_command_buffers(MAX_FRAMES_IN_FLIGHT as u32)?;
        let frame_sync = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameSync::new(device.raw()))
            .collect::<VulkanResult<Vec<_>>>()?;

        let shadow_render_pass = RenderPass::new_shadow(device.handle())?;
        let deferred_render_pass =
            RenderPass::new_deferred(device.handle(), swapchain.format().format)?;
        let gui_render_pass = RenderPass::new_gui(device.handle(), swapchain.format().format)?;

        let shadow_maps = SHADOW_MAP_SIZES
            .iter()
            .map(|&size| AttachmentImage::shadow_map(&device, size))
            .collect::<VulkanResult<Vec<_>>>()?;
        let depth_image = AttachmentImage::depth(&device, swapchain.extent())?;
        let g_buffer = GBuffer::new(&device, swapchain.extent())?;
        let shadow_sampler = Sampler::shadow(&device)?;

        let shadow_framebuffers = shadow_maps
            .iter()
            .zip(SHADOW_MAP_SIZES)
            .map(|(map, size)| {
                Framebuffer::new(
                    device.raw(),
                    shadow_render_pass.handle(),
                    &[map.image_view()],
                    vk::Extent2D {
                        width: size,
                        height: size,
                    },
                )
            })
            .collect::<VulkanResult<Vec<_>>>()?;
        let deferred_framebuffers = Self::create_deferred_framebuffers(
            &device,
            &deferred_render_pass,
            &swapchain,
            &depth_image,
            &g_buffer,
        )?;
        let gui_framebuffers =
            Self::create_gui_framebuffers(&device, &gui_render_pass, &swapchain)?;

        let global_layout = DescriptorSetLayoutBuilder::new()
            .add_uniform_buffer(
                0,
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            )
            .add_combined_image_sampler(1, vk::ShaderStageFlags::FRAGMENT)
            .add_combined_image_sampler(2, vk::ShaderStageFlags::FRAGMENT)
            .build(device.handle())?;
        let attachment_layout = DescriptorSetLayoutBuilder::new()
            .add_input_attachment(0, vk::ShaderStageFlags::FRAGMENT)
            .add_input_attachment(1, vk::ShaderStageFlags::FRAGMENT)
            .add_input_attachment(2, vk::ShaderStageFlags::FRAGMENT)
            .add_input_attachment(3, vk::ShaderStageFlags::FRAGMENT)
            .build(device.handle())?;

        let descriptor_pool = DescriptorPool::new(device.raw(), (MAX_FRAMES_IN_FLIGHT + 1) as u32)?;
        let global_sets = descriptor_pool
            .allocate_descriptor_sets(&vec![global_layout.handle(); MAX_FRAMES_IN_FLIGHT])?;
        let attachment_set =
            descriptor_pool.allocate_descriptor_sets(&[attachment_layout.handle()])?[0];

        let global_ubos = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| UniformBuffer::<GlobalUbo>::new(&device))
            .collect::<VulkanResult<Vec<_>>>()?;

        let mut writer = DescriptorSetWriter::new();
        for (set, ubo) in global_sets.iter().zip(&global_ubos) {
            writer = writer.write_buffer(*set, 0, ubo.handle(), 0, ubo.size());
            for (slot, map) in shadow_maps.iter().enumerate() {
                writer = writer.write_image(
                    *set,
                    1 + slot as u32,
                    map.image_view(),
                    shadow_sampler.handle(),
                    vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
                );
            }
        }
        writer.update(device.handle());
        Self::write_attachment_set(&device, attachment_set, &g_buffer);

        let shader_dir = settings.shader_dir.clone();
        let shadow_pass = ShadowPass::new(
            &device,
            &shadow_render_pass,
            global_layout.handle(),
            &shader_dir,
        )?;
        let geometry_pass = GeometryPass::new(
            &device,
            &deferred_render_pass,
            global_layout.handle(),
            &shader_dir,
        )?;
        let lighting_pass = LightingPass::new(
            &device,
            &deferred_render_pass,
            global_layout.handle(),
            attachment_layout.handle(),
            &shader_dir,
        )?;
        let transparency_pass = TransparencyPass::new(
            &device,
            &deferred_render_pass,
            global_layout.handle(),
            &shader_dir,
        )?;
        let gui_pass = GuiPass::new(&device, &gui_render_pass, &shader_dir)?;

        log::info!(
            "Renderer ready: {}x{}, {} swapchain images, vsync {}",
            swapchain.extent().width,
            swapchain.extent().height,
            swapchain.image_count(),
            settings.vsync,
        );

        Ok(Self {
            shadow_pass,
            geometry_pass,
            lighting_pass,
            transparency_pass,
            gui_pass,
            shadow_framebuffers,
            deferred_framebuffers,
            gui_framebuffers,
            shadow_maps,
            depth_image,
            g_buffer,
            shadow_sampler,
            global_sets,
            attachment_set,
            descriptor_pool,
            global_layout,
            attachment_layout,
            global_ubos,
            gpu_meshes: GpuMeshCache::new(),
            shadow_render_pass,
            deferred_render_pass,
            gui_render_pass,
            command_buffers,
            command_pool,
            frame_sync,
            current_frame: 0,
            vsync: settings.vsync,
            shader_dir,
            swapchain,
            device,
            context,
        })
    }

    /// Current swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Blocks until the GPU has finished all submitted work.
    pub fn wait_idle(&self) {
        self.device.wait_idle();
    }

    /// Renders one frame and presents it.
    ///
    /// Returns [`RenderError::SwapchainOutOfDate`] when the swapchain no
    /// longer matches the surface; the caller recreates via
    /// [`recreate`](Self::recreate) and skips the frame.
    pub fn draw_frame(
        &mut self,
        registry: &mut Registry,
        camera: &Camera,
        meshes: &MeshLibrary,
        overlay: &Overlay,
        dt: f32,
    ) -> RenderResult<()> {
        let frame = self.current_frame;
        self.frame_sync[frame].in_flight.wait(u64::MAX)?;

        let (image_index, _) = match self
            .swapchain
            .acquire_next_image(self.frame_sync[frame].image_available.handle())
        {
            Ok(acquired) => acquired,
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)) => {
                return Err(RenderError::SwapchainOutOfDate);
            }
            Err(err) => return Err(err.into()),
        };
        self.frame_sync[frame].in_flight.reset()?;

        self.upload_new_meshes(meshes)?;

        let lights = FrameLights::gather(registry, camera.position());
        let mut ubo = GlobalUbo::default();
        ubo.set_camera(*camera.projection(), *camera.view(), *camera.inverse_view());
        lights.write_into(&mut ubo);
        self.global_ubos[frame].update(&ubo)?;

        let frame_info = FrameInfo {
            frame_index: frame,
            dt,
            extent: self.swapchain.extent(),
            global_set: self.global_sets[frame],
            lights: &lights,
        };

        let mut recorder = CommandRecorder::new(self.command_buffers[frame], self.device.raw());
        recorder.begin()?;

        for slot in 0..MAX_SHADOW_CASTERS {
            self.record_shadow_pass(&mut recorder, &frame_info, registry, slot)?;
        }
        self.record_deferred_pass(&mut recorder, &frame_info, registry, image_index)?;
        self.record_gui_pass(&mut recorder, image_index, overlay)?;

        let command_buffer = recorder.end()?;

        let wait_semaphores = [self.frame_sync[frame].image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [self.frame_sync[frame].render_finished.handle()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .handle()
                .queue_submit(
                    self.device.graphics_queue(),
                    &[submit_info.build()],
                    self.frame_sync[frame].in_flight.handle(),
                )
                .map_err(VulkanError::Api)
                .map_err(RenderError::from)?;
        }

        let presented = self.swapchain.present(
            self.device.present_queue(),
            image_index,
            self.frame_sync[frame].render_finished.handle(),
        );
        // The submit went through, so the frame slot advances even when
        // presentation reports a stale swapchain.
        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        match presented {
            Ok(false) => Ok(()),
            Ok(true) => Err(RenderError::SwapchainOutOfDate),
            Err(VulkanError::Api(vk::Result::ERROR_OUT_OF_DATE_KHR)) => {
                Err(RenderError::SwapchainOutOfDate)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Rebuilds the swapchain and every extent-dependent resource.
    ///
    /// Does nothing while the window is minimized.
    pub fn recreate(&mut self, window: &Window) -> RenderResult<()> {
        let (width, height) = window.get_framebuffer_size();
        if width == 0 || height == 0 {
            return Ok(());
        }
        let extent = vk::Extent2D { width, height };
        log::debug!("Recreating swapchain at {}x{}", width, height);

        self.device.wait_idle();
        self.swapchain = Swapchain::recreate(
            &self.context,
            &self.device,
            extent,
            self.vsync,
            self.swapchain.handle(),
        )?;
        self.depth_image = AttachmentImage::depth(&self.device, self.swapchain.extent())?;
        self.g_buffer = GBuffer::new(&self.device, self.swapchain.extent())?;
        self.deferred_framebuffers = Self::create_deferred_framebuffers(
            &self.device,
            &self.deferred_render_pass,
            &self.swapchain,
            &self.depth_image,
            &self.g_buffer,
        )?;
        self.gui_framebuffers =
            Self::create_gui_framebuffers(&self.device, &self.gui_render_pass, &self.swapchain)?;
        Self::write_attachment_set(&self.device, self.attachment_set, &self.g_buffer);
        Ok(())
    }

    /// Drops GPU buffers for meshes no longer present in the library.
    pub fn release_unused_meshes(&mut self, meshes: &MeshLibrary) {
        let before = self.gpu_meshes.len();
        self.gpu_meshes.retain(|handle, _| meshes.get(*handle).is_some());
        let released = before - self.gpu_meshes.len();
        if released > 0 {
            self.device.wait_idle();
            log::debug!("Released {released} GPU meshes");
        }
    }

    fn upload_new_meshes(&mut self, meshes: &MeshLibrary) -> RenderResult<()> {
        for (handle, data) in meshes.iter() {
            if !self.gpu_meshes.contains_key(&handle) {
                let gpu = GpuMesh::upload(&self.device, &self.command_pool, data)?;
                self.gpu_meshes.insert(handle, gpu);
            }
        }
        Ok(())
    }

    fn record_shadow_pass(
        &self,
        recorder: &mut CommandRecorder,
        frame_info: &FrameInfo,
        registry: &mut Registry,
        slot: usize,
    ) -> RenderResult<()> {
        let size = SHADOW_MAP_SIZES[slot];
        let extent = vk::Extent2D {
            width: size,
            height: size,
        };
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let clear_values = [vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue {
                depth: 1.0,
                stencil: 0,
            },
        }];

        // Begun even without a caster so the map still reaches its
        // read-only layout for the lighting subpass.
        let mut pass = recorder.begin_render_pass(
            self.shadow_render_pass.handle(),
            self.shadow_framebuffers[slot].handle(),
            render_area,
            &clear_values,
        )?;
        if frame_info.lights.caster(slot).is_some() {
            pass.set_viewport(&Self::full_viewport(extent));
            pass.set_scissor(&render_area);
            self.shadow_pass
                .render(&mut pass, frame_info, registry, &self.gpu_meshes, slot as u32);
        }
        Ok(())
    }

    fn record_deferred_pass(
        &self,
        recorder: &mut CommandRecorder,
        frame_info: &FrameInfo,
        registry: &mut Registry,
        image_index: u32,
    ) -> RenderResult<()> {
        let extent = self.swapchain.extent();
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };
        let color_clear = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: [0.0, 0.0, 0.0, 1.0],
            },
        };
        let clear_values = [
            color_clear,
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
            color_clear,
            color_clear,
            color_clear,
            color_clear,
        ];

        let mut pass = recorder.begin_render_pass(
            self.deferred_render_pass.handle(),
            self.deferred_framebuffers[image_index as usize].handle(),
            render_area,
            &clear_values,
        )?;
        pass.set_viewport(&Self::full_viewport(extent));
        pass.set_scissor(&render_area);

        self.geometry_pass
            .render(&mut pass, frame_info, registry, &self.gpu_meshes);
        pass.next_subpass();
        self.lighting_pass
            .render(&mut pass, frame_info, self.attachment_set);
        pass.next_subpass();
        self.transparency_pass.render(&mut pass, frame_info);
        Ok(())
    }

    fn record_gui_pass(
        &self,
        recorder: &mut CommandRecorder,
        image_index: u32,
        overlay: &Overlay,
    ) -> RenderResult<()> {
        let extent = self.swapchain.extent();
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        // Always begun: this pass moves the image to PRESENT_SRC.
        let mut pass = recorder.begin_render_pass(
            self.gui_render_pass.handle(),
            self.gui_framebuffers[image_index as usize].handle(),
            render_area,
            &[],
        )?;
        if !overlay.is_empty() {
            pass.set_viewport(&Self::full_viewport(extent));
            pass.set_scissor(&render_area);
            self.gui_pass.render(&mut pass, extent, overlay);
        }
        Ok(())
    }

    fn create_deferred_framebuffers(
        device: &LogicalDevice,
        render_pass: &RenderPass,
        swapchain: &Swapchain,
        depth_image: &AttachmentImage,
        g_buffer: &GBuffer,
    ) -> VulkanResult<Vec<Framebuffer>> {
        let g_views = g_buffer.views();
        swapchain
            .image_views()
            .iter()
            .map(|&swapchain_view| {
                let attachments = [
                    swapchain_view,
                    depth_image.image_view(),
                    g_views[0],
                    g_views[1],
                    g_views[2],
                    g_views[3],
                ];
                Framebuffer::new(
                    device.raw(),
                    render_pass.handle(),
                    &attachments,
                    swapchain.extent(),
                )
            })
            .collect()
    }

    fn create_gui_framebuffers(
        device: &LogicalDevice,
        render_pass: &RenderPass,
        swapchain: &Swapchain,
    ) -> VulkanResult<Vec<Framebuffer>> {
        swapchain
            .image_views()
            .iter()
            .map(|&view| {
                Framebuffer::new(
                    device.raw(),
                    render_pass.handle(),
                    &[view],
                    swapchain.extent(),
                )
            })
            .collect()
    }

    fn write_attachment_set(
        device: &LogicalDevice,
        attachment_set: vk::DescriptorSet,
        g_buffer: &GBuffer,
    ) {
        let mut writer = DescriptorSetWriter::new();
        for (binding, view) in g_buffer.views().into_iter().enumerate() {
            writer = writer.write_input_attachment(attachment_set, binding as u32, view);
        }
        writer.update(device.handle());
    }

    fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
        vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Everything below may still be referenced by in-flight work.
        self.device.wait_idle();
    }
}
