//! Descriptor set layouts, pools, and updates.

use ash::{vk, Device};

use super::{LogicalDevice, VulkanError, VulkanResult};

/// Builder for descriptor set layouts.
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn add_uniform_buffer(mut self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    pub fn add_combined_image_sampler(
        mut self,
        binding: u32,
        stage_flags: vk::ShaderStageFlags,
    ) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Input attachments are read by lighting and transparency subpasses.
    pub fn add_input_attachment(mut self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    pub fn build(self, device: &Device) -> VulkanResult<DescriptorSetLayout> {
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);

        let layout = unsafe { device.create_descriptor_set_layout(&layout_info, None) }
            .map_err(VulkanError::Api)?;

        Ok(DescriptorSetLayout {
            layout,
            device: device.clone(),
        })
    }
}

impl Default for DescriptorSetLayoutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor set layout wrapper with automatic cleanup.
pub struct DescriptorSetLayout {
    layout: vk::DescriptorSetLayout,
    device: Device,
}

impl DescriptorSetLayout {
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Descriptor pool sized for the renderer's per-frame and attachment sets.
pub struct DescriptorPool {
    pool: vk::DescriptorPool,
    device: Device,
}

impl DescriptorPool {
    pub fn new(device: Device, max_sets: u32) -> VulkanResult<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(max_sets * 4)
                .build(),
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(max_sets * 4)
                .build(),
            vk::DescriptorPoolSize::builder()
                .ty(vk::DescriptorType::INPUT_ATTACHMENT)
                .descriptor_count(max_sets * 4)
                .build(),
        ];

        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(max_sets)
            .pool_sizes(&pool_sizes);

        let pool = unsafe { device.create_descriptor_pool(&pool_info, None) }
            .map_err(VulkanError::Api)?;

        Ok(Self { pool, device })
    }

    pub fn allocate_descriptor_sets(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> VulkanResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        unsafe { self.device.allocate_descriptor_sets(&alloc_info) }.map_err(VulkanError::Api)
    }

    pub fn free_descriptor_sets(&self, sets: &[vk::DescriptorSet]) -> VulkanResult<()> {
        unsafe { self.device.free_descriptor_sets(self.pool, sets) }.map_err(VulkanError::Api)
    }

    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

enum PendingWrite {
    Buffer {
        set: vk::DescriptorSet,
        binding: u32,
        info_index: usize,
    },
    Image {
        set: vk::DescriptorSet,
        binding: u32,
        descriptor_type: vk::DescriptorType,
        info_index: usize,
    },
}

/// Batches descriptor writes and applies them in one update call.
///
/// Write structs are built inside `update`, after the info arrays have
/// stopped growing, so the pointers they hold stay valid.
pub struct DescriptorSetWriter {
    pending: Vec<PendingWrite>,
    buffer_infos: Vec<vk::DescriptorBufferInfo>,
    image_infos: Vec<vk::DescriptorImageInfo>,
}

impl DescriptorSetWriter {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            buffer_infos: Vec::new(),
            image_infos: Vec::new(),
        }
    }

    pub fn write_buffer(
        mut self,
        descriptor_set: vk::DescriptorSet,
        binding: u32,
        buffer: vk::Buffer,
        offset: vk::DeviceSize,
        range: vk::DeviceSize,
    ) -> Self {
        let info_index = self.buffer_infos.len();
        self.buffer_infos.push(
            vk::DescriptorBufferInfo::builder()
                .buffer(buffer)
                .offset(offset)
                .range(range)
                .build(),
        );

        self.pending.push(PendingWrite::Buffer {
            set: descriptor_set,
            binding,
            info_index,
        });
        self
    }

    pub fn write_image(
        mut self,
        descriptor_set: vk::DescriptorSet,
        binding: u32,
        image_view: vk::ImageView,
        sampler: vk::Sampler,
        layout: vk::ImageLayout,
    ) -> Self {
        let info_index = self.image_infos.len();
        self.image_infos.push(
            vk::DescriptorImageInfo::builder()
                .image_view(image_view)
                .sampler(sampler)
                .image_layout(layout)
                .build(),
        );

        self.pending.push(PendingWrite::Image {
            set: descriptor_set,
            binding,
            descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            info_index,
        });
        self
    }

    pub fn write_input_attachment(
        mut self,
        descriptor_set: vk::DescriptorSet,
        binding: u32,
        image_view: vk::ImageView,
    ) -> Self {
        let info_index = self.image_infos.len();
        self.image_infos.push(
            vk::DescriptorImageInfo::builder()
                .image_view(image_view)
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .build(),
        );

        self.pending.push(PendingWrite::Image {
            set: descriptor_set,
            binding,
            descriptor_type: vk::DescriptorType::INPUT_ATTACHMENT,
            info_index,
        });
        self
    }

    pub fn update(self, device: &Device) {
        let writes: Vec<vk::WriteDescriptorSet> = self
            .pending
            .iter()
            .map(|pending| match *pending {
                PendingWrite::Buffer {
                    set,
                    binding,
                    info_index,
                } => vk::WriteDescriptorSet::builder()
                    .dst_set(set)
                    .dst_binding(binding)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(std::slice::from_ref(&self.buffer_infos[info_index]))
                    .build(),
                PendingWrite::Image {
                    set,
                    binding,
                    descriptor_type,
                    info_index,
                } => vk::WriteDescriptorSet::builder()
                    .dst_set(set)
                    .dst_binding(binding)
                    .dst_array_element(0)
                    .descriptor_type(descriptor_type)
                    .image_info(std::slice::from_ref(&self.image_infos[info_index]))
                    .build(),
            })
            .collect();

        unsafe {
            device.update_descriptor_sets(&writes, &[]);
        }
    }
}

impl Default for DescriptorSetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sampler for shadow map reads.
///
/// The opaque white border makes fragments outside the shadow frustum
/// compare as unoccluded.
pub struct Sampler {
    device: Device,
    sampler: vk::Sampler,
}

impl Sampler {
    pub fn shadow(device: &LogicalDevice) -> VulkanResult<Self> {
        let create_info = vk::SamplerCreateInfo::builder()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_BORDER)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_WHITE)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .min_lod(0.0)
            .max_lod(0.0);

        let raw = device.raw();
        let sampler = unsafe {
            raw.create_sampler(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self {
            device: raw,
            sampler,
        })
    }

    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_sampler(self.sampler, None);
        }
    }
}
