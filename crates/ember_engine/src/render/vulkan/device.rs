//! Physical device selection and logical device creation.

use std::collections::HashSet;
use std::ffi::CStr;

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::vk;
use ash::Device;

use super::{VulkanContext, VulkanError, VulkanResult};

/// A physical device that satisfies the renderer's requirements, with the
/// queue family indices discovered during selection.
pub struct PhysicalDeviceInfo {
    pub device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub graphics_family: u32,
    pub present_family: u32,
}

impl PhysicalDeviceInfo {
    /// Select the first physical device that can render and present to the
    /// context's surface.
    pub fn select(context: &VulkanContext) -> VulkanResult<Self> {
        let devices = unsafe {
            context
                .instance()
                .enumerate_physical_devices()
                .map_err(VulkanError::Api)?
        };

        for device in devices {
            if let Ok(info) = Self::evaluate(context, device) {
                log::info!("Selected GPU: {}", unsafe {
                    CStr::from_ptr(info.properties.device_name.as_ptr()).to_string_lossy()
                });
                return Ok(info);
            }
        }

        Err(VulkanError::InitializationFailed(
            "No suitable GPU found".to_string(),
        ))
    }

    fn evaluate(context: &VulkanContext, device: vk::PhysicalDevice) -> VulkanResult<Self> {
        let instance = context.instance();
        let properties = unsafe { instance.get_physical_device_properties(device) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(device) };

        let mut graphics_family = None;
        let mut present_family = None;

        for (index, family) in queue_families.iter().enumerate() {
            let index = index as u32;

            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) && graphics_family.is_none() {
                graphics_family = Some(index);
            }

            let present_support = unsafe {
                context
                    .surface_loader()
                    .get_physical_device_surface_support(device, index, context.surface())
                    .map_err(VulkanError::Api)?
            };

            if present_support && present_family.is_none() {
                present_family = Some(index);
            }

            if graphics_family.is_some() && present_family.is_some() {
                break;
            }
        }

        let graphics_family = graphics_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No graphics queue family found".to_string())
        })?;

        let present_family = present_family.ok_or_else(|| {
            VulkanError::InitializationFailed("No present queue family found".to_string())
        })?;

        let extensions = unsafe {
            instance
                .enumerate_device_extension_properties(device)
                .map_err(VulkanError::Api)?
        };

        let has_swapchain = extensions.iter().any(|available| {
            let name = unsafe { CStr::from_ptr(available.extension_name.as_ptr()) };
            name == SwapchainLoader::name()
        });

        if !has_swapchain {
            return Err(VulkanError::InitializationFailed(
                "Swapchain extension not supported".to_string(),
            ));
        }

        Ok(Self {
            device,
            properties,
            graphics_family,
            present_family,
        })
    }
}

/// Logical device wrapper owning the queues and the swapchain loader.
///
/// Memory properties are cached at creation so buffer and image allocation
/// never has to reach back to the instance.
pub struct LogicalDevice {
    device: Device,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    graphics_family: u32,
    present_family: u32,
    swapchain_loader: SwapchainLoader,
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    physical: vk::PhysicalDevice,
}

impl LogicalDevice {
    pub fn new(context: &VulkanContext, info: &PhysicalDeviceInfo) -> VulkanResult<Self> {
        let unique_families: HashSet<u32> = [info.graphics_family, info.present_family]
            .iter()
            .cloned()
            .collect();

        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&[1.0])
                    .build()
            })
            .collect();

        let required_extensions = [SwapchainLoader::name().as_ptr()];

        let device_features = vk::PhysicalDeviceFeatures::builder()
            .sampler_anisotropy(true)
            .build();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&required_extensions)
            .enabled_features(&device_features);

        let device = unsafe {
            context
                .instance()
                .create_device(info.device, &create_info, None)
                .map_err(VulkanError::Api)?
        };

        let graphics_queue = unsafe { device.get_device_queue(info.graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(info.present_family, 0) };

        let swapchain_loader = SwapchainLoader::new(context.instance(), &device);

        let memory_properties = unsafe {
            context
                .instance()
                .get_physical_device_memory_properties(info.device)
        };

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            graphics_family: info.graphics_family,
            present_family: info.present_family,
            swapchain_loader,
            memory_properties,
            physical: info.device,
        })
    }

    /// Clone of the device handle, for resources that outlive a borrow.
    pub fn raw(&self) -> Device {
        self.device.clone()
    }

    pub fn handle(&self) -> &Device {
        &self.device
    }

    pub fn physical(&self) -> vk::PhysicalDevice {
        self.physical
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    pub fn graphics_family(&self) -> u32 {
        self.graphics_family
    }

    pub fn present_family(&self) -> u32 {
        self.present_family
    }

    pub fn swapchain_loader(&self) -> &SwapchainLoader {
        &self.swapchain_loader
    }

    /// Find a memory type index satisfying both the resource's type filter
    /// and the requested property flags.
    pub fn find_memory_type(
        &self,
        type_filter: u32,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<u32> {
        for i in 0..self.memory_properties.memory_type_count {
            let type_matches = type_filter & (1 << i) != 0;
            let properties_match = self.memory_properties.memory_types[i as usize]
                .property_flags
                .contains(properties);

            if type_matches && properties_match {
                return Ok(i);
            }
        }

        Err(VulkanError::NoSuitableMemoryType)
    }

    pub fn wait_idle(&self) {
        unsafe {
            let _ = self.device.device_wait_idle();
        }
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}
