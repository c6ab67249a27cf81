//! Buffer allocation and upload paths.
//!
//! Mesh data lives in device-local memory filled through a staging copy at
//! load time. Uniform buffers stay host-visible since they are rewritten
//! every frame.

use std::mem;

use ash::{vk, Device};

use super::{CommandPool, LogicalDevice, VulkanError, VulkanResult};

/// Raw buffer plus its backing allocation.
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    pub fn new(
        device: &LogicalDevice,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let raw = device.raw();

        let buffer = unsafe {
            raw.create_buffer(&buffer_info, None)
                .map_err(VulkanError::Api)?
        };

        let mem_requirements = unsafe { raw.get_buffer_memory_requirements(buffer) };

        let memory_type_index =
            device.find_memory_type(mem_requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(mem_requirements.size)
            .memory_type_index(memory_type_index);

        let memory = unsafe {
            raw.allocate_memory(&alloc_info, None)
                .map_err(VulkanError::Api)?
        };

        unsafe {
            raw.bind_buffer_memory(buffer, memory, 0)
                .map_err(VulkanError::Api)?;
        }

        Ok(Self {
            device: raw,
            buffer,
            memory,
            size,
        })
    }

    pub fn map_memory(&self) -> VulkanResult<*mut std::ffi::c_void> {
        unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)
        }
    }

    pub fn unmap_memory(&self) {
        unsafe {
            self.device.unmap_memory(self.memory);
        }
    }

    /// Copy `data` into the buffer. Requires host-visible memory.
    pub fn write_data<T>(&self, data: &[T]) -> VulkanResult<()> {
        let data_ptr = self.map_memory()?;

        unsafe {
            let src_ptr = data.as_ptr() as *const std::ffi::c_void;
            let size = data.len() * mem::size_of::<T>();
            std::ptr::copy_nonoverlapping(src_ptr, data_ptr, size);
        }

        self.unmap_memory();
        Ok(())
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_buffer(self.buffer, None);
            self.device.free_memory(self.memory, None);
        }
    }
}

/// Fill a device-local buffer through a transient staging buffer.
fn upload_device_local<T>(
    device: &LogicalDevice,
    pool: &CommandPool,
    data: &[T],
    usage: vk::BufferUsageFlags,
) -> VulkanResult<Buffer> {
    let size = (data.len() * mem::size_of::<T>()) as vk::DeviceSize;

    let staging = Buffer::new(
        device,
        size,
        vk::BufferUsageFlags::TRANSFER_SRC,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
    )?;
    staging.write_data(data)?;

    let buffer = Buffer::new(
        device,
        size,
        usage | vk::BufferUsageFlags::TRANSFER_DST,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
    )?;

    pool.copy_buffer(
        device.graphics_queue(),
        staging.handle(),
        buffer.handle(),
        size,
    )?;

    Ok(buffer)
}

/// Device-local vertex buffer, filled once at mesh load.
pub struct VertexBuffer {
    buffer: Buffer,
}

impl VertexBuffer {
    pub fn new<T>(
        device: &LogicalDevice,
        pool: &CommandPool,
        vertices: &[T],
    ) -> VulkanResult<Self> {
        if vertices.is_empty() {
            return Err(VulkanError::InvalidOperation {
                reason: "vertex buffer requires at least one vertex".to_string(),
            });
        }

        let buffer = upload_device_local(
            device,
            pool,
            vertices,
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;

        Ok(Self { buffer })
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}

/// Device-local index buffer with the draw count baked in.
pub struct IndexBuffer {
    buffer: Buffer,
    index_count: u32,
}

impl IndexBuffer {
    pub fn new(device: &LogicalDevice, pool: &CommandPool, indices: &[u32]) -> VulkanResult<Self> {
        if indices.is_empty() {
            return Err(VulkanError::InvalidOperation {
                reason: "index buffer requires at least one index".to_string(),
            });
        }

        let buffer =
            upload_device_local(device, pool, indices, vk::BufferUsageFlags::INDEX_BUFFER)?;

        Ok(Self {
            buffer,
            index_count: indices.len() as u32,
        })
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// Host-visible uniform buffer rewritten each frame.
pub struct UniformBuffer<T> {
    buffer: Buffer,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> UniformBuffer<T> {
    pub fn new(device: &LogicalDevice) -> VulkanResult<Self> {
        let size = mem::size_of::<T>() as vk::DeviceSize;

        let buffer = Buffer::new(
            device,
            size,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;

        Ok(Self {
            buffer,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn update(&self, data: &T) -> VulkanResult<()> {
        self.buffer.write_data(std::slice::from_ref(data))
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.buffer.size()
    }
}
