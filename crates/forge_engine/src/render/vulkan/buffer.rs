//! Buffer management for vertex data and uniforms
//!
//! Memory management following RAII patterns with proper allocation and
//! cleanup. Everything this engine uploads is small enough to live in
//! host-visible, host-coherent memory.

use ash::{vk, Device};
use std::mem;

use crate::render::vulkan::{DeviceContext, VulkanError, VulkanResult};

/// Buffer wrapper with memory management
pub struct Buffer {
    device: Device,
    buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Create a new buffer with freshly allocated, bound memory
    pub fn new(
        context: &DeviceContext,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        properties: vk::MemoryPropertyFlags,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let buffer_info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_info, None).map_err(VulkanError::Api)? };

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };
        let memory_type = context.find_memory_type(requirements.memory_type_bits, properties)?;

        let alloc_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type);

        let memory = unsafe { device.allocate_memory(&alloc_info, None).map_err(VulkanError::Api)? };

        unsafe {
            device
                .bind_buffer_memory(buffer, memory, 0)
                .map_err(VulkanError::Api)?;
        }

        Ok(Self {
            device,
            buffer,
            memory,
            size,
        })
    }

    /// Map the buffer memory for writing
    pub fn map_memory(&self) -> VulkanResult<*mut std::ffi::c_void> {
        unsafe {
            self.device
                .map_memory(self.memory, 0, self.size, vk::MemoryMapFlags::empty())
                .map_err(VulkanError::Api)
        }
    }

    /// Unmap the buffer memory
    pub fn unmap_memory(&self) {
        unsafe {
            self.device.unmap_memory(self.memory);
        }
    }

    /// Copy `data` into the buffer (maps, copies, unmaps)
    pub fn write_data<T: Copy>(&self, data: &[T]) -> VulkanResult<()> {
        let mapped = self.map_memory()?;

        unsafe {
            let src = data.as_ptr() as *const std::ffi::c_void;
            let size = data.len() * mem::size_of::<T>();
            std::ptr::copy_nonoverlapping(src, mapped, size);
        }

        self.unmap_memory();
        Ok(())
    }

    /// Get the buffer handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Get the buffer size in bytes
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Descriptor info covering the whole buffer
    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.buffer,
            offset: 0,
            range: self.size,
        }
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
