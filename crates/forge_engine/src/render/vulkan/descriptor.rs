//! Descriptor set, layout, and pool management
//!
//! The layout/pool/writer trio used to bind uniform data to pipelines.
//! Layouts and pools are built through small builders; the writer collects
//! buffer bindings and produces a ready-to-bind descriptor set.

use ash::{vk, Device};

use crate::render::vulkan::{DeviceContext, VulkanError, VulkanResult};

/// Descriptor set layout wrapper with RAII cleanup
pub struct DescriptorSetLayout {
    device: Device,
    layout: vk::DescriptorSetLayout,
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayout {
    pub fn builder() -> DescriptorSetLayoutBuilder {
        DescriptorSetLayoutBuilder { bindings: Vec::new() }
    }

    /// Get the layout handle
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    fn descriptor_type_for(&self, binding: u32) -> Option<vk::DescriptorType> {
        self.bindings
            .iter()
            .find(|b| b.binding == binding)
            .map(|b| b.descriptor_type)
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}

/// Builder for descriptor set layouts
pub struct DescriptorSetLayoutBuilder {
    bindings: Vec<vk::DescriptorSetLayoutBinding>,
}

impl DescriptorSetLayoutBuilder {
    /// Add a binding of an arbitrary descriptor type
    pub fn add_binding(
        mut self,
        binding: u32,
        descriptor_type: vk::DescriptorType,
        stage_flags: vk::ShaderStageFlags,
    ) -> Self {
        self.bindings.push(
            vk::DescriptorSetLayoutBinding::builder()
                .binding(binding)
                .descriptor_type(descriptor_type)
                .descriptor_count(1)
                .stage_flags(stage_flags)
                .build(),
        );
        self
    }

    /// Add a uniform buffer binding
    pub fn add_uniform_buffer(self, binding: u32, stage_flags: vk::ShaderStageFlags) -> Self {
        self.add_binding(binding, vk::DescriptorType::UNIFORM_BUFFER, stage_flags)
    }

    /// Build the descriptor set layout
    pub fn build(self, context: &DeviceContext) -> VulkanResult<DescriptorSetLayout> {
        let device = context.raw_device();
        let layout_info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(&self.bindings);

        let layout = unsafe {
            device
                .create_descriptor_set_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(DescriptorSetLayout {
            device,
            layout,
            bindings: self.bindings,
        })
    }
}

/// Descriptor pool wrapper with RAII cleanup
pub struct DescriptorPool {
    device: Device,
    pool: vk::DescriptorPool,
}

impl DescriptorPool {
    pub fn builder() -> DescriptorPoolBuilder {
        DescriptorPoolBuilder {
            pool_sizes: Vec::new(),
            max_sets: 1,
        }
    }

    /// Allocate a single descriptor set with the given layout
    pub fn allocate(&self, layout: &DescriptorSetLayout) -> VulkanResult<vk::DescriptorSet> {
        let layouts = [layout.handle()];
        let alloc_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.pool)
            .set_layouts(&layouts);

        let sets = unsafe {
            self.device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(VulkanError::Api)?
        };

        Ok(sets[0])
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_descriptor_pool(self.pool, None);
        }
    }
}

/// Builder for descriptor pools
pub struct DescriptorPoolBuilder {
    pool_sizes: Vec<vk::DescriptorPoolSize>,
    max_sets: u32,
}

impl DescriptorPoolBuilder {
    /// Reserve `count` descriptors of the given type
    pub fn add_pool_size(mut self, descriptor_type: vk::DescriptorType, count: u32) -> Self {
        self.pool_sizes.push(vk::DescriptorPoolSize {
            ty: descriptor_type,
            descriptor_count: count,
        });
        self
    }

    /// Maximum number of sets the pool may allocate
    pub fn max_sets(mut self, count: u32) -> Self {
        self.max_sets = count;
        self
    }

    /// Build the descriptor pool
    pub fn build(self, context: &DeviceContext) -> VulkanResult<DescriptorPool> {
        let device = context.raw_device();
        let pool_info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(&self.pool_sizes)
            .max_sets(self.max_sets);

        let pool = unsafe {
            device
                .create_descriptor_pool(&pool_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(DescriptorPool { device, pool })
    }
}

/// Collects writes against a layout and produces a descriptor set
pub struct DescriptorWriter<'a> {
    layout: &'a DescriptorSetLayout,
    pool: &'a DescriptorPool,
    buffer_writes: Vec<(u32, vk::DescriptorBufferInfo)>,
}

impl<'a> DescriptorWriter<'a> {
    pub fn new(layout: &'a DescriptorSetLayout, pool: &'a DescriptorPool) -> Self {
        Self {
            layout,
            pool,
            buffer_writes: Vec::new(),
        }
    }

    /// Queue a buffer write for the given binding
    pub fn write_buffer(mut self, binding: u32, info: vk::DescriptorBufferInfo) -> Self {
        self.buffer_writes.push((binding, info));
        self
    }

    /// Allocate a set from the pool and apply all queued writes
    pub fn build(self, context: &DeviceContext) -> VulkanResult<vk::DescriptorSet> {
        let set = self.pool.allocate(self.layout)?;

        let writes: Vec<vk::WriteDescriptorSet> = self
            .buffer_writes
            .iter()
            .map(|(binding, info)| {
                let descriptor_type = self
                    .layout
                    .descriptor_type_for(*binding)
                    .unwrap_or(vk::DescriptorType::UNIFORM_BUFFER);
                vk::WriteDescriptorSet::builder()
                    .dst_set(set)
                    .dst_binding(*binding)
                    .dst_array_element(0)
                    .descriptor_type(descriptor_type)
                    .buffer_info(std::slice::from_ref(info))
                    .build()
            })
            .collect();

        unsafe {
            context.raw_device().update_descriptor_sets(&writes, &[]);
        }

        Ok(set)
    }
}
