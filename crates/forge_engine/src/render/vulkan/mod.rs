//! Vulkan backend
//!
//! Low-level RAII wrappers over the ash bindings. Everything here is
//! construction-time fatal: a failure to create an instance, device,
//! pipeline, or swap-chain indicates an environment or driver problem the
//! engine cannot recover from, so errors propagate up to `main`.

pub mod buffer;
pub mod context;
pub mod descriptor;
pub mod pipeline;
pub mod render_pass;
pub mod swapchain;
pub mod sync;

use ash::vk;
use thiserror::Error;

/// Vulkan-specific error types
#[derive(Error, Debug)]
pub enum VulkanError {
    /// General Vulkan API error with result code
    #[error("Vulkan API error: {0:?}")]
    Api(vk::Result),

    /// Vulkan context initialization failed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// No suitable memory type found for an allocation
    #[error("No suitable memory type found")]
    NoSuitableMemoryType,

    /// A recreated swap-chain no longer matches the image/depth format
    /// contract of its predecessor (e.g. the output color space changed).
    /// Render passes and pipelines were built against the old formats, so
    /// this is unrecoverable.
    #[error("Swap chain image or depth format changed during recreation")]
    SwapchainFormatChanged,
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;

pub use buffer::Buffer;
pub use context::{DeviceContext, LogicalDevice, PhysicalDeviceInfo, VulkanInstance};
pub use descriptor::{
    DescriptorPool, DescriptorPoolBuilder, DescriptorSetLayout, DescriptorSetLayoutBuilder,
    DescriptorWriter,
};
pub use pipeline::{GraphicsPipeline, PipelineConfig, ShaderModule};
pub use render_pass::RenderPass;
pub use swapchain::{Swapchain, MAX_FRAMES_IN_FLIGHT};
pub use sync::{Fence, FrameSync, Semaphore};
