//! Vulkan swap-chain management
//!
//! Each [`Swapchain`] is one immutable generation tied to a window extent:
//! it owns the presentable images, the depth buffers, the render pass and
//! framebuffers built against its formats, and the frame-in-flight
//! synchronization objects. Recreation constructs a fresh generation
//! chained from its predecessor (`old_swapchain` resource-reuse hint);
//! callers must verify format compatibility between generations with
//! [`Swapchain::compare_formats`].

use ash::extensions::khr::Swapchain as SwapchainLoader;
use ash::{vk, Device};

use crate::render::vulkan::{DeviceContext, FrameSync, RenderPass, VulkanError, VulkanResult};

/// Recover the raw `vk::Result` from a wrapped sync-object error so the
/// acquire/submit paths can report staleness codes verbatim.
fn raw_result(err: VulkanError) -> vk::Result {
    match err {
        VulkanError::Api(result) => result,
        _ => vk::Result::ERROR_UNKNOWN,
    }
}

/// Number of frames the CPU may record ahead of the GPU.
///
/// Slots cycle in strict round-robin order; slot k is reused only after its
/// in-flight fence signals, which the acquire path waits on.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// One generation of the swap-chain and everything built against it
pub struct Swapchain {
    device: Device,
    swapchain_loader: SwapchainLoader,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,

    swapchain: vk::SwapchainKHR,
    image_format: vk::Format,
    depth_format: vk::Format,
    extent: vk::Extent2D,

    image_views: Vec<vk::ImageView>,
    depth_images: Vec<vk::Image>,
    depth_image_memories: Vec<vk::DeviceMemory>,
    depth_image_views: Vec<vk::ImageView>,
    framebuffers: Vec<vk::Framebuffer>,

    render_pass: RenderPass,

    frame_syncs: Vec<FrameSync>,
    images_in_flight: Vec<vk::Fence>,
    current_frame: usize,
}

impl Swapchain {
    /// Create a swap-chain for the given extent.
    ///
    /// Pass the predecessor generation in `old` during recreation so the
    /// driver can recycle presentable images.
    pub fn new(context: &DeviceContext, window_extent: vk::Extent2D, old: Option<&Swapchain>) -> VulkanResult<Self> {
        let device = context.raw_device();
        let swapchain_loader = context.swapchain_loader().clone();
        let surface = context.surface();
        let surface_loader = context.surface_loader();
        let physical_device = context.physical_device();

        let surface_caps = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(physical_device.device, surface)
                .map_err(VulkanError::Api)?
        };

        let surface_formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(physical_device.device, surface)
                .map_err(VulkanError::Api)?
        };

        let surface_format = surface_formats
            .iter()
            .find(|sf| {
                sf.format == vk::Format::B8G8R8A8_SRGB && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .cloned()
            .unwrap_or(surface_formats[0]);

        let present_modes = unsafe {
            surface_loader
                .get_physical_device_surface_present_modes(physical_device.device, surface)
                .map_err(VulkanError::Api)?
        };

        let present_mode = present_modes
            .iter()
            .cloned()
            .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
            .unwrap_or(vk::PresentModeKHR::FIFO);

        let extent = if surface_caps.current_extent.width != u32::MAX {
            surface_caps.current_extent
        } else {
            vk::Extent2D {
                width: window_extent
                    .width
                    .clamp(surface_caps.min_image_extent.width, surface_caps.max_image_extent.width),
                height: window_extent
                    .height
                    .clamp(surface_caps.min_image_extent.height, surface_caps.max_image_extent.height),
            }
        };

        let image_count = (surface_caps.min_image_count + 1).min(if surface_caps.max_image_count > 0 {
            surface_caps.max_image_count
        } else {
            surface_caps.min_image_count + 1
        });

        let old_handle = old.map_or(vk::SwapchainKHR::null(), |o| o.swapchain);

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(surface_caps.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_handle);

        let swapchain = unsafe {
            swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        let images = unsafe {
            swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(VulkanError::Api)?
        };

        let image_views = Self::create_image_views(&device, &images, surface_format.format)?;

        let depth_format = context.find_supported_format(
            &[
                vk::Format::D32_SFLOAT,
                vk::Format::D32_SFLOAT_S8_UINT,
                vk::Format::D24_UNORM_S8_UINT,
            ],
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        )?;

        let mut depth_images = Vec::with_capacity(images.len());
        let mut depth_image_memories = Vec::with_capacity(images.len());
        let mut depth_image_views = Vec::with_capacity(images.len());

        for _ in 0..images.len() {
            let image_info = vk::ImageCreateInfo::builder()
                .image_type(vk::ImageType::TYPE_2D)
                .extent(vk::Extent3D {
                    width: extent.width,
                    height: extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .format(depth_format)
                .tiling(vk::ImageTiling::OPTIMAL)
                .initial_layout(vk::ImageLayout::UNDEFINED)
                .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
                .samples(vk::SampleCountFlags::TYPE_1)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let (image, memory) = context.create_image(&image_info, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;

            let view_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(depth_format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::DEPTH,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe { device.create_image_view(&view_info, None).map_err(VulkanError::Api)? };

            depth_images.push(image);
            depth_image_memories.push(memory);
            depth_image_views.push(view);
        }

        let render_pass = RenderPass::new(device.clone(), surface_format.format, depth_format)?;

        let framebuffers: Result<Vec<_>, _> = image_views
            .iter()
            .zip(depth_image_views.iter())
            .map(|(&color_view, &depth_view)| {
                let attachments = [color_view, depth_view];
                let framebuffer_info = vk::FramebufferCreateInfo::builder()
                    .render_pass(render_pass.handle())
                    .attachments(&attachments)
                    .width(extent.width)
                    .height(extent.height)
                    .layers(1);

                unsafe { device.create_framebuffer(&framebuffer_info, None) }
            })
            .collect();
        let framebuffers = framebuffers.map_err(VulkanError::Api)?;

        let frame_syncs: Result<Vec<_>, _> = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameSync::new(device.clone()))
            .collect();
        let frame_syncs = frame_syncs?;

        let images_in_flight = vec![vk::Fence::null(); images.len()];

        log::debug!(
            "Created swapchain: {}x{}, {} images, format {:?}, present mode {:?}",
            extent.width,
            extent.height,
            images.len(),
            surface_format.format,
            present_mode
        );

        Ok(Self {
            device,
            swapchain_loader,
            graphics_queue: context.graphics_queue(),
            present_queue: context.present_queue(),
            swapchain,
            image_format: surface_format.format,
            depth_format,
            extent,
            image_views,
            depth_images,
            depth_image_memories,
            depth_image_views,
            framebuffers,
            render_pass,
            frame_syncs,
            images_in_flight,
            current_frame: 0,
        })
    }

    fn create_image_views(
        device: &Device,
        images: &[vk::Image],
        format: vk::Format,
    ) -> VulkanResult<Vec<vk::ImageView>> {
        images
            .iter()
            .map(|&image| {
                let create_info = vk::ImageViewCreateInfo::builder()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(format)
                    .subresource_range(vk::ImageSubresourceRange {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        base_mip_level: 0,
                        level_count: 1,
                        base_array_layer: 0,
                        layer_count: 1,
                    });

                unsafe { device.create_image_view(&create_info, None).map_err(VulkanError::Api) }
            })
            .collect()
    }

    /// Whether this generation preserves the format contract of `other`
    pub fn compare_formats(&self, other: &Swapchain) -> bool {
        self.image_format == other.image_format && self.depth_format == other.depth_format
    }

    /// Wait for the current slot's previous work, then acquire the next
    /// presentable image.
    ///
    /// Surfaces `ERROR_OUT_OF_DATE_KHR` to the caller; the `bool` reports a
    /// suboptimal (but usable) surface.
    pub fn acquire_next_image(&self) -> Result<(u32, bool), vk::Result> {
        let sync = &self.frame_syncs[self.current_frame];
        sync.in_flight.wait(u64::MAX).map_err(raw_result)?;

        unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                sync.image_available.handle(),
                vk::Fence::null(),
            )
        }
    }

    /// Submit recorded work for the current slot and present the image.
    ///
    /// Returns `Ok(true)` when presentation reported a suboptimal surface.
    /// The slot index advances regardless of the presentation outcome so
    /// the round-robin order is never disturbed.
    pub fn submit(&mut self, command_buffer: vk::CommandBuffer, image_index: u32) -> Result<bool, vk::Result> {
        // If an earlier slot still owns this image, wait for it first
        let image_fence = self.images_in_flight[image_index as usize];
        if image_fence != vk::Fence::null() {
            unsafe {
                self.device.wait_for_fences(&[image_fence], true, u64::MAX)?;
            }
        }

        let sync = &self.frame_syncs[self.current_frame];
        self.images_in_flight[image_index as usize] = sync.in_flight.handle();
        sync.in_flight.reset().map_err(raw_result)?;

        let wait_semaphores = [sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [sync.render_finished.handle()];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .queue_submit(self.graphics_queue, &[submit_info.build()], sync.in_flight.handle())?;
        }

        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let present_result = unsafe { self.swapchain_loader.queue_present(self.present_queue, &present_info) };

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        present_result
    }

    /// Get the render pass built against this generation's formats
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }

    /// Get the framebuffer for a presentable image
    pub fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        self.framebuffers[image_index as usize]
    }

    /// Get the swap-chain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Width over height of the current extent
    pub fn extent_aspect_ratio(&self) -> f32 {
        self.extent.width as f32 / self.extent.height as f32
    }

    /// Number of presentable images
    pub fn image_count(&self) -> usize {
        self.image_views.len()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.destroy_framebuffer(framebuffer, None);
            }

            for &view in &self.depth_image_views {
                self.device.destroy_image_view(view, None);
            }
            for &image in &self.depth_images {
                self.device.destroy_image(image, None);
            }
            for &memory in &self.depth_image_memories {
                self.device.free_memory(memory, None);
            }

            for &view in &self.image_views {
                self.device.destroy_image_view(view, None);
            }

            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
        // render_pass and frame_syncs clean up through their own Drop impls
    }
}
