//! Frame orchestration
//!
//! The [`Renderer`] owns the swap-chain and one primary command buffer per
//! frame-in-flight slot. It decides when the swap-chain must be recreated,
//! brackets each frame with begin/end calls, and hands out the live command
//! buffer for the frame.
//!
//! A frame moves through a strict sequence: `begin_frame` (acquire +
//! begin recording) -> `begin_swapchain_render_pass` -> record draws ->
//! `end_swapchain_render_pass` -> `end_frame` (submit + present). Calling
//! these out of order is a programming error and fails an assertion;
//! stale-surface conditions are the only recoverable case and surface as
//! `begin_frame` returning `Ok(None)`.

use ash::{vk, Device};

use crate::render::vulkan::{DeviceContext, Swapchain, VulkanError, VulkanResult, MAX_FRAMES_IN_FLIGHT};
use crate::render::window::{wait_until_valid_extent, Window};

/// Frame orchestrator: swap-chain lifecycle plus per-frame command buffers
pub struct Renderer {
    device: Device,
    swapchain: Swapchain,
    command_buffers: Vec<vk::CommandBuffer>,
    current_image_index: u32,
    current_frame_index: usize,
    frame_started: bool,
}

impl Renderer {
    /// Create the orchestrator, building the first swap-chain generation
    /// for the window's current extent.
    pub fn new(context: &DeviceContext, window: &mut Window) -> VulkanResult<Self> {
        let extent = wait_until_valid_extent(window);
        let swapchain = Swapchain::new(context, extent, None)?;
        let command_buffers = context.allocate_command_buffers(MAX_FRAMES_IN_FLIGHT as u32)?;

        Ok(Self {
            device: context.raw_device(),
            swapchain,
            command_buffers,
            current_image_index: 0,
            current_frame_index: 0,
            frame_started: false,
        })
    }

    /// Whether a frame is currently between begin and end
    pub fn is_frame_in_progress(&self) -> bool {
        self.frame_started
    }

    /// Render pass of the current swap-chain generation
    pub fn render_pass(&self) -> vk::RenderPass {
        self.swapchain.render_pass()
    }

    /// Aspect ratio of the current swap-chain extent
    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.extent_aspect_ratio()
    }

    /// Index of the frame-in-flight slot being recorded
    pub fn frame_index(&self) -> usize {
        assert!(self.frame_started, "Cannot get frame index when no frame is in progress");
        self.current_frame_index
    }

    /// Command buffer of the frame being recorded
    pub fn current_command_buffer(&self) -> vk::CommandBuffer {
        assert!(
            self.frame_started,
            "Cannot get command buffer when no frame is in progress"
        );
        self.command_buffers[self.current_frame_index]
    }

    /// Begin a frame: acquire a presentable image and start recording.
    ///
    /// Returns `Ok(None)` when the drawable surface is stale — the
    /// swap-chain has already been recreated and the caller is expected to
    /// skip this frame and try again on the next loop iteration.
    pub fn begin_frame(
        &mut self,
        context: &DeviceContext,
        window: &mut Window,
    ) -> VulkanResult<Option<vk::CommandBuffer>> {
        assert!(!self.frame_started, "begin_frame called while a frame is already in progress");

        let image_index = match self.swapchain.acquire_next_image() {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                self.recreate_swapchain(context, window)?;
                return Ok(None);
            }
            Err(result) => return Err(VulkanError::Api(result)),
        };

        self.current_image_index = image_index;
        self.frame_started = true;

        let command_buffer = self.current_command_buffer();
        let begin_info = vk::CommandBufferBeginInfo::builder();
        unsafe {
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(VulkanError::Api)?;
        }

        Ok(Some(command_buffer))
    }

    /// End the frame: submit the recorded work and present.
    ///
    /// Staleness reported at present time (or a window resize) triggers
    /// swap-chain recreation. The frame-in-flight slot index advances
    /// unconditionally.
    pub fn end_frame(&mut self, context: &DeviceContext, window: &mut Window) -> VulkanResult<()> {
        assert!(self.frame_started, "end_frame called with no frame in progress");

        let command_buffer = self.current_command_buffer();
        unsafe {
            self.device
                .end_command_buffer(command_buffer)
                .map_err(VulkanError::Api)?;
        }

        let submit_result = self.swapchain.submit(command_buffer, self.current_image_index);

        let stale = match submit_result {
            Ok(suboptimal) => suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) | Err(vk::Result::SUBOPTIMAL_KHR) => true,
            Err(result) => return Err(VulkanError::Api(result)),
        };

        if stale || window.was_resized() {
            window.reset_resized_flag();
            self.recreate_swapchain(context, window)?;
        }

        self.frame_started = false;
        self.current_frame_index = (self.current_frame_index + 1) % MAX_FRAMES_IN_FLIGHT;

        Ok(())
    }

    /// Begin the frame's single render pass and set the dynamic viewport
    /// and scissor for the current extent.
    pub fn begin_swapchain_render_pass(&self, command_buffer: vk::CommandBuffer) {
        assert!(self.frame_started, "Cannot begin render pass with no frame in progress");
        assert!(
            command_buffer == self.current_command_buffer(),
            "Cannot begin render pass on a command buffer from a different frame"
        );

        let extent = self.swapchain.extent();

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.01, 0.01, 0.01, 1.0],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];

        let render_pass_info = vk::RenderPassBeginInfo::builder()
            .render_pass(self.swapchain.render_pass())
            .framebuffer(self.swapchain.framebuffer(self.current_image_index))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        unsafe {
            self.device
                .cmd_begin_render_pass(command_buffer, &render_pass_info, vk::SubpassContents::INLINE);
            self.device.cmd_set_viewport(command_buffer, 0, &[viewport]);
            self.device.cmd_set_scissor(command_buffer, 0, &[scissor]);
        }
    }

    /// End the frame's render pass
    pub fn end_swapchain_render_pass(&self, command_buffer: vk::CommandBuffer) {
        assert!(self.frame_started, "Cannot end render pass with no frame in progress");
        assert!(
            command_buffer == self.current_command_buffer(),
            "Cannot end render pass on a command buffer from a different frame"
        );

        unsafe {
            self.device.cmd_end_render_pass(command_buffer);
        }
    }

    /// Rebuild the swap-chain for the current window extent.
    ///
    /// Blocks cooperatively while the extent is degenerate (minimized
    /// window), waits for all in-flight device work, then constructs a new
    /// generation chained from the old one. A change in the image or depth
    /// format contract between generations is fatal.
    fn recreate_swapchain(&mut self, context: &DeviceContext, window: &mut Window) -> VulkanResult<()> {
        let extent = wait_until_valid_extent(window);
        context.wait_idle()?;

        let new_swapchain = Swapchain::new(context, extent, Some(&self.swapchain))?;
        if !self.swapchain.compare_formats(&new_swapchain) {
            return Err(VulkanError::SwapchainFormatChanged);
        }

        log::info!(
            "Recreated swapchain at {}x{} ({} images)",
            extent.width,
            extent.height,
            new_swapchain.image_count()
        );

        self.swapchain = new_swapchain;
        Ok(())
    }
}
