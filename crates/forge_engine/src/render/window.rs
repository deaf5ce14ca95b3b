//! Window management using GLFW
//!
//! Provides window creation, event handling, and the surface/extent queries
//! the frame orchestrator needs for swap-chain management.

use ash::vk;
use thiserror::Error;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("GLFW initialization failed")]
    InitializationFailed,

    #[error("Window creation failed")]
    CreationFailed,

    #[error("GLFW error: {0}")]
    GlfwError(String),
}

pub type WindowResult<T> = Result<T, WindowError>;

/// Anything that can report a drawable extent and block for window events.
///
/// The frame orchestrator only needs these two operations while it waits out
/// a degenerate (zero-area) extent, so they are factored into a trait that a
/// test double can implement as well.
pub trait ExtentSource {
    /// Current drawable extent in pixels
    fn framebuffer_extent(&self) -> vk::Extent2D;

    /// Block until at least one window event arrives
    fn wait_events(&mut self);
}

/// Block cooperatively until the drawable extent has a non-zero area.
///
/// A minimized window reports a zero-sized framebuffer; a swap-chain cannot
/// be created for it, so recreation parks here until the window becomes
/// visible again. This is the only intentional blocking point in the frame
/// loop.
pub fn wait_until_valid_extent(source: &mut dyn ExtentSource) -> vk::Extent2D {
    let mut extent = source.framebuffer_extent();
    while extent.width == 0 || extent.height == 0 {
        source.wait_events();
        extent = source.framebuffer_extent();
    }
    extent
}

/// GLFW window wrapper with proper resource management
pub struct Window {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    framebuffer_resized: bool,
}

impl Window {
    pub fn new(width: u32, height: u32, title: &str) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors).map_err(|_| WindowError::InitializationFailed)?;

        // Configure for Vulkan (no OpenGL context)
        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        Ok(Self {
            glfw,
            window,
            events,
            framebuffer_resized: false,
        })
    }

    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Pump the event queue without blocking
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
        self.process_events();
    }

    /// Whether the framebuffer changed size since the flag was last reset
    pub fn was_resized(&self) -> bool {
        self.framebuffer_resized
    }

    pub fn reset_resized_flag(&mut self) {
        self.framebuffer_resized = false;
    }

    /// Current key state for raw input queries
    pub fn is_key_pressed(&self, key: glfw::Key) -> bool {
        self.window.get_key(key) == glfw::Action::Press
    }

    /// Get required Vulkan instance extensions from GLFW
    pub fn required_instance_extensions(&self) -> WindowResult<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or_else(|| WindowError::GlfwError("Failed to get required extensions".to_string()))
    }

    /// Create a Vulkan surface using GLFW's built-in functionality
    pub fn create_surface(&mut self, instance: vk::Instance) -> WindowResult<vk::SurfaceKHR> {
        let mut surface = vk::SurfaceKHR::null();
        let result = self.window.create_window_surface(instance, std::ptr::null(), &mut surface);

        if result == vk::Result::SUCCESS {
            Ok(surface)
        } else {
            Err(WindowError::GlfwError(format!(
                "Failed to create Vulkan surface: {:?}",
                result
            )))
        }
    }

    fn process_events(&mut self) {
        for (_, event) in glfw::flush_messages(&self.events) {
            if let glfw::WindowEvent::FramebufferSize(_, _) = event {
                self.framebuffer_resized = true;
            }
        }
    }
}

impl ExtentSource for Window {
    fn framebuffer_extent(&self) -> vk::Extent2D {
        let (width, height) = self.window.get_framebuffer_size();
        vk::Extent2D {
            width: width as u32,
            height: height as u32,
        }
    }

    fn wait_events(&mut self) {
        self.glfw.wait_events();
        self.process_events();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports a zero extent for the first `zero_polls` waits, then a real one.
    struct StubExtentSource {
        zero_polls: u32,
        waits: u32,
        extent: vk::Extent2D,
    }

    impl ExtentSource for StubExtentSource {
        fn framebuffer_extent(&self) -> vk::Extent2D {
            if self.waits < self.zero_polls {
                vk::Extent2D { width: 0, height: 0 }
            } else {
                self.extent
            }
        }

        fn wait_events(&mut self) {
            self.waits += 1;
        }
    }

    #[test]
    fn test_wait_until_valid_extent_blocks_while_degenerate() {
        let mut stub = StubExtentSource {
            zero_polls: 5,
            waits: 0,
            extent: vk::Extent2D { width: 800, height: 600 },
        };

        let extent = wait_until_valid_extent(&mut stub);

        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
        assert_eq!(stub.waits, 5, "should have blocked once per degenerate poll");
    }

    #[test]
    fn test_wait_until_valid_extent_returns_immediately_when_valid() {
        let mut stub = StubExtentSource {
            zero_polls: 0,
            waits: 0,
            extent: vk::Extent2D { width: 1, height: 1 },
        };

        let extent = wait_until_valid_extent(&mut stub);

        assert_eq!((extent.width, extent.height), (1, 1));
        assert_eq!(stub.waits, 0);
    }

    #[test]
    fn test_wait_until_valid_extent_rejects_zero_width_only() {
        struct HalfDegenerate {
            fixed: bool,
        }

        impl ExtentSource for HalfDegenerate {
            fn framebuffer_extent(&self) -> vk::Extent2D {
                if self.fixed {
                    vk::Extent2D { width: 640, height: 480 }
                } else {
                    // Height alone being non-zero is still a degenerate surface
                    vk::Extent2D { width: 0, height: 480 }
                }
            }

            fn wait_events(&mut self) {
                self.fixed = true;
            }
        }

        let mut stub = HalfDegenerate { fixed: false };
        let extent = wait_until_valid_extent(&mut stub);
        assert_eq!((extent.width, extent.height), (640, 480));
    }
}
