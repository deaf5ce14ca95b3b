//! Rendering: window, device context, frame orchestration, render systems

pub mod camera;
pub mod frame_info;
pub mod mesh;
pub mod renderer;
pub mod systems;
pub mod vulkan;
pub mod window;

pub use camera::Camera;
pub use frame_info::{FrameInfo, GlobalUbo};
pub use mesh::{Mesh, MeshData, Vertex};
pub use renderer::Renderer;
pub use window::{wait_until_valid_extent, ExtentSource, Window, WindowError};
