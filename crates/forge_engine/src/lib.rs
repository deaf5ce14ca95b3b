//! # Forge Engine
//!
//! A tutorial-style 3D engine built directly on Vulkan.
//!
//! The engine is organized around a retained scene of game objects that is
//! mutated by a fixed physics step and consumed by composable render
//! systems. The frame orchestrator ([`render::Renderer`]) owns the
//! swap-chain lifecycle: it decides when the swap-chain must be recreated,
//! brackets every frame with begin/end calls, and hands out the live
//! command buffer for the frame.
//!
//! ## Frame flow
//!
//! ```text
//! poll input -> physics step -> begin_frame -> render pass
//!     -> mesh system, point light system -> end pass -> submit/present
//! ```
//!
//! A frame that cannot acquire a drawable image (stale swap-chain) is
//! skipped wholesale; the orchestrator recreates the swap-chain and the
//! loop simply tries again on the next iteration.

pub mod assets;
pub mod config;
pub mod foundation;
pub mod physics;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{EngineConfig, PhysicsConfig, ShaderConfig, WindowConfig};
    pub use crate::foundation::{
        math::{Mat3, Mat4, Vec2, Vec3, Vec4},
        time::Timer,
    };
    pub use crate::physics::PhysicsSystem;
    pub use crate::render::{
        systems::{MeshRenderSystem, PointLightSystem},
        vulkan::{DeviceContext, VulkanError, VulkanResult},
        Camera, FrameInfo, GlobalUbo, Mesh, MeshData, Renderer, Window,
    };
    pub use crate::scene::{
        GameObject, GameObjectId, GameObjectStore, PhysicsComponent, PointLightComponent,
        TransformComponent,
    };
}
