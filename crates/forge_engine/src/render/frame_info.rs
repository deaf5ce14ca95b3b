//! Per-frame context passed to every subsystem
//!
//! Render systems take `&FrameInfo` and can only read the scene through
//! it; the physics integrator takes `&mut FrameInfo` and is the only
//! subsystem allowed to mutate object state during a frame.

use ash::vk;
use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;
use crate::render::camera::Camera;
use crate::scene::GameObjectStore;

/// Scene-wide uniform data bound once per frame
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GlobalUbo {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// w component is the ambient intensity
    pub ambient_light_color: [f32; 4],
    pub light_position: [f32; 4],
    /// w component is the light intensity
    pub light_color: [f32; 4],
}

impl GlobalUbo {
    /// Assemble the frame's uniform block from the camera and the first
    /// light-emitting object in the store.
    pub fn from_scene(camera: &Camera, objects: &GameObjectStore) -> Self {
        let mut light_position = [0.0, -1.0, 0.0, 1.0];
        let mut light_color = [1.0, 1.0, 1.0, 0.0];

        if let Some((_, light)) = objects.iter().find(|(_, object)| object.point_light.is_some()) {
            let intensity = light.point_light.unwrap().light_intensity;
            let position: Vec3 = light.transform.translation;
            light_position = [position.x, position.y, position.z, 1.0];
            light_color = [light.color.x, light.color.y, light.color.z, intensity];
        }

        Self {
            projection: (*camera.projection()).into(),
            view: (*camera.view()).into(),
            ambient_light_color: [1.0, 1.0, 1.0, 0.02],
            light_position,
            light_color,
        }
    }
}

/// Everything a subsystem needs for one frame
pub struct FrameInfo<'a> {
    /// Frame-in-flight slot index
    pub frame_index: usize,
    /// Elapsed time since the previous frame, in seconds
    pub frame_time: f32,
    /// Live command buffer for the frame
    pub command_buffer: vk::CommandBuffer,
    /// Camera the frame is rendered through
    pub camera: &'a Camera,
    /// Global descriptor set for this slot
    pub global_descriptor_set: vk::DescriptorSet,
    /// The scene; render systems read it, the physics step mutates it
    pub game_objects: &'a mut GameObjectStore,
}
