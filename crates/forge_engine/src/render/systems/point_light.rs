//! Point light pass
//!
//! Draws a camera-facing billboard for every light-emitting entity. The
//! quad is generated in the vertex shader, so the pipeline binds no
//! vertex buffers at all.

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};
use std::path::Path;

use crate::render::frame_info::FrameInfo;
use crate::render::vulkan::{DeviceContext, GraphicsPipeline, PipelineConfig, VulkanError, VulkanResult};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PointLightPushConstants {
    position: [f32; 4],
    /// w component is the light intensity
    color: [f32; 4],
    radius: f32,
    _padding: [f32; 3],
}

/// Render system for point light billboards
pub struct PointLightSystem {
    device: Device,
    pipeline: GraphicsPipeline,
    pipeline_layout: vk::PipelineLayout,
}

impl PointLightSystem {
    /// Build the billboard pipeline. Failure is fatal at startup.
    pub fn new(
        context: &DeviceContext,
        render_pass: vk::RenderPass,
        global_set_layout: vk::DescriptorSetLayout,
        vert_path: &Path,
        frag_path: &Path,
    ) -> VulkanResult<Self> {
        let device = context.raw_device();

        let push_constant_range = vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            offset: 0,
            size: std::mem::size_of::<PointLightPushConstants>() as u32,
        };

        let set_layouts = [global_set_layout];
        let push_constant_ranges = [push_constant_range];
        let layout_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        let pipeline_layout = unsafe {
            device
                .create_pipeline_layout(&layout_info, None)
                .map_err(VulkanError::Api)?
        };

        let mut config = PipelineConfig::default_config();
        // The quad is synthesized from gl_VertexIndex; no vertex input
        config.binding_descriptions.clear();
        config.attribute_descriptions.clear();
        config.enable_alpha_blending();
        config.render_pass = render_pass;
        config.pipeline_layout = pipeline_layout;

        let pipeline = GraphicsPipeline::new(device.clone(), vert_path, frag_path, &config)?;

        Ok(Self {
            device,
            pipeline,
            pipeline_layout,
        })
    }

    /// Record one billboard draw per light-emitting entity
    pub fn render(&self, frame_info: &FrameInfo) {
        let command_buffer = frame_info.command_buffer;

        self.pipeline.bind(command_buffer);

        unsafe {
            self.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout,
                0,
                &[frame_info.global_descriptor_set],
                &[],
            );
        }

        for (_, object) in frame_info.game_objects.iter() {
            let Some(light) = object.point_light else { continue };

            let position = object.transform.translation;
            let push = PointLightPushConstants {
                position: [position.x, position.y, position.z, 1.0],
                color: [object.color.x, object.color.y, object.color.z, light.light_intensity],
                radius: object.transform.scale.x,
                _padding: [0.0; 3],
            };

            unsafe {
                self.device.cmd_push_constants(
                    command_buffer,
                    self.pipeline_layout,
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    0,
                    bytemuck::bytes_of(&push),
                );
                self.device.cmd_draw(command_buffer, 6, 1, 0, 0);
            }
        }
    }
}

impl Drop for PointLightSystem {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}
