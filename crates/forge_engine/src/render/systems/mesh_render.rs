//! Opaque mesh pass
//!
//! Draws every entity that carries a mesh. Per-draw data travels in a
//! 128-byte push block (the device-guaranteed minimum): model matrix,
//! normal matrix, and material color.

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};
use std::path::Path;

use crate::render::frame_info::FrameInfo;
use crate::render::mesh::Vertex;
use crate::render::vulkan::{DeviceContext, GraphicsPipeline, PipelineConfig, VulkanError, VulkanResult};

/// Per-draw parameter block; must stay within the 128-byte guaranteed
/// push-constant budget.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct MeshPushConstants {
    model_matrix: [[f32; 4]; 4],
    /// mat3 with vec4-aligned columns, as GLSL lays it out
    normal_matrix: [[f32; 4]; 3],
    color: [f32; 4],
}

/// Render system for opaque, mesh-carrying entities
pub struct MeshRenderSystem {
    device: Device,
    pipeline: GraphicsPipeline,
    pipeline_layout: vk::PipelineLayout,
}

impl MeshRenderSystem {
    /// Build the pipeline and layout for the pass. Failure here is a
    /// startup-time condition (driver or shader binary problem) and is
    /// never retried.
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
            size: std::mem::size_of::<MeshPushConstants>() as u32,
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
        config.binding_descriptions = Vertex::binding_descriptions();
        config.attribute_descriptions = Vertex::attribute_descriptions();
        config.render_pass = render_pass;
        config.pipeline_layout = pipeline_layout;

        let pipeline = GraphicsPipeline::new(device.clone(), vert_path, frag_path, &config)?;

        Ok(Self {
            device,
            pipeline,
            pipeline_layout,
        })
    }

    /// Record draws for every entity with a mesh. Reads the scene only.
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
            let Some(mesh) = &object.mesh else { continue };

            let normal = object.transform.normal_matrix();
            let push = MeshPushConstants {
                model_matrix: object.transform.mat4().into(),
                normal_matrix: [
                    [normal[(0, 0)], normal[(1, 0)], normal[(2, 0)], 0.0],
                    [normal[(0, 1)], normal[(1, 1)], normal[(2, 1)], 0.0],
                    [normal[(0, 2)], normal[(1, 2)], normal[(2, 2)], 0.0],
                ],
                color: [object.color.x, object.color.y, object.color.z, 1.0],
            };

            unsafe {
                self.device.cmd_push_constants(
                    command_buffer,
                    self.pipeline_layout,
                    vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                    0,
                    bytemuck::bytes_of(&push),
                );
            }

            mesh.bind(command_buffer);
            mesh.draw(command_buffer);
        }
    }
}

impl Drop for MeshRenderSystem {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.pipeline_layout, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_block_fits_guaranteed_budget() {
        // 128 bytes is the minimum maxPushConstantsSize any device offers
        assert_eq!(std::mem::size_of::<MeshPushConstants>(), 128);
    }
}
