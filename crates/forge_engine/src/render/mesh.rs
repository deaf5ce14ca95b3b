//! Mesh geometry resident in device memory
//!
//! A [`Mesh`] is immutable after construction: a vertex buffer and an
//! optional index buffer uploaded once. Entities share meshes through
//! `Arc`; device resources are freed when the last reference drops.

use ash::{vk, Device};
use bytemuck::{Pod, Zeroable};

use crate::render::vulkan::{Buffer, DeviceContext, VulkanResult};

/// Vertex layout shared by every mesh pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Vertex buffer binding description
    pub fn binding_descriptions() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    /// Attribute descriptions matching the shader input locations
    pub fn attribute_descriptions() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 24,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32_SFLOAT,
                offset: 36,
            },
        ]
    }
}

/// CPU-side mesh description used to build a [`Mesh`]
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit cube centered at the origin, one face color per side
    pub fn cube() -> Self {
        let face = |normal: [f32; 3], color: [f32; 3], corners: [[f32; 3]; 4]| -> Vec<Vertex> {
            corners
                .iter()
                .zip([[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]].iter())
                .map(|(&position, &uv)| Vertex {
                    position,
                    color,
                    normal,
                    uv,
                })
                .collect()
        };

        let h = 0.5;
        let faces: [Vec<Vertex>; 6] = [
            // -X (left, white-ish)
            face(
                [-1.0, 0.0, 0.0],
                [0.9, 0.9, 0.9],
                [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
            ),
            // +X (right, yellow-ish)
            face(
                [1.0, 0.0, 0.0],
                [0.8, 0.8, 0.1],
                [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]],
            ),
            // -Y (top in Y-down, orange-ish)
            face(
                [0.0, -1.0, 0.0],
                [0.9, 0.6, 0.1],
                [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
            ),
            // +Y (bottom, red-ish)
            face(
                [0.0, 1.0, 0.0],
                [0.8, 0.1, 0.1],
                [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]],
            ),
            // -Z (near, blue-ish)
            face(
                [0.0, 0.0, -1.0],
                [0.1, 0.1, 0.8],
                [[-h, -h, -h], [-h, h, -h], [h, h, -h], [h, -h, -h]],
            ),
            // +Z (far, green-ish)
            face(
                [0.0, 0.0, 1.0],
                [0.1, 0.8, 0.1],
                [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
            ),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for face_vertices in faces {
            let base = vertices.len() as u32;
            vertices.extend(face_vertices);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self { vertices, indices }
    }
}

/// Mesh resident in device memory
pub struct Mesh {
    device: Device,
    vertex_buffer: Buffer,
    vertex_count: u32,
    index_buffer: Option<Buffer>,
    index_count: u32,
}

impl Mesh {
    /// Upload mesh data into device-visible buffers
    pub fn new(context: &DeviceContext, data: &MeshData) -> VulkanResult<Self> {
        let vertex_count = data.vertices.len() as u32;
        assert!(vertex_count >= 3, "Mesh needs at least 3 vertices");

        let vertex_buffer = Buffer::new(
            context,
            (data.vertices.len() * std::mem::size_of::<Vertex>()) as vk::DeviceSize,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        )?;
        vertex_buffer.write_data(&data.vertices)?;

        let index_count = data.indices.len() as u32;
        let index_buffer = if data.indices.is_empty() {
            None
        } else {
            let buffer = Buffer::new(
                context,
                (data.indices.len() * std::mem::size_of::<u32>()) as vk::DeviceSize,
                vk::BufferUsageFlags::INDEX_BUFFER,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            )?;
            buffer.write_data(&data.indices)?;
            Some(buffer)
        };

        Ok(Self {
            device: context.raw_device(),
            vertex_buffer,
            vertex_count,
            index_buffer,
            index_count,
        })
    }

    /// Bind the vertex (and index) buffers
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(command_buffer, 0, &[self.vertex_buffer.handle()], &[0]);

            if let Some(index_buffer) = &self.index_buffer {
                self.device
                    .cmd_bind_index_buffer(command_buffer, index_buffer.handle(), 0, vk::IndexType::UINT32);
            }
        }
    }

    /// Record the draw for this mesh
    pub fn draw(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            if self.index_buffer.is_some() {
                self.device.cmd_draw_indexed(command_buffer, self.index_count, 1, 0, 0, 0);
            } else {
                self.device.cmd_draw(command_buffer, self.vertex_count, 1, 0, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_shader_inputs() {
        let bindings = Vertex::binding_descriptions();
        let attributes = Vertex::attribute_descriptions();

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].stride as usize, std::mem::size_of::<Vertex>());
        assert_eq!(attributes.len(), 4);

        // position / color / normal / uv packed back to back
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[1].offset, 12);
        assert_eq!(attributes[2].offset, 24);
        assert_eq!(attributes[3].offset, 36);
        assert_eq!(std::mem::size_of::<Vertex>(), 44);
    }

    #[test]
    fn test_cube_has_closed_index_list() {
        let cube = MeshData::cube();

        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        let max_index = *cube.indices.iter().max().unwrap();
        assert!((max_index as usize) < cube.vertices.len());
    }

    #[test]
    fn test_cube_normals_are_unit_axes() {
        let cube = MeshData::cube();

        for vertex in &cube.vertices {
            let length_sq: f32 = vertex.normal.iter().map(|c| c * c).sum();
            assert!((length_sq - 1.0).abs() < 1e-6);
        }
    }
}
