//! Shader module loading and graphics pipeline management
//!
//! SPIR-V binaries are opaque blobs loaded from disk. The pipeline
//! configuration mirrors the fixed-function state a pass cares about and
//! defaults to dynamic viewport/scissor, so pipelines survive swap-chain
//! recreation without being rebuilt.

use ash::{vk, Device};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::render::vulkan::{VulkanError, VulkanResult};

/// Shader module wrapper with RAII cleanup
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create a shader module from SPIR-V bytecode
    pub fn from_bytes(device: Device, bytes: &[u8]) -> VulkanResult<Self> {
        // SPIR-V words are u32-aligned
        let (prefix, words, suffix) = unsafe { bytes.align_to::<u32>() };
        if !prefix.is_empty() || !suffix.is_empty() {
            return Err(VulkanError::InitializationFailed(
                "SPIR-V bytecode is not properly aligned".to_string(),
            ));
        }

        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);

        let module = unsafe {
            device
                .create_shader_module(&create_info, None)
                .map_err(VulkanError::Api)?
        };

        Ok(Self { device, module })
    }

    /// Load a shader module from a SPIR-V file
    pub fn from_file<P: AsRef<Path>>(device: Device, path: P) -> VulkanResult<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            VulkanError::InitializationFailed(format!("Failed to open shader file {:?}: {}", path, e))
        })?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            VulkanError::InitializationFailed(format!("Failed to read shader file {:?}: {}", path, e))
        })?;

        Self::from_bytes(device, &bytes)
    }

    /// Get the shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Fixed-function state for one graphics pipeline.
///
/// `render_pass` and `pipeline_layout` must be filled in by the caller
/// before the config is handed to [`GraphicsPipeline::new`].
pub struct PipelineConfig {
    pub binding_descriptions: Vec<vk::VertexInputBindingDescription>,
    pub attribute_descriptions: Vec<vk::VertexInputAttributeDescription>,
    pub input_assembly: vk::PipelineInputAssemblyStateCreateInfo,
    pub rasterization: vk::PipelineRasterizationStateCreateInfo,
    pub multisample: vk::PipelineMultisampleStateCreateInfo,
    pub color_blend_attachment: vk::PipelineColorBlendAttachmentState,
    pub depth_stencil: vk::PipelineDepthStencilStateCreateInfo,
    pub dynamic_states: Vec<vk::DynamicState>,
    pub render_pass: vk::RenderPass,
    pub pipeline_layout: vk::PipelineLayout,
    pub subpass: u32,
}

impl PipelineConfig {
    /// Sensible defaults for an opaque forward pass: triangle list,
    /// back-face culling off, depth test + write, no blending, dynamic
    /// viewport and scissor.
    pub fn default_config() -> Self {
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false)
            .build();

        let rasterization = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false)
            .build();

        let multisample = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .build();

        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .build();

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::builder()
            .depth_test_enable(true)
            .depth_write_enable(true)
            .depth_compare_op(vk::CompareOp::LESS)
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false)
            .build();

        Self {
            binding_descriptions: Vec::new(),
            attribute_descriptions: Vec::new(),
            input_assembly,
            rasterization,
            multisample,
            color_blend_attachment,
            depth_stencil,
            dynamic_states: vec![vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR],
            render_pass: vk::RenderPass::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            subpass: 0,
        }
    }

    /// Enable alpha blending on the color attachment (used by the point
    /// light billboards).
    pub fn enable_alpha_blending(&mut self) {
        self.color_blend_attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD)
            .build();
    }
}

/// Graphics pipeline wrapper with RAII cleanup
pub struct GraphicsPipeline {
    device: Device,
    pipeline: vk::Pipeline,
}

impl GraphicsPipeline {
    /// Create a graphics pipeline from SPIR-V files and a configuration
    pub fn new<P: AsRef<Path>>(
        device: Device,
        vert_path: P,
        frag_path: P,
        config: &PipelineConfig,
    ) -> VulkanResult<Self> {
        assert!(
            config.pipeline_layout != vk::PipelineLayout::null(),
            "Cannot create pipeline: no pipeline layout provided in config"
        );
        assert!(
            config.render_pass != vk::RenderPass::null(),
            "Cannot create pipeline: no render pass provided in config"
        );

        let vert_module = ShaderModule::from_file(device.clone(), vert_path)?;
        let frag_module = ShaderModule::from_file(device.clone(), frag_path)?;

        let entry_point = std::ffi::CStr::from_bytes_with_nul(b"main\0").unwrap();
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vert_module.handle())
                .name(entry_point)
                .build(),
            vk::PipelineShaderStageCreateInfo::builder()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(frag_module.handle())
                .name(entry_point)
                .build(),
        ];

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&config.binding_descriptions)
            .vertex_attribute_descriptions(&config.attribute_descriptions);

        // Viewport and scissor are dynamic; only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        let color_blend_attachments = [config.color_blend_attachment];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_state = vk::PipelineDynamicStateCreateInfo::builder()
            .dynamic_states(&config.dynamic_states);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&config.input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&config.rasterization)
            .multisample_state(&config.multisample)
            .depth_stencil_state(&config.depth_stencil)
            .color_blend_state(&color_blending)
            .dynamic_state(&dynamic_state)
            .layout(config.pipeline_layout)
            .render_pass(config.render_pass)
            .subpass(config.subpass);

        let pipelines = unsafe {
            device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info.build()], None)
                .map_err(|(_, err)| VulkanError::Api(err))?
        };

        // Shader modules may be destroyed once the pipeline exists; their
        // Drop impls run when this function returns.
        Ok(Self {
            device,
            pipeline: pipelines[0],
        })
    }

    /// Bind the pipeline for graphics work
    pub fn bind(&self, command_buffer: vk::CommandBuffer) {
        unsafe {
            self.device
                .cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, self.pipeline);
        }
    }

    /// Get the pipeline handle
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
    }
}
