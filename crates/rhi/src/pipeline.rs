//! Graphics pipeline management.
//!
//! This module handles VkPipelineLayout and VkPipeline creation for the
//! fixed two-stage program. All fixed-function state is assembled from one
//! immutable [`PipelineDescriptor`] value in a single creation call; there
//! is no builder to mutate and no state to revisit afterwards.
//!
//! The pipeline draws with no vertex input: the three vertex positions live
//! in the vertex stage's own code, so the vertex-input state is empty and
//! the layout carries zero descriptor sets and zero push-constant ranges.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::RhiResult;
use crate::render_pass::RenderPass;
use crate::shader::Shader;

/// Vulkan pipeline layout wrapper.
///
/// The presenter binds nothing externally, so the layout is always empty:
/// no descriptor set layouts, no push-constant ranges.
pub struct PipelineLayout {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan pipeline layout handle.
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates an empty pipeline layout.
    ///
    /// # Errors
    ///
    /// Returns an error if pipeline layout creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::PipelineLayoutCreateInfo::default();

        let layout = unsafe { device.handle().create_pipeline_layout(&create_info, None)? };

        debug!("Created empty pipeline layout");

        Ok(Self { device, layout })
    }

    /// Returns the Vulkan pipeline layout handle.
    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
        debug!("Pipeline layout destroyed");
    }
}

/// Immutable description of the graphics pipeline to create.
///
/// Everything variable about the pipeline is captured here before the single
/// creation call; the shaders only need to stay alive until that call
/// returns.
pub struct PipelineDescriptor<'a> {
    /// Compiled vertex stage.
    pub vertex_shader: &'a Shader,
    /// Compiled fragment stage.
    pub fragment_shader: &'a Shader,
    /// Fixed viewport and scissor extent (the swapchain extent).
    pub extent: vk::Extent2D,
}

/// Vulkan graphics pipeline wrapper.
pub struct Pipeline {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan pipeline handle.
    pipeline: vk::Pipeline,
}

impl Pipeline {
    /// Creates the graphics pipeline.
    ///
    /// Fixed-function state:
    /// - no vertex input bindings or attributes
    /// - triangle-list topology
    /// - static viewport and scissor covering the descriptor's extent
    /// - fill rasterization, back-face culling, clockwise front face
    /// - no multisampling
    /// - alpha blending (src-alpha / one-minus-src-alpha, additive alpha)
    ///
    /// # Errors
    ///
    /// Returns an error if pipeline creation fails.
    pub fn new_graphics(
        device: Arc<Device>,
        render_pass: &RenderPass,
        layout: &PipelineLayout,
        descriptor: &PipelineDescriptor,
    ) -> RhiResult<Self> {
        let stages = [
            descriptor.vertex_shader.stage_create_info(),
            descriptor.fragment_shader.stage_create_info(),
        ];

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewports = [vk::Viewport::default()
            .x(0.0)
            .y(0.0)
            .width(descriptor.extent.width as f32)
            .height(descriptor.extent.height as f32)
            .min_depth(0.0)
            .max_depth(1.0)];

        let scissors = [vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: descriptor.extent,
        }];

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(true)
            .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
            .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ONE)
            .alpha_blend_op(vk::BlendOp::ADD)];

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(layout.handle())
            .render_pass(render_pass.handle())
            .subpass(0);

        let pipeline = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, result)| result)?[0]
        };

        info!(
            "Graphics pipeline created ({}x{})",
            descriptor.extent.width, descriptor.extent.height
        );

        Ok(Self { device, pipeline })
    }

    /// Returns the Vulkan pipeline handle.
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        info!("Graphics pipeline destroyed");
    }
}
