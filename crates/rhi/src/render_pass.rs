//! Render pass creation.
//!
//! A single-subpass render pass with one color attachment, matching the
//! swapchain format. The attachment is cleared on load, stored for
//! presentation, and transitioned from UNDEFINED to PRESENT_SRC_KHR across
//! the pass.
//!
//! The EXTERNAL -> 0 subpass dependency gates the subpass on the
//! color-attachment-output stage. Without it, reusing a swapchain image
//! could start clearing before a prior presentation of the same image has
//! released it; with it, the render pass stays safe to replay across the
//! scheduler's image-in-flight tracking.

use std::sync::Arc;

use ash::vk;
use tracing::info;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan render pass wrapper.
pub struct RenderPass {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan render pass handle.
    render_pass: vk::RenderPass,
}

impl RenderPass {
    /// Creates a render pass for presenting to swapchain images of the given
    /// format.
    ///
    /// # Errors
    ///
    /// Returns an error if render pass creation fails.
    pub fn new(device: Arc<Device>, color_format: vk::Format) -> RhiResult<Self> {
        let color_attachment = vk::AttachmentDescription::default()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

        let attachments = [color_attachment];

        let color_attachment_refs = [vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];

        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_attachment_refs)];

        let dependencies = [vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { device.handle().create_render_pass(&create_info, None)? };

        info!("Render pass created for format {:?}", color_format);

        Ok(Self {
            device,
            render_pass,
        })
    }

    /// Returns the Vulkan render pass handle.
    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_render_pass(self.render_pass, None);
        }
        info!("Render pass destroyed");
    }
}
