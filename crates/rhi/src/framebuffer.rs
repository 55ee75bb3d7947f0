//! Framebuffer management.
//!
//! One framebuffer per swapchain image view, bound to the render pass, at
//! the swapchain extent. Order matches the image views exactly; the command
//! recorder indexes buffers by this position.

use std::sync::Arc;

use ash::vk;
use tracing::info;

use crate::device::Device;
use crate::error::RhiResult;
use crate::render_pass::RenderPass;

/// The set of framebuffers backing the swapchain images.
pub struct FramebufferSet {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// One framebuffer per swapchain image view, in view order.
    framebuffers: Vec<vk::Framebuffer>,
}

impl FramebufferSet {
    /// Creates one framebuffer per image view.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `render_pass` - The render pass the framebuffers bind to
    /// * `image_views` - The swapchain image views, in image order
    /// * `extent` - The swapchain extent
    ///
    /// # Errors
    ///
    /// Returns an error if any framebuffer creation fails; framebuffers
    /// created so far are released by the set's Drop.
    pub fn new(
        device: Arc<Device>,
        render_pass: &RenderPass,
        image_views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let mut set = Self {
            device,
            framebuffers: Vec::with_capacity(image_views.len()),
        };

        for &image_view in image_views {
            let attachments = [image_view];

            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            let framebuffer = unsafe { set.device.handle().create_framebuffer(&create_info, None)? };

            set.framebuffers.push(framebuffer);
        }

        info!("Created {} framebuffers", set.framebuffers.len());

        Ok(set)
    }

    /// Returns the framebuffer handles, in image-view order.
    #[inline]
    pub fn handles(&self) -> &[vk::Framebuffer] {
        &self.framebuffers
    }

    /// Returns the number of framebuffers.
    #[inline]
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    /// Returns true if the set is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}

impl Drop for FramebufferSet {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.handle().destroy_framebuffer(framebuffer, None);
            }
        }
        info!("Destroyed {} framebuffers", self.framebuffers.len());
    }
}
