//! Command pool and command buffer recording.
//!
//! The scene is static, so every command buffer is recorded exactly once at
//! initialization and resubmitted unchanged for the life of the presenter.
//! The pool therefore uses default flags: no per-buffer reset, no transient
//! hint. Buffers are freed implicitly when the pool is destroyed.

use std::sync::Arc;

use ash::vk;
use tracing::info;

use crate::device::Device;
use crate::error::RhiResult;
use crate::framebuffer::FramebufferSet;
use crate::pipeline::Pipeline;
use crate::render_pass::RenderPass;

/// Clear color for the single color attachment: opaque blue.
const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

/// Vulkan command pool wrapper.
///
/// Allocated buffers belong to the pool and are freed with it.
pub struct CommandPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan command pool handle.
    pool: vk::CommandPool,
    /// Queue family index this pool belongs to.
    queue_family: u32,
}

impl CommandPool {
    /// Creates a new command pool for the specified queue family.
    ///
    /// The pool uses default flags: the buffers it allocates are recorded
    /// once and never individually reset.
    ///
    /// # Errors
    ///
    /// Returns an error if command pool creation fails.
    pub fn new(device: Arc<Device>, queue_family: u32) -> RhiResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::default().queue_family_index(queue_family);

        let pool = unsafe { device.handle().create_command_pool(&create_info, None)? };

        info!("Command pool created for queue family {}", queue_family);

        Ok(Self {
            device,
            pool,
            queue_family,
        })
    }

    /// Returns the Vulkan command pool handle.
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// Returns the queue family index this pool belongs to.
    #[inline]
    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    /// Allocates primary command buffers from this pool.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn allocate_command_buffers(&self, count: u32) -> RhiResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        let buffers = unsafe { self.device.handle().allocate_command_buffers(&alloc_info)? };
        Ok(buffers)
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_command_pool(self.pool, None);
        }
        info!(
            "Command pool destroyed for queue family {}",
            self.queue_family
        );
    }
}

/// The pool and the pre-recorded draw buffers, one per framebuffer.
pub struct CommandRecorder {
    /// Command pool owning the buffers (kept alive for their lifetime).
    pool: CommandPool,
    /// One pre-recorded primary buffer per framebuffer, in framebuffer order.
    buffers: Vec<vk::CommandBuffer>,
}

impl CommandRecorder {
    /// Allocates and records one draw buffer per framebuffer.
    ///
    /// Each buffer records, unconditionally: begin the render pass on its
    /// framebuffer with the opaque-blue clear, bind the graphics pipeline,
    /// draw three vertices in one instance, end the render pass. Recording
    /// happens here exactly once; the buffers are never re-recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation, allocation, or recording fails.
    pub fn record(
        device: Arc<Device>,
        queue_family: u32,
        framebuffers: &FramebufferSet,
        render_pass: &RenderPass,
        pipeline: &Pipeline,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let pool = CommandPool::new(device.clone(), queue_family)?;
        let buffers = pool.allocate_command_buffers(framebuffers.len() as u32)?;

        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: CLEAR_COLOR,
            },
        }];

        for (&buffer, &framebuffer) in buffers.iter().zip(framebuffers.handles()) {
            let begin_info = vk::CommandBufferBeginInfo::default();

            let render_pass_begin = vk::RenderPassBeginInfo::default()
                .render_pass(render_pass.handle())
                .framebuffer(framebuffer)
                .render_area(vk::Rect2D {
                    offset: vk::Offset2D { x: 0, y: 0 },
                    extent,
                })
                .clear_values(&clear_values);

            unsafe {
                device.handle().begin_command_buffer(buffer, &begin_info)?;
                device.handle().cmd_begin_render_pass(
                    buffer,
                    &render_pass_begin,
                    vk::SubpassContents::INLINE,
                );
                device.handle().cmd_bind_pipeline(
                    buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    pipeline.handle(),
                );
                device.handle().cmd_draw(buffer, 3, 1, 0, 0);
                device.handle().cmd_end_render_pass(buffer);
                device.handle().end_command_buffer(buffer)?;
            }
        }

        info!("Recorded {} draw command buffers", buffers.len());

        Ok(Self { pool, buffers })
    }

    /// Returns the pre-recorded buffer for the given swapchain image index.
    ///
    /// # Panics
    ///
    /// Panics if `image_index` is out of bounds.
    #[inline]
    pub fn buffer(&self, image_index: usize) -> vk::CommandBuffer {
        self.buffers[image_index]
    }

    /// Returns the number of recorded buffers.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns true if no buffers were recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Returns the owning command pool.
    #[inline]
    pub fn pool(&self) -> &CommandPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_color_is_opaque_blue() {
        assert_eq!(CLEAR_COLOR, [0.0, 0.0, 1.0, 1.0]);
    }
}
