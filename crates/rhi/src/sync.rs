//! Synchronization primitives.
//!
//! This module provides wrappers for the two Vulkan synchronization objects
//! the present loop relies on:
//! - [`Semaphore`] - GPU-to-GPU ordering between queue operations, never
//!   observed directly by the CPU
//! - [`Fence`] - GPU-to-CPU signaling the host can block on
//!
//! All fence waits here are bounded. The infinite waits common in tutorial
//! code turn a stalled driver into a stalled process; a bounded wait turns
//! it into a reportable [`RhiError::SyncTimeout`] instead, which the host
//! can distinguish from a real device loss.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Number of frames the scheduler keeps in flight.
///
/// Two slots let the CPU record/submit frame N+1 while the GPU still works
/// on frame N. Fixed at initialization; not a runtime tunable.
pub const FRAMES_IN_FLIGHT: usize = 2;

/// Vulkan semaphore wrapper.
///
/// Used to order queue operations: image acquisition before rendering, and
/// rendering before presentation.
pub struct Semaphore {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan semaphore handle.
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new semaphore in the unsignaled state.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        debug!("Created semaphore");

        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
        debug!("Destroyed semaphore");
    }
}

/// Vulkan fence wrapper.
///
/// The per-frame in-flight fences are created signaled so a shutdown before
/// the first frame never blocks on them.
pub struct Fence {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan fence handle.
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `signaled` - If true, the fence starts in the signaled state
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        debug!(
            "Created fence ({})",
            if signaled { "signaled" } else { "unsignaled" }
        );

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Waits for the fence to become signaled, up to the given bound.
    ///
    /// # Arguments
    ///
    /// * `timeout_ns` - Upper bound for the wait, in nanoseconds
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::SyncTimeout`] if the bound expires, or the
    /// underlying Vulkan error otherwise.
    pub fn wait(&self, timeout_ns: u64) -> RhiResult<()> {
        let fences = [self.fence];
        let result = unsafe {
            self.device
                .handle()
                .wait_for_fences(&fences, true, timeout_ns)
        };

        match result {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(RhiError::SyncTimeout {
                what: "frame fence",
                timeout_ns,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Resets the fence to the unsignaled state.
    ///
    /// The fence must not be referenced by an outstanding queue submission.
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset(&self) -> RhiResult<()> {
        let fences = [self.fence];
        unsafe { self.device.handle().reset_fences(&fences)? };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
        debug!("Destroyed fence");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_in_flight_is_double_buffered() {
        assert_eq!(FRAMES_IN_FLIGHT, 2);
    }

    #[test]
    fn test_semaphore_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Semaphore>();
    }

    #[test]
    fn test_fence_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Fence>();
    }
}
