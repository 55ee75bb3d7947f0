//! Vulkan logical device and queue management.
//!
//! This module handles VkDevice creation and queue retrieval.
//!
//! # Overview
//!
//! The [`Device`] struct provides a safe abstraction over the Vulkan logical
//! device. The device requests exactly one queue (priority 1.0) from the
//! selected combined family and enables a single extension: swapchain
//! support. Graphics and present queues are retrieved separately but may
//! alias the same underlying queue.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::error::RhiError;
use crate::instance::Instance;
use crate::physical_device::DeviceSelection;

/// Required device extensions.
const DEVICE_EXTENSIONS: &[&std::ffi::CStr] = &[ash::khr::swapchain::NAME];

/// Vulkan logical device wrapper.
///
/// Manages the lifetime of the Vulkan logical device and its queues. Shared
/// across the resource wrappers via `Arc` so the device outlives everything
/// created from it.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// Graphics queue handle.
    graphics_queue: vk::Queue,
    /// Presentation queue handle (may alias the graphics queue).
    present_queue: vk::Queue,
    /// Queue family index used for both graphics and presentation.
    queue_family: u32,
}

impl Device {
    /// Creates a new logical device from the selected physical device.
    ///
    /// # Errors
    ///
    /// Returns an error if device creation fails.
    pub fn new(instance: &Instance, selection: &DeviceSelection) -> Result<Arc<Self>, RhiError> {
        let queue_priorities = [1.0f32];
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(selection.queue_family)
            .queue_priorities(&queue_priorities)];

        // No optional features are requested; the fixed pipeline needs none.
        let features = vk::PhysicalDeviceFeatures::default();

        let extension_names: Vec<*const i8> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(selection.device, &create_info, None)?
        };

        info!(
            "Logical device created with {} extension(s)",
            DEVICE_EXTENSIONS.len()
        );

        let graphics_queue = unsafe { device.get_device_queue(selection.queue_family, 0) };
        let present_queue = unsafe { device.get_device_queue(selection.queue_family, 0) };
        debug!(
            "Graphics and present queues retrieved from family {}",
            selection.queue_family
        );

        Ok(Arc::new(Self {
            device,
            physical_device: selection.device,
            graphics_queue,
            present_queue,
            queue_family: selection.queue_family,
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the graphics queue handle.
    #[inline]
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Returns the presentation queue handle.
    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Returns the queue family index used for graphics and presentation.
    #[inline]
    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    /// Waits for the device to become idle.
    ///
    /// Blocks until all outstanding operations on all queues have completed.
    /// Must precede any teardown of objects the GPU may still reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_idle(&self) -> Result<(), RhiError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            // All queues must be drained before the device goes away
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("Failed to wait for device idle during drop: {:?}", e);
            }

            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_extensions_defined() {
        // Swapchain support is the single required extension
        assert_eq!(DEVICE_EXTENSIONS, &[ash::khr::swapchain::NAME]);
    }

    #[test]
    fn test_device_is_send_sync() {
        // Compile-time check that Device is Send + Sync
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
