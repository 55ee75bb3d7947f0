//! Physical device (GPU) selection.
//!
//! Selection policy is first-fit, not scored: the first enumerated device
//! that exposes a queue family supporting both graphics operations and
//! presentation to the surface wins. Simplicity over optimality is
//! deliberate; what the policy must never do is leave the choice
//! undetermined, so selection fails closed with
//! [`RhiError::NoSuitableDevice`] when nothing qualifies.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;

/// The physical device chosen for rendering, together with the single queue
/// family used for both graphics and presentation.
#[derive(Clone, Copy)]
pub struct DeviceSelection {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version).
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue family index supporting graphics and presentation.
    pub queue_family: u32,
}

impl DeviceSelection {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }
}

impl std::fmt::Debug for DeviceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSelection")
            .field("name", &self.device_name())
            .field("queue_family", &self.queue_family)
            .finish()
    }
}

/// Selects the physical device to render with.
///
/// Devices are examined in enumeration order and the first one exposing a
/// combined graphics + present queue family is taken.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableDevice`] if no device is enumerated or no
/// enumerated device qualifies.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<DeviceSelection, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableDevice);
    }

    info!("Found {} GPU(s)", devices.len());

    for device in devices {
        let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

        let queue_family = find_combined_family(&families, |index| unsafe {
            surface_loader
                .get_physical_device_surface_support(device, index, surface)
                .unwrap_or(false)
        });

        let properties = unsafe { instance.get_physical_device_properties(device) };

        match queue_family {
            Some(queue_family) => {
                let selection = DeviceSelection {
                    device,
                    properties,
                    queue_family,
                };
                info!(
                    "Selected GPU: '{}' (queue family {})",
                    selection.device_name(),
                    queue_family
                );
                return Ok(selection);
            }
            None => {
                debug!(
                    "GPU '{}' skipped: no combined graphics + present queue family",
                    unsafe {
                        CStr::from_ptr(properties.device_name.as_ptr())
                            .to_str()
                            .unwrap_or("Unknown")
                    }
                );
            }
        }
    }

    warn!("No GPU exposes a combined graphics + present queue family");
    Err(RhiError::NoSuitableDevice)
}

/// Finds the first queue family that supports graphics operations and for
/// which `supports_present` reports presentation support.
fn find_combined_family(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: impl FnMut(u32) -> bool,
) -> Option<u32> {
    families.iter().enumerate().find_map(|(index, family)| {
        let index = index as u32;

        if family.queue_count == 0 {
            return None;
        }

        let has_graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
        if has_graphics && supports_present(index) {
            Some(index)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, count: u32) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_families_fails_closed() {
        assert_eq!(find_combined_family(&[], |_| true), None);
    }

    #[test]
    fn test_graphics_without_present_fails_closed() {
        let families = [family(vk::QueueFlags::GRAPHICS, 1)];
        assert_eq!(find_combined_family(&families, |_| false), None);
    }

    #[test]
    fn test_present_without_graphics_fails_closed() {
        let families = [family(vk::QueueFlags::TRANSFER, 1)];
        assert_eq!(find_combined_family(&families, |_| true), None);
    }

    #[test]
    fn test_first_fit_takes_earliest_combined_family() {
        let families = [
            family(vk::QueueFlags::TRANSFER, 1),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, 4),
            family(vk::QueueFlags::GRAPHICS, 1),
        ];
        assert_eq!(find_combined_family(&families, |_| true), Some(1));
    }

    #[test]
    fn test_graphics_family_without_present_is_skipped() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 1),
            family(vk::QueueFlags::GRAPHICS, 1),
        ];
        // Only family 1 can present
        assert_eq!(find_combined_family(&families, |i| i == 1), Some(1));
    }

    #[test]
    fn test_empty_family_is_skipped() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, 0),
            family(vk::QueueFlags::GRAPHICS, 1),
        ];
        assert_eq!(find_combined_family(&families, |_| true), Some(1));
    }
}
