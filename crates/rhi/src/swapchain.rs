//! Swapchain management.
//!
//! This module handles VkSwapchainKHR creation, image acquisition, and
//! presentation.
//!
//! # Overview
//!
//! The [`Swapchain`] struct provides a safe abstraction over the Vulkan
//! swapchain:
//! - Surface capability querying
//! - Deterministic format, present mode, extent, and image count selection
//! - Image view creation and management
//!
//! The selection rules are total orders over whatever the surface offers, so
//! the outcome is reproducible for a given support set. They live in free
//! functions so they can be tested without a device.

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::RhiError;
use crate::instance::Instance;

/// Surface support details for swapchain creation.
#[derive(Debug, Clone)]
pub struct SurfaceSupport {
    /// Surface capabilities (min/max image count, extents, transforms)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (format and color space combinations)
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes (FIFO, MAILBOX, IMMEDIATE, ...)
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupport {
    /// Queries surface support details for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> Result<Self, RhiError> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Surface support: {} formats, {} present modes, image count {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unbounded".to_string()
            } else {
                capabilities.max_image_count.to_string()
            }
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Returns true if at least one format and one present mode are offered.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Vulkan swapchain wrapper.
///
/// Owns the swapchain handle and one image view per swapchain image. The
/// images themselves belong to the swapchain and are never destroyed
/// explicitly.
pub struct Swapchain {
    /// Reference to the logical device
    device: Arc<Device>,
    /// Swapchain extension loader
    swapchain_loader: ash::khr::swapchain::Device,
    /// Swapchain handle
    swapchain: vk::SwapchainKHR,
    /// Swapchain images (owned by the swapchain)
    images: Vec<vk::Image>,
    /// Image views for the swapchain images, in image order
    image_views: Vec<vk::ImageView>,
    /// Swapchain image format
    format: vk::Format,
    /// Swapchain extent (resolution)
    extent: vk::Extent2D,
    /// Present mode
    present_mode: vk::PresentModeKHR,
}

impl Swapchain {
    /// Creates a new swapchain for the surface.
    ///
    /// # Arguments
    ///
    /// * `instance` - The Vulkan instance
    /// * `device` - The logical device
    /// * `surface` - The window surface
    /// * `width` - Desired swapchain width, used only when the surface does
    ///   not dictate an extent
    /// * `height` - Desired swapchain height, same condition
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Surface queries fail or report no formats / present modes
    /// - Swapchain creation fails
    /// - Image view creation fails
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
    ) -> Result<Self, RhiError> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        let support = SurfaceSupport::query(device.physical_device(), surface, &surface_loader)?;

        if !support.is_adequate() {
            return Err(RhiError::Swapchain(
                "surface offers no formats or present modes".to_string(),
            ));
        }

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, width, height);
        let image_count = choose_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, present mode {:?}, {} images",
            extent.width, extent.height, surface_format.format, present_mode, image_count
        );

        // The selection policy yields one combined family, so the indices
        // coincide and sharing resolves to EXCLUSIVE; the branch stays in
        // place for the general contract.
        let queue_family_indices = [device.queue_family(), device.queue_family()];
        let sharing_mode = choose_sharing_mode(queue_family_indices[0], queue_family_indices[1]);
        let queue_family_indices_slice = if sharing_mode == vk::SharingMode::CONCURRENT {
            queue_family_indices.as_slice()
        } else {
            &[][..]
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(queue_family_indices_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

        let images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };
        info!("Swapchain created with {} images", images.len());

        let image_views = create_image_views(&device, &images, surface_format.format)?;

        Ok(Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views,
            format: surface_format.format,
            extent,
            present_mode,
        })
    }

    /// Acquires the next swapchain image for rendering.
    ///
    /// # Arguments
    ///
    /// * `semaphore` - Semaphore to signal when the image is available
    /// * `timeout_ns` - Upper bound for the wait, in nanoseconds
    ///
    /// # Returns
    ///
    /// Returns `(image_index, suboptimal)`. The raw `vk::Result` error is
    /// left for the caller to classify (timeout, stale, fatal).
    pub fn acquire_next_image(
        &self,
        semaphore: vk::Semaphore,
        timeout_ns: u64,
    ) -> Result<(u32, bool), vk::Result> {
        unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                timeout_ns,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    /// Presents the rendered image to the screen.
    ///
    /// # Arguments
    ///
    /// * `queue` - The presentation queue
    /// * `image_index` - Index of the image to present
    /// * `wait_semaphore` - Semaphore to wait on before presenting
    ///
    /// # Returns
    ///
    /// Returns true if the swapchain is suboptimal. The raw `vk::Result`
    /// error is left for the caller to classify.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> Result<bool, vk::Result> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe { self.swapchain_loader.queue_present(queue, &present_info) }
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the swapchain extent (resolution).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the present mode.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns the number of swapchain images.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Returns all image views, in image order.
    #[inline]
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &image_view in &self.image_views {
                self.device.handle().destroy_image_view(image_view, None);
            }
            self.swapchain_loader
                .destroy_swapchain(self.swapchain, None);
        }
        info!(
            "Swapchain destroyed (was {}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
    }
}

/// Chooses the surface format.
///
/// Prefers B8G8R8A8_UNORM with SRGB_NONLINEAR color space when the surface
/// offers it; otherwise takes the first offered format. This is a hard-coded
/// preference, not a ranking, so the result is order-sensitive on the input.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_UNORM
            && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = preferred {
        debug!("Selected preferred surface format: B8G8R8A8_UNORM with SRGB_NONLINEAR");
        return format;
    }

    warn!(
        "Preferred surface format unavailable, using first offered: {:?}",
        formats[0].format
    );
    formats[0]
}

/// Chooses the present mode.
///
/// Prefers MAILBOX (low-latency triple buffering). Falls back to FIFO, which
/// the Vulkan specification guarantees to be available.
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode");
        return vk::PresentModeKHR::MAILBOX;
    }

    debug!("Selected FIFO present mode (vsync)");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swapchain extent (resolution).
///
/// When the surface reports a current extent it is used unconditionally.
/// The `u32::MAX` sentinel means the surface leaves the choice to us, in
/// which case the requested size is clamped per axis into the surface's
/// limits.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        debug!(
            "Using current surface extent: {}x{}",
            capabilities.current_extent.width, capabilities.current_extent.height
        );
        return capabilities.current_extent;
    }

    let extent = vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Clamped extent: {}x{} (requested {}x{})",
        extent.width, extent.height, width, height
    );

    extent
}

/// Determines the number of swapchain images to request.
///
/// One more than the minimum, capped at the maximum when the surface reports
/// one (zero means unbounded).
fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

/// Chooses the image sharing mode between the graphics and present families.
///
/// CONCURRENT only when the families differ; EXCLUSIVE otherwise, which
/// avoids ownership-transfer barriers in the common single-family case.
fn choose_sharing_mode(graphics_family: u32, present_family: u32) -> vk::SharingMode {
    if graphics_family != present_family {
        vk::SharingMode::CONCURRENT
    } else {
        vk::SharingMode::EXCLUSIVE
    }
}

/// Creates one 2D color image view per swapchain image.
///
/// Identity channel mapping, single mip level, single array layer, color
/// aspect only. Views come back in image order, one per image.
fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<vk::ImageView>, RhiError> {
    let mut image_views = Vec::with_capacity(images.len());

    for (i, &image) in images.iter().enumerate() {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let image_view = unsafe {
            device
                .handle()
                .create_image_view(&create_info, None)
                .map_err(|e| {
                    RhiError::Swapchain(format!("failed to create image view {}: {:?}", i, e))
                })?
        };

        image_views.push(image_view);
    }

    debug!("Created {} image views", image_views.len());
    Ok(image_views)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_surface_format_prefers_bgra_unorm() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_choose_surface_format_requires_matching_color_space() {
        // Right format, wrong color space: not the preferred pair
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(
            selected.color_space,
            vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT
        );
    }

    #[test]
    fn test_choose_surface_format_falls_back_to_first() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        // Order-sensitive: the first candidate wins
        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_choose_present_mode_prefers_mailbox() {
        let modes = vec![
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];

        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_choose_present_mode_falls_back_to_fifo() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];

        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current_unconditionally() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 1280,
                height: 720,
            },
            ..Default::default()
        };

        // current_extent wins even when outside the desired size
        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn test_choose_extent_clamps_per_axis() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 200,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 1000,
            },
            ..Default::default()
        };

        // Each axis clamps independently
        let extent = choose_extent(&capabilities, 3000, 50);
        assert_eq!(extent.width, 2000);
        assert_eq!(extent.height, 200);

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn test_choose_image_count() {
        let capped = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&capped), 2);

        let roomy = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&roomy), 3);

        let unbounded = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0, // 0 means no limit
            ..Default::default()
        };
        assert_eq!(choose_image_count(&unbounded), 3);
    }

    #[test]
    fn test_choose_image_count_at_least_minimum() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 3,
            ..Default::default()
        };
        assert!(choose_image_count(&capabilities) >= capabilities.min_image_count);
    }

    #[test]
    fn test_choose_sharing_mode() {
        assert_eq!(choose_sharing_mode(0, 0), vk::SharingMode::EXCLUSIVE);
        assert_eq!(choose_sharing_mode(0, 1), vk::SharingMode::CONCURRENT);
    }

    #[test]
    fn test_surface_support_is_adequate() {
        let adequate = SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!no_formats.is_adequate());

        let no_modes = SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![],
        };
        assert!(!no_modes.is_adequate());
    }
}
