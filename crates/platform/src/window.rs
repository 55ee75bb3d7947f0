//! Window management using winit.
//!
//! This module provides window creation and Vulkan surface creation. The
//! window is fixed-size: swapchain recreation on resize is out of scope, so
//! the window is created non-resizable.

use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use trigon_core::{Error, Result};

/// RAII wrapper for a Vulkan surface.
///
/// Owns a `vk::SurfaceKHR` handle together with the loader needed to destroy
/// it, so destruction happens exactly once, here. The caller must ensure the
/// Vulkan instance outlives this surface; the presenter guarantees that by
/// dropping the surface before the instance during teardown.
pub struct Surface {
    handle: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    /// Get the raw Vulkan surface handle.
    ///
    /// The returned handle is valid only as long as this `Surface` exists.
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    /// Get a reference to the surface loader, for capability queries.
    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: The handle was created by ash_window::create_surface and the
        // loader comes from the same instance. This is the only destroy site.
        unsafe {
            self.surface_loader.destroy_surface(self.handle, None);
        }
        tracing::debug!("Vulkan surface destroyed");
    }
}

/// A window wrapper providing the raw handles needed for surface creation.
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
}

impl Window {
    /// Create a new fixed-size window with the given dimensions and title.
    pub fn new(event_loop: &ActiveEventLoop, width: u32, height: u32, title: &str) -> Result<Self> {
        let attrs = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        tracing::info!("Window created: {}x{}", width, height);

        Ok(Self {
            window: Arc::new(window),
            width,
            height,
        })
    }

    /// Get a reference to the underlying winit window.
    pub fn inner(&self) -> &WinitWindow {
        &self.window
    }

    /// Get the width of the window.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the height of the window.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Request a redraw of the window.
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Get the display handle, for enumerating required Vulkan extensions.
    pub fn display_handle(
        &self,
    ) -> std::result::Result<raw_window_handle::DisplayHandle<'_>, raw_window_handle::HandleError>
    {
        self.window.display_handle()
    }

    /// Create a Vulkan surface for this window.
    ///
    /// Returns a RAII [`Surface`] that destroys the underlying handle when
    /// dropped.
    ///
    /// # Errors
    /// Returns an error if the window handles cannot be obtained or if
    /// Vulkan surface creation fails.
    pub fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<Surface> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("Failed to get display handle: {}", e)))?;

        let window_handle = self
            .window
            .window_handle()
            .map_err(|e| Error::Window(format!("Failed to get window handle: {}", e)))?;

        // SAFETY: The entry and instance are valid references provided by the
        // caller, and the handles come from a live winit window. The surface
        // is destroyed in Surface::drop.
        let handle = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| Error::Window(format!("Failed to create Vulkan surface: {}", e)))?
        };

        let surface_loader = ash::khr::surface::Instance::new(entry, instance);

        tracing::info!("Vulkan surface created");

        Ok(Surface {
            handle,
            surface_loader,
        })
    }
}

/// Get the Vulkan instance extensions required to present to this platform's
/// windows.
///
/// The returned pointers reference static strings owned by the Vulkan loader
/// and stay valid for the life of the process.
///
/// # Errors
/// Returns an error if the required extensions cannot be enumerated for the
/// display.
pub fn required_extensions(
    display_handle: raw_window_handle::RawDisplayHandle,
) -> Result<Vec<*const i8>> {
    let extensions = ash_window::enumerate_required_extensions(display_handle)
        .map_err(|e| Error::Window(format!("Failed to enumerate required extensions: {}", e)))?;

    tracing::debug!(
        "Required Vulkan extensions for surface: {:?}",
        extensions
            .iter()
            // SAFETY: ash_window guarantees valid, null-terminated C strings
            // pointing at static loader data.
            .map(|&ext| unsafe { std::ffi::CStr::from_ptr(ext) })
            .collect::<Vec<_>>()
    );

    Ok(extensions.to_vec())
}
