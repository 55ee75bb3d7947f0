//! RHI-specific error types.

use thiserror::Error;

/// RHI-specific error type.
///
/// Creation-phase failures are unrecoverable for the presenter; they
/// propagate to the host program, which decides whether to retry or exit.
/// The two steady-state variants carry the distinctions the host needs:
/// [`RhiError::SyncTimeout`] (a bounded wait expired) versus
/// [`RhiError::SwapchainStale`] (the swapchain no longer matches the
/// surface), neither of which is a device-lost condition.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] ash::vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    Loading(#[from] ash::LoadingError),

    /// No physical device exposes a queue family with both graphics
    /// capability and presentation support
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// Surface creation error
    #[error("Surface error: {0}")]
    Surface(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    Swapchain(String),

    /// Shader module creation error
    #[error("Shader error: {0}")]
    Shader(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// A bounded acquire or fence wait expired
    #[error("Synchronization timeout waiting for {what} ({timeout_ns} ns)")]
    SyncTimeout {
        /// What was being waited on.
        what: &'static str,
        /// The bound that expired, in nanoseconds.
        timeout_ns: u64,
    },

    /// The swapchain no longer matches the surface (out of date or
    /// suboptimal); recreation is up to the host
    #[error("Swapchain is stale and no longer matches the surface")]
    SwapchainStale,
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vulkan_error_conversion() {
        let err: RhiError = ash::vk::Result::ERROR_DEVICE_LOST.into();
        assert!(matches!(err, RhiError::Vulkan(_)));
    }

    #[test]
    fn test_sync_timeout_display() {
        let err = RhiError::SyncTimeout {
            what: "image acquire",
            timeout_ns: 5_000_000_000,
        };
        let text = err.to_string();
        assert!(text.contains("image acquire"));
        assert!(text.contains("5000000000"));
    }

    #[test]
    fn test_stale_is_distinct_from_timeout() {
        // The host branches on these two; they must not collapse into one.
        let stale = RhiError::SwapchainStale;
        assert!(!matches!(
            stale,
            RhiError::SyncTimeout { .. } | RhiError::Vulkan(_)
        ));
    }
}
