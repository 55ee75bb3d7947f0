//! Runtime configuration.
//!
//! Configuration is loaded from an optional TOML file; every field has a
//! default so a missing file or a partial file is fine. The synchronization
//! timeout deliberately lives here rather than in the render core: the core
//! treats it as an opaque bound and never picks its own.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Application configuration.
///
/// # Example
///
/// ```toml
/// width = 1280
/// height = 720
/// title = "Hello Vulkan"
/// validation = true
/// sync_timeout_ms = 2000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Window width in pixels.
    pub width: u32,
    /// Window height in pixels.
    pub height: u32,
    /// Window title.
    pub title: String,
    /// Whether to enable Vulkan validation layers.
    pub validation: bool,
    /// Upper bound for image-acquire and fence waits, in milliseconds.
    ///
    /// Expiry is reported as a synchronization timeout, distinct from a
    /// device-lost condition.
    pub sync_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Hello Vulkan".to_string(),
            validation: cfg!(debug_assertions),
            sync_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)
            .map_err(|e| Error::Config(format!("failed to parse {:?}: {}", path, e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Loads configuration from a TOML file if it exists, falling back to
    /// defaults otherwise.
    pub fn from_file_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Returns the synchronization timeout in nanoseconds, as Vulkan waits
    /// expect it.
    #[inline]
    pub fn sync_timeout_ns(&self) -> u64 {
        self.sync_timeout_ms.saturating_mul(1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.title, "Hello Vulkan");
        assert_eq!(config.sync_timeout_ms, 5000);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("width = 1024").unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 600);
        assert_eq!(config.title, "Hello Vulkan");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("widht = 1024");
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config {
            sync_timeout_ms: 2,
            ..Config::default()
        };
        assert_eq!(config.sync_timeout_ns(), 2_000_000);
    }

    #[test]
    fn test_timeout_conversion_saturates() {
        let config = Config {
            sync_timeout_ms: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.sync_timeout_ns(), u64::MAX);
    }
}
