//! Error types for the host layers.

use thiserror::Error;

/// Host-level error type.
///
/// Failures inside the Vulkan core have their own taxonomy in `trigon-rhi`;
/// this type covers everything around it (windowing, configuration, file I/O).
#[derive(Error, Debug)]
pub enum Error {
    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Shader blob loading errors
    #[error("Shader error: {0}")]
    Shader(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using the host Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_error_display() {
        let err = Error::Config("bad value".to_string());
        assert_eq!(err.to_string(), "Config error: bad value");
    }
}
