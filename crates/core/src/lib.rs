//! Core utilities for the trigon presenter.
//!
//! This crate provides the foundational pieces shared by the other crates:
//! - Error types and result aliases
//! - Logging initialization
//! - Runtime configuration
//! - Frame timing

mod config;
mod error;
mod logging;
mod timer;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::Timer;
