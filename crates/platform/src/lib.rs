//! Platform layer for the trigon presenter.
//!
//! This crate provides the windowing collaborators the render core depends
//! on but does not own:
//! - Window creation via winit
//! - Vulkan surface creation and the required instance extensions

mod window;

pub use window::{Surface, Window, required_extensions};
