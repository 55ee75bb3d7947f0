//! Presenter orchestration.
//!
//! This crate drives the double-buffered present loop:
//! - [`FrameScheduler`] owns the per-frame synchronization state machine
//! - [`Renderer`] owns every Vulkan resource and the ordered teardown

pub mod frame_scheduler;
pub mod renderer;

pub use frame_scheduler::FrameScheduler;
pub use renderer::Renderer;
pub use trigon_rhi::sync::FRAMES_IN_FLIGHT;
