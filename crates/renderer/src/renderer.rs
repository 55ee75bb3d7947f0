//! Renderer orchestration.
//!
//! This module provides the [`Renderer`] struct: the single long-lived
//! context object owning every Vulkan handle. Construction runs the
//! dependency chain in order (instance, surface, device, swapchain, render
//! pass, pipeline, framebuffers, command buffers, scheduler); teardown runs
//! it exactly backwards, behind a device-idle wait, in one routine.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use tracing::{error, info};

use trigon_core::Config;
use trigon_platform::{Surface, Window, required_extensions};
use trigon_rhi::command::CommandRecorder;
use trigon_rhi::device::Device;
use trigon_rhi::framebuffer::FramebufferSet;
use trigon_rhi::instance::Instance;
use trigon_rhi::physical_device::select_physical_device;
use trigon_rhi::pipeline::{Pipeline, PipelineDescriptor, PipelineLayout};
use trigon_rhi::render_pass::RenderPass;
use trigon_rhi::shader::{Shader, ShaderStage};
use trigon_rhi::swapchain::Swapchain;
use trigon_rhi::{RhiError, RhiResult};

use crate::frame_scheduler::FrameScheduler;

/// The presenter's GPU context.
///
/// Owns every Vulkan resource. Fields are wrapped in `ManuallyDrop` so the
/// Drop impl can release them in exact reverse creation order; nothing else
/// in the program destroys a Vulkan object.
pub struct Renderer {
    /// Vulkan instance (created first, destroyed last).
    instance: ManuallyDrop<Instance>,
    /// Window surface (destroyed after the device, before the instance).
    surface: ManuallyDrop<Surface>,
    /// Logical device.
    device: ManuallyDrop<Arc<Device>>,
    /// Swapchain with its image views.
    swapchain: ManuallyDrop<Swapchain>,
    /// Render pass for the single color attachment.
    render_pass: ManuallyDrop<RenderPass>,
    /// Empty pipeline layout.
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    /// The fixed graphics pipeline.
    pipeline: ManuallyDrop<Pipeline>,
    /// One framebuffer per swapchain image view.
    framebuffers: ManuallyDrop<FramebufferSet>,
    /// Pre-recorded draw buffers, one per framebuffer.
    recorder: ManuallyDrop<CommandRecorder>,
    /// The frame synchronization core.
    scheduler: ManuallyDrop<FrameScheduler>,
}

impl Renderer {
    /// Creates the full rendering context for the given window.
    ///
    /// # Arguments
    ///
    /// * `window` - The window to present to
    /// * `config` - Validation toggle and synchronization timeout
    /// * `vertex_spirv` - Pre-compiled vertex shader binary
    /// * `fragment_spirv` - Pre-compiled fragment shader binary
    ///
    /// # Errors
    ///
    /// Returns an error if any resource in the chain fails to build. State
    /// constructed before the failure is released by ordinary drops, in
    /// reverse order.
    pub fn new(
        window: &Window,
        config: &Config,
        vertex_spirv: &[u8],
        fragment_spirv: &[u8],
    ) -> RhiResult<Self> {
        let width = window.width();
        let height = window.height();

        info!("Initializing Vulkan presenter ({}x{})", width, height);

        let window_extensions = required_extensions(
            window
                .display_handle()
                .map_err(|e| RhiError::Surface(e.to_string()))?
                .as_raw(),
        )
        .map_err(|e| RhiError::Surface(e.to_string()))?;

        let instance = Instance::new(&window_extensions, config.validation)?;

        // Surface creation precedes device selection: presentation support
        // is per queue family and can only be queried against a live
        // surface.
        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::Surface(e.to_string()))?;

        let selection = select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = Device::new(&instance, &selection)?;

        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), width, height)?;

        let render_pass = RenderPass::new(device.clone(), swapchain.format())?;

        let pipeline_layout = PipelineLayout::new(device.clone())?;

        // Shader modules live only for the duration of pipeline creation.
        let pipeline = {
            let vertex_shader =
                Shader::from_spirv_bytes(device.clone(), vertex_spirv, ShaderStage::Vertex, "main")?;
            let fragment_shader = Shader::from_spirv_bytes(
                device.clone(),
                fragment_spirv,
                ShaderStage::Fragment,
                "main",
            )?;

            Pipeline::new_graphics(
                device.clone(),
                &render_pass,
                &pipeline_layout,
                &PipelineDescriptor {
                    vertex_shader: &vertex_shader,
                    fragment_shader: &fragment_shader,
                    extent: swapchain.extent(),
                },
            )?
        };

        let framebuffers = FramebufferSet::new(
            device.clone(),
            &render_pass,
            swapchain.image_views(),
            swapchain.extent(),
        )?;

        let recorder = CommandRecorder::record(
            device.clone(),
            device.queue_family(),
            &framebuffers,
            &render_pass,
            &pipeline,
            swapchain.extent(),
        )?;

        let scheduler = FrameScheduler::new(
            device.clone(),
            swapchain.image_count(),
            config.sync_timeout_ns(),
        )?;

        info!("Vulkan presenter initialized");

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            surface: ManuallyDrop::new(surface),
            device: ManuallyDrop::new(device),
            swapchain: ManuallyDrop::new(swapchain),
            render_pass: ManuallyDrop::new(render_pass),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            pipeline: ManuallyDrop::new(pipeline),
            framebuffers: ManuallyDrop::new(framebuffers),
            recorder: ManuallyDrop::new(recorder),
            scheduler: ManuallyDrop::new(scheduler),
        })
    }

    /// Draws and presents one frame.
    ///
    /// # Errors
    ///
    /// See [`FrameScheduler::draw_frame`]; every error is terminal for the
    /// present loop.
    pub fn draw_frame(&mut self) -> RhiResult<()> {
        self.scheduler.draw_frame(&self.swapchain, &self.recorder)
    }

    /// Returns the number of swapchain images.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.swapchain.image_count()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Nothing may be destroyed while the GPU still references it.
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during teardown: {:?}", e);
        }

        // Exact reverse of construction order. This is the only teardown
        // routine; each object's own Drop destroys its handle once.
        unsafe {
            ManuallyDrop::drop(&mut self.scheduler);
            ManuallyDrop::drop(&mut self.recorder);
            ManuallyDrop::drop(&mut self.framebuffers);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
