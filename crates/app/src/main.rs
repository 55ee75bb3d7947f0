//! Trigon - Main Entry Point
//!
//! Presents a single fixed triangle through a double-buffered Vulkan
//! swapchain. The interesting machinery lives in `trigon-renderer` and
//! `trigon-rhi`; this binary only owns the event loop, configuration, and
//! shader blob loading.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use trigon_core::{Config, Error, Timer};
use trigon_platform::Window;
use trigon_renderer::Renderer;

/// Default SPIR-V locations, relative to the working directory.
const VERTEX_SHADER_PATH: &str = "shaders/triangle.vert.spv";
const FRAGMENT_SHADER_PATH: &str = "shaders/triangle.frag.spv";

/// Reads a pre-compiled SPIR-V blob from disk.
///
/// The bytes are handed to the render core untouched; a malformed blob is
/// rejected there during shader module creation.
fn load_spirv(path: &Path) -> trigon_core::Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Shader(format!("failed to read {:?}: {}", path, e)))?;
    debug!("Read {} bytes from {:?}", bytes.len(), path);
    Ok(bytes)
}

struct App {
    config: Config,
    window: Option<Window>,
    renderer: Option<Renderer>,
    timer: Timer,
    frames: u64,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            renderer: None,
            timer: Timer::new(),
            frames: 0,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Window::new(
            event_loop,
            self.config.width,
            self.config.height,
            &self.config.title,
        )?;

        let vertex_spirv = load_spirv(Path::new(VERTEX_SHADER_PATH))?;
        let fragment_spirv = load_spirv(Path::new(FRAGMENT_SHADER_PATH))?;

        let renderer = Renderer::new(&window, &self.config, &vertex_spirv, &fragment_spirv)?;

        self.window = Some(window);
        self.renderer = Some(renderer);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            match self.init(event_loop) {
                Ok(()) => info!("Initialization complete, entering present loop"),
                Err(e) => {
                    error!("Initialization failed: {:?}", e);
                    event_loop.exit();
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down after current frame");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                let delta = self.timer.delta_secs();

                if let Some(ref mut renderer) = self.renderer {
                    match renderer.draw_frame() {
                        Ok(()) => {
                            self.frames += 1;
                            if self.frames % 600 == 0 {
                                debug!("Frame {} ({:.2} ms)", self.frames, delta * 1000.0);
                            }
                        }
                        Err(e) => {
                            // Every draw failure is terminal here: swapchain
                            // recreation is out of scope and nothing else is
                            // worth retrying.
                            error!("Present loop terminated: {}", e);
                            event_loop.exit();
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    trigon_core::init_logging();
    info!("Starting trigon");

    let config = Config::from_file_or_default(Path::new("trigon.toml"))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}
