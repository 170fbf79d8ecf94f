use std::sync::Arc;

use anyhow::Context;
use skyroom_core::GpuContext;
use skyroom_renderer::Renderer;
use winit::window::Window;

pub struct GraphicsState {
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
    pub renderer: Renderer,
}

impl GraphicsState {
    pub async fn new(window: Arc<Window>, width: u32, height: u32, vsync: bool) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        // The surface owns an `Arc` of the window, so it is `'static`.
        let surface = instance
            .create_surface(window)
            .context("failed to create a surface for the window")?;
        let context = GpuContext::new_with_instance(instance, Some(&surface)).await?;

        let caps = surface.get_capabilities(&context.adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let present_mode = if vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&context.device, &config);
        log::info!("Surface configured: {}x{} {:?}", config.width, config.height, format);

        let renderer = Renderer::new(context, config.width, config.height, config.format);

        Ok(Self {
            surface,
            config,
            renderer,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.reconfigure();
            self.renderer.resize(width, height);
        }
    }

    pub fn reconfigure(&self) {
        self.surface
            .configure(&self.renderer.context.device, &self.config);
    }
}
