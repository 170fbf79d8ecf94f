use std::sync::Arc;

use anyhow::Context;
use skyroom_core::{FrameClock, InputState};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::builder::AppConfig;
use crate::context::AppContext;
use crate::graphics::GraphicsState;
use crate::traits::SkyroomApp;

/// Pixels of touchpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 40.0;

struct Runner<A: SkyroomApp> {
    app: A,
    config: AppConfig,
    window: Option<Arc<Window>>,
    graphics: Option<GraphicsState>,
    input: InputState,
    window_size: (u32, u32),
    clock: FrameClock,
    /// First fatal error; stops the loop and is returned from `run`.
    error: Option<anyhow::Error>,
}

impl<A: SkyroomApp> Runner<A> {
    fn new(app: A, config: AppConfig) -> Self {
        Self {
            app,
            config,
            window: None,
            graphics: None,
            input: InputState::new(),
            window_size: (0, 0),
            clock: FrameClock::new(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_resizable(self.config.resizable)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.width,
                self.config.height,
            ));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create the window")?,
        );
        let size = window.inner_size();
        self.window_size = (size.width.max(1), size.height.max(1));

        let mut gfx = pollster::block_on(GraphicsState::new(
            window.clone(),
            self.window_size.0,
            self.window_size.1,
            self.config.vsync,
        ))?;
        gfx.renderer.clear_color = self.config.clear_color();

        // Call user setup; the borrow ends before gfx moves into self.graphics
        {
            let mut ctx = AppContext {
                input: &mut self.input,
                time: self.clock.peek(),
                window_size: self.window_size,
                window: &window,
                renderer: Some(&mut gfx.renderer),
                exit_requested: false,
            };
            self.app.setup(&mut ctx).context("application setup failed")?;
            if ctx.exit_requested {
                event_loop.exit();
            }
        }

        self.window = Some(window);
        self.graphics = Some(gfx);
        // setup may take a while (cubemap projection); start timing now
        self.clock = FrameClock::new();
        Ok(())
    }

    /// Feeds keyboard, mouse and scroll events into `self.input`.
    fn record_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.input
                        .update_key(code, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input
                    .update_mouse_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input.set_mouse_position(position.x, position.y);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                self.input.add_scroll(lines);
            }
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gfx), Some(window)) = (&mut self.graphics, &self.window) else {
            return;
        };
        if self.window_size.0 == 0 || self.window_size.1 == 0 {
            return;
        }

        let time = self.clock.tick();

        // ── 1. UPDATE ────────────────────────────────────────────────────────
        {
            let mut ctx = AppContext {
                input: &mut self.input,
                time,
                window_size: self.window_size,
                window,
                renderer: Some(&mut gfx.renderer),
                exit_requested: false,
            };
            self.app.update(&mut ctx);
            if ctx.exit_requested {
                event_loop.exit();
                return;
            }
        }

        // ── 2. DRAW ──────────────────────────────────────────────────────────
        let frame = match gfx.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                gfx.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out waiting for the next surface texture");
                return;
            }
            Err(err) => {
                let err = anyhow::Error::from(err).context("failed to acquire the next surface texture");
                self.fail(event_loop, err);
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let app = &mut self.app;
        let stats = gfx.renderer.render(&view, |f| app.draw(f));
        frame.present();
        if time.frame_count % 600 == 0 {
            log::debug!(
                "frame {}: {:.0} fps, {} draws, {} texture binds",
                time.frame_count,
                time.fps(),
                stats.draw_calls,
                stats.texture_binds
            );
        }

        // ── End-of-frame input cleanup ───────────────────────────────────────
        // Must happen AFTER all update/draw callbacks have read just_pressed etc.
        self.input.end_frame();
    }
}

impl<A: SkyroomApp> ApplicationHandler for Runner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.record_input(&event);

        // Forward to user callback
        if let Some(window) = self.window.clone() {
            let mut ctx = AppContext {
                input: &mut self.input,
                time: self.clock.peek(),
                window_size: self.window_size,
                window: &window,
                renderer: self.graphics.as_mut().map(|g| &mut g.renderer),
                exit_requested: false,
            };
            self.app.on_window_event(&event, &mut ctx);
            if ctx.exit_requested {
                event_loop.exit();
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let new_size = (size.width, size.height);
                self.window_size = new_size;
                log::debug!("Window resized to {}x{}", size.width, size.height);
                let (Some(gfx), Some(window)) = (&mut self.graphics, self.window.clone()) else {
                    return;
                };
                gfx.resize(size.width, size.height);
                let mut ctx = AppContext {
                    input: &mut self.input,
                    time: self.clock.peek(),
                    window_size: new_size,
                    window: &window,
                    renderer: Some(&mut gfx.renderer),
                    exit_requested: false,
                };
                self.app.on_resize(new_size, &mut ctx);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

pub(crate) fn run_internal<A: SkyroomApp + 'static>(config: AppConfig, app: A) -> anyhow::Result<()> {
    let mut runner = Runner::new(app, config);
    let event_loop = EventLoop::new().context("failed to create the event loop")?;
    // Poll = spin the loop as fast as possible; no sleeping between frames.
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run_app(&mut runner)
        .context("event loop terminated abnormally")?;
    match runner.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
