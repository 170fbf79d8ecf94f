use skyroom_core::{InputState, Time};
use skyroom_renderer::Renderer;
use winit::window::Window;

/// Per-frame context passed to every [`SkyroomApp`](crate::SkyroomApp)
/// callback.
///
/// ```rust,ignore
/// fn update(&mut self, ctx: &mut AppContext) {
///     self.controller.apply(&mut self.camera, ctx.input, ctx.time.delta);
///     if ctx.input.just_pressed(KeyCode::Escape) {
///         ctx.request_exit();
///     }
/// }
/// ```
pub struct AppContext<'a> {
    /// Keyboard and mouse state for this frame.  Mutable so controllers can
    /// consume the accumulated mouse and scroll deltas.
    pub input: &'a mut InputState,

    /// Frame timing: delta, elapsed, FPS.
    pub time: Time,

    /// Current window size in physical pixels.
    pub window_size: (u32, u32),

    pub window: &'a Window,

    /// Available in `setup`, `update`, `on_resize` and `on_window_event`
    /// once the GPU is up.
    pub renderer: Option<&'a mut Renderer>,

    pub(crate) exit_requested: bool,
}

impl<'a> AppContext<'a> {
    /// Signal the event loop to shut down after the current frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn renderer(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_deref_mut()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.window_size.0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.window_size.1
    }

    /// Aspect ratio (width / height). Returns 1.0 if height is zero.
    #[inline]
    pub fn aspect(&self) -> f32 {
        let (w, h) = self.window_size;
        if h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }
}
