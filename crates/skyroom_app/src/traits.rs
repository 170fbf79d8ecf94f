use skyroom_renderer::Frame;

use crate::context::AppContext;

/// The trait every SkyRoom application implements.
///
/// All methods have empty default implementations so you only override what
/// you need.
///
/// ```rust,ignore
/// struct Viewer { room: Option<Room>, camera: Camera }
///
/// impl SkyroomApp for Viewer {
///     fn setup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
///         let renderer = ctx.renderer().context("no renderer")?;
///         self.room = Some(Room::new(&renderer.context, &desc, textures)?);
///         Ok(())
///     }
///
///     fn draw(&mut self, frame: &mut Frame<'_>) {
///         if let Some(room) = &mut self.room {
///             room.draw(frame, &self.camera);
///         }
///     }
/// }
/// ```
#[allow(unused_variables)]
pub trait SkyroomApp {
    /// Called once after the window and GPU are ready.  An error stops the
    /// event loop and is returned from [`App::run`](crate::App::run).
    fn setup(&mut self, ctx: &mut AppContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called every frame before rendering.
    fn update(&mut self, ctx: &mut AppContext) {}

    /// Records this frame's draws.  The pass is already cleared.
    fn draw(&mut self, frame: &mut Frame<'_>) {}

    /// Called whenever the window is resized.  The runner has already
    /// reconfigured the surface and resized the renderer.
    fn on_resize(&mut self, new_size: (u32, u32), ctx: &mut AppContext) {}

    /// Called for every raw winit `WindowEvent`, after the runner updated
    /// the input state.
    fn on_window_event(&mut self, event: &winit::event::WindowEvent, ctx: &mut AppContext) {}
}
