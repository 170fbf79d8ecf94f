//! Framework de aplicación para SkyRoom: ventana, bucle de eventos,
//! configuración TOML y logging.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use skyroom_app::{App, AppContext, SkyroomApp, KeyCode};
//!
//! struct Viewer;
//!
//! impl SkyroomApp for Viewer {
//!     fn update(&mut self, ctx: &mut AppContext) {
//!         if ctx.input.just_pressed(KeyCode::Escape) {
//!             ctx.request_exit();
//!         }
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     App::new(Viewer).with_title("Room").run()
//! }
//! ```

pub mod builder;
pub mod config;
pub mod context;
mod graphics;
pub mod logging;
mod runner;
pub mod traits;

pub use builder::{App, AppConfig, LogConfig};
pub use context::AppContext;
pub use traits::SkyroomApp;

// Users can do `use skyroom_app::{Camera, KeyCode, Time};` without adding
// skyroom_core as a direct dependency.
pub use skyroom_core::{Camera, CameraMovement, Controller, InputState, KeyCode, MouseButton, Time};

pub use skyroom_core::glam::{Mat4, Vec2, Vec3};
