//! skyroom_core: tipos básicos compartidos por el renderer y la aplicación.
//!
//! Holds the pieces that do not need a render pipeline: the wgpu device
//! context, keyboard/mouse state, the frame clock and the first-person
//! camera.

#[cfg(feature = "gpu")]
pub mod context;

// input helper for keyboard / mouse state
#[cfg(feature = "input")]
pub mod input;

pub mod scene;
pub mod time;

pub use glam;

#[cfg(feature = "gpu")]
pub use context::{ContextError, GpuContext};
#[cfg(feature = "input")]
pub use input::{InputState, KeyCode, MouseButton};
pub use scene::{Camera, CameraMovement};
#[cfg(feature = "input")]
pub use scene::Controller;
pub use time::{FrameClock, Time};
