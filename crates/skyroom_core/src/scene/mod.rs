pub mod camera;
#[cfg(feature = "input")]
pub mod controller;

pub use camera::{Camera, CameraMovement};
#[cfg(feature = "input")]
pub use controller::Controller;
