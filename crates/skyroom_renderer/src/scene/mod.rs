//! Drawable scene components.  Each is built once at startup and drawn
//! every frame through a [`Frame`](crate::Frame).

pub mod room;
pub mod skybox;

pub use room::{Room, RoomDesc, RoomTexturePaths, RoomTextures, RoomUniform, GLASS_OPACITY};
pub use skybox::{Skybox, SkyboxDesc};
