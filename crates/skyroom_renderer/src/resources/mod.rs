pub mod buffer;
pub mod loader;
pub mod readback;
pub mod texture;
pub mod uniform;

pub use loader::{load_2d, load_cubemap, load_cubemap_dir, load_hdr_2d, TextureError, CUBE_FACE_NAMES};
pub use texture::{CubeFace, CubeTexture, SamplerKind, Texture2D, TextureHandle};
pub use uniform::DynamicUniformBuffer;
