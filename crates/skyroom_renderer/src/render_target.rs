//! A depth texture matching the colour target it is paired with.
//!
//! The window renderer keeps one and recreates it on resize; the cubemap
//! projector allocates a transient one per capture and destroys it when
//! the capture is done.
use crate::resources::texture::{self, RenderTextureDesc};

pub struct DepthTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTarget {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let (texture, view) = Self::make(device, width, height);
        Self { texture, view }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if (width, height) == self.size() {
            return;
        }
        self.texture.destroy();
        let (t, v) = Self::make(device, width, height);
        self.texture = t;
        self.view = v;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    /// Releases the GPU memory now instead of at drop time.
    pub fn destroy(self) {
        self.texture.destroy();
    }

    fn make(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let tex = texture::create_render_texture(
            device,
            &RenderTextureDesc {
                label: "Depth Texture",
                width: width.max(1),
                height: height.max(1),
                format: Self::FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            },
        );
        let view = texture::default_view(&tex);
        (tex, view)
    }
}
