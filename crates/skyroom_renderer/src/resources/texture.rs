//! GPU texture types and the descriptor helpers shared by the loader, the
//! cubemap projector and the render targets.
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::bail;
use skyroom_core::GpuContext;

/// Process-unique identity of a texture.  Render state slots record handles,
/// never raw wgpu objects, so "nothing bound" is simply `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(NonZeroU64);

impl TextureHandle {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }

    pub fn get(self) -> u64 {
        self.0.get()
    }
}

// ── Descriptor helpers ──────────────────────────────────────────────────────

/// Descriptor for a single-sample 2-D render-attachment texture.
pub struct RenderTextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
}

pub fn create_render_texture(device: &wgpu::Device, desc: &RenderTextureDesc<'_>) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(desc.label),
        size: wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: desc.format,
        usage: desc.usage,
        view_formats: &[],
    })
}

/// Creates a default `TextureView` for a texture (all mips, all layers).
#[inline]
pub fn default_view(texture: &wgpu::Texture) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Address mode family used by the room and skybox samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerKind {
    /// Wrap in both directions; floors and walls tile.
    Repeat,
    /// Clamp to the edge texel; paintings, HDR sources and cubemaps.
    Clamp,
}

pub fn create_sampler(device: &wgpu::Device, kind: SamplerKind) -> wgpu::Sampler {
    let address_mode = match kind {
        SamplerKind::Repeat => wgpu::AddressMode::Repeat,
        SamplerKind::Clamp => wgpu::AddressMode::ClampToEdge,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(match kind {
            SamplerKind::Repeat => "Repeat Sampler",
            SamplerKind::Clamp => "Clamp Sampler",
        }),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

fn bytes_per_texel(format: wgpu::TextureFormat) -> u32 {
    format.block_copy_size(None).unwrap_or(4)
}

// ── Texture2D ───────────────────────────────────────────────────────────────

/// A sampled 2-D texture with its default view.
pub struct Texture2D {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    handle: TextureHandle,
    width: u32,
    height: u32,
}

impl Texture2D {
    /// Uploads a full mip chain.  `levels[0]` is the base image of
    /// `width × height`; level `i` is `max(1, width >> i) × max(1, height >> i)`,
    /// tightly packed in `format`.
    pub fn from_levels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        levels: &[Vec<u8>],
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len().max(1) as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let texel = bytes_per_texel(format);
        for (mip, data) in levels.iter().enumerate() {
            let w = (width >> mip).max(1);
            let h = (height >> mip).max(1);
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: mip as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(w * texel),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = default_view(&texture);
        Self {
            texture,
            view,
            handle: TextureHandle::next(),
            width,
            height,
        }
    }

    /// 8-bit sRGB image without mips.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Self {
        Self::from_levels(
            device,
            queue,
            label,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            width,
            height,
            &[rgba.to_vec()],
        )
    }

    /// Floating-point image stored as `Rgba16Float`.
    pub fn from_rgba32f(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[f32],
    ) -> Self {
        let halves: Vec<half::f16> = rgba.iter().map(|&c| half::f16::from_f32(c)).collect();
        Self::from_levels(
            device,
            queue,
            label,
            wgpu::TextureFormat::Rgba16Float,
            width,
            height,
            &[bytemuck::cast_slice(&halves).to_vec()],
        )
    }

    /// 1×1 texture of a single color.
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, rgba: [u8; 4]) -> Self {
        Self::from_rgba8(device, queue, label, 1, 1, &rgba)
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    pub fn mip_level_count(&self) -> u32 {
        self.texture.mip_level_count()
    }
}

impl std::fmt::Debug for Texture2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture2D")
            .field("handle", &self.handle)
            .field("size", &(self.width, self.height))
            .field("format", &self.format())
            .finish()
    }
}

// ── Cube textures ───────────────────────────────────────────────────────────

/// Cube faces in array-layer order.  Consumers address faces by this index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Array layer of this face (0..6).
    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }
}

pub struct CubeTexture {
    pub texture: wgpu::Texture,
    /// `TextureViewDimension::Cube` view for sampling.
    pub view: wgpu::TextureView,
    handle: TextureHandle,
    size: u32,
}

impl CubeTexture {
    /// Allocates an uninitialised `size × size × 6` cube texture, one mip.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        size: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });
        Self {
            texture,
            view,
            handle: TextureHandle::next(),
            size,
        }
    }

    /// A 2-D view of one face, usable as a render attachment.
    pub fn face_view(&self, face: CubeFace) -> wgpu::TextureView {
        self.texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Cube Face View"),
            dimension: Some(wgpu::TextureViewDimension::D2),
            base_array_layer: face.index(),
            array_layer_count: Some(1),
            ..Default::default()
        })
    }

    /// Uploads tightly packed texels for one face.
    pub fn write_face(&self, queue: &wgpu::Queue, face: CubeFace, data: &[u8]) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: face.index(),
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.size * bytes_per_texel(self.format())),
                rows_per_image: Some(self.size),
            },
            wgpu::Extent3d {
                width: self.size,
                height: self.size,
                depth_or_array_layers: 1,
            },
        );
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Edge length of a face in texels.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }

    /// Reads one `Rgba16Float` face back to the CPU, row by row.  Blocks
    /// until the copy has finished.  The texture needs `COPY_SRC` usage.
    pub fn read_face(&self, ctx: &GpuContext, face: CubeFace) -> anyhow::Result<Vec<[f32; 4]>> {
        if self.format() != wgpu::TextureFormat::Rgba16Float {
            bail!("read_face expects Rgba16Float, cubemap is {:?}", self.format());
        }
        let bytes = super::readback::read_texture_layer(ctx, &self.texture, face.index())?;
        let channel = |b: &[u8]| half::f16::from_le_bytes([b[0], b[1]]).to_f32();
        Ok(bytes
            .chunks_exact(8)
            .map(|t| [channel(&t[0..2]), channel(&t[2..4]), channel(&t[4..6]), channel(&t[6..8])])
            .collect())
    }
}

impl std::fmt::Debug for CubeTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeTexture")
            .field("handle", &self.handle)
            .field("size", &self.size)
            .field("format", &self.format())
            .finish()
    }
}
