//! GPU → CPU texture copies, used to verify render-to-texture output.
use anyhow::{anyhow, bail, Context as _};
use skyroom_core::GpuContext;

/// Copies array layer `layer` (mip 0) of `texture` into a mappable buffer
/// and returns its texels tightly packed, without the row padding wgpu
/// requires for buffer copies.
pub fn read_texture_layer(
    ctx: &GpuContext,
    texture: &wgpu::Texture,
    layer: u32,
) -> anyhow::Result<Vec<u8>> {
    let (width, height) = (texture.width(), texture.height());
    if layer >= texture.depth_or_array_layers() {
        bail!(
            "layer {layer} out of range, texture has {} layers",
            texture.depth_or_array_layers()
        );
    }
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texel = texture
        .format()
        .block_copy_size(None)
        .context("texture format has no single copy size")?;

    // bytes per row must be a multiple of COPY_BYTES_PER_ROW_ALIGNMENT
    let unpadded = width * texel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded = unpadded.div_ceil(align) * align;

    let output = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: padded as u64 * height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Readback Encoder"),
        });

    // Layers of array and cube textures are first copied into a
    // single-layer texture; some backends read array layers back as zeros.
    let staging;
    let (source, source_layer) = if texture.depth_or_array_layers() > 1 {
        staging = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Readback Staging"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture.format(),
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        encoder.copy_texture_to_texture(
            layer_copy(texture, layer),
            layer_copy(&staging, 0),
            extent,
        );
        (&staging, 0)
    } else {
        (texture, layer)
    };

    encoder.copy_texture_to_buffer(
        layer_copy(source, source_layer),
        wgpu::ImageCopyBuffer {
            buffer: &output,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    ctx.queue.submit(std::iter::once(encoder.finish()));

    let slice = output.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.wait_idle();
    rx.recv()
        .context("readback callback was dropped")?
        .map_err(|e| anyhow!("failed to map readback buffer: {e}"))?;

    let data = slice.get_mapped_range();
    let mut texels = Vec::with_capacity((unpadded * height) as usize);
    for row in data.chunks_exact(padded as usize) {
        texels.extend_from_slice(&row[..unpadded as usize]);
    }
    drop(data);
    output.unmap();
    Ok(texels)
}

fn layer_copy(texture: &wgpu::Texture, layer: u32) -> wgpu::ImageCopyTexture<'_> {
    wgpu::ImageCopyTexture {
        texture,
        mip_level: 0,
        origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
        aspect: wgpu::TextureAspect::All,
    }
}
