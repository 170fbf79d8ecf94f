//! Image file → GPU texture loading.
//!
//! Decoding goes through the `image` crate; the returned textures own their
//! GPU storage.  Failures are reported as [`TextureError`] and never panic,
//! so callers can log them and carry on without the texture.

use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use skyroom_core::GpuContext;
use thiserror::Error;

use super::texture::{CubeFace, CubeTexture, Texture2D};

/// File stems of the six faces, in [`CubeFace`] order.
pub const CUBE_FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cubemap face {} is {width}x{height}, expected {expected}x{expected}", .path.display())]
    FaceSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },
    #[error("none of the cubemap faces could be loaded (first: {})", .first.display())]
    NoFaces { first: PathBuf },
    #[error("image {} is {width}x{height}, larger than the device limit of {max}", .path.display())]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

/// Rejects images the device cannot hold in a single 2-D or cube texture.
fn check_size(path: &Path, width: u32, height: u32, max: u32) -> Result<(), TextureError> {
    if width > max || height > max {
        return Err(TextureError::TooLarge {
            path: path.to_path_buf(),
            width,
            height,
            max,
        });
    }
    Ok(())
}

fn max_dimension(ctx: &GpuContext) -> u32 {
    ctx.device.limits().max_texture_dimension_2d
}

fn decode(path: &Path) -> Result<image::DynamicImage, TextureError> {
    image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads an 8-bit image as an sRGB texture with a full mip chain.
///
/// Rows are flipped when `flip_vertically` is set so that `v = 0` samples
/// the bottom of the picture.  Grey and RGB images are expanded to RGBA.
pub fn load_2d(
    ctx: &GpuContext,
    path: impl AsRef<Path>,
    flip_vertically: bool,
) -> Result<Texture2D, TextureError> {
    let path = path.as_ref();
    let mut image = decode(path)?.into_rgba8();
    if flip_vertically {
        imageops::flip_vertical_in_place(&mut image);
    }
    let (width, height) = image.dimensions();
    check_size(path, width, height, max_dimension(ctx))?;
    let levels: Vec<Vec<u8>> = mip_chain(image).into_iter().map(RgbaImage::into_raw).collect();

    log::debug!("Loaded {} ({width}x{height}, {} mips)", path.display(), levels.len());
    Ok(Texture2D::from_levels(
        &ctx.device,
        &ctx.queue,
        &path.to_string_lossy(),
        wgpu::TextureFormat::Rgba8UnormSrgb,
        width,
        height,
        &levels,
    ))
}

/// Loads a floating-point image (Radiance `.hdr` and friends) as an
/// `Rgba16Float` texture.  Always flipped vertically, no mips.
pub fn load_hdr_2d(ctx: &GpuContext, path: impl AsRef<Path>) -> Result<Texture2D, TextureError> {
    let path = path.as_ref();
    let image = decode(path)?;
    check_size(path, image.width(), image.height(), max_dimension(ctx))?;
    let mut image = image.into_rgba32f();
    imageops::flip_vertical_in_place(&mut image);
    let (width, height) = image.dimensions();

    log::debug!("Loaded HDR {} ({width}x{height})", path.display());
    Ok(Texture2D::from_rgba32f(
        &ctx.device,
        &ctx.queue,
        &path.to_string_lossy(),
        width,
        height,
        image.as_raw(),
    ))
}

/// Loads six square 8-bit images as the faces of a cube texture, in
/// [`CubeFace`] order (+X, −X, +Y, −Y, +Z, −Z).
///
/// A face that fails to decode, or whose size differs from the first good
/// face, is logged and left black.  An error is returned when no face
/// loads at all or when the faces exceed the device's texture limit.
pub fn load_cubemap<P: AsRef<Path>>(ctx: &GpuContext, faces: &[P; 6]) -> Result<CubeTexture, TextureError> {
    let mut images: Vec<Option<RgbaImage>> = Vec::with_capacity(6);
    for path in faces {
        let path = path.as_ref();
        match decode(path) {
            Ok(image) => images.push(Some(image.into_rgba8())),
            Err(err) => {
                log::error!("{err}");
                images.push(None);
            }
        }
    }

    let Some((first, size)) = images
        .iter()
        .zip(faces)
        .find_map(|(image, path)| image.as_ref().map(|i| (path.as_ref(), i.width())))
    else {
        return Err(TextureError::NoFaces {
            first: faces[0].as_ref().to_path_buf(),
        });
    };
    check_size(first, size, size, max_dimension(ctx))?;

    let cubemap = CubeTexture::new(
        &ctx.device,
        "Cubemap",
        size,
        wgpu::TextureFormat::Rgba8UnormSrgb,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
    );
    for ((face, image), path) in CubeFace::ALL.into_iter().zip(images).zip(faces) {
        let Some(image) = image else { continue };
        if image.dimensions() != (size, size) {
            let err = TextureError::FaceSize {
                path: path.as_ref().to_path_buf(),
                width: image.width(),
                height: image.height(),
                expected: size,
            };
            log::warn!("{err}");
            continue;
        }
        cubemap.write_face(&ctx.queue, face, image.as_raw());
    }
    Ok(cubemap)
}

/// Loads `dir/{right,left,top,bottom,front,back}.ext` via [`load_cubemap`].
pub fn load_cubemap_dir(
    ctx: &GpuContext,
    dir: impl AsRef<Path>,
    ext: &str,
) -> Result<CubeTexture, TextureError> {
    load_cubemap(ctx, &cube_face_paths(dir.as_ref(), ext))
}

fn cube_face_paths(dir: &Path, ext: &str) -> [PathBuf; 6] {
    CUBE_FACE_NAMES.map(|name| dir.join(format!("{name}.{ext}")))
}

/// Base image followed by successively halved levels down to 1×1.
fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let mut levels = vec![base];
    loop {
        let Some(last) = levels.last() else { break };
        let (w, h) = last.dimensions();
        if w <= 1 && h <= 1 {
            break;
        }
        let next = imageops::resize(last, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle);
        levels.push(next);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_paths_follow_cube_face_order() {
        let paths = cube_face_paths(Path::new("sky"), "png");
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        assert_eq!(
            names,
            ["right", "left", "top", "bottom", "front", "back"].map(|n| Path::new("sky").join(format!("{n}.png")).display().to_string())
        );
    }

    #[test]
    fn mip_chain_halves_to_one_texel() {
        let levels = mip_chain(RgbaImage::new(8, 2));
        let dims: Vec<(u32, u32)> = levels.iter().map(|l| l.dimensions()).collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn mip_chain_of_single_texel_is_itself() {
        assert_eq!(mip_chain(RgbaImage::new(1, 1)).len(), 1);
    }

    #[test]
    fn decode_error_names_the_file() {
        let err = decode(Path::new("definitely/missing.png")).unwrap_err();
        assert!(err.to_string().contains("definitely"));
        assert!(matches!(err, TextureError::Decode { .. }));
    }

    #[test]
    fn oversized_images_are_rejected_before_upload() {
        assert!(check_size(Path::new("sky.hdr"), 8192, 4096, 8192).is_ok());
        let err = check_size(Path::new("sky.hdr"), 16384, 8192, 8192).unwrap_err();
        assert!(matches!(
            err,
            TextureError::TooLarge {
                width: 16384,
                height: 8192,
                max: 8192,
                ..
            }
        ));
        assert!(err.to_string().contains("sky.hdr"));
        assert!(check_size(Path::new("tall.png"), 2, 9000, 8192).is_err());
    }
}
