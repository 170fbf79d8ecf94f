//! Headless GPU tests.  Each test returns early when the machine has no
//! usable adapter.

use std::path::PathBuf;

use glam::{Vec3, Vec4};
use skyroom_renderer::geometry::primitives;
use skyroom_renderer::resources::readback::read_texture_layer;
use skyroom_renderer::resources::{
    self, load_2d, load_cubemap, load_hdr_2d, CubeFace, CubeTexture, Texture2D, TextureError,
};
use skyroom_renderer::scene::{Room, RoomDesc, RoomTexturePaths, RoomTextures, Skybox, SkyboxDesc};
use skyroom_renderer::shader::{ProgramDesc, ShaderError, ShaderProgram};
use skyroom_renderer::state::Blend;
use skyroom_renderer::{
    Camera, DepthTarget, EquirectProjector, GpuContext, RasterState, RenderState, Renderer, ShaderSource, Viewport,
};

const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

fn gpu() -> Option<GpuContext> {
    match pollster::block_on(GpuContext::new()) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            eprintln!("skipping GPU test: {err:#}");
            None
        }
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("skyroom-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn color_target(ctx: &GpuContext, width: u32, height: u32) -> wgpu::TextureView {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Test Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Colour target that can also be copied back to the CPU.
fn readable_target(ctx: &GpuContext, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Readable Target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

fn pixel(rgba: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * width + x) * 4) as usize;
    [rgba[i], rgba[i + 1], rgba[i + 2], rgba[i + 3]]
}

fn write_hdr(path: &std::path::Path, width: u32, height: u32, color: [f32; 3]) {
    let pixels = vec![image::Rgb(color); (width * height) as usize];
    let file = std::io::BufWriter::new(std::fs::File::create(path).unwrap());
    image::codecs::hdr::HdrEncoder::new(file)
        .encode(&pixels, width as usize, height as usize)
        .unwrap();
}

fn camera() -> Camera {
    Camera::looking_at(Vec3::new(0.0, 1.6, 3.0), Vec3::new(0.0, 1.6, 0.0), 60.0, 1.0)
}

#[test]
fn uniform_equirect_projects_to_uniform_faces() {
    let Some(ctx) = gpu() else { return };
    let color = [0.25f32, 0.5, 0.75, 1.0];
    let (w, h) = (128u32, 64u32);
    let pixels: Vec<f32> = (0..w * h).flat_map(|_| color).collect();
    let source = Texture2D::from_rgba32f(&ctx.device, &ctx.queue, "Uniform Equirect", w, h, &pixels);
    let cube = primitives::cube(&ctx.device, 2.0);

    let mut projector = EquirectProjector::new(
        &ctx.device,
        ShaderSource::Embedded(skyroom_renderer::shader::builtin::EQUIRECT_TO_CUBEMAP),
    )
    .unwrap();
    let mut state = RenderState::new();
    let restore = Viewport::sized(640, 480);
    let cubemap = projector.project(&ctx, &mut state, &source, &cube, 64, restore);

    assert_eq!(state.viewport(), restore);
    assert_eq!(state.raster, RasterState::default());
    assert_eq!(cubemap.size(), 64);

    let expected = Vec4::from_array(color);
    for face in CubeFace::ALL {
        let texels = cubemap.read_face(&ctx, face).unwrap();
        assert_eq!(texels.len(), 64 * 64);
        for texel in texels {
            let got = Vec4::from_array(texel);
            assert!(got.abs_diff_eq(expected, 1e-2), "{face:?}: {got:?}");
        }
    }
}

#[test]
fn skybox_without_hdr_leaves_the_frame_untouched() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = Renderer::new(ctx, 64, 64, TARGET_FORMAT);
    let cube = primitives::cube(&renderer.context.device, 2.0);
    let restore = renderer.full_viewport();
    let mut skybox = Skybox::new(
        &renderer.context,
        &mut renderer.state,
        &cube,
        &SkyboxDesc {
            hdr_path: std::path::Path::new("does/not/exist.hdr"),
            cube_size: 32,
            restore,
            color_format: TARGET_FORMAT,
            shader_dir: None,
        },
    )
    .unwrap();
    assert!(!skybox.has_cubemap());

    let view = color_target(&renderer.context, 64, 64);
    let before = renderer.state.clone();
    let camera = camera();
    let stats = renderer.render(&view, |frame| skybox.draw(frame, &camera));

    assert_eq!(stats.draw_calls, 0);
    assert_eq!(stats.texture_binds, 0);
    assert_eq!(renderer.state, before);
}

#[test]
fn skybox_with_hdr_draws_once_and_restores_state() {
    let Some(ctx) = gpu() else { return };
    let dir = scratch_dir("sky");
    let hdr = dir.join("sky.hdr");
    write_hdr(&hdr, 32, 16, [2.0, 1.0, 0.5]);

    let mut renderer = Renderer::new(ctx, 64, 64, TARGET_FORMAT);
    let cube = primitives::cube(&renderer.context.device, 2.0);
    let restore = renderer.full_viewport();
    let mut skybox = Skybox::new(
        &renderer.context,
        &mut renderer.state,
        &cube,
        &SkyboxDesc {
            hdr_path: &hdr,
            cube_size: 16,
            restore,
            color_format: TARGET_FORMAT,
            shader_dir: None,
        },
    )
    .unwrap();
    assert!(skybox.has_cubemap());
    assert_eq!(renderer.state.viewport(), restore);

    let view = color_target(&renderer.context, 64, 64);
    let camera = camera();
    let stats = renderer.render(&view, |frame| skybox.draw(frame, &camera));
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.texture_binds, 1);
    assert_eq!(renderer.state.raster, RasterState::default());
    assert_eq!(renderer.state.bound_count(), 0);

    let face = skybox.cubemap().unwrap().read_face(&renderer.context, CubeFace::PositiveX).unwrap();
    assert!(Vec4::from_array(face[0]).abs_diff_eq(Vec4::new(2.0, 1.0, 0.5, 1.0), 5e-2));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn room_draws_glass_only_with_a_glass_texture() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = Renderer::new(ctx, 64, 64, TARGET_FORMAT);
    let desc = RoomDesc {
        size: Vec3::new(10.0, 3.0, 10.0),
        cut_window: true,
        color_format: TARGET_FORMAT,
        shader_dir: None,
    };
    let camera = camera();
    let view = color_target(&renderer.context, 64, 64);

    let mut bare = Room::new(&renderer.context, &desc, RoomTextures::default()).unwrap();
    assert!(bare.transparent().is_uploaded());
    let stats = renderer.render(&view, |frame| bare.draw(frame, &camera));
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(renderer.state.bound_count(), 0);

    let glass = Texture2D::solid(&renderer.context.device, &renderer.context.queue, "Glass", [200, 220, 255, 255]);
    let textures = RoomTextures {
        glass: Some(glass),
        ..Default::default()
    };
    let mut glazed = Room::new(&renderer.context, &desc, textures).unwrap();
    let stats = renderer.render(&view, |frame| glazed.draw(frame, &camera));
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.texture_binds, 6);
    assert_eq!(renderer.state.raster, RasterState::default());
    assert_eq!(renderer.state.bound_count(), 0);
}

#[test]
fn solid_room_has_no_transparent_mesh() {
    let Some(ctx) = gpu() else { return };
    let desc = RoomDesc {
        size: Vec3::new(10.0, 3.0, 10.0),
        cut_window: false,
        color_format: TARGET_FORMAT,
        shader_dir: None,
    };
    let room = Room::new(&ctx, &desc, RoomTextures::default()).unwrap();
    assert_eq!(room.opaque().vertex_count(), 48);
    assert_eq!(room.opaque().index_count(), 72);
    assert!(!room.transparent().is_uploaded());
}

#[test]
fn loader_builds_mip_chain_and_reports_missing_files() {
    let Some(ctx) = gpu() else { return };
    let dir = scratch_dir("tex");
    let png = dir.join("checker.png");
    image::RgbaImage::from_fn(4, 2, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    })
    .save(&png)
    .unwrap();

    let texture = load_2d(&ctx, &png, true).unwrap();
    assert_eq!(texture.size(), (4, 2));
    assert_eq!(texture.mip_level_count(), 3);
    assert_eq!(texture.format(), wgpu::TextureFormat::Rgba8UnormSrgb);

    let err = load_2d(&ctx, dir.join("missing.png"), true).unwrap_err();
    assert!(matches!(err, TextureError::Decode { .. }));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cubemap_loader_skips_bad_faces() {
    let Some(ctx) = gpu() else { return };
    let dir = scratch_dir("cube");
    let faces = resources::CUBE_FACE_NAMES.map(|name| dir.join(format!("{name}.png")));
    for (i, path) in faces.iter().enumerate() {
        match i {
            // left face missing, top face the wrong size
            1 => {}
            2 => image::RgbaImage::new(4, 4).save(path).unwrap(),
            _ => image::RgbaImage::new(8, 8).save(path).unwrap(),
        }
    }

    let cubemap = load_cubemap(&ctx, &faces).unwrap();
    assert_eq!(cubemap.size(), 8);

    let nothing = [0, 1, 2, 3, 4, 5].map(|i| dir.join(format!("none{i}.png")));
    assert!(matches!(load_cubemap(&ctx, &nothing), Err(TextureError::NoFaces { .. })));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn every_cube_face_reads_back_its_own_texels() {
    let Some(ctx) = gpu() else { return };
    let cube = CubeTexture::new(
        &ctx.device,
        "Readback Cube",
        4,
        wgpu::TextureFormat::Rgba16Float,
        wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC,
    );
    for face in CubeFace::ALL {
        let value = half::f16::from_f32(face.index() as f32 + 1.0).to_le_bytes();
        let texel: Vec<u8> = (0..4).flat_map(|_| value).collect();
        cube.write_face(&ctx.queue, face, &texel.repeat(16));
    }

    for face in CubeFace::ALL {
        let texels = cube.read_face(&ctx, face).unwrap();
        let want = face.index() as f32 + 1.0;
        assert_eq!(texels.len(), 16);
        assert!(texels.iter().all(|t| *t == [want; 4]), "{face:?}: {:?}", texels[0]);
    }
}

#[test]
fn oversized_hdr_is_an_error_and_leaves_no_skybox() {
    let Some(ctx) = gpu() else { return };
    let max = ctx.device.limits().max_texture_dimension_2d;
    let dir = scratch_dir("huge");
    let hdr = dir.join("wide.hdr");
    write_hdr(&hdr, max + 8, 2, [1.0, 1.0, 1.0]);

    let err = load_hdr_2d(&ctx, &hdr).unwrap_err();
    assert!(
        matches!(err, TextureError::TooLarge { width, max: limit, .. } if width == max + 8 && limit == max),
        "{err}"
    );

    let mut renderer = Renderer::new(ctx, 32, 32, TARGET_FORMAT);
    let cube = primitives::cube(&renderer.context.device, 2.0);
    let restore = renderer.full_viewport();
    let skybox = Skybox::new(
        &renderer.context,
        &mut renderer.state,
        &cube,
        &SkyboxDesc {
            hdr_path: &hdr,
            cube_size: 16,
            restore,
            color_format: TARGET_FORMAT,
            shader_dir: None,
        },
    )
    .unwrap();
    assert!(!skybox.has_cubemap());
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn resize_carries_a_full_target_viewport_along() {
    let Some(ctx) = gpu() else { return };
    let mut renderer = Renderer::new(ctx, 32, 32, TARGET_FORMAT);
    renderer.state.set_viewport(renderer.full_viewport());
    renderer.resize(64, 64);
    assert_eq!(renderer.state.viewport(), Viewport::sized(64, 64));

    let inset = Viewport::new(8, 8, 16, 16);
    renderer.state.set_viewport(inset);
    renderer.resize(128, 96);
    assert_eq!(renderer.state.viewport(), inset);
}

#[test]
fn sky_fills_the_target_after_the_window_grows() {
    let Some(ctx) = gpu() else { return };
    let dir = scratch_dir("grow");
    let hdr = dir.join("sky.hdr");
    write_hdr(&hdr, 32, 16, [0.25, 0.5, 0.75]);

    let mut renderer = Renderer::new(ctx, 32, 32, TARGET_FORMAT);
    renderer.clear_color = wgpu::Color::BLACK;
    let cube = primitives::cube(&renderer.context.device, 2.0);
    let restore = renderer.full_viewport();
    let mut skybox = Skybox::new(
        &renderer.context,
        &mut renderer.state,
        &cube,
        &SkyboxDesc {
            hdr_path: &hdr,
            cube_size: 16,
            restore,
            color_format: TARGET_FORMAT,
            shader_dir: None,
        },
    )
    .unwrap();
    renderer.resize(64, 64);

    let (target, view) = readable_target(&renderer.context, 64, 64);
    let camera = camera();
    renderer.render(&view, |frame| skybox.draw(frame, &camera));
    let rgba = read_texture_layer(&renderer.context, &target, 0).unwrap();

    let near = pixel(&rgba, 64, 5, 5);
    let far = pixel(&rgba, 64, 60, 60);
    assert_ne!(far, [0, 0, 0, 255]);
    for (a, b) in near.iter().zip(far) {
        assert!(a.abs_diff(b) <= 2, "{near:?} vs {far:?}");
    }
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn room_textures_skip_missing_files_and_unused_glass() {
    let Some(ctx) = gpu() else { return };
    let dir = scratch_dir("room-tex");
    let png = dir.join("plain.png");
    image::RgbaImage::from_pixel(2, 2, image::Rgba([180, 120, 60, 255]))
        .save(&png)
        .unwrap();
    let paths = RoomTexturePaths {
        floor: Some(png.clone()),
        wall: Some(dir.join("missing.png")),
        glass: Some(png.clone()),
        ..Default::default()
    };

    let solid = RoomTextures::load(&ctx, &paths, false);
    assert_eq!(solid.presence(), [true, false, false, false, false, false]);
    let glazed = RoomTextures::load(&ctx, &paths, true);
    assert_eq!(glazed.presence(), [true, false, false, true, false, false]);

    let mut renderer = Renderer::new(ctx, 64, 64, TARGET_FORMAT);
    let desc = RoomDesc {
        size: Vec3::new(10.0, 3.0, 10.0),
        cut_window: false,
        color_format: TARGET_FORMAT,
        shader_dir: None,
    };
    let mut room = Room::new(&renderer.context, &desc, solid).unwrap();
    let view = color_target(&renderer.context, 64, 64);
    let camera = camera();
    let stats = renderer.render(&view, |frame| room.draw(frame, &camera));
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(renderer.state.bound_count(), 0);
    let _ = std::fs::remove_dir_all(dir);
}

fn flat_shader(fragment_entry: &str) -> String {
    r#"
struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.clip = vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn FRAGMENT_ENTRY(in: VsOut) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#
    .replace("FRAGMENT_ENTRY", fragment_entry)
}

fn touch(path: &std::path::Path, seconds_ahead: u64) {
    let when = std::time::SystemTime::now() + std::time::Duration::from_secs(seconds_ahead);
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

fn flat_desc() -> ProgramDesc {
    ProgramDesc {
        label: "Flat".to_owned(),
        color_format: TARGET_FORMAT,
        depth_format: Some(DepthTarget::FORMAT),
        bind_group_layouts: Vec::new(),
    }
}

#[test]
fn reload_keeps_the_old_program_when_the_edit_cannot_link() {
    let Some(ctx) = gpu() else { return };
    let device = ctx.device.as_ref();
    let dir = scratch_dir("reload");
    let path = dir.join("flat.wgsl");
    std::fs::write(&path, flat_shader("fs_main")).unwrap();

    let mut program = ShaderProgram::new(device, ShaderSource::File(path.clone()), flat_desc()).unwrap();
    assert_eq!(program.cached_pipelines(), 1);
    let alpha = RasterState {
        blend: Blend::Alpha,
        ..Default::default()
    };
    program.pipeline(device, alpha).unwrap();
    assert_eq!(program.cached_pipelines(), 2);

    // compiles, but has no `fs_main` to link against
    std::fs::write(&path, flat_shader("fs_main_edit")).unwrap();
    touch(&path, 10);
    assert!(!program.reload_if_changed(device));
    assert_eq!(program.cached_pipelines(), 2);
    assert!(program.pipeline(device, RasterState::default()).is_ok());
    assert!(program.pipeline(device, alpha).is_ok());
    assert!(!program.reload_if_changed(device));

    std::fs::write(&path, flat_shader("fs_main")).unwrap();
    touch(&path, 20);
    assert!(program.reload_if_changed(device));
    assert_eq!(program.cached_pipelines(), 2);
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn program_without_fragment_entry_is_rejected() {
    let Some(ctx) = gpu() else { return };
    let dir = scratch_dir("unlinked");
    let path = dir.join("broken.wgsl");
    std::fs::write(&path, flat_shader("shade")).unwrap();

    let err = ShaderProgram::new(&ctx.device, ShaderSource::File(path), flat_desc()).unwrap_err();
    assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    let _ = std::fs::remove_dir_all(dir);
}
