//! Equirectangular → cubemap projection.
//!
//! The unit cube is drawn six times from its centre with a 90° camera, once
//! per face, each time into one array layer of the destination cube texture.
//! The fragment stage turns the interpolated cube-local position into a
//! direction and looks it up in the equirect image.
//!
//! All six passes are recorded in [`CubeFace`] order into one command
//! encoder and submitted together.
use std::sync::Arc;

use glam::{Mat4, Vec3};
use skyroom_core::GpuContext;

use crate::frame::Frame;
use crate::geometry::Mesh;
use crate::pipeline;
use crate::render_target::DepthTarget;
use crate::resources::texture::{create_sampler, SamplerKind};
use crate::resources::{CubeFace, CubeTexture, DynamicUniformBuffer, Texture2D};
use crate::shader::{ProgramDesc, ShaderError, ShaderProgram, ShaderSource};
use crate::state::{CullFace, RenderState, StateScope, Viewport};

/// Format of projected cubemaps.
pub const CUBEMAP_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

const CAPTURE_NEAR: f32 = 0.1;
const CAPTURE_FAR: f32 = 10.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CaptureUniform {
    view_proj: [[f32; 4]; 4],
}

/// 90° square projection used for every face.
///
/// Clip-space Y is flipped: render targets put NDC `+y` on the first texel
/// row, while cube sampling expects the first row at `−y` of each face's
/// basis.
pub fn capture_projection() -> Mat4 {
    Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0))
        * Mat4::perspective_rh(90f32.to_radians(), 1.0, CAPTURE_NEAR, CAPTURE_FAR)
}

/// View matrices looking from the origin through each face, in
/// [`CubeFace`] order.
pub fn capture_views() -> [Mat4; 6] {
    let look = |dir: Vec3, up: Vec3| Mat4::look_at_rh(Vec3::ZERO, dir, up);
    [
        look(Vec3::X, Vec3::NEG_Y),
        look(Vec3::NEG_X, Vec3::NEG_Y),
        look(Vec3::Y, Vec3::Z),
        look(Vec3::NEG_Y, Vec3::NEG_Z),
        look(Vec3::Z, Vec3::NEG_Y),
        look(Vec3::NEG_Z, Vec3::NEG_Y),
    ]
}

/// Face size actually used for a requested capture resolution.
fn clamp_resolution(requested: u32, max: u32) -> u32 {
    if requested > max {
        log::warn!("Cubemap size {requested} exceeds the device limit, using {max}");
    }
    requested.clamp(1, max)
}

pub struct EquirectProjector {
    program: ShaderProgram,
    uniforms: DynamicUniformBuffer<CaptureUniform>,
    camera_group: wgpu::BindGroup,
    source_layout: Arc<wgpu::BindGroupLayout>,
    sampler: wgpu::Sampler,
}

impl EquirectProjector {
    pub fn new(device: &wgpu::Device, source: ShaderSource) -> Result<Self, ShaderError> {
        let uniforms = DynamicUniformBuffer::<CaptureUniform>::new(device, "Capture Uniforms", 6);
        let camera_layout = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Capture Camera (dynamic)"),
            entries: &[DynamicUniformBuffer::<CaptureUniform>::layout_entry(
                0,
                wgpu::ShaderStages::VERTEX,
            )],
        }));
        let source_layout = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Equirect Source"),
            entries: &[
                pipeline::texture_entry(0, wgpu::ShaderStages::FRAGMENT, wgpu::TextureViewDimension::D2),
                pipeline::sampler_entry(1, wgpu::ShaderStages::FRAGMENT),
            ],
        }));
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Capture Camera"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.binding(),
            }],
        });

        let program = ShaderProgram::new(
            device,
            source,
            ProgramDesc {
                label: "Equirect To Cubemap".to_owned(),
                color_format: CUBEMAP_FORMAT,
                depth_format: Some(DepthTarget::FORMAT),
                bind_group_layouts: vec![camera_layout, source_layout.clone()],
            },
        )?;

        Ok(Self {
            program,
            uniforms,
            camera_group,
            source_layout,
            sampler: create_sampler(device, SamplerKind::Clamp),
        })
    }

    /// Projects `source` onto a new `resolution`² cube texture.  The
    /// resolution is clamped to the device's texture limit.
    ///
    /// `cube` is drawn as is, with culling disabled, so any closed mesh
    /// around the origin works.  The viewport of `state` is the capture size
    /// while recording and equals `restore` when this returns.
    pub fn project(
        &mut self,
        ctx: &GpuContext,
        state: &mut RenderState,
        source: &Texture2D,
        cube: &Mesh,
        resolution: u32,
        restore: Viewport,
    ) -> CubeTexture {
        let device = ctx.device.as_ref();
        let queue = ctx.queue.as_ref();
        let resolution = clamp_resolution(resolution, device.limits().max_texture_dimension_2d);

        let cubemap = CubeTexture::new(
            device,
            "Environment Cubemap",
            resolution,
            CUBEMAP_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
        );
        let depth = DepthTarget::new(device, resolution, resolution);

        let projection = capture_projection();
        for (face, view) in capture_views().iter().enumerate() {
            let view_proj = projection * *view;
            self.uniforms.write(
                queue,
                face,
                &CaptureUniform {
                    view_proj: view_proj.to_cols_array_2d(),
                },
            );
        }

        let source_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Equirect Source"),
            layout: &self.source_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut scope = StateScope::new(state);
        scope.restore_viewport_to(restore);
        scope.raster.cull = CullFace::None;
        scope.set_viewport(Viewport::sized(resolution, resolution));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Cubemap Capture Encoder"),
        });
        let mut draws = 0;
        for face in CubeFace::ALL {
            let face_view = cubemap.face_view(face);
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Cubemap Capture Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &face_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let offset = self.uniforms.offset(face.index() as usize);
            let mut frame = Frame::new(pass, device, queue, &mut scope, (resolution, resolution));
            frame.draw_mesh(
                &mut self.program,
                cube,
                &[(&self.camera_group, &[offset]), (&source_group, &[])],
            );
            draws += frame.finish().draw_calls;
        }
        queue.submit(std::iter::once(encoder.finish()));
        depth.destroy();
        drop(scope);

        log::debug!("Projected equirect texture onto {resolution}x{resolution} cubemap ({draws} face draws)");
        cubemap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_dirs() -> [Vec3; 6] {
        [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z]
    }

    #[test]
    fn each_view_looks_through_its_face() {
        for (view, dir) in capture_views().iter().zip(face_dirs()) {
            let eye_space = view.transform_vector3(dir);
            assert!(eye_space.abs_diff_eq(Vec3::NEG_Z, 1e-5), "{dir:?} -> {eye_space:?}");
        }
    }

    #[test]
    fn face_centres_project_to_the_middle_of_the_target() {
        let proj = capture_projection();
        for (view, dir) in capture_views().iter().zip(face_dirs()) {
            let clip = proj * *view * dir.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5, "{dir:?} -> {ndc:?}");
            assert!((0.0..=1.0).contains(&ndc.z));
        }
    }

    #[test]
    fn projection_flips_clip_space_y() {
        let p = capture_projection() * Vec3::new(0.0, 0.5, -1.0).extend(1.0);
        assert!(p.y / p.w < 0.0);
        let q = Mat4::perspective_rh(90f32.to_radians(), 1.0, CAPTURE_NEAR, CAPTURE_FAR)
            * Vec3::new(0.0, 0.5, -1.0).extend(1.0);
        assert!((p.y + q.y).abs() < 1e-6);
    }

    #[test]
    fn resolution_stays_within_device_limit() {
        assert_eq!(clamp_resolution(512, 8192), 512);
        assert_eq!(clamp_resolution(16384, 8192), 8192);
        assert_eq!(clamp_resolution(0, 8192), 1);
    }

    #[test]
    fn capture_frustum_covers_exactly_one_face() {
        // The corner of the +Z face lands on the corner of clip space.
        let views = capture_views();
        let clip = capture_projection() * views[4] * Vec3::new(1.0, 1.0, 1.0).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!((ndc.x.abs() - 1.0).abs() < 1e-5);
        assert!((ndc.y.abs() - 1.0).abs() < 1e-5);
    }
}
