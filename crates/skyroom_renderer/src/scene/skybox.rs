use std::path::Path;
use std::sync::Arc;

use glam::{Mat3, Mat4};
use skyroom_core::{Camera, GpuContext};

use crate::cubemap::EquirectProjector;
use crate::frame::Frame;
use crate::geometry::Mesh;
use crate::pipeline;
use crate::render_target::DepthTarget;
use crate::resources::texture::{create_sampler, SamplerKind};
use crate::resources::{buffer, load_hdr_2d, CubeTexture};
use crate::shader::{builtin, ProgramDesc, ShaderError, ShaderProgram, ShaderSource};
use crate::state::{CullFace, DepthFunc, RenderState, StateScope, TrackedState, Viewport};

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct SkyUniform {
    view_proj: [[f32; 4]; 4],
}

/// Construction parameters for [`Skybox::new`].
#[derive(Debug, Clone, Copy)]
pub struct SkyboxDesc<'p> {
    pub hdr_path: &'p Path,
    /// Edge length of each projected cube face in texels.
    pub cube_size: u32,
    /// Viewport in effect once the projection has finished.
    pub restore: Viewport,
    pub color_format: wgpu::TextureFormat,
    /// Directory with hot-reloadable `skybox.wgsl` and
    /// `equirect_to_cubemap.wgsl`; embedded sources when `None`.
    pub shader_dir: Option<&'p Path>,
}

/// HDR environment drawn behind everything else.
///
/// The cube mesh is borrowed and must outlive the skybox.  The HDR image is
/// projected once in [`Skybox::new`] and only the cubemap is kept.
pub struct Skybox<'a> {
    cube: &'a Mesh,
    program: ShaderProgram,
    uniform: wgpu::Buffer,
    cubemap: Option<CubeTexture>,
    bind_group: Option<wgpu::BindGroup>,
}

impl<'a> Skybox<'a> {
    /// Loads `desc.hdr_path` and projects it onto a cubemap.
    ///
    /// A missing or unreadable HDR is logged and yields a skybox without a
    /// cubemap, whose `draw` does nothing.  Only shader errors are returned.
    pub fn new(
        ctx: &GpuContext,
        state: &mut RenderState,
        cube: &'a Mesh,
        desc: &SkyboxDesc<'_>,
    ) -> Result<Self, ShaderError> {
        let device = ctx.device.as_ref();
        let layout = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Skybox"),
            entries: &[
                pipeline::uniform_entry(0, wgpu::ShaderStages::VERTEX),
                pipeline::texture_entry(1, wgpu::ShaderStages::FRAGMENT, wgpu::TextureViewDimension::Cube),
                pipeline::sampler_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        }));
        let program = ShaderProgram::new(
            device,
            ShaderSource::from_dir_or(desc.shader_dir, "skybox.wgsl", builtin::SKYBOX),
            ProgramDesc {
                label: "Skybox".to_owned(),
                color_format: desc.color_format,
                depth_format: Some(DepthTarget::FORMAT),
                bind_group_layouts: vec![layout.clone()],
            },
        )?;
        let uniform = buffer::create_uniform(
            device,
            "Skybox Uniform",
            &SkyUniform {
                view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            },
        );

        let cubemap = match load_hdr_2d(ctx, desc.hdr_path) {
            Ok(hdr) => {
                let mut projector = EquirectProjector::new(
                    device,
                    ShaderSource::from_dir_or(
                        desc.shader_dir,
                        "equirect_to_cubemap.wgsl",
                        builtin::EQUIRECT_TO_CUBEMAP,
                    ),
                )?;
                let cubemap = projector.project(ctx, state, &hdr, cube, desc.cube_size, desc.restore);
                log::info!(
                    "Skybox ready: {} projected to {}x{} faces",
                    desc.hdr_path.display(),
                    cubemap.size(),
                    cubemap.size()
                );
                Some(cubemap)
            }
            Err(err) => {
                log::error!("Skybox: {err}");
                None
            }
        };

        let bind_group = cubemap.as_ref().map(|cubemap| {
            let sampler = create_sampler(device, SamplerKind::Clamp);
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Skybox"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&cubemap.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            })
        });

        Ok(Self {
            cube,
            program,
            uniform,
            cubemap,
            bind_group,
        })
    }

    pub fn cubemap(&self) -> Option<&CubeTexture> {
        self.cubemap.as_ref()
    }

    pub fn has_cubemap(&self) -> bool {
        self.cubemap.is_some()
    }

    /// Draws the environment at the far plane.  Slot 0 is unbound again
    /// afterwards.  Without a cubemap this returns immediately and leaves
    /// `frame` untouched.
    pub fn draw(&mut self, frame: &mut Frame<'_>, camera: &Camera) {
        let (Some(cubemap), Some(bind_group)) = (&self.cubemap, &self.bind_group) else {
            return;
        };
        self.program.reload_if_changed(frame.device());

        let view = Mat4::from_mat3(Mat3::from_mat4(camera.view_matrix()));
        let uniform = SkyUniform {
            view_proj: (camera.projection_matrix() * view).to_cols_array_2d(),
        };
        buffer::update_uniform(frame.queue(), &self.uniform, &uniform);

        let mut scope = StateScope::new(&mut *frame);
        let raster = &mut scope.render_state().raster;
        raster.depth_func = DepthFunc::LessEqual;
        raster.cull = CullFace::Front;
        scope.bind_texture(0, Some(cubemap.handle()));
        scope.draw_mesh(&mut self.program, self.cube, &[(bind_group, &[])]);
        scope.bind_texture(0, None);
    }
}
