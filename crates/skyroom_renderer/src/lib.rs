//! `skyroom_renderer` — textured room and HDR skybox rendering on wgpu.
//!
//! # Module layout
//!
//! | Module          | Responsibility                                            |
//! |-----------------|-----------------------------------------------------------|
//! | `resources`     | Buffers, textures, dynamic uniforms, image loading        |
//! | `geometry`      | `Vertex`, `MeshData`/`Mesh`, cube primitive, room builder |
//! | `state`         | `RenderState` and scoped overrides (`StateScope`)         |
//! | `shader`        | `ShaderProgram` with pipeline cache and hot reload        |
//! | `pipeline`      | Pipeline and bind-group-layout construction helpers       |
//! | `render_target` | Depth attachment                                          |
//! | `frame`         | `Frame`: one render pass plus its state and counters      |
//! | `cubemap`       | Equirect → cubemap projection                             |
//! | `scene`         | `Skybox` and `Room`                                       |
pub mod cubemap;
pub mod frame;
pub mod geometry;
pub mod pipeline;
pub mod render_target;
pub mod resources;
pub mod scene;
pub mod shader;
pub mod state;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use glam;
pub use skyroom_core::{Camera, GpuContext};

pub use cubemap::EquirectProjector;
pub use frame::{Frame, FrameStats};
pub use geometry::{Mesh, MeshData, Vertex};
pub use render_target::DepthTarget;
pub use resources::{CubeFace, CubeTexture, Texture2D, TextureError, TextureHandle};
pub use scene::{Room, RoomDesc, RoomTexturePaths, RoomTextures, Skybox, SkyboxDesc};
pub use shader::{ShaderError, ShaderProgram, ShaderSource};
pub use state::{RasterState, RenderState, StateScope, TrackedState, Viewport};

// ── Renderer ──────────────────────────────────────────────────────────────────

/// Owns the device context, the depth buffer and the render state, and
/// opens one cleared render pass per [`render`](Renderer::render) call.
pub struct Renderer {
    pub context: GpuContext,
    pub state: RenderState,
    pub clear_color: wgpu::Color,
    depth: DepthTarget,
    format: wgpu::TextureFormat,
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(context: GpuContext, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let depth = DepthTarget::new(&context.device, width, height);
        Self {
            context,
            state: RenderState::new(),
            clear_color: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.12,
                a: 1.0,
            },
            depth,
            format,
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Viewport covering the whole colour target.
    pub fn full_viewport(&self) -> Viewport {
        Viewport::sized(self.width, self.height)
    }

    /// Recreates the depth buffer when the target changes size.  A viewport
    /// that covered the whole old target grows or shrinks with it; any other
    /// viewport is left alone.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return;
        }
        if self.state.viewport() == self.full_viewport() {
            self.state.set_viewport(Viewport::sized(width, height));
        }
        self.depth.resize(&self.context.device, width, height);
        self.width = width;
        self.height = height;
        log::debug!("Renderer resized to {width}x{height}");
    }

    /// Clears `view` and the depth buffer, lets `draw` record into the pass
    /// and submits it.  `view` must have the renderer's size and format.
    pub fn render<F>(&mut self, view: &wgpu::TextureView, draw: F) -> FrameStats
    where
        F: FnOnce(&mut Frame<'_>),
    {
        let mut encoder = self
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let stats = {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut frame = Frame::new(
                pass,
                &self.context.device,
                &self.context.queue,
                &mut self.state,
                (self.width, self.height),
            );
            draw(&mut frame);
            frame.finish()
        };

        self.context.queue.submit(std::iter::once(encoder.finish()));
        stats
    }
}
