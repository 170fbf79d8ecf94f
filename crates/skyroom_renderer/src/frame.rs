//! One open render pass plus the state it is drawn with.
//!
//! A `Frame` is handed to scene components by [`crate::Renderer::render`] and
//! by the cubemap projector for each captured face.  Components draw through
//! [`Frame::draw_mesh`], which picks the pipeline matching the current
//! [`RasterState`](crate::state::RasterState) and applies the viewport lazily.
use crate::geometry::Mesh;
use crate::resources::TextureHandle;
use crate::shader::ShaderProgram;
use crate::state::{RenderState, TrackedState, Viewport};

/// Counters collected while a frame is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    /// Slots bound to a texture (binding `None` is not counted).
    pub texture_binds: u32,
}

pub struct Frame<'a> {
    pass: wgpu::RenderPass<'a>,
    device: &'a wgpu::Device,
    queue: &'a wgpu::Queue,
    state: &'a mut RenderState,
    target_size: (u32, u32),
    applied_viewport: Option<Viewport>,
    stats: FrameStats,
}

impl<'a> Frame<'a> {
    pub fn new(
        pass: wgpu::RenderPass<'a>,
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        state: &'a mut RenderState,
        target_size: (u32, u32),
    ) -> Self {
        Self {
            pass,
            device,
            queue,
            state,
            target_size,
            applied_viewport: None,
            stats: FrameStats::default(),
        }
    }

    pub fn device(&self) -> &'a wgpu::Device {
        self.device
    }

    pub fn queue(&self) -> &'a wgpu::Queue {
        self.queue
    }

    pub fn state(&self) -> &RenderState {
        &*self.state
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target_size
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Width / height of the current viewport.
    pub fn aspect(&self) -> f32 {
        let (_, _, w, h) = self.state.viewport().resolve(self.target_size);
        if h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }

    pub fn bind_texture(&mut self, slot: usize, handle: Option<TextureHandle>) {
        if self.state.bind_texture(slot, handle) && handle.is_some() {
            self.stats.texture_binds += 1;
        }
    }

    pub fn unbind_all_textures(&mut self) {
        self.state.unbind_all();
    }

    /// Draws `mesh` with `program` under the current raster state.
    ///
    /// `bind_groups[i]` is bound to group `i` with its dynamic offsets.
    /// Returns `false` without drawing when the mesh has no GPU buffers or
    /// the program cannot produce a pipeline for the current raster state.
    pub fn draw_mesh(
        &mut self,
        program: &mut ShaderProgram,
        mesh: &Mesh,
        bind_groups: &[(&wgpu::BindGroup, &[u32])],
    ) -> bool {
        if !mesh.is_uploaded() {
            return false;
        }
        self.apply_viewport();

        let pipeline = match program.pipeline(self.device, self.state.raster) {
            Ok(pipeline) => pipeline,
            Err(err) => {
                log::error!("{err}");
                return false;
            }
        };
        self.pass.set_pipeline(&pipeline);
        for (index, (group, offsets)) in bind_groups.iter().enumerate() {
            self.pass.set_bind_group(index as u32, *group, offsets);
        }
        if mesh.draw(&mut self.pass) {
            self.stats.draw_calls += 1;
            true
        } else {
            false
        }
    }

    /// Ends the pass and returns the counters.
    pub fn finish(self) -> FrameStats {
        self.stats
    }

    fn apply_viewport(&mut self) {
        let viewport = self.state.viewport();
        if self.applied_viewport == Some(viewport) {
            return;
        }
        let (x, y, w, h) = viewport.resolve(self.target_size);
        if w == 0 || h == 0 {
            return;
        }
        self.pass
            .set_viewport(x as f32, y as f32, w as f32, h as f32, 0.0, 1.0);
        self.applied_viewport = Some(viewport);
    }
}

impl TrackedState for Frame<'_> {
    fn render_state(&mut self) -> &mut RenderState {
        &mut *self.state
    }
}
