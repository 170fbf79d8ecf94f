//! Explicit render state and scoped overrides.
//!
//! Everything a draw depends on besides its own resources lives in a
//! [`RenderState`]: the raster configuration (depth test, culling, blending,
//! depth writes), the viewport and the six texture slots.  Pipelines are
//! looked up by [`RasterState`], so changing it between draws selects a
//! different cached pipeline.
//!
//! Code that needs a temporary change opens a [`StateScope`].  The scope
//! records the raster state and viewport on creation and writes them back
//! when it is dropped, on every exit path.
use std::ops::{Deref, DerefMut};

use crate::resources::TextureHandle;

/// Number of texture slots tracked by [`RenderState`].
pub const TEXTURE_SLOTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunc {
    #[default]
    Less,
    LessEqual,
    Always,
}

impl DepthFunc {
    pub fn compare(self) -> wgpu::CompareFunction {
        match self {
            DepthFunc::Less => wgpu::CompareFunction::Less,
            DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
            DepthFunc::Always => wgpu::CompareFunction::Always,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    #[default]
    None,
    Front,
    Back,
}

impl CullFace {
    pub fn face(self) -> Option<wgpu::Face> {
        match self {
            CullFace::None => None,
            CullFace::Front => Some(wgpu::Face::Front),
            CullFace::Back => Some(wgpu::Face::Back),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blend {
    #[default]
    Opaque,
    /// Straight alpha: `src·a + dst·(1 − a)`.
    Alpha,
}

impl Blend {
    pub fn state(self) -> wgpu::BlendState {
        match self {
            Blend::Opaque => wgpu::BlendState::REPLACE,
            Blend::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        }
    }
}

/// The part of the render state that is baked into a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub depth_func: DepthFunc,
    pub cull: CullFace,
    pub blend: Blend,
    pub depth_write: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            depth_func: DepthFunc::Less,
            cull: CullFace::None,
            blend: Blend::Opaque,
            depth_write: true,
        }
    }
}

impl RasterState {
    pub fn primitive(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: self.cull.face(),
            ..Default::default()
        }
    }

    pub fn depth_stencil(&self, format: wgpu::TextureFormat) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format,
            depth_write_enabled: self.depth_write,
            depth_compare: self.depth_func.compare(),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }

    pub fn color_target(&self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: Some(self.blend.state()),
            write_mask: wgpu::ColorWrites::ALL,
        }
    }
}

/// Pixel rectangle of the render target.  A zero-sized viewport stands for
/// "the whole target", whatever its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const FULL: Viewport = Viewport {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Viewport covering a `width × height` target from the origin.
    pub fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_full(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The concrete rectangle for a target of `target` size, clipped so it
    /// never extends past the target edges.
    pub fn resolve(&self, target: (u32, u32)) -> (u32, u32, u32, u32) {
        let (tw, th) = target;
        if self.is_full() {
            return (0, 0, tw, th);
        }
        let x = self.x.min(tw);
        let y = self.y.min(th);
        (x, y, self.width.min(tw - x), self.height.min(th - y))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderState {
    pub raster: RasterState,
    viewport: Viewport,
    slots: [Option<TextureHandle>; TEXTURE_SLOTS],
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn slot(&self, slot: usize) -> Option<TextureHandle> {
        self.slots.get(slot).copied().flatten()
    }

    /// Records `handle` in `slot`.  Out-of-range slots are ignored and
    /// return `false`.
    pub fn bind_texture(&mut self, slot: usize, handle: Option<TextureHandle>) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) => {
                *entry = handle;
                true
            }
            None => {
                log::warn!("texture slot {slot} out of range (max {TEXTURE_SLOTS})");
                false
            }
        }
    }

    pub fn unbind_all(&mut self) {
        self.slots = [None; TEXTURE_SLOTS];
    }

    /// Number of slots that currently hold a texture.
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

/// Anything that owns or borrows a [`RenderState`] and can therefore be
/// wrapped in a [`StateScope`].
pub trait TrackedState {
    fn render_state(&mut self) -> &mut RenderState;
}

impl TrackedState for RenderState {
    fn render_state(&mut self) -> &mut RenderState {
        self
    }
}

/// Guard that restores the raster state and viewport of `T` when dropped.
///
/// ```ignore
/// let mut scope = StateScope::new(frame);
/// scope.render_state().raster.depth_func = DepthFunc::LessEqual;
/// scope.draw_mesh(..);
/// // previous depth function is back here
/// ```
pub struct StateScope<'s, T: TrackedState + ?Sized> {
    target: &'s mut T,
    raster: RasterState,
    viewport: Viewport,
}

impl<'s, T: TrackedState + ?Sized> StateScope<'s, T> {
    pub fn new(target: &'s mut T) -> Self {
        let state = target.render_state();
        let raster = state.raster;
        let viewport = state.viewport;
        Self {
            target,
            raster,
            viewport,
        }
    }

    /// Restore the viewport to `viewport` instead of the saved one.
    pub fn restore_viewport_to(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Raster state that will be written back on drop.
    pub fn saved_raster(&self) -> RasterState {
        self.raster
    }
}

impl<T: TrackedState + ?Sized> Deref for StateScope<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: TrackedState + ?Sized> DerefMut for StateScope<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: TrackedState + ?Sized> Drop for StateScope<'_, T> {
    fn drop(&mut self) {
        let state = self.target.render_state();
        state.raster = self.raster;
        state.viewport = self.viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_plain_depth_tested_pass() {
        let raster = RasterState::default();
        assert_eq!(raster.depth_func, DepthFunc::Less);
        assert_eq!(raster.cull, CullFace::None);
        assert_eq!(raster.blend, Blend::Opaque);
        assert!(raster.depth_write);
        assert!(RenderState::new().viewport().is_full());
    }

    #[test]
    fn scope_restores_raster_state() {
        let mut state = RenderState::new();
        {
            let mut scope = StateScope::new(&mut state);
            scope.raster.depth_func = DepthFunc::LessEqual;
            scope.raster.cull = CullFace::Front;
            assert_eq!(scope.raster.cull, CullFace::Front);
        }
        assert_eq!(state.raster, RasterState::default());
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let mut state = RenderState::new();
        {
            let mut outer = StateScope::new(&mut state);
            outer.raster.blend = Blend::Alpha;
            {
                let mut inner = StateScope::new(&mut *outer);
                inner.raster.depth_write = false;
                inner.raster.blend = Blend::Opaque;
            }
            assert_eq!(outer.raster.blend, Blend::Alpha);
            assert!(outer.raster.depth_write);
        }
        assert_eq!(state.raster.blend, Blend::Opaque);
    }

    #[test]
    fn scope_restores_viewport_to_requested_value() {
        let mut state = RenderState::new();
        state.set_viewport(Viewport::sized(800, 600));
        let restore = Viewport::sized(1024, 768);
        {
            let mut scope = StateScope::new(&mut state);
            scope.set_viewport(Viewport::sized(64, 64));
            scope.restore_viewport_to(restore);
        }
        assert_eq!(state.viewport(), restore);
    }

    #[test]
    fn texture_slots_do_not_survive_unbind_all() {
        let mut state = RenderState::new();
        let handle = TextureHandle::next();
        assert!(state.bind_texture(3, Some(handle)));
        assert!(!state.bind_texture(TEXTURE_SLOTS, Some(handle)));
        assert_eq!(state.slot(3), Some(handle));
        assert_eq!(state.bound_count(), 1);
        state.unbind_all();
        assert_eq!(state.bound_count(), 0);
    }

    #[test]
    fn viewport_resolution_clips_to_target() {
        assert_eq!(Viewport::FULL.resolve((640, 480)), (0, 0, 640, 480));
        assert_eq!(Viewport::new(600, 0, 100, 100).resolve((640, 480)), (600, 0, 40, 100));
        assert_eq!(Viewport::sized(64, 64).resolve((640, 480)), (0, 0, 64, 64));
    }
}
