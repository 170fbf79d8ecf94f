use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Mat4, Vec3};
use skyroom_core::{Camera, GpuContext};

use crate::frame::Frame;
use crate::geometry::{room, Mesh, PaintingLayout};
use crate::pipeline;
use crate::render_target::DepthTarget;
use crate::resources::texture::{create_sampler, SamplerKind};
use crate::resources::{buffer, load_2d, Texture2D, TextureHandle};
use crate::shader::{builtin, ProgramDesc, ShaderError, ShaderProgram, ShaderSource};
use crate::state::{Blend, StateScope, TrackedState};

pub const SLOT_FLOOR: usize = 0;
pub const SLOT_WALL: usize = 1;
pub const SLOT_CEILING: usize = 2;
pub const SLOT_GLASS: usize = 3;
pub const SLOT_PAINTING1: usize = 4;
pub const SLOT_PAINTING2: usize = 5;

/// Alpha of the window glass.
pub const GLASS_OPACITY: f32 = 0.5;

/// Image files for each room surface.  `None` leaves the surface untextured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomTexturePaths {
    pub floor: Option<PathBuf>,
    pub wall: Option<PathBuf>,
    pub ceiling: Option<PathBuf>,
    pub glass: Option<PathBuf>,
    pub painting1: Option<PathBuf>,
    pub painting2: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RoomTextures {
    pub floor: Option<Texture2D>,
    pub wall: Option<Texture2D>,
    pub ceiling: Option<Texture2D>,
    pub glass: Option<Texture2D>,
    pub painting1: Option<Texture2D>,
    pub painting2: Option<Texture2D>,
}

impl RoomTextures {
    /// Loads every configured texture.  A file that fails to load is logged
    /// and leaves its slot empty.  The glass texture is only loaded when
    /// `glazed` is set, since a solid wall has no glass to put it on.
    pub fn load(ctx: &GpuContext, paths: &RoomTexturePaths, glazed: bool) -> Self {
        let load = |name: &str, path: &Option<PathBuf>| -> Option<Texture2D> {
            let path = path.as_deref()?;
            match load_2d(ctx, path, true) {
                Ok(texture) => Some(texture),
                Err(err) => {
                    log::warn!("Room {name} texture unavailable: {err}");
                    None
                }
            }
        };
        Self {
            floor: load("floor", &paths.floor),
            wall: load("wall", &paths.wall),
            ceiling: load("ceiling", &paths.ceiling),
            glass: if glazed { load("glass", &paths.glass) } else { None },
            painting1: load("painting 1", &paths.painting1),
            painting2: load("painting 2", &paths.painting2),
        }
    }

    /// Textures in slot order (`SLOT_FLOOR` .. `SLOT_PAINTING2`).
    pub fn slots(&self) -> [Option<&Texture2D>; 6] {
        [
            self.floor.as_ref(),
            self.wall.as_ref(),
            self.ceiling.as_ref(),
            self.glass.as_ref(),
            self.painting1.as_ref(),
            self.painting2.as_ref(),
        ]
    }

    pub fn presence(&self) -> [bool; 6] {
        self.slots().map(|t| t.is_some())
    }
}

/// Uniform block shared by both stages of `room.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RoomUniform {
    pub view_proj: [[f32; 4]; 4],
    pub room_center: [f32; 4],
    pub paint1_center: [f32; 4],
    pub paint2_center: [f32; 4],
    pub paint_sizes: [f32; 4],
    pub has_surface: [u32; 4],
    pub has_painting: [u32; 4],
    pub params: [f32; 4],
}

impl RoomUniform {
    /// Painting centres are stored relative to the room centre.
    pub fn new(view_proj: Mat4, layout: &PaintingLayout, presence: [bool; 6], opacity: f32) -> Self {
        let [p1, p2] = layout.paintings;
        let rel = |c: Vec3| (c - layout.room_center).extend(0.0).to_array();
        let flag = |slot: usize| u32::from(presence[slot]);
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            room_center: layout.room_center.extend(1.0).to_array(),
            paint1_center: rel(p1.center),
            paint2_center: rel(p2.center),
            paint_sizes: [p1.size.x, p1.size.y, p2.size.x, p2.size.y],
            has_surface: [flag(SLOT_FLOOR), flag(SLOT_WALL), flag(SLOT_CEILING), flag(SLOT_GLASS)],
            has_painting: [flag(SLOT_PAINTING1), flag(SLOT_PAINTING2), 0, 0],
            params: [opacity, 0.0, 0.0, 0.0],
        }
    }
}

/// Construction parameters for [`Room::new`].
#[derive(Debug, Clone, Copy)]
pub struct RoomDesc<'p> {
    /// Width (X), height (Y) and depth (Z).
    pub size: Vec3,
    pub cut_window: bool,
    pub color_format: wgpu::TextureFormat,
    /// Directory with a hot-reloadable `room.wgsl`.
    pub shader_dir: Option<&'p Path>,
}

/// The procedurally built room with its textures, ready to draw.
pub struct Room {
    opaque: Mesh,
    transparent: Mesh,
    layout: PaintingLayout,
    textures: RoomTextures,
    /// Bound in place of every missing texture.
    fallback: Texture2D,
    program: ShaderProgram,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Room {
    pub fn new(ctx: &GpuContext, desc: &RoomDesc<'_>, textures: RoomTextures) -> Result<Self, ShaderError> {
        let device = ctx.device.as_ref();
        let geometry = room::build(desc.size.x, desc.size.y, desc.size.z, desc.cut_window);
        let opaque = Mesh::new(device, "Room Opaque", &geometry.opaque);
        let transparent = Mesh::new(device, "Room Transparent", &geometry.transparent);
        log::info!(
            "Room {}x{}x{}: {} opaque / {} transparent vertices, south wall in {} quad(s)",
            desc.size.x,
            desc.size.y,
            desc.size.z,
            opaque.vertex_count(),
            transparent.vertex_count(),
            geometry.south_wall_quads
        );

        let visibility = wgpu::ShaderStages::FRAGMENT;
        let mut entries = vec![pipeline::uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )];
        entries.extend((1..=6).map(|b| pipeline::texture_entry(b, visibility, wgpu::TextureViewDimension::D2)));
        entries.push(pipeline::sampler_entry(7, visibility));
        entries.push(pipeline::sampler_entry(8, visibility));
        let layout = Arc::new(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Layout: Room"),
            entries: &entries,
        }));

        let program = ShaderProgram::new(
            device,
            ShaderSource::from_dir_or(desc.shader_dir, "room.wgsl", builtin::ROOM),
            ProgramDesc {
                label: "Room".to_owned(),
                color_format: desc.color_format,
                depth_format: Some(DepthTarget::FORMAT),
                bind_group_layouts: vec![layout.clone()],
            },
        )?;

        let fallback = Texture2D::solid(device, &ctx.queue, "Room Fallback", [255, 255, 255, 255]);
        let uniform = buffer::create_uniform(
            device,
            "Room Uniform",
            &RoomUniform::new(Mat4::IDENTITY, &geometry.layout, textures.presence(), GLASS_OPACITY),
        );
        let repeat = create_sampler(device, SamplerKind::Repeat);
        let clamp = create_sampler(device, SamplerKind::Clamp);

        let views = textures.slots().map(|t| &t.unwrap_or(&fallback).view);
        let mut group_entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform.as_entire_binding(),
        }];
        group_entries.extend(views.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
            binding: i as u32 + 1,
            resource: wgpu::BindingResource::TextureView(view),
        }));
        group_entries.push(wgpu::BindGroupEntry {
            binding: 7,
            resource: wgpu::BindingResource::Sampler(&repeat),
        });
        group_entries.push(wgpu::BindGroupEntry {
            binding: 8,
            resource: wgpu::BindingResource::Sampler(&clamp),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Room"),
            layout: &layout,
            entries: &group_entries,
        });

        Ok(Self {
            opaque,
            transparent,
            layout: geometry.layout,
            textures,
            fallback,
            program,
            uniform,
            bind_group,
        })
    }

    pub fn layout(&self) -> &PaintingLayout {
        &self.layout
    }

    pub fn textures(&self) -> &RoomTextures {
        &self.textures
    }

    pub fn opaque(&self) -> &Mesh {
        &self.opaque
    }

    pub fn transparent(&self) -> &Mesh {
        &self.transparent
    }

    /// Draws the opaque shell, then the glass when there is glass geometry
    /// and a glass texture.  All texture slots are unbound afterwards.
    pub fn draw(&mut self, frame: &mut Frame<'_>, camera: &Camera) {
        self.program.reload_if_changed(frame.device());

        let presence = self.textures.presence();
        let uniform = RoomUniform::new(camera.view_projection_matrix(), &self.layout, presence, GLASS_OPACITY);
        buffer::update_uniform(frame.queue(), &self.uniform, &uniform);

        let fallback = self.fallback.handle();
        let handles: [TextureHandle; 6] = self.textures.slots().map(|t| t.map_or(fallback, Texture2D::handle));
        for (slot, handle) in handles.into_iter().enumerate() {
            frame.bind_texture(slot, Some(handle));
        }

        frame.draw_mesh(&mut self.program, &self.opaque, &[(&self.bind_group, &[])]);

        if self.transparent.is_uploaded() && self.textures.glass.is_some() {
            let mut scope = StateScope::new(&mut *frame);
            let raster = &mut scope.render_state().raster;
            raster.blend = Blend::Alpha;
            raster.depth_write = false;
            scope.draw_mesh(&mut self.program, &self.transparent, &[(&self.bind_group, &[])]);
        }

        frame.unbind_all_textures();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::geometry::PaintingPlacement;

    fn layout() -> PaintingLayout {
        PaintingLayout {
            paintings: [
                PaintingPlacement {
                    center: Vec3::new(-2.5, 1.8, -4.99),
                    size: Vec2::new(1.2, 0.9),
                },
                PaintingPlacement {
                    center: Vec3::new(4.99, 1.65, 2.5),
                    size: Vec2::new(1.0, 0.7),
                },
            ],
            room_center: Vec3::new(0.0, 1.5, 0.0),
        }
    }

    #[test]
    fn uniform_matches_wgsl_block_size() {
        assert_eq!(std::mem::size_of::<RoomUniform>(), 176);
    }

    #[test]
    fn painting_centres_are_relative_to_room_centre() {
        let u = RoomUniform::new(Mat4::IDENTITY, &layout(), [false; 6], GLASS_OPACITY);
        assert_eq!(u.room_center, [0.0, 1.5, 0.0, 1.0]);
        assert!(Vec3::from_slice(&u.paint1_center[..3]).abs_diff_eq(Vec3::new(-2.5, 0.3, -4.99), 1e-6));
        assert!(Vec3::from_slice(&u.paint2_center[..3]).abs_diff_eq(Vec3::new(4.99, 0.15, 2.5), 1e-6));
        assert_eq!(u.paint_sizes, [1.2, 0.9, 1.0, 0.7]);
        assert_eq!(u.params[0], 0.5);
    }

    #[test]
    fn presence_flags_follow_slot_assignment() {
        let mut presence = [false; 6];
        presence[SLOT_WALL] = true;
        presence[SLOT_GLASS] = true;
        presence[SLOT_PAINTING2] = true;
        let u = RoomUniform::new(Mat4::IDENTITY, &layout(), presence, GLASS_OPACITY);
        assert_eq!(u.has_surface, [0, 1, 0, 1]);
        assert_eq!(u.has_painting, [0, 1, 0, 0]);
    }

    #[test]
    fn default_textures_are_all_absent() {
        let paths = RoomTexturePaths::default();
        assert!(paths.floor.is_none() && paths.painting2.is_none());
        assert_eq!(RoomTextures::default().presence(), [false; 6]);
    }
}
