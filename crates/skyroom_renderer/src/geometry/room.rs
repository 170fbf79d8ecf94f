//! Procedural room geometry.
//!
//! The room is an axis-aligned box centred on the origin in X/Z with the
//! floor at `y = 0` and the ceiling at `y = height`.  The south wall
//! (`z = +depth/2`) can have a rectangular window cut into it; the hole is
//! produced by emitting up to four solid strips around it rather than by any
//! boolean mesh operation.  Two framed paintings are inset into the north and
//! east walls.
//!
//! Every quad is wound counter-clockwise as seen from inside the room, so
//! all face normals point inwards.  Geometry is split into an opaque mesh and
//! a transparent one that only ever holds the window glass.
//!
//! Vertex colors double as material tags for the room shader: the glass and
//! the two painting canvases use the marker colors below.

use glam::{Vec2, Vec3};

use crate::geometry::MeshData;

pub const FLOOR_COLOR: Vec3 = Vec3::new(0.8, 0.8, 0.8);
pub const CEILING_COLOR: Vec3 = Vec3::new(0.7, 0.7, 0.9);
pub const NORTH_COLOR: Vec3 = Vec3::new(0.9, 0.7, 0.7);
pub const SOUTH_COLOR: Vec3 = Vec3::new(0.7, 0.9, 0.7);
pub const WEST_COLOR: Vec3 = Vec3::new(0.7, 0.7, 0.9);
pub const EAST_COLOR: Vec3 = Vec3::new(0.9, 0.9, 0.7);
pub const GLASS_COLOR: Vec3 = Vec3::new(0.6, 0.8, 1.0);
pub const PAINTING1_MARKER: Vec3 = Vec3::new(0.2, 0.0, 0.0);
pub const PAINTING2_MARKER: Vec3 = Vec3::new(0.0, 0.2, 0.0);
pub const FRAME_COLOR: Vec3 = Vec3::new(0.35, 0.22, 0.12);
pub const MAT_COLOR: Vec3 = Vec3::new(0.92, 0.9, 0.85);

/// Margin keeping the window away from the wall edges.
const OPENING_EPS: f32 = 1e-4;
/// How far the glass pane sits inside the wall plane.
const GLASS_INSET: f32 = 0.01;

/// Painting layers, back to front: (border around the canvas, inset).
const FRAME_LAYER: (f32, f32) = (0.08, 0.004);
const MAT_LAYER: (f32, f32) = (0.04, 0.007);
const CANVAS_INSET: f32 = 0.01;
/// Largest share of the free wall space around a painting centre that its
/// frame may cover.
const PAINTING_MAX_FILL: f32 = 0.8;

/// What to do with the window in the south wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowOpening {
    /// No opening; the wall is one quad.
    #[default]
    Solid,
    /// A hole with nothing in it.
    Open,
    /// A hole with a glass pane in the transparent mesh.
    Glazed,
}

impl WindowOpening {
    pub fn from_cut_window(cut_window: bool) -> Self {
        if cut_window {
            Self::Glazed
        } else {
            Self::Solid
        }
    }
}

/// Where a painting's canvas ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintingPlacement {
    /// Canvas centre in world space.
    pub center: Vec3,
    /// Canvas width and height in the wall plane.  For the east wall the
    /// width runs along Z.
    pub size: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintingLayout {
    /// `[north wall painting, east wall painting]`.
    pub paintings: [PaintingPlacement; 2],
    /// `(0, height / 2, 0)`; the shader works relative to this point.
    pub room_center: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomGeometry {
    pub opaque: MeshData,
    pub transparent: MeshData,
    pub layout: PaintingLayout,
    /// Quads the south wall was split into (1 when solid, up to 4 strips).
    pub south_wall_quads: usize,
}

/// Builds the room with either no window (`cut_window == false`) or a glazed
/// window.
pub fn build(width: f32, height: f32, depth: f32, cut_window: bool) -> RoomGeometry {
    build_with_opening(width, height, depth, WindowOpening::from_cut_window(cut_window))
}

pub fn build_with_opening(
    width: f32,
    height: f32,
    depth: f32,
    opening: WindowOpening,
) -> RoomGeometry {
    let room = Extents {
        hx: width * 0.5,
        hz: depth * 0.5,
        height,
    };
    let mut opaque = MeshData::new();
    let mut transparent = MeshData::new();

    room.push_rect(&mut opaque, Wall::Floor, room.bounds(Wall::Floor), 0.0, FLOOR_COLOR);
    room.push_rect(&mut opaque, Wall::Ceiling, room.bounds(Wall::Ceiling), 0.0, CEILING_COLOR);
    room.push_rect(&mut opaque, Wall::North, room.bounds(Wall::North), 0.0, NORTH_COLOR);

    let south_wall_quads = match opening {
        WindowOpening::Solid => {
            room.push_rect(&mut opaque, Wall::South, room.bounds(Wall::South), 0.0, SOUTH_COLOR);
            1
        }
        WindowOpening::Open | WindowOpening::Glazed => {
            room.push_south_wall_with_window(&mut opaque, &mut transparent, opening == WindowOpening::Glazed)
        }
    };

    room.push_rect(&mut opaque, Wall::West, room.bounds(Wall::West), 0.0, WEST_COLOR);
    room.push_rect(&mut opaque, Wall::East, room.bounds(Wall::East), 0.0, EAST_COLOR);

    let painting1 = room.push_painting(
        &mut opaque,
        Wall::North,
        Vec2::new(-room.hx * 0.5, height * 0.6),
        Vec2::new(1.2, 0.9),
        PAINTING1_MARKER,
    );
    let painting2 = room.push_painting(
        &mut opaque,
        Wall::East,
        Vec2::new(room.hz * 0.5, height * 0.55),
        Vec2::new(1.0, 0.7),
        PAINTING2_MARKER,
    );

    RoomGeometry {
        opaque,
        transparent,
        layout: PaintingLayout {
            paintings: [painting1, painting2],
            room_center: Vec3::new(0.0, height * 0.5, 0.0),
        },
        south_wall_quads,
    }
}

/// A rectangle in a wall's plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    u0: f32,
    u1: f32,
    v0: f32,
    v1: f32,
}

impl Rect {
    fn centered(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            u0: center.x - half.x,
            u1: center.x + half.x,
            v0: center.y - half.y,
            v1: center.y + half.y,
        }
    }
}

/// The six room surfaces.  Each has a 2D plane parametrisation `(u, v)`:
///
/// | wall    | plane   | u | v | inward normal |
/// |---------|---------|---|---|---------------|
/// | floor   | y = 0   | x | z | +Y |
/// | ceiling | y = h   | x | z | −Y |
/// | north   | z = −hz | x | y | +Z |
/// | south   | z = +hz | x | y | −Z |
/// | west    | x = −hx | z | y | +X |
/// | east    | x = +hx | z | y | −X |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wall {
    Floor,
    Ceiling,
    North,
    South,
    West,
    East,
}

impl Wall {
    fn inward_normal(self) -> Vec3 {
        match self {
            Wall::Floor => Vec3::Y,
            Wall::Ceiling => Vec3::NEG_Y,
            Wall::North => Vec3::Z,
            Wall::South => Vec3::NEG_Z,
            Wall::West => Vec3::X,
            Wall::East => Vec3::NEG_X,
        }
    }

    /// Walls whose `(u, v)` basis is left-handed when viewed from inside.
    /// Their quads are emitted in mirrored order to stay counter-clockwise.
    fn mirrored(self) -> bool {
        matches!(self, Wall::Floor | Wall::South | Wall::West)
    }
}

struct Extents {
    hx: f32,
    hz: f32,
    height: f32,
}

impl Extents {
    fn bounds(&self, wall: Wall) -> Rect {
        let (hx, hz, h) = (self.hx, self.hz, self.height);
        match wall {
            Wall::Floor | Wall::Ceiling => Rect { u0: -hx, u1: hx, v0: -hz, v1: hz },
            Wall::North | Wall::South => Rect { u0: -hx, u1: hx, v0: 0.0, v1: h },
            Wall::West | Wall::East => Rect { u0: -hz, u1: hz, v0: 0.0, v1: h },
        }
    }

    /// Maps plane coordinates to world space, `inset` units along the
    /// inward normal.
    fn point(&self, wall: Wall, u: f32, v: f32, inset: f32) -> Vec3 {
        let on_plane = match wall {
            Wall::Floor => Vec3::new(u, 0.0, v),
            Wall::Ceiling => Vec3::new(u, self.height, v),
            Wall::North => Vec3::new(u, v, -self.hz),
            Wall::South => Vec3::new(u, v, self.hz),
            Wall::West => Vec3::new(-self.hx, v, u),
            Wall::East => Vec3::new(self.hx, v, u),
        };
        on_plane + wall.inward_normal() * inset
    }

    fn push_rect(&self, mesh: &mut MeshData, wall: Wall, r: Rect, inset: f32, color: Vec3) {
        let a = self.point(wall, r.u0, r.v0, inset);
        let b = self.point(wall, r.u1, r.v0, inset);
        let c = self.point(wall, r.u1, r.v1, inset);
        let d = self.point(wall, r.u0, r.v1, inset);
        let corners = if wall.mirrored() { [b, a, d, c] } else { [a, b, c, d] };
        mesh.push_quad(corners, color);
    }

    /// Emits the south wall around a window opening.  Returns the number of
    /// opaque quads used for the wall.
    fn push_south_wall_with_window(
        &self,
        opaque: &mut MeshData,
        transparent: &mut MeshData,
        glazed: bool,
    ) -> usize {
        let wall = self.bounds(Wall::South);
        let Some(win) = window_opening(wall, self.height, 2.0 * self.hx) else {
            self.push_rect(opaque, Wall::South, wall, 0.0, SOUTH_COLOR);
            return 1;
        };

        let strips = [
            // left
            (win.u0 > wall.u0 + OPENING_EPS).then_some(Rect { u1: win.u0, ..wall }),
            // right
            (win.u1 < wall.u1 - OPENING_EPS).then_some(Rect { u0: win.u1, ..wall }),
            // bottom
            (win.v0 > wall.v0 + OPENING_EPS).then_some(Rect { u0: win.u0, u1: win.u1, v1: win.v0, ..wall }),
            // top
            (win.v1 < wall.v1 - OPENING_EPS).then_some(Rect { u0: win.u0, u1: win.u1, v0: win.v1, ..wall }),
        ];
        let mut emitted = 0;
        for strip in strips.into_iter().flatten() {
            self.push_rect(opaque, Wall::South, strip, 0.0, SOUTH_COLOR);
            emitted += 1;
        }

        if glazed {
            self.push_rect(transparent, Wall::South, win, GLASS_INSET, GLASS_COLOR);
        }
        emitted
    }

    /// Frame, mat and canvas quads layered towards the room interior.  The
    /// whole frame is scaled down when it would not fit around `center`.
    fn push_painting(
        &self,
        mesh: &mut MeshData,
        wall: Wall,
        center: Vec2,
        canvas: Vec2,
        marker: Vec3,
    ) -> PaintingPlacement {
        let bounds = self.bounds(wall);
        let outer = canvas + Vec2::splat(2.0 * FRAME_LAYER.0);
        let free = Vec2::new(
            (center.x - bounds.u0).min(bounds.u1 - center.x),
            (center.y - bounds.v0).min(bounds.v1 - center.y),
        );
        let scale = (free * 2.0 * PAINTING_MAX_FILL / outer).min(Vec2::ONE);

        let canvas = canvas * scale;
        for (border, inset, color) in [
            (FRAME_LAYER.0, FRAME_LAYER.1, FRAME_COLOR),
            (MAT_LAYER.0, MAT_LAYER.1, MAT_COLOR),
        ] {
            let size = canvas + Vec2::splat(2.0 * border) * scale;
            self.push_rect(mesh, wall, Rect::centered(center, size), inset, color);
        }
        self.push_rect(mesh, wall, Rect::centered(center, canvas), CANVAS_INSET, marker);

        PaintingPlacement {
            center: self.point(wall, center.x, center.y, CANVAS_INSET),
            size: canvas,
        }
    }
}

/// The window rectangle in south-wall coordinates, or `None` when clamping
/// it into the wall leaves no area.
fn window_opening(wall: Rect, height: f32, width: f32) -> Option<Rect> {
    let win = Rect::centered(Vec2::new(0.0, height * 0.55), Vec2::new(width * 0.35, height * 0.35));
    // not f32::clamp: the bounds cross on walls thinner than 2 * eps
    let clamp = |x: f32, lo: f32, hi: f32| x.max(lo).min(hi);
    let (lo_u, hi_u) = (wall.u0 + OPENING_EPS, wall.u1 - OPENING_EPS);
    let (lo_v, hi_v) = (wall.v0 + OPENING_EPS, wall.v1 - OPENING_EPS);
    let win = Rect {
        u0: clamp(win.u0, lo_u, hi_u),
        u1: clamp(win.u1, lo_u, hi_u),
        v0: clamp(win.v0, lo_v, hi_v),
        v1: clamp(win.v1, lo_v, hi_v),
    };
    if win.u1 <= win.u0 + OPENING_EPS || win.v1 <= win.v0 + OPENING_EPS {
        None
    } else {
        Some(win)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn assert_faces_inward(geometry: &RoomGeometry) {
        let center = Vec3::new(0.0, geometry.layout.room_center.y, 0.0);
        for mesh in [&geometry.opaque, &geometry.transparent] {
            for [a, b, c] in mesh.triangles() {
                let (a, b, c) = (a.pos(), b.pos(), c.pos());
                let normal = (b - a).cross(c - a);
                let centroid = (a + b + c) / 3.0;
                assert!(
                    normal.dot(center - centroid) > 0.0,
                    "triangle at {centroid:?} faces outwards"
                );
            }
        }
    }

    #[test]
    fn solid_room_has_six_walls_and_two_framed_paintings() {
        let room = build(10.0, 3.0, 10.0, false);
        assert_eq!(room.opaque.vertices.len(), 48);
        assert_eq!(room.opaque.indices.len(), 72);
        assert!(room.transparent.is_empty());
        assert!(room.transparent.indices.is_empty());
        assert_eq!(room.south_wall_quads, 1);
    }

    #[test]
    fn window_room_has_one_glass_quad() {
        let room = build(10.0, 3.0, 10.0, true);
        assert_eq!(room.transparent.vertices.len(), 4);
        assert_eq!(room.transparent.indices.len(), 6);
        assert_eq!(room.south_wall_quads, 4);
        // five walls, four strips, six painting layers
        assert_eq!(room.opaque.vertices.len(), (5 + 4 + 6) * 4);
        assert!(room
            .transparent
            .vertices
            .iter()
            .all(|v| v.color == GLASS_COLOR.to_array() && (v.position[2] - 4.99).abs() < 1e-5));
    }

    #[test]
    fn window_opening_matches_default_sizing() {
        let room = build(10.0, 3.0, 10.0, true);
        let xs: Vec<f32> = room.transparent.vertices.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = room.transparent.vertices.iter().map(|v| v.position[1]).collect();
        let min = |s: &[f32]| s.iter().copied().fold(f32::INFINITY, f32::min);
        let max = |s: &[f32]| s.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!((min(&xs) + 1.75).abs() < 1e-5);
        assert!((max(&xs) - 1.75).abs() < 1e-5);
        assert!((min(&ys) - (1.65 - 0.525)).abs() < 1e-5);
        assert!((max(&ys) - (1.65 + 0.525)).abs() < 1e-5);
    }

    #[test]
    fn open_window_cuts_the_hole_without_glass() {
        let room = build_with_opening(10.0, 3.0, 10.0, WindowOpening::Open);
        assert!(room.transparent.is_empty());
        assert_eq!(room.south_wall_quads, 4);
    }

    #[test]
    fn degenerate_opening_falls_back_to_a_solid_wall() {
        let room = build_with_opening(1e-4, 3.0, 10.0, WindowOpening::Glazed);
        assert_eq!(room.south_wall_quads, 1);
        assert!(room.transparent.is_empty());
        assert_eq!(room.opaque.vertices.len(), 48);
    }

    #[test]
    fn painting_layout_matches_the_canvas_quads() {
        let room = build(10.0, 3.0, 10.0, false);
        let [p1, p2] = room.layout.paintings;
        assert!(p1.center.abs_diff_eq(Vec3::new(-2.5, 1.8, -4.99), 1e-5));
        assert!(p1.size.abs_diff_eq(Vec2::new(1.2, 0.9), 1e-6));
        assert!(p2.center.abs_diff_eq(Vec3::new(4.99, 1.65, 2.5), 1e-5));
        assert!(p2.size.abs_diff_eq(Vec2::new(1.0, 0.7), 1e-6));
        assert!(room.layout.room_center.abs_diff_eq(Vec3::new(0.0, 1.5, 0.0), 1e-6));

        let canvas: Vec<Vec3> = room
            .opaque
            .vertices
            .iter()
            .filter(|v| v.color == PAINTING1_MARKER.to_array())
            .map(|v| v.pos())
            .collect();
        assert_eq!(canvas.len(), 4);
        let mid = canvas.iter().copied().sum::<Vec3>() / 4.0;
        assert!(mid.abs_diff_eq(p1.center, 1e-5));
    }

    #[test]
    fn paintings_shrink_to_fit_small_rooms() {
        let room = build(1.0, 1.0, 1.0, false);
        for p in room.layout.paintings {
            assert!(p.size.x > 0.0 && p.size.y > 0.0);
            assert!(p.size.x < 0.5 && p.size.y < 0.8);
        }
        assert_faces_inward(&room);
    }

    #[test]
    fn walls_face_inward() {
        assert_faces_inward(&build(10.0, 3.0, 10.0, true));
        assert_faces_inward(&build(4.0, 2.5, 7.0, false));
    }

    proptest! {
        #[test]
        fn counts_hold_for_any_positive_room(
            width in 0.1f32..100.0,
            height in 0.1f32..100.0,
            depth in 0.1f32..100.0,
        ) {
            let solid = build(width, height, depth, false);
            prop_assert_eq!(solid.opaque.vertices.len(), 48);
            prop_assert_eq!(solid.opaque.indices.len(), 72);
            prop_assert!(solid.transparent.is_empty());

            let glazed = build(width, height, depth, true);
            prop_assert!((1..=4).contains(&glazed.south_wall_quads));
            prop_assert_eq!(glazed.transparent.vertices.len(), 4);
            prop_assert_eq!(glazed.transparent.indices.len(), 6);
            prop_assert_eq!(
                glazed.opaque.vertices.len(),
                (5 + glazed.south_wall_quads + 6) * 4
            );
        }

        #[test]
        fn geometry_is_finite_inward_and_repeatable(
            width in 0.1f32..50.0,
            height in 0.1f32..50.0,
            depth in 0.1f32..50.0,
            cut_window in any::<bool>(),
        ) {
            let room = build(width, height, depth, cut_window);
            prop_assert!(room
                .opaque
                .vertices
                .iter()
                .chain(&room.transparent.vertices)
                .all(|v| v.pos().is_finite()));
            for [a, b, c] in room.opaque.triangles() {
                let area = (b.pos() - a.pos()).cross(c.pos() - a.pos()).length();
                prop_assert!(area > 0.0);
            }
            assert_faces_inward(&room);
            prop_assert_eq!(&room, &build(width, height, depth, cut_window));
        }
    }
}
