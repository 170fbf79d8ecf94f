//! Axis-aligned cube centred at the origin.
//!
//! Used both as the capture geometry for the equirect projection and as the
//! sky box.  Each face has its own four vertices and a distinct color so the
//! cube is recognisable when drawn on its own; 24 vertices and 36 indices in
//! total, wound counter-clockwise when seen from outside.
use glam::Vec3;

use crate::geometry::{Mesh, MeshData, Vertex};

/// Cube with edge length `size`.
pub fn cube_data(size: f32) -> MeshData {
    let h = size * 0.5;
    let v = |x: f32, y: f32, z: f32, col: Vec3| Vertex::new(Vec3::new(x, y, z) * h, col);

    const RED: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    const GREEN: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    const BLUE: Vec3 = Vec3::new(0.0, 0.0, 1.0);
    const YELLOW: Vec3 = Vec3::new(1.0, 1.0, 0.0);
    const MAGENTA: Vec3 = Vec3::new(1.0, 0.0, 1.0);
    const CYAN: Vec3 = Vec3::new(0.0, 1.0, 1.0);

    #[rustfmt::skip]
    let vertices = vec![
        // front  (z+)
        v(-1.0, -1.0,  1.0, RED),     v( 1.0, -1.0,  1.0, RED),
        v( 1.0,  1.0,  1.0, RED),     v(-1.0,  1.0,  1.0, RED),
        // back   (z-)
        v(-1.0, -1.0, -1.0, GREEN),   v( 1.0, -1.0, -1.0, GREEN),
        v( 1.0,  1.0, -1.0, GREEN),   v(-1.0,  1.0, -1.0, GREEN),
        // left   (x-)
        v(-1.0, -1.0, -1.0, BLUE),    v(-1.0, -1.0,  1.0, BLUE),
        v(-1.0,  1.0,  1.0, BLUE),    v(-1.0,  1.0, -1.0, BLUE),
        // right  (x+)
        v( 1.0, -1.0, -1.0, YELLOW),  v( 1.0, -1.0,  1.0, YELLOW),
        v( 1.0,  1.0,  1.0, YELLOW),  v( 1.0,  1.0, -1.0, YELLOW),
        // top    (y+)
        v(-1.0,  1.0, -1.0, MAGENTA), v(-1.0,  1.0,  1.0, MAGENTA),
        v( 1.0,  1.0,  1.0, MAGENTA), v( 1.0,  1.0, -1.0, MAGENTA),
        // bottom (y-)
        v(-1.0, -1.0, -1.0, CYAN),    v(-1.0, -1.0,  1.0, CYAN),
        v( 1.0, -1.0,  1.0, CYAN),    v( 1.0, -1.0, -1.0, CYAN),
    ];

    #[rustfmt::skip]
    let indices = vec![
        0,  1,  2,  2,  3,  0,  // front
        4,  6,  5,  4,  7,  6,  // back
        8,  9,  10, 8,  10, 11, // left
        12, 14, 13, 12, 15, 14, // right
        16, 17, 18, 16, 18, 19, // top
        20, 22, 21, 20, 23, 22, // bottom
    ];

    MeshData { vertices, indices }
}

/// Uploads [`cube_data`] as an indexed mesh.
pub fn cube(device: &wgpu::Device, size: f32) -> Mesh {
    Mesh::new(device, "Cube", &cube_data(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_extent() {
        let data = cube_data(2.0);
        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
        for v in &data.vertices {
            assert!(v.position.iter().all(|c| c.abs() == 1.0));
        }
    }

    #[test]
    fn triangles_face_outwards() {
        for [a, b, c] in cube_data(1.0).triangles() {
            let (a, b, c) = (a.pos(), b.pos(), c.pos());
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0, "inward triangle at {centroid:?}");
        }
    }
}
