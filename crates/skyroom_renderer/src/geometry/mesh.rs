//! CPU-side geometry and its GPU-resident counterpart.
//!
//! Builders (the cube primitive, the room) produce [`MeshData`]; uploading it
//! yields a [`Mesh`].  A `Mesh` is the single owner of its buffers: it is not
//! `Clone`, moves transfer ownership, and dropping it destroys the buffers
//! exactly once.
use crate::geometry::Vertex;
use crate::resources::buffer;

/// Vertices plus an optional `u32` index list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    /// Empty means the mesh is drawn non-indexed.
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Appends the quad `a, b, c, d` as triangles `(a, b, c)` and `(a, c, d)`.
    /// Each quad gets its own four vertices; nothing is shared across quads.
    pub fn push_quad(&mut self, corners: [glam::Vec3; 4], color: glam::Vec3) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|&p| Vertex::new(p, color)));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Triangles as vertex triples, following the index list when present.
    pub fn triangles(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        let count = if self.indices.is_empty() {
            self.vertices.len() / 3
        } else {
            self.indices.len() / 3
        };
        (0..count).map(move |t| {
            let idx = |k: usize| {
                if self.indices.is_empty() {
                    t * 3 + k
                } else {
                    self.indices[t * 3 + k] as usize
                }
            };
            [self.vertices[idx(0)], self.vertices[idx(1)], self.vertices[idx(2)]]
        })
    }
}

pub struct Mesh {
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
    indexed: bool,
}

impl Mesh {
    /// Uploads `data`.  Indexed when `data.indices` is non-empty.
    ///
    /// An empty `data` creates no GPU buffers; the resulting mesh reports
    /// `is_uploaded() == false` and drawing it is a no-op.
    pub fn new(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        if data.vertices.is_empty() {
            return Self::empty();
        }
        let indexed = !data.indices.is_empty();
        Self {
            vertex_buffer: Some(buffer::create_vertex(device, &format!("{label} VB"), &data.vertices)),
            index_buffer: indexed
                .then(|| buffer::create_index(device, &format!("{label} IB"), &data.indices)),
            vertex_count: data.vertices.len() as u32,
            index_count: if indexed { data.indices.len() as u32 } else { 0 },
            indexed,
        }
    }

    /// Non-indexed mesh: every three vertices form a triangle.
    pub fn from_vertices(device: &wgpu::Device, label: &str, vertices: &[Vertex]) -> Self {
        Self::new(
            device,
            label,
            &MeshData {
                vertices: vertices.to_vec(),
                indices: Vec::new(),
            },
        )
    }

    /// A mesh with no GPU storage.
    pub fn empty() -> Self {
        Self {
            vertex_buffer: None,
            index_buffer: None,
            vertex_count: 0,
            index_count: 0,
            indexed: false,
        }
    }

    /// True when GPU buffers exist (the "non-zero handle" check).
    #[inline]
    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some()
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Only meaningful when [`is_indexed`](Self::is_indexed) is true.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Records the draw into `pass`.  Returns `false` (and records nothing)
    /// when the mesh has no buffers.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(vb) = &self.vertex_buffer else {
            return false;
        };
        pass.set_vertex_buffer(0, vb.slice(..));
        match (&self.index_buffer, self.indexed) {
            (Some(ib), true) => {
                pass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
            _ => pass.draw(0..self.vertex_count, 0..1),
        }
        true
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if let Some(vb) = self.vertex_buffer.take() {
            vb.destroy();
        }
        if let Some(ib) = self.index_buffer.take() {
            ib.destroy();
        }
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("uploaded", &self.is_uploaded())
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .field("indexed", &self.indexed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    #[test]
    fn push_quad_emits_two_triangles_with_fresh_vertices() {
        let mut data = MeshData::new();
        let quad = [Vec3::ZERO, Vec3::X, Vec3::X + Vec3::Y, Vec3::Y];
        data.push_quad(quad, Vec3::ONE);
        data.push_quad(quad, Vec3::ONE);

        assert_eq!(data.vertices.len(), 8);
        assert_eq!(&data.indices[..6], &[0, 1, 2, 0, 2, 3]);
        assert_eq!(&data.indices[6..], &[4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn triangles_follow_indices_or_vertex_order() {
        let mut indexed = MeshData::new();
        indexed.push_quad([Vec3::ZERO, Vec3::X, Vec3::ONE, Vec3::Y], Vec3::ZERO);
        let tris: Vec<_> = indexed.triangles().collect();
        assert_eq!(tris.len(), 2);
        assert_eq!(tris[1][2].pos(), Vec3::Y);

        let plain = MeshData {
            vertices: indexed.vertices[..3].to_vec(),
            indices: Vec::new(),
        };
        assert_eq!(plain.triangles().count(), 1);
    }

    #[test]
    fn empty_mesh_has_no_storage() {
        let mesh = Mesh::empty();
        assert!(!mesh.is_uploaded());
        assert!(!mesh.is_indexed());
        assert_eq!(mesh.vertex_count(), 0);
    }
}
