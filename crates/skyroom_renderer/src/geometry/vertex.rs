//! GPU vertex type shared by the room mesh and the sky/capture cube.
//!
//! Position and vertex color are contiguous `vec3<f32>` fields so that
//! `bytemuck` can reinterpret a slice as bytes.  There are no normals or UVs:
//! the fragment stages derive both from the interpolated world position.
//! The matching WGSL attribute locations live in `assets/shaders/*.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Linear RGB vertex color.  The room shader also reads it as a material
    /// tag (glass, painting canvases).
    pub color: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        // @location(0) position
        0 => Float32x3,
        // @location(1) color
        1 => Float32x3,
    ];

    #[inline]
    pub fn new(position: glam::Vec3, color: glam::Vec3) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }

    #[inline]
    pub fn pos(&self) -> glam::Vec3 {
        glam::Vec3::from_array(self.position)
    }

    /// Returns the `VertexBufferLayout` matching this struct's memory layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
