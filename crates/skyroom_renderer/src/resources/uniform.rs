//! A uniform buffer holding `N` copies of one `Pod` struct, addressed with a
//! dynamic offset.
//!
//! The cubemap projector stores one view-projection matrix per cube face in
//! a single buffer and binds it once per face pass with that face's offset,
//! instead of creating six buffers and six bind groups.
//!
//! wgpu requires each dynamic offset to be a multiple of
//! `min_uniform_buffer_offset_alignment` (typically 256 bytes on desktop, 64
//! on some mobile GPUs), so every slot is padded up to that stride.
use std::marker::PhantomData;

pub struct DynamicUniformBuffer<T> {
    pub buffer: wgpu::Buffer,
    /// Byte distance between consecutive slots.
    pub stride: u32,
    slots: usize,
    _marker: PhantomData<T>,
}

impl<T: bytemuck::Pod> DynamicUniformBuffer<T> {
    pub fn new(device: &wgpu::Device, label: &str, slots: usize) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let stride = align_up(std::mem::size_of::<T>() as u32, alignment);
        let slots = slots.max(1);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: slots as u64 * stride as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            stride,
            slots,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots == 0
    }

    /// Byte offset of slot `index`, as passed to `set_bind_group`.
    #[inline]
    pub fn offset(&self, index: usize) -> u32 {
        index as u32 * self.stride
    }

    /// Writes `value` into slot `index`.
    #[inline]
    pub fn write(&self, queue: &wgpu::Queue, index: usize, value: &T) {
        debug_assert!(index < self.slots, "DynamicUniformBuffer slot out of range");
        queue.write_buffer(&self.buffer, self.offset(index) as u64, bytemuck::bytes_of(value));
    }

    /// The binding a shader sees: one slot, moved by the dynamic offset.
    pub fn binding(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
        })
    }

    /// Layout entry matching [`binding`](Self::binding).
    pub fn layout_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
        wgpu::BindGroupLayoutEntry {
            binding,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two).
#[inline]
pub(crate) fn align_up(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) & !(alignment - 1)
}
