use std::ops::{Deref, DerefMut};

/// Write-only mapping of a small per-frame buffer holding `N` floats.
///
/// Mapping discards the previous contents: the view starts zeroed and is never filled
/// from the GPU. The values reach the buffer on [`unmap`](Self::unmap), or when the
/// view is dropped, and are visible to draws submitted after that point.
pub struct ScopedWrite<'a, const N: usize> {
    queue: &'a wgpu::Queue,
    buffer: &'a wgpu::Buffer,
    values: [f32; N],
}

impl<'a, const N: usize> ScopedWrite<'a, N> {
    pub(crate) fn new(queue: &'a wgpu::Queue, buffer: &'a wgpu::Buffer) -> Self {
        debug_assert!(buffer.size() >= std::mem::size_of::<[f32; N]>() as u64);
        Self {
            queue,
            buffer,
            values: [0.0; N],
        }
    }

    /// Commits the written values to the buffer. Dropping the view does the same.
    pub fn unmap(self) {
        drop(self);
    }
}

impl<const N: usize> Deref for ScopedWrite<'_, N> {
    type Target = [f32; N];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl<const N: usize> DerefMut for ScopedWrite<'_, N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.values
    }
}

impl<const N: usize> Drop for ScopedWrite<'_, N> {
    fn drop(&mut self) {
        self.queue
            .write_buffer(self.buffer, 0, bytemuck::cast_slice(&self.values));
    }
}
