use std::ops::Range;

use super::PassEncoder;
use super::spiral::ScopedWrite;

/// What a clock-face renderer submitted for one draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

/// Per-frame interface of a clock-face renderer.
///
/// Frame protocol: write the offset and the transform (in either order), then draw.
/// Both writes must be unmapped before the draw is submitted for the frame to pick
/// them up.
pub trait ClockFaceRenderer {
    /// Maps the per-instance offset (one float) for writing.
    fn map_offset<'a>(&'a self, queue: &'a wgpu::Queue) -> ScopedWrite<'a, 1>;

    /// Maps the 2x2 column-major transform (four floats) for writing.
    fn map_transform<'a>(&'a self, queue: &'a wgpu::Queue) -> ScopedWrite<'a, 4>;

    /// Records the draw into `pass`.
    fn draw(&self, pass: &mut dyn PassEncoder, num_instances: u32) -> DrawCall;

    fn set_offset(&self, queue: &wgpu::Queue, offset: f32) {
        let mut view = self.map_offset(queue);
        view[0] = offset;
        view.unmap();
    }

    fn set_transform(&self, queue: &wgpu::Queue, transform: [f32; 4]) {
        let mut view = self.map_transform(queue);
        *view = transform;
        view.unmap();
    }
}
