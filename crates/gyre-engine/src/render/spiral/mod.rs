//! 24-hour spiral clock face.
//!
//! `geometry` builds the static per-second table on the CPU; `SpiralRenderer` owns
//! the GPU side (pipeline, static table, per-frame offset and transform buffers).

pub mod geometry;
mod mapped;
mod renderer;

pub use geometry::{Point, SegmentCursor, build_spiral};
pub use mapped::ScopedWrite;
pub use renderer::{SPIRAL_WGSL, SpiralRenderer, Teardown, validate_shader};
