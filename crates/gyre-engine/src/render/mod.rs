//! GPU rendering subsystem.
//!
//! Each renderer is responsible for its own GPU resources (pipelines, buffers) and
//! for releasing them while the context that created them is still current.

mod ctx;
mod face;
mod pass;
pub mod spiral;

pub use ctx::{RenderCtx, RenderTarget};
pub use face::{ClockFaceRenderer, DrawCall};
pub use pass::{PassCmd, PassEncoder, RecordingPass};
