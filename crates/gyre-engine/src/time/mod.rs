//! Time subsystem.
//!
//! - `FrameClock`: per-window frame deltas, call `tick()` once per presented frame
//! - `DayClock`: time of day that drives the clock face

mod day_clock;
mod frame_clock;

pub use day_clock::DayClock;
pub use frame_clock::{FrameClock, FrameTime};
