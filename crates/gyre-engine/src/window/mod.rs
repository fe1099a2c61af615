//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Windows, creates one GPU context per window and
//! drives the app's frames. Stands in for the host platform's lifecycle code.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
