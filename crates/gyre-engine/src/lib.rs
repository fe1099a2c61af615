//! Gyre engine crate.
//!
//! GPU context management and the 24-hour spiral clock-face renderer, plus a small
//! window runtime used by the studio driver.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
