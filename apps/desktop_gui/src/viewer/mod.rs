//! Viewer-side state machines: frame navigation, display adjustments, and
//! request progress. Pure state, no I/O, unit tested in place.

pub mod display;
pub mod progress;
pub mod session;
