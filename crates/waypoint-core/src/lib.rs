#![forbid(unsafe_code)]

//! Core: geometry in logical pixels, viewport classification, and host-driven clocks.

pub mod clock;
pub mod geometry;
pub mod viewport;
