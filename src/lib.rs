//! satstatus - real-time satellite trace viewer
//!
//! Library crate holding the trace engine, clock, orbit camera and element
//! set loading; `main.rs` assembles them into a Bevy app.

pub mod config;
pub mod core;
pub mod error;
pub mod orbital;
pub mod tle;
pub mod trace;
pub mod ui;
pub mod visualization;
