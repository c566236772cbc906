//! Orbital mechanics module
//!
//! Coordinate transforms, SGP4 propagation of element sets, the solar
//! ephemeris and the simulation clock.

pub mod coordinates;
pub mod propagation;
pub mod solar;
pub mod time;

pub use coordinates::{
    fixed_to_display, inertial_to_display, inertial_to_fixed, julian_date, sidereal_time,
};
pub use propagation::{ElementSet, PositionSource, minutes_since_epoch};
pub use solar::SolarEphemeris;
pub use time::{ClockConfig, ClockState, SimulationClock, TimeChange, TimeListener};
