//! Coordinate transformation utilities for orbital mechanics
//!
//! Pipeline used by every trace:
//! timestamp -> Julian date -> sidereal angle, inertial (TEME) km -> fixed km
//! -> display units.

use bevy::math::DVec3;
use chrono::{DateTime, Utc};

/// Kilometres per display unit.
pub const KM_PER_DISPLAY_UNIT: f64 = 100.0;

/// Julian date of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2440587.5;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Julian date for a UTC timestamp (millisecond resolution).
pub fn julian_date(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / MS_PER_DAY + UNIX_EPOCH_JD
}

/// Greenwich Mean Sidereal Time (radians) at a Julian date, IAU 1982
/// polynomial. Assumes UT1 ~= UTC.
pub fn sidereal_time(jd: f64) -> f64 {
    let t_cent = (jd - 2451545.0) / 36525.0;

    let gmst_sec =
        67310.54841 + (876600.0 * 3600.0 + 8640184.812866) * t_cent + 0.093104 * t_cent * t_cent
            - 6.2e-6 * t_cent * t_cent * t_cent;

    (gmst_sec * std::f64::consts::TAU / 86400.0).rem_euclid(std::f64::consts::TAU)
}

/// Rotate inertial (TEME) -> Earth-fixed by -GMST about Z
pub fn inertial_to_fixed(eci: DVec3, gmst: f64) -> DVec3 {
    let (s, c) = gmst.sin_cos();
    let x = c * eci.x + s * eci.y;
    let y = -s * eci.x + c * eci.y;
    DVec3::new(x, y, eci.z)
}

/// Map fixed-frame kilometres to display space.
/// Mapping: display (x, y, z) = (fixed.x, fixed.z, -fixed.y) / 100
pub fn fixed_to_display(fixed: DVec3) -> DVec3 {
    DVec3::new(fixed.x, fixed.z, -fixed.y) / KM_PER_DISPLAY_UNIT
}

/// Kilometres to display units
pub fn km_to_display_units(km: f64) -> f64 {
    km / KM_PER_DISPLAY_UNIT
}

/// Inertial position at `t` straight to display space.
pub fn inertial_to_display(eci: DVec3, t: DateTime<Utc>) -> DVec3 {
    let gmst = sidereal_time(julian_date(t));
    fixed_to_display(inertial_to_fixed(eci, gmst))
}
