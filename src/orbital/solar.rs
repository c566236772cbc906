//! Low-precision solar ephemeris
//!
//! Geocentric sun position good to a fraction of a degree, enough to place
//! the scene light and the sun trace.

use bevy::math::DVec3;
use chrono::{DateTime, Utc};

use crate::error::PropagationError;
use crate::orbital::coordinates::{inertial_to_display, julian_date};
use crate::orbital::propagation::PositionSource;

/// Kilometres per astronomical unit
pub const AU_KM: f64 = 1.495_978_706_91e8;

fn wrap(x: f64, y: f64) -> f64 {
    if x == 0.0 { x } else { x.rem_euclid(y) }
}

fn wrap_360(degrees: f64) -> f64 {
    wrap(degrees, 360.0)
}

/// ET - UT approximation in seconds for a fractional year
fn delta_et(year: f64) -> f64 {
    26.465 + 0.747622 * (year - 1950.0)
        + 1.886913 * (std::f64::consts::TAU * (year - 1975.0) / 33.0).sin()
}

/// Inertial solar position (km) at a Julian date.
pub fn solar_position_eci(jd: f64) -> DVec3 {
    let mjd = jd - 2415020.0;
    let year = 1900.0 + mjd / 365.25;
    let t = (mjd + delta_et(year) / 86400.0) / 36525.0;

    let m = (wrap_360(358.47583 + wrap_360(35999.04975 * t) - (0.000150 + 0.0000033 * t) * t * t))
        .to_radians();
    let l = (wrap_360(279.69668 + wrap_360(36000.76892 * t) + 0.0003025 * t * t)).to_radians();
    let e = 0.01675104 - (0.0000418 + 0.000000126 * t) * t;
    let c = ((1.919460 - (0.004789 + 0.000014 * t) * t) * m.sin()
        + (0.020094 - 0.000100 * t) * (2.0 * m).sin()
        + 0.000293 * (3.0 * m).sin())
    .to_radians();
    let o = wrap_360(259.18 - 1934.142 * t).to_radians();
    let lsa = wrap(l + c - (0.00569 - 0.00479 * o.sin()).to_radians(), std::f64::consts::TAU);
    let nu = wrap(m + c, std::f64::consts::TAU);
    let r = 1.0000002 * (1.0 - e * e) / (1.0 + e * nu.cos()) * AU_KM;
    let eps = (23.452294 - (0.0130125 + (0.00000164 - 0.000000503 * t) * t) * t
        + 0.00256 * o.cos())
    .to_radians();

    DVec3::new(
        r * lsa.cos(),
        r * lsa.sin() * eps.cos(),
        r * lsa.sin() * eps.sin(),
    )
}

/// The sun as a trace source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolarEphemeris;

impl PositionSource for SolarEphemeris {
    fn position_at(&self, t: DateTime<Utc>) -> Result<DVec3, PropagationError> {
        Ok(inertial_to_display(solar_position_eci(julian_date(t)), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ecliptic_longitude_deg(eci: DVec3) -> f64 {
        // undo the obliquity rotation about X
        let eps = 23.44_f64.to_radians();
        let y = eci.y * eps.cos() + eci.z * eps.sin();
        y.atan2(eci.x).to_degrees().rem_euclid(360.0)
    }

    #[test]
    fn test_distance_is_about_one_au() {
        let t = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let r = solar_position_eci(julian_date(t)).length() / AU_KM;
        assert!((0.98..1.02).contains(&r), "r = {} AU", r);
    }

    #[test]
    fn test_perihelion_and_aphelion() {
        let jan = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        let jul = Utc.with_ymd_and_hms(2024, 7, 5, 0, 0, 0).unwrap();
        let r_jan = solar_position_eci(julian_date(jan)).length();
        let r_jul = solar_position_eci(julian_date(jul)).length();
        assert!(r_jan < r_jul, "january {} km vs july {} km", r_jan, r_jul);
    }

    #[test]
    fn test_march_equinox_longitude() {
        // 2024 March equinox: 20 March 03:06 UTC
        let t = Utc.with_ymd_and_hms(2024, 3, 20, 3, 6, 0).unwrap();
        let eci = solar_position_eci(julian_date(t));
        let lon = ecliptic_longitude_deg(eci);
        let off = lon.min(360.0 - lon);
        assert!(off < 0.1, "longitude {} deg", lon);
        assert!(eci.z.abs() / eci.length() < 0.002, "declination not ~0");
    }

    #[test]
    fn test_june_solstice_declination() {
        let t = Utc.with_ymd_and_hms(2024, 6, 20, 20, 51, 0).unwrap();
        let eci = solar_position_eci(julian_date(t));
        let dec = (eci.z / eci.length()).asin().to_degrees();
        assert!((dec - 23.44).abs() < 0.05, "declination {} deg", dec);
    }

    #[test]
    fn test_display_position_is_far_from_earth() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let p = SolarEphemeris.position_at(t).expect("sun never fails");
        assert!(p.length() > 1.4e6, "display distance {}", p.length());
    }
}
