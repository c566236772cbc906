//! Orbital propagation utilities
//!
//! Wraps the `sgp4` crate behind an [`ElementSet`] that knows its own epoch,
//! and exposes the [`PositionSource`] seam used by trace buffers.

use bevy::math::DVec3;
use chrono::{DateTime, Duration, Utc};

use crate::error::{ElementSetParseError, PropagationError};
use crate::orbital::coordinates::{inertial_to_display, julian_date};
use crate::tle::parser::parse_tle_epoch_to_utc;

/// Anything that yields a display-space position for a timestamp.
pub trait PositionSource {
    fn position_at(&self, t: DateTime<Utc>) -> Result<DVec3, PropagationError>;
}

/// Calculate minutes since epoch for SGP4 propagation
pub fn minutes_since_epoch(sim_utc: DateTime<Utc>, epoch: DateTime<Utc>) -> f64 {
    let delta = sim_utc - epoch;
    delta.num_seconds() as f64 / 60.0 + (delta.subsec_nanos() as f64) / 60.0 / 1.0e9
}

/// Parsed two-line element set plus its SGP4 model. Immutable after parse.
pub struct ElementSet {
    name: Option<String>,
    norad: Option<u32>,
    epoch_utc: DateTime<Utc>,
    epoch_jd: f64,
    constants: sgp4::Constants,
}

impl std::fmt::Debug for ElementSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementSet")
            .field("name", &self.name)
            .field("norad", &self.norad)
            .field("epoch_utc", &self.epoch_utc)
            .finish_non_exhaustive()
    }
}

impl ElementSet {
    /// Build from line 1 and line 2 of a TLE.
    pub fn from_lines(
        name: Option<String>,
        line1: &str,
        line2: &str,
    ) -> Result<Self, ElementSetParseError> {
        let line1 = line1.trim();
        let line2 = line2.trim();
        let epoch_utc = parse_tle_epoch_to_utc(line1).ok_or(ElementSetParseError::BadEpoch)?;
        let elements = sgp4::Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| ElementSetParseError::Invalid(e.to_string()))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| ElementSetParseError::Invalid(e.to_string()))?;
        let norad = line1.get(2..7).and_then(|s| s.trim().parse::<u32>().ok());

        Ok(Self {
            name,
            norad,
            epoch_utc,
            epoch_jd: julian_date(epoch_utc),
            constants,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn norad(&self) -> Option<u32> {
        self.norad
    }

    pub fn epoch_utc(&self) -> DateTime<Utc> {
        self.epoch_utc
    }

    /// Epoch as a Julian date.
    pub fn epoch_jd(&self) -> f64 {
        self.epoch_jd
    }

    /// Inertial (TEME) position and velocity in km and km/s.
    pub fn propagate(&self, minutes: f64) -> Result<(DVec3, DVec3), PropagationError> {
        let state = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .map_err(|e| PropagationError {
                time: self.epoch_utc + Duration::milliseconds((minutes * 60_000.0) as i64),
                minutes,
                reason: e.to_string(),
            })?;
        Ok((
            DVec3::from_array(state.position),
            DVec3::from_array(state.velocity),
        ))
    }
}

impl PositionSource for ElementSet {
    fn position_at(&self, t: DateTime<Utc>) -> Result<DVec3, PropagationError> {
        let (eci, _) = self.propagate(minutes_since_epoch(t, self.epoch_utc))?;
        Ok(inertial_to_display(eci, t))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) const ISS_NAME: &str = "ISS (ZARYA)";
    pub(crate) const ISS_LINE1: &str =
        "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
    pub(crate) const ISS_LINE2: &str =
        "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    /// Element set from raw text with an optional name line.
    fn parse_text(text: &str) -> Result<ElementSet, ElementSetParseError> {
        let (name, line1, line2) = crate::tle::parser::extract_tle_block(text, None)
            .ok_or(ElementSetParseError::MissingLines)?;
        ElementSet::from_lines(name, &line1, &line2)
    }

    pub(crate) fn iss() -> ElementSet {
        ElementSet::from_lines(Some(ISS_NAME.to_string()), ISS_LINE1, ISS_LINE2)
            .expect("valid ISS element set")
    }

    #[test]
    fn test_minutes_since_epoch() {
        let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let sim_time = Utc.with_ymd_and_hms(2000, 1, 1, 1, 0, 0).unwrap();
        assert!((minutes_since_epoch(sim_time, epoch) - 60.0).abs() < 1e-10);

        let sim_time_frac = Utc.with_ymd_and_hms(2000, 1, 1, 0, 1, 30).unwrap();
        assert!((minutes_since_epoch(sim_time_frac, epoch) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_minutes_since_epoch_negative() {
        let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 1, 0, 0).unwrap();
        let sim_time = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert!((minutes_since_epoch(sim_time, epoch) + 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_with_name_line() {
        let text = format!("{}\r\n{}\r\n{}\r\n", ISS_NAME, ISS_LINE1, ISS_LINE2);
        let set = parse_text(&text).expect("parse");
        assert_eq!(set.name(), Some(ISS_NAME));
        assert_eq!(set.norad(), Some(25544));
    }

    #[test]
    fn test_parse_without_name_line() {
        let text = format!("{}\n{}", ISS_LINE1, ISS_LINE2);
        let set = parse_text(&text).expect("parse");
        assert_eq!(set.name(), None);
    }

    #[test]
    fn test_parse_rejects_missing_lines() {
        assert_eq!(
            parse_text("ISS (ZARYA)\n").unwrap_err(),
            ElementSetParseError::MissingLines
        );
        assert_eq!(
            parse_text("").unwrap_err(),
            ElementSetParseError::MissingLines
        );
    }

    #[test]
    fn test_parse_rejects_garbled_line() {
        let garbled = "2 25544  51.6416 247.4627 XXXXXXX 130.5360 325.0288 15.72125391563537";
        let err = ElementSet::from_lines(None, ISS_LINE1, garbled).unwrap_err();
        assert!(matches!(err, ElementSetParseError::Invalid(_)), "{:?}", err);
    }

    #[test]
    fn test_epoch_matches_line1() {
        let set = iss();
        let expected = parse_tle_epoch_to_utc(ISS_LINE1).unwrap();
        assert_eq!(set.epoch_utc(), expected);
        assert!((set.epoch_jd() - julian_date(expected)).abs() < 1e-9);
    }

    #[test]
    fn test_propagate_at_epoch_is_low_earth_orbit() {
        let (pos, vel) = iss().propagate(0.0).expect("propagate");
        let altitude = pos.length() - 6371.0;
        assert!((300.0..450.0).contains(&altitude), "altitude {} km", altitude);
        assert!((7.0..8.5).contains(&vel.length()), "speed {} km/s", vel.length());
    }

    #[test]
    fn test_position_at_is_in_display_units() {
        let set = iss();
        let p = set.position_at(set.epoch_utc()).expect("position");
        // 6371 km earth radius is 63.71 display units; ISS sits ~4 units above
        assert!((66.0..68.5).contains(&p.length()), "radius {}", p.length());
    }

    #[test]
    fn test_position_at_is_deterministic() {
        let set = iss();
        let t = set.epoch_utc() + chrono::Duration::minutes(42);
        assert_eq!(set.position_at(t).unwrap(), set.position_at(t).unwrap());
    }
}
