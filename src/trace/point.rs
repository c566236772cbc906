use bevy::math::DVec3;
use chrono::{DateTime, Utc};

use crate::visualization::SegmentHandle;

/// Fade factor for a point of the given age: 1 when new, 0 at `max_age_ms`.
pub fn age_factor(age_ms: i64, max_age_ms: i64) -> f32 {
    if max_age_ms <= 0 {
        return 0.0;
    }
    (1.0 - age_ms as f64 / max_age_ms as f64).clamp(0.0, 1.0) as f32
}

/// One timestamped sample of a trace.
///
/// Points live in buffer slots and are overwritten in place when the slot is
/// reused. `segment` is the renderer primitive joining the predecessor to
/// this point and is present exactly when `connected` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct TracePoint {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) position: DVec3,
    pub(crate) connected: bool,
    pub(crate) age_factor: f32,
    pub(crate) segment: Option<SegmentHandle>,
}

impl TracePoint {
    pub(crate) fn new(timestamp: DateTime<Utc>, position: DVec3, connected: bool) -> Self {
        Self {
            timestamp,
            position,
            connected,
            age_factor: 1.0,
            segment: None,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Display-space position
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Whether the point is drawn joined to its predecessor
    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn age_factor(&self) -> f32 {
        self.age_factor
    }

    pub fn segment(&self) -> Option<SegmentHandle> {
        self.segment
    }

    pub(crate) fn age_ms(&self, reference: DateTime<Utc>) -> i64 {
        (reference - self.timestamp).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_age_factor_bounds() {
        assert_eq!(age_factor(0, 5_400_000), 1.0);
        assert_eq!(age_factor(5_400_000, 5_400_000), 0.0);
        assert_eq!(age_factor(2_700_000, 5_400_000), 0.5);
    }

    #[test]
    fn test_age_factor_clamps() {
        assert_eq!(age_factor(-1_000, 5_400_000), 1.0);
        assert_eq!(age_factor(10_000_000, 5_400_000), 0.0);
        assert_eq!(age_factor(10, 0), 0.0);
    }

    #[test]
    fn test_age_factor_is_monotonic() {
        let max = 5_400_000;
        let mut last = age_factor(0, max);
        for age in (60_000..=max).step_by(60_000) {
            let f = age_factor(age, max);
            assert!(f < last, "age {} gave {} after {}", age, f, last);
            last = f;
        }
    }

    #[test]
    fn test_point_age() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let point = TracePoint::new(t, DVec3::X, false);
        assert_eq!(point.age_ms(t + chrono::Duration::minutes(2)), 120_000);
        assert_eq!(point.segment(), None);
        assert_eq!(point.age_factor(), 1.0);
    }
}
