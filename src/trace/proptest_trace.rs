//! Property-based tests for the trace window using proptest.
//!
//! Random forward step sequences must keep the window ordered, bounded and
//! young, and every connected pair within the interval limit.

use bevy::color::Color;
use chrono::Duration;
use proptest::prelude::*;

use super::buffer::TraceBuffer;
use super::buffer::tests::{LinearSource, t0};
use super::TraceConfig;
use crate::visualization::testing::RecordingRenderer;

fn config_strategy() -> impl Strategy<Value = TraceConfig> {
    (1usize..120, 1_000i64..120_000, 120_000i64..10_000_000).prop_map(
        |(capacity, max_interval_ms, max_age_ms)| TraceConfig {
            capacity,
            max_interval_ms,
            max_age_ms,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Ordering, capacity, age and gap bounds hold after every advance.
    #[test]
    fn prop_window_invariants(
        config in config_strategy(),
        steps in prop::collection::vec(0i64..20_000_000, 1..40),
    ) {
        let mut renderer = RecordingRenderer::default();
        let mut trace = TraceBuffer::new("prop", LinearSource::new(1.0), config, Color::WHITE).unwrap();
        let mut now = t0();

        for step in steps {
            now += Duration::milliseconds(step);
            trace.advance(now, &mut renderer);

            prop_assert!(trace.len() <= config.capacity);
            prop_assert!(!trace.is_empty());
            prop_assert_eq!(trace.newest().unwrap().timestamp(), now);

            let points: Vec<_> = trace.points().collect();
            prop_assert!(!points[0].connected());
            for pair in points.windows(2) {
                prop_assert!(pair[0].timestamp() <= pair[1].timestamp());
                if pair[1].connected() {
                    let gap = (pair[1].timestamp() - pair[0].timestamp()).num_milliseconds();
                    prop_assert!(gap <= config.max_interval_ms, "connected gap {} ms", gap);
                }
            }
            for point in &points {
                prop_assert!((now - point.timestamp()).num_milliseconds() <= config.max_age_ms);
                prop_assert_eq!(point.connected(), point.segment().is_some());
            }
            let live = points.iter().filter(|p| p.segment().is_some()).count();
            prop_assert_eq!(renderer.segments.len(), live);
        }
    }

    /// Repeating the last advance never changes the window.
    #[test]
    fn prop_repeat_advance_is_noop(
        config in config_strategy(),
        steps in prop::collection::vec(1i64..5_000_000, 1..10),
    ) {
        let mut renderer = RecordingRenderer::default();
        let mut trace = TraceBuffer::new("prop", LinearSource::new(1.0), config, Color::WHITE).unwrap();
        let mut now = t0();
        for step in steps {
            now += Duration::milliseconds(step);
            trace.advance(now, &mut renderer);
        }
        let before: Vec<_> = trace.points().cloned().collect();

        let report = trace.advance(now, &mut renderer);

        prop_assert!(!report.changed());
        let after: Vec<_> = trace.points().cloned().collect();
        prop_assert_eq!(before, after);
    }
}
