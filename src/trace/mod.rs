//! Sliding-window traces of recent positions
//!
//! A [`TraceBuffer`] keeps a bounded, time-ordered ring of [`TracePoint`]s for
//! one satellite (or the sun) and keeps the renderer's line segments in step
//! with it as simulated time moves.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Longest window a trace may cover (one year)
pub const MAX_WINDOW_MS: i64 = 365 * 86_400_000;
/// Upper bound on the points held by one trace
pub const MAX_CAPACITY: usize = 100_000;

pub mod buffer;
pub mod point;

#[cfg(test)]
mod proptest_trace;

pub use buffer::{AdvanceReport, TraceBuffer};
pub use point::{TracePoint, age_factor};

/// Window bounds of one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Maximum number of points held
    pub capacity: usize,
    /// Largest timestamp gap between two connected points
    pub max_interval_ms: i64,
    /// Points older than this (relative to the reference time) are evicted
    pub max_age_ms: i64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            capacity: 90,
            max_interval_ms: 60_000,
            max_age_ms: 5_400_000,
        }
    }
}

impl TraceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 || self.capacity > MAX_CAPACITY {
            return Err(ConfigError::Invalid {
                field: "capacity",
                reason: format!("must be in 1..={}, got {}", MAX_CAPACITY, self.capacity),
            });
        }
        if self.max_interval_ms <= 0 {
            return Err(ConfigError::Invalid {
                field: "max_interval_ms",
                reason: format!("must be positive, got {}", self.max_interval_ms),
            });
        }
        if self.max_age_ms <= 0 || self.max_age_ms > MAX_WINDOW_MS {
            return Err(ConfigError::Invalid {
                field: "max_age_ms",
                reason: format!("must be in 1..={}, got {}", MAX_WINDOW_MS, self.max_age_ms),
            });
        }
        if self.max_interval_ms > self.max_age_ms {
            return Err(ConfigError::Invalid {
                field: "max_interval_ms",
                reason: format!(
                    "must not exceed max_age_ms ({}), got {}",
                    self.max_age_ms, self.max_interval_ms
                ),
            });
        }
        Ok(())
    }
}
