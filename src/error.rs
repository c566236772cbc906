//! Error taxonomy for trace loading, propagation and clock setup

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Malformed two-line element text. Fatal to the affected trace: its buffer
/// stays in the last good state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ElementSetParseError {
    #[error("no line 1 / line 2 pair found in element set text")]
    MissingLines,
    #[error("could not parse element set epoch from line 1")]
    BadEpoch,
    #[error("invalid element set: {0}")]
    Invalid(String),
}

/// The propagation model diverged (or rejected the elements) for one sample.
/// Recoverable: the sample is skipped and retried on the next advance.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("propagation failed at {time} ({minutes:.1} min from epoch): {reason}")]
pub struct PropagationError {
    pub time: DateTime<Utc>,
    pub minutes: f64,
    pub reason: String,
}

/// Failure to obtain element set text. Recoverable: the trace keeps its
/// previous element set and the caller may retry.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    #[error("HTTP {status} fetching {url}")]
    Http { status: u16, url: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("I/O error reading {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("fetch worker is not running")]
    WorkerGone,
    #[error("no trace with id {0}")]
    UnknownTrace(usize),
    #[error(transparent)]
    Parse(#[from] ElementSetParseError),
}

/// Invalid clock parameters, rejected when the clock is built.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClockMisuseError {
    #[error("playback step must not be negative (got {0} ms)")]
    NegativeStep(i64),
    #[error("tick period must be positive")]
    ZeroTickPeriod,
}

/// Rejected configuration value.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("not a hex colour: {0:?}")]
    BadColor(String),
}

/// A display session could not be built from its configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Clock(#[from] ClockMisuseError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
