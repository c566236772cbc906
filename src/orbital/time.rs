//! Simulation clock and time-change notifications
//!
//! The clock is the single time authority of a display session. While
//! running it advances by a fixed simulated step on every wall-clock tick;
//! while stopped it only moves on manual advances, which follow real elapsed
//! wall-clock time.

use bevy::log::debug;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClockMisuseError;
use crate::visualization::RenderAdapter;

/// Clock configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Wall-clock period between accelerated ticks
    pub tick_period_ms: u64,
    /// Simulated time added per tick
    pub step_ms: i64,
    /// Start the accelerated clock when the session starts
    pub autostart: bool,
    /// Cadence of real-time manual advances while stopped
    pub realtime_update_ms: u64,
    /// Initial simulated time; `None` means now
    pub start_time: Option<DateTime<Utc>>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 100,
            step_ms: 60_000,
            autostart: true,
            realtime_update_ms: 1_000,
            start_time: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockState {
    Stopped,
    Running,
}

/// Context handed to every time-change listener.
pub struct TimeChange<'a> {
    time: DateTime<Utc>,
    renderer: &'a mut dyn RenderAdapter,
    stop_requested: bool,
}

impl<'a> TimeChange<'a> {
    pub fn new(time: DateTime<Utc>, renderer: &'a mut dyn RenderAdapter) -> Self {
        Self {
            time,
            renderer,
            stop_requested: false,
        }
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn renderer(&mut self) -> &mut dyn RenderAdapter {
        &mut *self.renderer
    }

    /// Ask the clock that emitted this notification to stop once the
    /// current broadcast completes.
    pub fn stop_clock(&mut self) {
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}

/// Receives simulated time changes.
pub trait TimeListener {
    fn on_time_change(&mut self, change: &mut TimeChange<'_>);
}

/// Simulation clock state
#[derive(Debug)]
pub struct SimulationClock {
    reference_time: DateTime<Utc>,
    state: ClockState,
    tick_period: std::time::Duration,
    step: Duration,
    pending_wall: std::time::Duration,
    last_wall: Option<DateTime<Utc>>,
}

impl SimulationClock {
    /// Build a stopped clock at `start`.
    pub fn new(start: DateTime<Utc>, config: &ClockConfig) -> Result<Self, ClockMisuseError> {
        if config.step_ms < 0 {
            return Err(ClockMisuseError::NegativeStep(config.step_ms));
        }
        if config.tick_period_ms == 0 {
            return Err(ClockMisuseError::ZeroTickPeriod);
        }
        Ok(Self {
            reference_time: start,
            state: ClockState::Stopped,
            tick_period: std::time::Duration::from_millis(config.tick_period_ms),
            step: Duration::milliseconds(config.step_ms),
            pending_wall: std::time::Duration::ZERO,
            last_wall: None,
        })
    }

    pub fn reference_time(&self) -> DateTime<Utc> {
        self.reference_time
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Simulated milliseconds per wall-clock millisecond; 0 while stopped.
    pub fn playback_rate(&self) -> f64 {
        match self.state {
            ClockState::Stopped => 0.0,
            ClockState::Running => {
                self.step.num_milliseconds() as f64 / self.tick_period.as_millis() as f64
            }
        }
    }

    /// Returns true if the clock was stopped and is now running.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = ClockState::Running;
        self.pending_wall = std::time::Duration::ZERO;
        self.last_wall = None;
        true
    }

    /// Returns true if the clock was running and is now stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state = ClockState::Stopped;
        self.pending_wall = std::time::Duration::ZERO;
        self.last_wall = None;
        true
    }

    /// Feed elapsed wall-clock time. Ignored while stopped.
    pub fn accumulate(&mut self, wall_elapsed: std::time::Duration) {
        if self.is_running() {
            self.pending_wall += wall_elapsed;
        }
    }

    /// Consume one tick period of accumulated wall time, advancing the
    /// reference time by one step. Returns the new time to broadcast.
    pub fn poll(&mut self) -> Option<DateTime<Utc>> {
        if !self.is_running() || self.pending_wall < self.tick_period {
            return None;
        }
        self.pending_wall -= self.tick_period;
        self.reference_time += self.step;
        Some(self.reference_time)
    }

    /// Manual advance while stopped: moves by the real wall-clock time
    /// elapsed since the previous manual advance (nothing on the first one).
    pub fn advance_manual(&mut self, wall_now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.is_running() {
            debug!("manual advance ignored while clock is running");
            return None;
        }
        if let Some(last) = self.last_wall {
            let elapsed = (wall_now - last).max(Duration::zero());
            self.reference_time += elapsed;
        }
        self.last_wall = Some(wall_now);
        Some(self.reference_time)
    }

    /// Jump to an absolute simulated time.
    pub fn seek(&mut self, time: DateTime<Utc>) -> DateTime<Utc> {
        self.reference_time = time;
        self.pending_wall = std::time::Duration::ZERO;
        self.reference_time
    }
}
