//! Per-frame session systems

use bevy::prelude::*;
use std::time::Duration;

use crate::visualization::SessionResource;

/// Wall-clock cadence of real-time advances while the clock is stopped
#[derive(Resource)]
pub struct RealtimeTimer(pub Timer);

impl RealtimeTimer {
    pub fn from_millis(ms: u64) -> Self {
        Self(Timer::new(Duration::from_millis(ms), TimerMode::Repeating))
    }
}

/// Drive the accelerated clock with the frame delta
pub fn clock_tick_system(time: Res<Time>, mut session: ResMut<SessionResource>) {
    if !session.clock().is_running() {
        return;
    }
    let ticks = session.tick(time.delta());
    if ticks > 1 {
        debug!("[CLOCK] {} ticks in one frame", ticks);
    }
}

/// Follow the wall clock while the accelerated clock is stopped
pub fn realtime_advance_system(
    time: Res<Time>,
    mut timer: ResMut<RealtimeTimer>,
    mut session: ResMut<SessionResource>,
) {
    if session.clock().is_running() {
        timer.0.reset();
        return;
    }
    if timer.0.tick(time.delta()).just_finished() {
        session.advance_manual(chrono::Utc::now());
    }
}

/// Apply camera input and consume the frame request
pub fn frame_update_system(mut session: ResMut<SessionResource>) {
    if session.update_frame() {
        session.renderer_mut().take_frame_request();
    }
}
