//! Core display state: the session, its orbit camera and the typed
//! subscription registries.

pub mod observer;
pub mod orbit_camera;
pub mod session;
pub mod systems;

pub use observer::{Observers, SubscriptionId};
pub use orbit_camera::{CameraConfig, CameraOrbitController};
pub use session::{DisplaySession, LoadOutcome, SatelliteTrace};
pub use systems::{RealtimeTimer, clock_tick_system, frame_update_system, realtime_advance_system};

use bevy::prelude::*;

/// Plugin driving the session clock and frame updates
pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (clock_tick_system, realtime_advance_system).chain())
            .add_systems(PostUpdate, frame_update_system);
    }
}
