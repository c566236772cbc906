//! User input module
//!
//! Pointer, wheel and keyboard handling for the orbit camera and the
//! simulation clock.

use bevy::prelude::*;

pub mod input;

pub use input::{camera_input_system, clock_control_system};

/// Plugin for user input handling
pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, (camera_input_system, clock_control_system));
    }
}
