//! Mapping of Bevy input events onto the orbit camera and the clock

use bevy::input::mouse::{AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::core::orbit_camera::{ArrowKey, PointerButton};
use crate::visualization::SessionResource;

/// Pixels per scroll line, so line and pixel wheels zoom alike
const PIXELS_PER_LINE: f32 = 16.0;

pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

pub fn arrow_key(key: KeyCode) -> Option<ArrowKey> {
    match key {
        KeyCode::ArrowUp => Some(ArrowKey::Up),
        KeyCode::ArrowDown => Some(ArrowKey::Down),
        KeyCode::ArrowLeft => Some(ArrowKey::Left),
        KeyCode::ArrowRight => Some(ArrowKey::Right),
        _ => None,
    }
}

/// Wheel delta in pixels; positive is wheel up.
pub fn scroll_pixels(unit: MouseScrollUnit, delta_y: f32) -> f64 {
    match unit {
        MouseScrollUnit::Line => (delta_y * PIXELS_PER_LINE) as f64,
        MouseScrollUnit::Pixel => delta_y as f64,
    }
}

/// Feed mouse and arrow-key input to the orbit camera
pub fn camera_input_system(
    mut session: ResMut<SessionResource>,
    buttons: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    scroll: Res<AccumulatedMouseScroll>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let cursor = windows
        .single()
        .ok()
        .and_then(|w| w.cursor_position())
        .map(|p| p.as_dvec2());
    let camera = session.camera_mut();

    if let Some(at) = cursor {
        for button in buttons.get_just_pressed() {
            if let Some(mapped) = pointer_button(*button) {
                camera.pointer_down(mapped, at);
            }
        }
    }
    if buttons.get_just_released().next().is_some()
        && !buttons.any_pressed([MouseButton::Left, MouseButton::Middle])
    {
        camera.pointer_up();
    }

    if let Some(at) = cursor {
        camera.pointer_move(at);
    }

    if scroll.delta.y != 0.0 {
        camera.scroll(scroll_pixels(scroll.unit, scroll.delta.y));
    }

    for key in keys.get_just_pressed() {
        if let Some(arrow) = arrow_key(*key) {
            camera.arrow_key(arrow);
        }
    }
}

/// Space toggles the clock, R reloads every element set, Home seeks to now
pub fn clock_control_system(mut session: ResMut<SessionResource>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::Space) {
        let running = session.toggle_clock();
        info!("[UI] clock {}", if running { "running" } else { "stopped" });
    }
    if keys.just_pressed(KeyCode::KeyR) {
        for result in session.reload_all() {
            if let Err(e) = result {
                warn!("[UI] reload failed: {}", e);
            }
        }
    }
    if keys.just_pressed(KeyCode::Home) {
        session.seek(chrono::Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_button_mapping() {
        assert_eq!(pointer_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(pointer_button(MouseButton::Middle), Some(PointerButton::Middle));
        assert_eq!(pointer_button(MouseButton::Back), None);
    }

    #[test]
    fn test_arrow_key_mapping() {
        assert_eq!(arrow_key(KeyCode::ArrowLeft), Some(ArrowKey::Left));
        assert_eq!(arrow_key(KeyCode::KeyA), None);
    }

    #[test]
    fn test_scroll_units_normalised() {
        assert_eq!(scroll_pixels(MouseScrollUnit::Line, 1.0), 16.0);
        assert_eq!(scroll_pixels(MouseScrollUnit::Pixel, -3.0), -3.0);
    }
}
