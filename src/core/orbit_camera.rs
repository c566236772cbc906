//! Orbit camera around a fixed center.
//!
//! Input and clock-driven rotation only accumulate pending deltas; they are
//! applied exactly once per [`CameraOrbitController::update`] and then reset.
//! Azimuth is measured from display +X toward display +Z, the polar angle
//! from display +Y.

use std::f64::consts::{PI, TAU};

use bevy::math::{DVec2, DVec3};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::orbital::time::{TimeChange, TimeListener};

/// Clamp margin for the polar angle
pub const EPS: f64 = 1e-6;
/// Pointer travel (px) for a full turn at rotate speed 1
const DRAG_PIXELS_PER_TURN: f64 = 1800.0;
const ZOOM_BASE: f64 = 0.95;
/// Rotation per arrow key press (rad)
const KEY_ROTATE_STEP: f64 = 0.1;

/// Earth rotation angle for a span of simulated time, one turn per day
pub fn milliseconds_to_radians(milliseconds: f64) -> f64 {
    PI / 43_200_000.0 * milliseconds
}

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Initial distance from the center (display units)
    pub radius: f64,
    pub polar_angle: f64,
    pub azimuth_angle: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_polar_angle: f64,
    pub max_polar_angle: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
    /// Turn the camera with simulated time, one revolution per day
    pub follow_time: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: 250.0,
            polar_angle: PI / 2.0,
            azimuth_angle: 0.0,
            min_distance: 70.0,
            max_distance: 2_000.0,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            follow_time: true,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_distance > 0.0 && self.min_distance <= self.max_distance) {
            return Err(ConfigError::Invalid {
                field: "min_distance",
                reason: format!(
                    "need 0 < min_distance <= max_distance, got {}..{}",
                    self.min_distance, self.max_distance
                ),
            });
        }
        if !(0.0..=PI).contains(&self.min_polar_angle)
            || !(0.0..=PI).contains(&self.max_polar_angle)
            || self.max_polar_angle - self.min_polar_angle <= 2.0 * EPS
        {
            return Err(ConfigError::Invalid {
                field: "polar_angle",
                reason: "limits must be an increasing range within 0..=pi".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragMode {
    #[default]
    Idle,
    DraggingRotate,
    DraggingZoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct CameraOrbitController {
    config: CameraConfig,
    center: DVec3,
    radius: f64,
    polar: f64,
    azimuth: f64,
    pending_theta: f64,
    pending_phi: f64,
    pending_scale: f64,
    last_position: DVec3,
    mode: DragMode,
    last_pointer: Option<DVec2>,
    last_time: Option<DateTime<Utc>>,
}

impl CameraOrbitController {
    pub fn new(config: CameraConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut controller = Self {
            center: DVec3::ZERO,
            radius: config.radius.clamp(config.min_distance, config.max_distance),
            polar: config.polar_angle.clamp(
                config.min_polar_angle + EPS,
                config.max_polar_angle - EPS,
            ),
            azimuth: config.azimuth_angle.rem_euclid(TAU),
            pending_theta: 0.0,
            pending_phi: 0.0,
            pending_scale: 1.0,
            last_position: DVec3::ZERO,
            mode: DragMode::Idle,
            last_pointer: None,
            last_time: None,
            config,
        };
        controller.last_position = controller.position();
        Ok(controller)
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn polar_angle(&self) -> f64 {
        self.polar
    }

    pub fn azimuth_angle(&self) -> f64 {
        self.azimuth
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    /// Position for the current angles and radius, pending deltas excluded.
    pub fn position(&self) -> DVec3 {
        let (sin_phi, cos_phi) = self.polar.sin_cos();
        let (sin_theta, cos_theta) = self.azimuth.sin_cos();
        self.center
            + self.radius * DVec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta)
    }

    pub fn rotate(&mut self, delta_theta: f64, delta_phi: f64) {
        self.pending_theta += delta_theta;
        self.pending_phi += delta_phi;
    }

    pub fn rotate_left(&mut self, angle: f64) {
        self.rotate(-angle, 0.0);
    }

    pub fn rotate_up(&mut self, angle: f64) {
        self.rotate(0.0, -angle);
    }

    /// Multiply the radius by `scale` on the next update.
    pub fn zoom(&mut self, scale: f64) {
        self.pending_scale *= scale;
    }

    fn zoom_step(&self) -> f64 {
        ZOOM_BASE.powf(self.config.zoom_speed)
    }

    pub fn zoom_in(&mut self) {
        self.zoom(self.zoom_step());
    }

    pub fn zoom_out(&mut self) {
        self.zoom(1.0 / self.zoom_step());
    }

    /// Azimuth of the camera around the pole, from display +X toward +Z.
    pub fn orbit_angle(&self) -> f64 {
        let offset = self.position() - self.center;
        offset.z.atan2(offset.x)
    }

    /// Place the camera at `theta` around the pole, keeping its polar angle
    /// and radius. Returns the azimuth wrapped to [0, 2π).
    pub fn set_orbit_angle(&mut self, theta: f64) -> f64 {
        self.azimuth = theta.rem_euclid(TAU);
        self.pending_theta = 0.0;
        self.azimuth
    }

    pub fn pointer_down(&mut self, button: PointerButton, at: DVec2) {
        self.mode = match button {
            PointerButton::Primary => DragMode::DraggingRotate,
            PointerButton::Middle => DragMode::DraggingZoom,
            PointerButton::Secondary => return,
        };
        self.last_pointer = Some(at);
    }

    pub fn pointer_move(&mut self, at: DVec2) {
        let Some(last) = self.last_pointer else {
            return;
        };
        self.drag(at - last);
        self.last_pointer = Some(at);
    }

    pub fn pointer_up(&mut self) {
        self.mode = DragMode::Idle;
        self.last_pointer = None;
    }

    /// Apply a pointer movement in pixels according to the drag mode.
    pub fn drag(&mut self, delta: DVec2) {
        match self.mode {
            DragMode::Idle => {}
            DragMode::DraggingRotate => {
                let per_px = TAU / DRAG_PIXELS_PER_TURN * self.config.rotate_speed;
                self.rotate_left(per_px * delta.x);
                self.rotate_up(per_px * delta.y);
            }
            DragMode::DraggingZoom => {
                if delta.y > 0.0 {
                    self.zoom_in();
                } else if delta.y < 0.0 {
                    self.zoom_out();
                }
            }
        }
    }

    /// Wheel input; positive (wheel up) deltas back away from the center.
    pub fn scroll(&mut self, delta: f64) {
        if delta > 0.0 {
            self.zoom_out();
        } else if delta < 0.0 {
            self.zoom_in();
        }
    }

    pub fn arrow_key(&mut self, key: ArrowKey) {
        match key {
            ArrowKey::Up => self.rotate_up(KEY_ROTATE_STEP),
            ArrowKey::Down => self.rotate_up(-KEY_ROTATE_STEP),
            ArrowKey::Left => self.rotate_left(KEY_ROTATE_STEP),
            ArrowKey::Right => self.rotate_left(-KEY_ROTATE_STEP),
        }
    }

    /// Apply and reset pending deltas, clamping the polar angle and radius.
    /// Returns true if the camera position moved since the last update.
    pub fn update(&mut self) -> bool {
        self.azimuth = (self.azimuth + self.pending_theta).rem_euclid(TAU);
        self.polar = (self.polar + self.pending_phi).clamp(
            self.config.min_polar_angle + EPS,
            self.config.max_polar_angle - EPS,
        );
        self.radius = (self.radius * self.pending_scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        self.pending_theta = 0.0;
        self.pending_phi = 0.0;
        self.pending_scale = 1.0;

        let position = self.position();
        let changed = self.last_position != position;
        if changed {
            self.last_position = position;
        }
        changed
    }

    /// Queue the rotation matching the simulated time elapsed since the
    /// previous call. The first call only records the time.
    pub fn follow_time(&mut self, time: DateTime<Utc>) {
        if let Some(last) = self.last_time {
            let elapsed_ms = (time - last).num_milliseconds() as f64;
            self.rotate(milliseconds_to_radians(elapsed_ms), 0.0);
        }
        self.last_time = Some(time);
    }
}

impl TimeListener for CameraOrbitController {
    fn on_time_change(&mut self, change: &mut TimeChange<'_>) {
        if self.config.follow_time {
            self.follow_time(change.time());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn controller() -> CameraOrbitController {
        CameraOrbitController::new(CameraConfig::default()).unwrap()
    }

    #[test]
    fn test_time_to_radians() {
        assert_relative_eq!(milliseconds_to_radians(86_400_000.0), TAU);
        assert_relative_eq!(milliseconds_to_radians(3_600_000.0), PI / 12.0);
    }

    #[test]
    fn test_initial_position() {
        let c = controller();
        // polar pi/2, azimuth 0: on the +X axis
        let p = c.position();
        assert_relative_eq!(p.x, 250.0, epsilon = 1e-9);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-3);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_set_orbit_angle_wraps_and_preserves() {
        let mut c = controller();
        c.rotate(0.0, -0.4);
        c.zoom(0.5);
        c.update();
        let polar = c.polar_angle();
        let radius = c.radius();

        c.set_orbit_angle(0.0);
        let theta = c.set_orbit_angle(TAU + 0.1);

        assert_relative_eq!(theta, 0.1, epsilon = 1e-12);
        assert_relative_eq!(c.azimuth_angle(), 0.1, epsilon = 1e-12);
        assert_eq!(c.polar_angle(), polar);
        assert_eq!(c.radius(), radius);
        assert!(c.update());
        assert_relative_eq!(c.orbit_angle(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_set_orbit_angle_negative_wraps() {
        let mut c = controller();
        assert_relative_eq!(c.set_orbit_angle(-0.5), TAU - 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_pending_deltas_apply_once() {
        let mut c = controller();
        c.rotate(0.25, 0.0);
        c.rotate(0.25, 0.0);
        assert!(c.update());
        assert_relative_eq!(c.azimuth_angle(), 0.5, epsilon = 1e-12);
        // nothing pending: position unchanged
        assert!(!c.update());
        assert_relative_eq!(c.azimuth_angle(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_tiny_rotation_reports_change() {
        let mut c = controller();
        c.rotate(1e-9, 0.0);
        assert!(c.update());
        assert!(!c.update());
    }

    #[test]
    fn test_polar_clamped_off_the_poles() {
        let mut c = controller();
        c.rotate(0.0, -10.0);
        c.update();
        assert_relative_eq!(c.polar_angle(), EPS);
        c.rotate(0.0, 20.0);
        c.update();
        assert_relative_eq!(c.polar_angle(), PI - EPS);
    }

    #[test]
    fn test_radius_clamped() {
        let mut c = controller();
        c.zoom(0.001);
        c.update();
        assert_eq!(c.radius(), 70.0);
        c.zoom(1e6);
        c.update();
        assert_eq!(c.radius(), 2_000.0);
    }

    #[test]
    fn test_scroll_zoom_steps() {
        let mut c = controller();
        c.scroll(-1.0);
        c.update();
        assert_relative_eq!(c.radius(), 250.0 * 0.95, epsilon = 1e-9);
        c.scroll(1.0);
        c.update();
        assert_relative_eq!(c.radius(), 250.0, epsilon = 1e-9);
        c.scroll(0.0);
        assert!(!c.update());
    }

    #[test]
    fn test_drag_state_machine() {
        let mut c = controller();
        assert_eq!(c.mode(), DragMode::Idle);

        c.pointer_down(PointerButton::Primary, DVec2::new(100.0, 100.0));
        assert_eq!(c.mode(), DragMode::DraggingRotate);
        c.pointer_move(DVec2::new(190.0, 100.0));
        c.update();
        // 90 px of 1800 is a twentieth of a turn, to the left
        assert_relative_eq!(c.azimuth_angle(), TAU - TAU / 20.0, epsilon = 1e-9);
        c.pointer_up();
        assert_eq!(c.mode(), DragMode::Idle);

        c.pointer_move(DVec2::new(500.0, 500.0));
        assert!(!c.update());
    }

    #[test]
    fn test_zoom_drag() {
        let mut c = controller();
        c.pointer_down(PointerButton::Middle, DVec2::ZERO);
        assert_eq!(c.mode(), DragMode::DraggingZoom);
        c.pointer_move(DVec2::new(0.0, 5.0));
        c.update();
        assert!(c.radius() < 250.0);
        c.pointer_move(DVec2::new(0.0, -5.0));
        c.update();
        assert_relative_eq!(c.radius(), 250.0, epsilon = 1e-9);
    }

    #[test]
    fn test_secondary_button_does_not_drag() {
        let mut c = controller();
        c.pointer_down(PointerButton::Secondary, DVec2::ZERO);
        assert_eq!(c.mode(), DragMode::Idle);
    }

    #[test]
    fn test_arrow_keys() {
        let mut c = controller();
        c.arrow_key(ArrowKey::Right);
        c.update();
        assert_relative_eq!(c.azimuth_angle(), 0.1, epsilon = 1e-12);
        c.arrow_key(ArrowKey::Up);
        c.update();
        assert_relative_eq!(c.polar_angle(), PI / 2.0 - 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_follow_time_turns_once_per_day() {
        let mut c = controller();
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        c.follow_time(t);
        assert!(!c.update());
        c.follow_time(t + Duration::hours(6));
        c.update();
        assert_relative_eq!(c.azimuth_angle(), PI / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_config_validation() {
        assert!(CameraConfig::default().validate().is_ok());
        let inverted = CameraConfig {
            min_distance: 500.0,
            max_distance: 100.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
        let bad_polar = CameraConfig {
            min_polar_angle: 2.0,
            max_polar_angle: 1.0,
            ..Default::default()
        };
        assert!(bad_polar.validate().is_err());
    }
}
