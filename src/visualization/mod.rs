//! Visualization module
//!
//! The rendering engine is reached only through [`RenderAdapter`]: traces
//! create, update, restyle and remove line segments, the session places the
//! camera and the sun light and asks for frames. [`scene::SceneSegments`] is
//! the Bevy-backed adapter; the systems in this module push its state into
//! the ECS world.

use bevy::color::Color;
use bevy::math::DVec3;
use bevy::prelude::*;

pub mod earth;
pub mod lighting;
pub mod scene;
pub mod trace_gizmo;

pub use earth::{EARTH_RADIUS_KM, spawn_earth};
pub use lighting::{SunLight, sync_sun_light};
pub use scene::{MainCamera, SceneSegments, SessionResource, setup_scene, sync_camera_transform};
pub use trace_gizmo::draw_trace_segments;

/// Opaque id of a line-segment primitive owned by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentHandle(pub u64);

/// Capability interface to the rendering engine.
pub trait RenderAdapter {
    fn create_segment(&mut self, a: DVec3, b: DVec3) -> SegmentHandle;
    fn update_segment(&mut self, handle: SegmentHandle, a: DVec3, b: DVec3);
    fn remove_segment(&mut self, handle: SegmentHandle);
    fn set_style(&mut self, handle: SegmentHandle, opacity: f32, color: Color);
    fn set_camera_position(&mut self, position: DVec3);
    fn set_light_position(&mut self, position: DVec3);
    fn request_frame(&mut self);
}

/// Plugin for visualization systems
pub struct VisualizationPlugin;

impl Plugin for VisualizationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_scene, spawn_earth)).add_systems(
            PostUpdate,
            (sync_camera_transform, sync_sun_light, draw_trace_segments)
                .after(crate::core::frame_update_system),
        );
    }
}
