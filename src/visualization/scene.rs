//! Bevy-backed render adapter and scene setup

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::GlobalAmbientLight;
use bevy::math::DVec3;
use bevy::prelude::*;
use std::collections::BTreeMap;

use super::{RenderAdapter, SegmentHandle};
use crate::core::DisplaySession;

/// Camera far plane (display units)
pub const FAR_PLANE: f32 = 20_000.0;

/// Marker for the camera driven by the orbit controller
#[derive(Component)]
pub struct MainCamera;

/// One live line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSegment {
    pub a: DVec3,
    pub b: DVec3,
    pub color: Color,
    pub opacity: f32,
}

/// Segment store and camera/light placement read by the drawing and sync
/// systems each frame.
#[derive(Debug, Default)]
pub struct SceneSegments {
    next_id: u64,
    segments: BTreeMap<SegmentHandle, SceneSegment>,
    camera_position: Option<DVec3>,
    light_position: Option<DVec3>,
    frame_requested: bool,
}

impl SceneSegment {
    /// False when both ends lie beyond the far plane, as the sun trace does.
    pub fn within_draw_distance(&self) -> bool {
        let limit = FAR_PLANE as f64;
        self.a.length() <= limit || self.b.length() <= limit
    }
}

impl SceneSegments {
    pub fn segments(&self) -> impl Iterator<Item = &SceneSegment> + '_ {
        self.segments.values()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn camera_position(&self) -> Option<DVec3> {
        self.camera_position
    }

    pub fn light_position(&self) -> Option<DVec3> {
        self.light_position
    }

    /// Returns and clears the pending frame request.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }
}

impl RenderAdapter for SceneSegments {
    fn create_segment(&mut self, a: DVec3, b: DVec3) -> SegmentHandle {
        self.next_id += 1;
        let handle = SegmentHandle(self.next_id);
        self.segments.insert(
            handle,
            SceneSegment {
                a,
                b,
                color: Color::WHITE,
                opacity: 1.0,
            },
        );
        handle
    }

    fn update_segment(&mut self, handle: SegmentHandle, a: DVec3, b: DVec3) {
        match self.segments.get_mut(&handle) {
            Some(segment) => {
                segment.a = a;
                segment.b = b;
            }
            None => warn!("update of unknown segment {:?}", handle),
        }
    }

    fn remove_segment(&mut self, handle: SegmentHandle) {
        if self.segments.remove(&handle).is_none() {
            warn!("removal of unknown segment {:?}", handle);
        }
    }

    fn set_style(&mut self, handle: SegmentHandle, opacity: f32, color: Color) {
        if let Some(segment) = self.segments.get_mut(&handle) {
            segment.opacity = opacity;
            segment.color = color;
        }
    }

    fn set_camera_position(&mut self, position: DVec3) {
        self.camera_position = Some(position);
    }

    fn set_light_position(&mut self, position: DVec3) {
        self.light_position = Some(position);
    }

    fn request_frame(&mut self) {
        self.frame_requested = true;
    }
}

pub type BevySession = DisplaySession<SceneSegments>;

/// The display session as an ECS resource
#[derive(Resource, Deref, DerefMut)]
pub struct SessionResource(pub BevySession);

/// Spawn the camera and lights
pub fn setup_scene(mut commands: Commands) {
    // Keep the night side visible
    commands.insert_resource(GlobalAmbientLight {
        brightness: 150.0,
        ..default()
    });

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            near: 0.5,
            far: FAR_PLANE,
            ..default()
        }),
        Camera {
            order: 0,
            clear_color: ClearColorConfig::Custom(Color::BLACK),
            ..default()
        },
        MainCamera,
        Tonemapping::TonyMcMapface,
        Transform::from_xyz(0.0, 0.0, 250.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            ..default()
        },
        super::SunLight,
        Transform::from_xyz(0.0, 0.0, 1_000.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Move the camera entity to the orbit controller's position
pub fn sync_camera_transform(
    session: Res<SessionResource>,
    mut cameras: Query<&mut Transform, With<MainCamera>>,
) {
    let Some(position) = session.renderer().camera_position() else {
        return;
    };
    let center = session.camera().center().as_vec3();
    for mut transform in cameras.iter_mut() {
        transform.translation = position.as_vec3();
        transform.look_at(center, Vec3::Y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_lifecycle() {
        let mut scene = SceneSegments::default();
        let handle = scene.create_segment(DVec3::ZERO, DVec3::X);
        scene.set_style(handle, 0.25, Color::BLACK);
        scene.update_segment(handle, DVec3::Y, DVec3::Z);

        let segment = *scene.segments().next().unwrap();
        assert_eq!(segment.a, DVec3::Y);
        assert_eq!(segment.b, DVec3::Z);
        assert_eq!(segment.opacity, 0.25);

        scene.remove_segment(handle);
        assert!(scene.is_empty());
        // unknown handles are tolerated
        scene.remove_segment(handle);
        scene.update_segment(handle, DVec3::ZERO, DVec3::ZERO);
    }

    #[test]
    fn test_far_segments_are_not_drawn() {
        let near = SceneSegment {
            a: DVec3::new(70.0, 0.0, 0.0),
            b: DVec3::new(0.0, 70.0, 0.0),
            color: Color::WHITE,
            opacity: 1.0,
        };
        assert!(near.within_draw_distance());

        // sun distance: 1 AU at 100 km per unit
        let sun = SceneSegment {
            a: DVec3::new(1.496e6, 0.0, 0.0),
            b: DVec3::new(1.496e6, 1.0e4, 0.0),
            ..near
        };
        assert!(!sun.within_draw_distance());
    }

    #[test]
    fn test_frame_request_is_consumed() {
        let mut scene = SceneSegments::default();
        assert!(!scene.take_frame_request());
        scene.request_frame();
        assert!(scene.take_frame_request());
        assert!(!scene.take_frame_request());
    }

    #[test]
    fn test_handles_are_unique() {
        let mut scene = SceneSegments::default();
        let a = scene.create_segment(DVec3::ZERO, DVec3::X);
        let b = scene.create_segment(DVec3::ZERO, DVec3::X);
        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);
    }
}
