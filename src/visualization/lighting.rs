//! Lighting systems

use bevy::prelude::*;

use super::scene::SessionResource;

/// Marker component for the sun directional light
#[derive(Component)]
pub struct SunLight;

/// Distance of the light entity from the origin. Irrelevant to a
/// directional light's intensity.
const LIGHT_DISTANCE: f32 = 1_000.0;

/// Point the sun light along the newest sun trace position
pub fn sync_sun_light(
    session: Res<SessionResource>,
    mut lights: Query<&mut Transform, With<SunLight>>,
) {
    let Some(position) = session.renderer().light_position() else {
        return;
    };
    let dir = position.normalize_or_zero().as_vec3();
    if dir.length_squared() == 0.0 {
        return;
    }

    for mut transform in lights.iter_mut() {
        transform.translation = dir * LIGHT_DISTANCE;
        // -Z toward the Earth
        transform.look_at(Vec3::ZERO, Vec3::Y);
    }
}
