use bevy::prelude::*;

use crate::orbital::coordinates::km_to_display_units;

/// Mean Earth radius (km)
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Spawn the Earth sphere at the origin, sized in display units
pub fn spawn_earth(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let radius = km_to_display_units(EARTH_RADIUS_KM) as f32;
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.15, 0.35, 0.7),
        perceptual_roughness: 1.0,
        ..default()
    });

    commands.spawn((
        Mesh3d(meshes.add(Sphere::new(radius).mesh().uv(64, 32))),
        MeshMaterial3d(material),
        Transform::from_xyz(0.0, 0.0, 0.0),
        Visibility::Visible,
        Name::new("Earth"),
    ));
}
