use bevy::prelude::*;
use meadow::grass::{GrassSettings, GrassViewer};

use crate::input::CameraOrbit;

#[derive(Component)]
pub struct MainCamera;

pub fn setup(
    mut commands: Commands,
    settings: Res<GrassSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // 1) Light
    commands.spawn((
        DirectionalLight {
            illuminance: 12_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(30.0, 60.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // 2) Ground under the field
    let size = settings.field_size;
    commands.spawn((
        Name::new("Ground"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(size, size))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.22, 0.17, 0.11),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::default(),
    ));

    // 3) Camera, starting outside the LOD radius of the far tiles
    let radius = settings.field_size * 0.6;
    let yaw = std::f32::consts::FRAC_PI_4;
    let pitch = 0.45_f32;
    let orbit = CameraOrbit { focus: Vec3::ZERO, radius, yaw, pitch };
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(orbit.eye()).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
        GrassViewer,
        orbit,
    ));
}
