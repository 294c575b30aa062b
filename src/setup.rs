use bevy::prelude::*;

use crate::input::FlightController;

/// The observer; its translation and forward vector feed the streaming core.
#[derive(Component)]
pub struct MainCamera;

pub fn setup(mut commands: Commands) {
    // 1) Sun
    commands.spawn((
        DirectionalLight {
            illuminance: 12_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::YXZ, 0.6, -0.9, 0.0)),
    ));

    // 2) Camera, starting well above the terrain and flying along +X
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 180.0, 0.0),
        MainCamera,
        FlightController {
            yaw: -std::f32::consts::FRAC_PI_2,
            pitch: 0.0,
            speed: 60.0,
        },
    ));
}
