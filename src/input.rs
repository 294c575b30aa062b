use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::prelude::*;

use crate::actions::{ActionState, PlayerAction};
use crate::elevation::HeightSampler;
use crate::setup::MainCamera;
use crate::terrain::TerrainStreamer;

pub const MIN_SPEED: f32 = 20.0;
pub const MAX_SPEED: f32 = 400.0;
pub const THROTTLE_RATE: f32 = 90.0;
pub const TURN_RATE: f32 = 0.9;
pub const PITCH_RATE: f32 = 0.7;
pub const MAX_PITCH: f32 = 1.2;
/// Minimum height above the ground (or water) the camera may fly.
pub const MIN_CLEARANCE: f32 = 6.0;
pub const MAX_FLIGHT_DT: f32 = 0.05; // never use a dt larger than 50ms

/// Simple flight kinematics: yaw/pitch angles plus forward speed, integrated
/// each frame. Not part of the streaming core; its pose is what the core
/// reads as the observer.
#[derive(Component)]
pub struct FlightController {
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
}

pub fn input_mapping_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut action_state: ResMut<ActionState>,
) {
    action_state.set(
        PlayerAction::PitchDown,
        keys.pressed(KeyCode::KeyW) || keys.pressed(KeyCode::ArrowUp),
    );
    action_state.set(
        PlayerAction::PitchUp,
        keys.pressed(KeyCode::KeyS) || keys.pressed(KeyCode::ArrowDown),
    );
    action_state.set(
        PlayerAction::YawLeft,
        keys.pressed(KeyCode::KeyA) || keys.pressed(KeyCode::ArrowLeft),
    );
    action_state.set(
        PlayerAction::YawRight,
        keys.pressed(KeyCode::KeyD) || keys.pressed(KeyCode::ArrowRight),
    );
    action_state.set(PlayerAction::Accelerate, keys.pressed(KeyCode::ShiftLeft));
    action_state.set(PlayerAction::Decelerate, keys.pressed(KeyCode::ControlLeft));
}

pub fn flight_controller(
    time: Res<Time>,
    action_state: Res<ActionState>,
    streamer: Res<TerrainStreamer>,
    mut query: Query<(&mut Transform, &mut FlightController), With<MainCamera>>,
) {
    // 0) Clamp delta
    let mut dt = time.delta_secs();
    if dt > MAX_FLIGHT_DT {
        dt = MAX_FLIGHT_DT;
    }

    let Ok((mut tf, mut flight)) = query.single_mut() else { return };

    // 1) Steering
    if action_state.pressed(PlayerAction::YawLeft) {
        flight.yaw += TURN_RATE * dt;
    }
    if action_state.pressed(PlayerAction::YawRight) {
        flight.yaw -= TURN_RATE * dt;
    }
    if action_state.pressed(PlayerAction::PitchDown) {
        flight.pitch -= PITCH_RATE * dt;
    }
    if action_state.pressed(PlayerAction::PitchUp) {
        flight.pitch += PITCH_RATE * dt;
    }
    flight.pitch = flight.pitch.clamp(-MAX_PITCH, MAX_PITCH);

    // 2) Throttle
    if action_state.pressed(PlayerAction::Accelerate) {
        flight.speed += THROTTLE_RATE * dt;
    }
    if action_state.pressed(PlayerAction::Decelerate) {
        flight.speed -= THROTTLE_RATE * dt;
    }
    flight.speed = flight.speed.clamp(MIN_SPEED, MAX_SPEED);

    // 3) Integrate position along the nose direction
    let rotation = Quat::from_euler(EulerRot::YXZ, flight.yaw, flight.pitch, 0.0);
    let nose = rotation * -Vec3::Z;
    tf.translation += nose * flight.speed * dt;

    // 4) Prevent flying into the ground (or under a lake surface)
    let terrain = &streamer.0;
    let ground = terrain
        .field()
        .elevation(tf.translation.x, tf.translation.z)
        .max(terrain.settings().water_level);
    if tf.translation.y < ground + MIN_CLEARANCE {
        tf.translation.y = ground + MIN_CLEARANCE;
    }

    tf.rotation = rotation;
}
