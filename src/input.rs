use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::prelude::*;
use std::collections::HashMap;

use crate::setup::MainCamera;

pub const MOVE_SPEED: f32 = 25.0;
pub const ROTATE_SPEED: f32 = 0.2;
pub const MAX_CAMERA_DT: f32 = 0.05; // never use a dt larger than 50ms
pub const MIN_EYE_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanAction {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Default, Resource)]
pub struct PanInput {
    pressed: HashMap<PanAction, bool>,
}

impl PanInput {
    pub fn set(&mut self, action: PanAction, is_pressed: bool) {
        self.pressed.insert(action, is_pressed);
    }

    pub fn pressed(&self, action: PanAction) -> bool {
        self.pressed.get(&action).copied().unwrap_or(false)
    }
}

#[derive(Component, Clone, Copy, Debug)]
pub struct CameraOrbit {
    pub focus: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl CameraOrbit {
    /// World position of the camera for the current orbit parameters.
    pub fn eye(&self) -> Vec3 {
        let xz_radius = self.radius * self.pitch.cos();
        self.focus
            + Vec3::new(
                xz_radius * self.yaw.cos(),
                self.radius * self.pitch.sin(),
                xz_radius * self.yaw.sin(),
            )
    }
}

pub fn map_pan_keys(keys: Res<ButtonInput<KeyCode>>, mut pan: ResMut<PanInput>) {
    pan.set(PanAction::Forward, keys.pressed(KeyCode::KeyW));
    pan.set(PanAction::Backward, keys.pressed(KeyCode::KeyS));
    pan.set(PanAction::Left, keys.pressed(KeyCode::KeyA));
    pan.set(PanAction::Right, keys.pressed(KeyCode::KeyD));
}

pub fn camera_controller(
    time: Res<Time>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut motion_evr: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    pan: Res<PanInput>,
    mut query: Query<(&mut Transform, &mut CameraOrbit), With<MainCamera>>,
) {
    let dt = time.delta_secs().min(MAX_CAMERA_DT);
    let Ok((mut tf, mut orbit)) = query.single_mut() else { return; };
    let before = *orbit;

    // 1) Camera-relative pan on the ground plane
    let forward = Vec2::new(-orbit.yaw.cos(), -orbit.yaw.sin());
    let right = Vec2::new(-forward.y, forward.x);

    let mut dir = Vec2::ZERO;
    if pan.pressed(PanAction::Forward) { dir += forward; }
    if pan.pressed(PanAction::Backward) { dir -= forward; }
    if pan.pressed(PanAction::Left) { dir -= right; }
    if pan.pressed(PanAction::Right) { dir += right; }

    if dir != Vec2::ZERO {
        let delta = dir.normalize() * MOVE_SPEED * dt;
        orbit.focus.x += delta.x;
        orbit.focus.z += delta.y;
    }

    // 2) Zoom
    for ev in scroll_evr.read() {
        let amount = match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.02,
        };
        orbit.radius = (orbit.radius - amount).clamp(2.0, 400.0);
    }

    // 3) Orbit
    if mouse_buttons.pressed(MouseButton::Middle) {
        for ev in motion_evr.read() {
            orbit.yaw += ev.delta.x * ROTATE_SPEED * dt;
            orbit.pitch += ev.delta.y * ROTATE_SPEED * dt;
        }
    } else {
        motion_evr.clear();
    }

    orbit.pitch = orbit.pitch.clamp(0.05, std::f32::consts::FRAC_PI_2 - 0.01);

    // Only touch the transform on real input so the grass LOD is not
    // re-evaluated every frame.
    if orbit.focus == before.focus
        && orbit.radius == before.radius
        && orbit.yaw == before.yaw
        && orbit.pitch == before.pitch
    {
        return;
    }

    // 4) Position camera, never below the ground
    let mut eye = orbit.eye();
    eye.y = eye.y.max(MIN_EYE_HEIGHT);
    tf.translation = eye;
    tf.look_at(orbit.focus, Vec3::Y);
}
