//! Fly-style camera movement.

use crate::settings::Settings;
use bevy::prelude::*;

#[allow(clippy::needless_pass_by_value)]
pub fn camera_movement(
    keys: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    settings: Res<Settings>,
    mut query: Query<&mut Transform, With<Camera3d>>,
) {
    let Ok(mut transform) = query.get_single_mut() else {
        return;
    };

    let forward = *transform.forward();
    let right = *transform.right();
    let mut wish = Vec3::ZERO;
    if keys.pressed(KeyCode::KeyW) {
        wish += forward;
    }
    if keys.pressed(KeyCode::KeyS) {
        wish -= forward;
    }
    if keys.pressed(KeyCode::KeyD) {
        wish += right;
    }
    if keys.pressed(KeyCode::KeyA) {
        wish -= right;
    }
    if keys.pressed(KeyCode::Space) {
        wish += Vec3::Y;
    }
    if keys.pressed(KeyCode::ShiftLeft) {
        wish -= Vec3::Y;
    }
    if wish == Vec3::ZERO {
        return;
    }

    let mut speed = settings.controls.fly_speed;
    if keys.pressed(KeyCode::ControlLeft) {
        speed *= 4.0;
    }
    transform.translation += wish.normalize() * speed * time.delta_seconds();
}
