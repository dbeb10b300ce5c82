//! Mouse look.

use crate::settings::Settings;
use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

/// Accumulated look angles in radians. Pitch is clamped just short of the
/// poles so the view never flips.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PlayerLook {
    pub yaw: f32,
    pub pitch: f32,
}

const PITCH_LIMIT: f32 = 1.54; // ~88 degrees

impl PlayerLook {
    /// Apply a mouse delta (pixels) to the look angles.
    pub fn apply_delta(&mut self, delta: Vec2) {
        const SCALE: f32 = 0.0022;
        self.yaw -= delta.x * SCALE;
        self.pitch = (self.pitch - delta.y * SCALE).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn camera_look(
    mut motion: EventReader<MouseMotion>,
    settings: Res<Settings>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut query: Query<(&mut Transform, &mut PlayerLook), With<Camera3d>>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    if window.cursor.grab_mode != CursorGrabMode::Locked {
        motion.clear();
        return;
    }

    let mut delta = Vec2::ZERO;
    for ev in motion.read() {
        delta += ev.delta;
    }
    if delta == Vec2::ZERO {
        return;
    }
    if settings.controls.invert_y {
        delta.y = -delta.y;
    }
    delta *= settings.controls.mouse_sensitivity;

    for (mut transform, mut look) in &mut query {
        look.apply_delta(delta);
        transform.rotation = Quat::from_euler(EulerRot::YXZ, look.yaw, look.pitch, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_clamps_at_the_poles() {
        let mut look = PlayerLook::default();
        look.apply_delta(Vec2::new(0.0, -100_000.0));
        assert!((look.pitch - PITCH_LIMIT).abs() < f32::EPSILON);
        look.apply_delta(Vec2::new(0.0, 100_000.0));
        assert!((look.pitch + PITCH_LIMIT).abs() < f32::EPSILON);
    }

    #[test]
    fn yaw_accumulates_without_bound() {
        let mut look = PlayerLook::default();
        for _ in 0..100 {
            look.apply_delta(Vec2::new(500.0, 0.0));
        }
        assert!(look.yaw < -1.0);
    }
}
