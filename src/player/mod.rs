//! The viewer: a fly camera whose chunk position drives world streaming.

pub mod camera;
pub mod movement;

pub use camera::{camera_look, PlayerLook};
pub use movement::camera_movement;

use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

/// Marker for the player camera entity.
#[derive(Component)]
pub struct Player;

/// Click to capture the cursor, Escape to release it. Look and interaction
/// systems only run while the cursor is locked.
#[allow(clippy::needless_pass_by_value)]
pub fn cursor_grab(
    mouse: Res<ButtonInput<MouseButton>>,
    keys: Res<ButtonInput<KeyCode>>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let Ok(mut window) = windows.get_single_mut() else {
        return;
    };
    if mouse.just_pressed(MouseButton::Left) && window.cursor.grab_mode != CursorGrabMode::Locked {
        window.cursor.grab_mode = CursorGrabMode::Locked;
        window.cursor.visible = false;
    }
    if keys.just_pressed(KeyCode::Escape) {
        window.cursor.grab_mode = CursorGrabMode::None;
        window.cursor.visible = true;
    }
}
