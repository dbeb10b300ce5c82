//! Window presentation settings sync.

use regolith::settings::Settings;
use bevy::prelude::*;
use bevy::window::{PresentMode, PrimaryWindow, Window};

#[allow(clippy::needless_pass_by_value)]
pub fn sync_vsync_settings(
    settings: Res<Settings>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !settings.is_changed() {
        return;
    }
    for mut window in &mut windows {
        let wanted = if settings.graphics.vsync {
            PresentMode::AutoVsync
        } else {
            PresentMode::AutoNoVsync
        };
        if window.present_mode != wanted {
            window.present_mode = wanted;
        }
    }
}
