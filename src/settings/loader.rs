//! Settings loading and hot reload.

use super::Settings;
use crate::ron::{load_ron_file, setup_ron_watcher, RonWatcher};
use bevy::prelude::*;

const SETTINGS_FILE: &str = "data/settings/settings.ron";
const SETTINGS_DIR: &str = "data/settings";

/// Watcher resource dedicated to the settings directory.
#[derive(Resource)]
pub struct SettingsWatcher(pub RonWatcher);

impl SettingsWatcher {
    #[must_use]
    pub fn stub() -> Self {
        SettingsWatcher(RonWatcher::stub())
    }
}

/// Load settings from disk, falling back to defaults when the file is
/// missing or unparsable.
#[must_use]
pub fn load_settings() -> Settings {
    load_ron_file(SETTINGS_FILE).unwrap_or_default()
}

/// Create the settings watcher.
///
/// # Errors
/// Propagates the `notify` error; callers fall back to [`SettingsWatcher::stub`].
pub fn setup_settings_watcher() -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(SETTINGS_DIR).map(SettingsWatcher)
}

/// Reload the settings resource when the file changed on disk. The sync
/// systems in `app` fan the new values out to the window, the world
/// tunables and the atmosphere.
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if watcher.0.take_changed() {
        *settings = load_settings();
        info!("settings reloaded from {SETTINGS_FILE}");
    }
}
