//! RON file loading and change watching.
//!
//! Small helpers shared by the settings loader: read one RON file into a
//! deserializable type, and watch a directory so edits made while the game
//! runs are picked up on the next frame (hot reload).

use bevy::prelude::Resource;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// File-watcher resource for RON hot reload.
#[derive(Resource)]
pub struct RonWatcher {
    /// Set to `true` by the watcher thread when a watched file changes.
    pub changed: Arc<Mutex<bool>>,
    _watcher: Option<RecommendedWatcher>,
}

impl RonWatcher {
    /// A watcher that never fires. Fallback when the OS watcher cannot be
    /// created; hot reload is a development convenience, not a requirement.
    #[must_use]
    pub fn stub() -> Self {
        RonWatcher { changed: Arc::new(Mutex::new(false)), _watcher: None }
    }

    /// Consume and reset the changed flag.
    pub fn take_changed(&self) -> bool {
        let mut guard = match self.changed.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut guard)
    }
}

/// Load one RON file. Returns `None` (with a logged warning) on missing
/// files or parse errors so callers can fall back to defaults.
#[must_use]
pub fn load_ron_file<T: DeserializeOwned>(path: &str) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            bevy::log::warn!("could not read {path}: {e}");
            return None;
        }
    };
    match ron::from_str::<T>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            bevy::log::warn!("failed to parse {path}: {e}");
            None
        }
    }
}

/// Watch a directory for modifications to any file under it.
///
/// # Errors
/// Returns the `notify` error when the OS watcher cannot be registered.
pub fn setup_ron_watcher(path: &str) -> Result<RonWatcher, notify::Error> {
    let changed = Arc::new(Mutex::new(false));
    let changed_clone = changed.clone();
    let watched_path: PathBuf =
        std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, notify::EventKind::Modify(_)) {
                    let relevant = event.paths.iter().any(|p| {
                        std::fs::canonicalize(p)
                            .unwrap_or_else(|_| p.clone())
                            .starts_with(&watched_path)
                    });
                    if relevant {
                        if let Ok(mut flag) = changed_clone.lock() {
                            *flag = true;
                        }
                    }
                }
            }
            Err(e) => bevy::log::warn!("ron watch error: {e}"),
        },
        Config::default(),
    )?;

    watcher.watch(Path::new(path), RecursiveMode::NonRecursive)?;
    Ok(RonWatcher { changed, _watcher: Some(watcher) })
}
