//! Atmosphere renderer settings sync (resolution and dithering only; the
//! enabled flag needs a restart because the plugin is added at startup).

use regolith::settings::Settings;
use bevy::prelude::*;
use bevy_atmosphere::settings::AtmosphereSettings as AtmosphereRenderSettings;

#[allow(clippy::needless_pass_by_value)]
pub fn sync_atmosphere_settings(
    settings: Res<Settings>,
    atmosphere: Option<ResMut<AtmosphereRenderSettings>>,
) {
    if !settings.is_changed() {
        return;
    }
    let Some(mut atmosphere) = atmosphere else {
        return;
    };
    if atmosphere.resolution != settings.atmosphere.resolution {
        atmosphere.resolution = settings.atmosphere.resolution;
    }
    if atmosphere.dithering != settings.atmosphere.dithering {
        atmosphere.dithering = settings.atmosphere.dithering;
    }
}
