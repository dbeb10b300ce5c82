//! Settings: types and defaults.
//!
//! Settings live in `data/settings/settings.ron` and hot-reload through the
//! RON watcher. Every field has a serde default so a partial (or missing)
//! file still yields a playable configuration.

use crate::terrain::TerrainParams;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

pub mod loader;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Cap FPS to the display refresh rate.
    #[serde(default = "GraphicsSettings::default_view_distance")]
    pub view_distance: u32, // Radius in chunks kept loaded around the camera.
    #[serde(default = "GraphicsSettings::default_shadows")]
    pub shadows: bool, // Directional light shadows.
}

impl GraphicsSettings {
    fn default_vsync() -> bool {
        true
    }
    fn default_view_distance() -> u32 {
        8
    }
    fn default_shadows() -> bool {
        true
    }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            vsync: Self::default_vsync(),
            view_distance: Self::default_view_distance(),
            shadows: Self::default_shadows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default)]
    pub invert_y: bool, // Invert mouse Y axis.
    #[serde(default = "ControlsSettings::default_sensitivity")]
    pub mouse_sensitivity: f32, // Mouse look sensitivity multiplier.
    #[serde(default = "ControlsSettings::default_fly_speed")]
    pub fly_speed: f32, // Camera movement speed in blocks per second.
}

impl ControlsSettings {
    fn default_sensitivity() -> f32 {
        1.0
    }
    fn default_fly_speed() -> f32 {
        24.0
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            invert_y: false,
            mouse_sensitivity: Self::default_sensitivity(),
            fly_speed: Self::default_fly_speed(),
        }
    }
}

/// Per-frame work limits for the streaming pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceSettings {
    #[serde(default = "PerformanceSettings::default_max_uploads")]
    pub max_uploads_per_frame: usize, // GPU mesh uploads applied per frame.
    #[serde(default = "PerformanceSettings::default_batch_rebuilds")]
    pub batch_rebuilds_per_frame: usize, // Dirty batch rebuilds per frame.
}

impl PerformanceSettings {
    fn default_max_uploads() -> usize {
        4
    }
    fn default_batch_rebuilds() -> usize {
        4
    }
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            max_uploads_per_frame: Self::default_max_uploads(),
            batch_rebuilds_per_frame: Self::default_batch_rebuilds(),
        }
    }
}

/// Configuration for the bevy_atmosphere sky renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtmosphereSettings {
    #[serde(default = "AtmosphereSettings::default_enabled")]
    pub enabled: bool, // Requires a restart to take effect.
    #[serde(default = "AtmosphereSettings::default_resolution")]
    pub resolution: u32, // Skybox face resolution (multiple of 8).
    #[serde(default = "AtmosphereSettings::default_dithering")]
    pub dithering: bool, // Reduce sky color banding.
}

impl AtmosphereSettings {
    fn default_enabled() -> bool {
        true
    }
    fn default_resolution() -> u32 {
        512
    }
    fn default_dithering() -> bool {
        true
    }
}

impl Default for AtmosphereSettings {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            resolution: Self::default_resolution(),
            dithering: Self::default_dithering(),
        }
    }
}

/// World generation inputs: the seed, the day length and the full terrain
/// parameter block handed to every worker job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldGenSettings {
    #[serde(default = "WorldGenSettings::default_seed")]
    pub seed: u32, // World seed; same seed, same world.
    #[serde(default = "WorldGenSettings::default_day_length")]
    pub day_length_seconds: f32, // Real seconds for one 24h cycle.
    #[serde(default)]
    pub terrain: TerrainParams,
}

impl WorldGenSettings {
    fn default_seed() -> u32 {
        42
    }
    fn default_day_length() -> f32 {
        1_200.0
    }
}

impl Default for WorldGenSettings {
    fn default() -> Self {
        Self {
            seed: Self::default_seed(),
            day_length_seconds: Self::default_day_length(),
            terrain: TerrainParams::default(),
        }
    }
}

/// Top-level settings resource.
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub performance: PerformanceSettings,
    #[serde(default)]
    pub atmosphere: AtmosphereSettings,
    #[serde(default)]
    pub worldgen: WorldGenSettings,
}
