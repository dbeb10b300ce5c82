//! Pure time-of-day math: sun position, ambient light, fog.
//!
//! `compute_daylight` turns a clock value in `[0, 24)` into every lighting
//! parameter the renderer consumes. Deterministic and allocation-free, so
//! it is safe to call from benches and tests.

use crate::chunk::CHUNK_SIZE_I32;
use bevy::prelude::*;

/// Result of the daylight math for a single clock sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DaylightInfo {
    /// Sine of the solar altitude (-1 midnight .. 1 noon).
    pub sun_height: f32,
    pub is_night: bool,
    /// Dusk-to-night interpolation (0 day .. 1 night).
    pub night_factor: f32,

    /// Direction the sunlight travels (unit vector, pointing down at noon).
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub sun_illuminance: f32,

    pub ambient_color: Vec3,
    pub ambient_brightness: f32,
    /// Tint uniform for the voxel material (RGB color, A strength).
    pub ambient_tint: Vec4,

    /// Sky color at the horizon; fog derives from it.
    pub horizon_color: Vec3,
}

/// Smoothstep helper used throughout the daylight curves.
#[inline]
#[must_use]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Compute lighting parameters for a clock value in `[0, 24)`.
/// 6:00 is sunrise, 12:00 solar noon, 18:00 sunset.
#[must_use]
pub fn compute_daylight(time_of_day: f32) -> DaylightInfo {
    let tod = time_of_day.rem_euclid(24.0);
    let solar_angle = (tod - 6.0) / 12.0 * std::f32::consts::PI;
    let sun_height = solar_angle.sin();

    let night_factor = smoothstep((0.15 - sun_height) / 0.20);
    let is_night = sun_height < -0.05;

    // The sun travels east to west in the XY plane, tilted slightly south.
    let sun_direction =
        Vec3::new(-solar_angle.cos(), -sun_height.max(0.05), -0.3).normalize();

    let day_illuminance = if sun_height < 0.06 {
        let t = (sun_height + 0.06) / 0.12;
        400.0 + smoothstep(t) * 400.0
    } else {
        (1_200.0 + sun_height.max(0.0).powf(1.8) * 3_500.0).min(8_000.0)
    };
    let sun_illuminance = day_illuminance * (1.0 - night_factor);

    let day_color = if sun_height < 0.15 {
        let t = smoothstep((sun_height + 0.05) / 0.20);
        Vec3::new(1.0, 0.5, 0.3).lerp(Vec3::new(1.0, 0.85, 0.7), t)
    } else if sun_height < 0.4 {
        let t = smoothstep((sun_height - 0.15) / 0.25);
        Vec3::new(1.0, 0.85, 0.7).lerp(Vec3::new(1.0, 0.98, 0.95), t)
    } else {
        Vec3::new(1.0, 0.98, 0.95)
    };
    let sun_color = day_color.lerp(Vec3::new(0.6, 0.65, 0.85), night_factor);

    let ambient_color = if is_night {
        Vec3::new(0.04, 0.06, 0.10)
    } else {
        Vec3::new(0.95, 0.95, 1.0).lerp(sun_color, 0.08)
    };
    let ambient_brightness = if is_night {
        0.12
    } else if sun_height < 0.15 {
        0.12 + smoothstep((sun_height + 0.05) / 0.20) * 0.28
    } else {
        (0.32 + (sun_height - 0.15) * 0.18).min(0.65)
    };

    let solar = (sun_height + 1.0) * 0.5;
    let shadow_rgb = Vec3::splat(0.02) * (1.0 + (1.0 - solar) * 0.5) + sun_color * 0.02;
    let ambient_tint = Vec4::new(
        shadow_rgb.x,
        shadow_rgb.y,
        shadow_rgb.z,
        0.70 + (1.0 - solar) * 0.1,
    );

    let horizon_color = Vec3::new(0.55, 0.68, 0.85)
        .lerp(Vec3::new(0.95, 0.55, 0.35), smoothstep(1.0 - sun_height.abs() * 4.0))
        .lerp(Vec3::new(0.02, 0.03, 0.07), night_factor);

    DaylightInfo {
        sun_height,
        is_night,
        night_factor,
        sun_direction,
        sun_color,
        sun_illuminance,
        ambient_color,
        ambient_brightness,
        ambient_tint,
        horizon_color,
    }
}

/// Linear fog band for a view distance in chunks: geometry starts fading at
/// 80% of the loaded radius and is fully fogged past 120%.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fog_distances(view_distance: i32) -> (f32, f32) {
    let radius = (view_distance * CHUNK_SIZE_I32) as f32;
    (radius * 0.8, radius * 1.2)
}

/// Fog color: the horizon tint scaled by ambient brightness, so distant
/// geometry never reads brighter than nearby geometry.
#[must_use]
pub fn fog_color(info: &DaylightInfo) -> Color {
    let c = info.horizon_color * (info.ambient_brightness / 0.65).clamp(0.1, 1.0);
    Color::srgb(c.x, c.y, c.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noon_is_bright_and_midnight_is_dark() {
        let noon = compute_daylight(12.0);
        let midnight = compute_daylight(0.0);
        assert!(!noon.is_night);
        assert!(midnight.is_night);
        assert!(noon.ambient_brightness > midnight.ambient_brightness);
        assert!(noon.sun_illuminance > 1_000.0);
        assert!(midnight.sun_illuminance < 50.0);
    }

    #[test]
    fn clock_wraps_at_24() {
        assert_eq!(compute_daylight(1.5), compute_daylight(25.5));
    }

    #[test]
    fn brightness_is_continuous_across_dusk() {
        // No jump larger than what 6 simulated minutes can explain.
        let mut prev = compute_daylight(16.0).ambient_brightness;
        let mut t = 16.0;
        while t < 20.0 {
            t += 0.1;
            let next = compute_daylight(t).ambient_brightness;
            assert!((next - prev).abs() < 0.05, "brightness jump at {t}");
            prev = next;
        }
    }

    #[test]
    fn fog_band_scales_with_view_distance() {
        let (start, end) = fog_distances(8);
        assert!((start - 8.0 * 16.0 * 0.8).abs() < f32::EPSILON);
        assert!((end - 8.0 * 16.0 * 1.2).abs() < f32::EPSILON);
        assert!(start < end);
    }

    #[test]
    fn sun_direction_is_unit_and_downward_at_noon() {
        let noon = compute_daylight(12.0);
        assert!((noon.sun_direction.length() - 1.0).abs() < 1e-5);
        assert!(noon.sun_direction.y < -0.5);
    }
}
