//! Frame-by-frame daylight application.
//!
//! Advances the world clock, then pushes the pure daylight math from
//! `regolith::lighting` into everything that consumes it: the sun light, the
//! ambient level, the camera fog (with the underwater override) and the
//! voxel material uniforms.

use regolith::block::BlockType;
use regolith::lighting::{compute_daylight, fog_color, fog_distances};
use regolith::material::{VoxelExtendedMaterial, VoxelMaterialHandles};
use regolith::settings::Settings;
use regolith::world::World;
use bevy::pbr::{FogFalloff, FogSettings};
use bevy::prelude::*;
use bevy_atmosphere::prelude::{AtmosphereModel, Nishita};

/// World clock in hours, `[0, 24)`.
#[derive(Resource)]
pub struct TimeOfDay {
    pub hours: f32,
}

/// Marker for the directional sun light.
#[derive(Component)]
pub struct Sun;

#[derive(bevy::ecs::system::SystemParam)]
pub struct DaylightCtx<'w, 's> {
    pub time: Res<'w, Time>,
    pub settings: Res<'w, Settings>,
    pub tod: ResMut<'w, TimeOfDay>,
    pub ambient: ResMut<'w, AmbientLight>,
    pub world: Option<Res<'w, World>>,
    pub materials: ResMut<'w, Assets<VoxelExtendedMaterial>>,
    pub handles: Option<Res<'w, VoxelMaterialHandles>>,
    pub atmosphere: Option<ResMut<'w, AtmosphereModel>>,
    pub sun_query: Query<'w, 's, (&'static mut Transform, &'static mut DirectionalLight), With<Sun>>,
    pub fog_query: Query<
        'w,
        's,
        (&'static mut FogSettings, &'static GlobalTransform),
        (With<Camera3d>, Without<Sun>),
    >,
}

/// Advance the clock and apply the daylight curve.
#[allow(clippy::needless_pass_by_value)]
pub fn daylight_cycle(mut ctx: DaylightCtx<'_, '_>) {
    let Some(world) = ctx.world.as_ref() else {
        return;
    };

    let day_length = ctx.settings.worldgen.day_length_seconds.max(1.0);
    ctx.tod.hours = (ctx.tod.hours + ctx.time.delta_seconds() * 24.0 / day_length).rem_euclid(24.0);
    let info = compute_daylight(ctx.tod.hours);

    for (mut transform, mut light) in &mut ctx.sun_query {
        *transform = Transform::default().looking_to(info.sun_direction, Vec3::Y);
        light.illuminance = info.sun_illuminance;
        light.color = Color::srgb(info.sun_color.x, info.sun_color.y, info.sun_color.z);
        light.shadows_enabled = ctx.settings.graphics.shadows && !info.is_night;
    }

    ctx.ambient.color = Color::srgb(
        info.ambient_color.x,
        info.ambient_color.y,
        info.ambient_color.z,
    );
    ctx.ambient.brightness = info.ambient_brightness * 500.0;

    // Fog follows the view distance and flips to a dense blue underwater.
    let mut underwater = false;
    for (mut fog, camera_tf) in &mut ctx.fog_query {
        let eye = camera_tf.translation();
        #[allow(clippy::cast_possible_truncation)]
        let cell = (
            eye.x.floor() as i32,
            eye.y.floor() as i32,
            eye.z.floor() as i32,
        );
        underwater = world.get_block(cell.0, cell.1, cell.2).kind == BlockType::Water;
        if underwater {
            fog.color = Color::srgb(0.1, 0.25, 0.45);
            fog.falloff = FogFalloff::Linear { start: 2.0, end: 28.0 };
        } else {
            let (start, end) = fog_distances(world.view_distance);
            fog.color = fog_color(&info);
            fog.falloff = FogFalloff::Linear { start, end };
        }
    }

    if let Some(handles) = ctx.handles.as_ref() {
        for handle in [&handles.opaque, &handles.transparent] {
            if let Some(material) = ctx.materials.get_mut(&*handle) {
                material.extension.ambient_tint = info.ambient_tint;
                material.extension.underwater = u32::from(underwater);
                material.extension.time = ctx.time.elapsed_seconds();
            }
        }
    }

    if let Some(atmosphere) = ctx.atmosphere.as_mut() {
        // Nishita wants the direction toward the sun.
        **atmosphere = AtmosphereModel::new(Nishita {
            sun_position: -info.sun_direction,
            ..Nishita::default()
        });
    }
}
