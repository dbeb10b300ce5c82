//! Startup: atlas, materials, camera, sun, and the initial spawn area.

use regolith::atlas::{build_block_atlas, AtlasTextureHandle};
use regolith::chunk::streaming::apply_pass;
use regolith::chunk::{Chunk, ChunkState};
use regolith::lighting::{compute_daylight, fog_color, fog_distances};
use regolith::material::{make_pass_materials, VoxelExtendedMaterial};
use regolith::player::{Player, PlayerLook};
use regolith::settings::Settings;
use regolith::terrain::terrain_height_at;
use regolith::world::World;
use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::pbr::{FogFalloff, FogSettings};
use bevy::prelude::*;
use bevy_atmosphere::plugin::AtmosphereCamera;
use rayon::prelude::*;

use super::lighting::{Sun, TimeOfDay};

/// Radius (in chunks) generated synchronously before the first frame so the
/// camera never hangs over void while the worker pipeline warms up.
const SPAWN_PREGEN_RADIUS: i32 = 1;

/// Perform initial world construction and spawn the core entities.
pub fn setup(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    mut materials: ResMut<Assets<VoxelExtendedMaterial>>,
    mut meshes: ResMut<Assets<Mesh>>,
    settings: Res<Settings>,
) {
    // Texture atlas and the two pass materials.
    let (atlas_image, uv_map) = build_block_atlas();
    let atlas_handle = images.add(atlas_image);
    let pass_materials = make_pass_materials(atlas_handle.clone(), &mut materials);
    commands.insert_resource(AtlasTextureHandle(atlas_handle));
    commands.insert_resource(uv_map.clone());
    commands.insert_resource(pass_materials.clone());

    // The world itself, tuned from settings.
    let mut world = World::new(settings.worldgen.seed, settings.worldgen.terrain.clone());
    world.view_distance = settings.graphics.view_distance as i32;
    world.max_uploads_per_frame = settings.performance.max_uploads_per_frame;
    world.batch_rebuilds_per_frame = settings.performance.batch_rebuilds_per_frame;

    // Spawn area: generate the immediate neighborhood in parallel and
    // upload it synchronously, so frame one has ground to stand on.
    let noise = world.noise.clone();
    let params = world.params.clone();
    let coords: Vec<(i32, i32)> = (-SPAWN_PREGEN_RADIUS..=SPAWN_PREGEN_RADIUS)
        .flat_map(|cz| (-SPAWN_PREGEN_RADIUS..=SPAWN_PREGEN_RADIUS).map(move |cx| (cx, cz)))
        .collect();
    let generated: Vec<(Chunk, regolith::chunk::ChunkMeshData)> = coords
        .par_iter()
        .map(|&(cx, cz)| {
            let mut chunk = Chunk::new(cx, cz);
            regolith::terrain::generate_chunk(&mut chunk, &noise, &params);
            regolith::chunk::light::compute_skylight(&mut chunk);
            let staged = regolith::chunk::mesh::build_chunk_mesh(&chunk, &uv_map);
            (chunk, staged)
        })
        .collect();

    for (chunk, staged) in generated {
        let (cx, cz) = (chunk.cx, chunk.cz);
        let origin = chunk.world_origin();
        let mut record = chunk;
        apply_pass(
            &mut commands,
            &mut meshes,
            &staged.opaque,
            pass_materials.opaque.clone(),
            origin,
            (cx, cz),
            &mut record.opaque_mesh,
            &mut record.opaque_entity,
        );
        apply_pass(
            &mut commands,
            &mut meshes,
            &staged.transparent,
            pass_materials.transparent.clone(),
            origin,
            (cx, cz),
            &mut record.transparent_mesh,
            &mut record.transparent_entity,
        );
        record.mesh_data = Some(staged);
        record.state = ChunkState::Complete;
        record.has_spawned = true;
        world.chunks.insert((cx, cz), record);
        world.batches.register_coords(cx, cz);
        world.register_chunk_chests(cx, cz);
    }

    // Camera above the spawn column.
    let spawn_height = terrain_height_at(&world.noise, &world.params, 8, 8);
    #[allow(clippy::cast_precision_loss)]
    let camera_pos = Vec3::new(8.5, spawn_height as f32 + 3.0, 8.5);

    let daylight = compute_daylight(8.0);
    let (fog_start, fog_end) = fog_distances(world.view_distance);
    let mut camera = commands.spawn((
        Camera3dBundle {
            transform: Transform::from_translation(camera_pos)
                .looking_at(camera_pos + Vec3::new(1.0, -0.2, 1.0), Vec3::Y),
            tonemapping: Tonemapping::TonyMcMapface,
            ..default()
        },
        FogSettings {
            color: fog_color(&daylight),
            falloff: FogFalloff::Linear { start: fog_start, end: fog_end },
            ..default()
        },
        Player,
        PlayerLook::default(),
    ));
    if settings.atmosphere.enabled {
        camera.insert(AtmosphereCamera::default());
    }

    // The sun; the daylight cycle re-aims it every frame.
    commands.spawn((
        DirectionalLightBundle {
            directional_light: DirectionalLight {
                illuminance: daylight.sun_illuminance,
                shadows_enabled: settings.graphics.shadows,
                ..default()
            },
            transform: Transform::default().looking_to(daylight.sun_direction, Vec3::Y),
            ..default()
        },
        Sun,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(
            daylight.ambient_color.x,
            daylight.ambient_color.y,
            daylight.ambient_color.z,
        ),
        brightness: daylight.ambient_brightness * 500.0,
    });
    commands.insert_resource(TimeOfDay { hours: 8.0 });
    commands.insert_resource(world);
}
