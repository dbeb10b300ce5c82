//! Chunk streaming: the per-frame pipeline that keeps the world meshed
//! around the viewer.
//!
//! Each frame, in order: advance the game tick (water on even ticks, leaf
//! decay on wall time), drain finished worker jobs (bounded uploads),
//! enqueue missing cells nearest-first, remesh edited chunks from the dirty
//! list, rebuild a bounded number of dirty batches, and evict chunks far
//! outside the view distance.
//!
//! Worker jobs run on the async compute pool. A job owns a private `Chunk`,
//! runs terrain → skylight → staged meshing, and hands everything back as a
//! [`CompletedChunk`]; the map-owned record carries the `Generating` state
//! while the job is in flight and nothing else touches its grid. Jobs copy
//! the noise tables and terrain params by value — workers never hold a
//! reference into the world.

use super::{Chunk, ChunkEntity, ChunkState, CHUNK_SIZE_I32};
use crate::atlas::AtlasUVMap;
use crate::chunk::mesh::{build_chunk_mesh, ChunkMeshData, StagedBuffers};
use crate::material::VoxelMaterialHandles;
use crate::world::World;
use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, Task};

/// Maximum outstanding worker jobs; enqueueing simply resumes next frame
/// once the count drops.
pub const TASK_QUEUE_CAP: usize = 512;
/// New jobs started per frame, nearest-first.
const SPAWN_BUDGET_PER_FRAME: usize = 16;
/// Chunks this far beyond the view distance are evicted.
const EVICT_MARGIN: i32 = 2;
/// Dirty-chunk remeshes applied per frame.
const REMESH_BUDGET_PER_FRAME: usize = 8;

/// A finished generation job: the generated grid plus both staged passes.
pub struct CompletedChunk {
    pub chunk: Chunk,
    pub staged: ChunkMeshData,
}

pub struct ChunkJob {
    pub coords: (i32, i32),
    pub task: Task<CompletedChunk>,
}

/// In-flight worker jobs.
#[derive(Resource, Default)]
pub struct PendingChunks {
    pub jobs: Vec<ChunkJob>,
}

/// Cheap counters for the debug overlay and the periodic streaming log.
#[derive(Resource, Default)]
pub struct StreamingDiagnostics {
    pub last_log_seconds: f64,
    pub uploads_total: u64,
    pub evictions_total: u64,
    pub discarded_results: u64,
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct StreamChunksCtx<'w, 's> {
    pub camera_query: Query<'w, 's, &'static GlobalTransform, With<Camera3d>>,
    pub commands: Commands<'w, 's>,
    pub meshes: ResMut<'w, Assets<Mesh>>,
    pub world: ResMut<'w, World>,
    pub atlas: Option<Res<'w, AtlasUVMap>>,
    pub materials: Option<Res<'w, VoxelMaterialHandles>>,
    pub pending: ResMut<'w, PendingChunks>,
    pub time: Res<'w, Time>,
    pub diag: ResMut<'w, StreamingDiagnostics>,
}

/// Main streaming system, run every frame on the main thread.
#[allow(clippy::needless_pass_by_value)]
pub fn stream_chunks(mut ctx: StreamChunksCtx<'_, '_>) {
    let Some(atlas) = ctx.atlas.as_ref().map(|a| (**a).clone()) else {
        return;
    };
    let Some(materials) = ctx.materials.as_ref().map(|m| (**m).clone()) else {
        return;
    };
    let Ok(camera) = ctx.camera_query.get_single() else {
        return;
    };

    let pos = camera.translation();
    #[allow(clippy::cast_possible_truncation)]
    let center = (
        (pos.x / CHUNK_SIZE_I32 as f32).floor() as i32,
        (pos.z / CHUNK_SIZE_I32 as f32).floor() as i32,
    );
    ctx.world.center_chunk = center;

    ctx.world.game_tick = ctx.world.game_tick.wrapping_add(1);
    if ctx.world.game_tick % 2 == 0 {
        ctx.world.water_tick();
    }
    let now = ctx.time.elapsed_seconds_f64();
    ctx.world.leaf_decay_tick(now);

    drain_completed(&mut ctx, center, &materials);
    queue_generation(&mut ctx, center, &atlas);
    remesh_dirty(&mut ctx, &atlas, &materials);

    let budget = ctx.world.batch_rebuilds_per_frame;
    crate::batch::rebuild::rebuild_batches(
        &mut ctx.world,
        &mut ctx.commands,
        &mut ctx.meshes,
        &materials,
        budget,
    );

    evict_far_chunks(&mut ctx, center);

    if now - ctx.diag.last_log_seconds > 5.0 {
        ctx.diag.last_log_seconds = now;
        info!(
            "streaming: chunks={} jobs={} dirty={} batches={} water={} uploads={} evictions={}",
            ctx.world.chunks.len(),
            ctx.pending.jobs.len(),
            ctx.world.dirty_len(),
            ctx.world.batches.len(),
            ctx.world.water.len(),
            ctx.diag.uploads_total,
            ctx.diag.evictions_total,
        );
    }
}

/// Create records for wanted cells and spawn generation jobs nearest-first.
fn queue_generation(ctx: &mut StreamChunksCtx<'_, '_>, center: (i32, i32), atlas: &AtlasUVMap) {
    let view = ctx.world.view_distance;
    let mut wanted: Vec<(i32, i32, i64)> = Vec::new();
    for dz in -view..=view {
        for dx in -view..=view {
            let key = (center.0 + dx, center.1 + dz);
            let state = ctx
                .world
                .chunks
                .entry(key)
                .or_insert_with(|| Chunk::new(key.0, key.1))
                .state;
            if state == ChunkState::Empty {
                wanted.push((key.0, key.1, i64::from(dx) * i64::from(dx) + i64::from(dz) * i64::from(dz)));
            }
        }
    }
    wanted.sort_by_key(|&(_, _, d)| d);

    let pool = AsyncComputeTaskPool::get();
    let mut spawned = 0usize;
    for (cx, cz, _priority) in wanted {
        if ctx.pending.jobs.len() >= TASK_QUEUE_CAP || spawned >= SPAWN_BUDGET_PER_FRAME {
            break; // queue full; the cells stay Empty and retry next frame
        }
        if ctx.pending.jobs.iter().any(|j| j.coords == (cx, cz)) {
            continue;
        }

        let noise = ctx.world.noise.clone();
        let params = ctx.world.params.clone();
        let atlas = atlas.clone();
        let task = pool.spawn(async move {
            let mut chunk = Chunk::new(cx, cz);
            crate::terrain::generate_chunk(&mut chunk, &noise, &params);
            crate::chunk::light::compute_skylight(&mut chunk);
            let staged = build_chunk_mesh(&chunk, &atlas);
            CompletedChunk { chunk, staged }
        });

        if let Some(record) = ctx.world.chunks.get_mut(&(cx, cz)) {
            record.state = ChunkState::Generating;
        }
        ctx.pending.jobs.push(ChunkJob { coords: (cx, cz), task });
        spawned += 1;
    }
}

/// Move finished job results into the world and upload their meshes,
/// bounded by the per-frame upload budget.
fn drain_completed(
    ctx: &mut StreamChunksCtx<'_, '_>,
    center: (i32, i32),
    materials: &VoxelMaterialHandles,
) {
    let max_uploads = ctx.world.max_uploads_per_frame;
    let mut uploads = 0usize;
    let mut i = 0usize;
    while i < ctx.pending.jobs.len() {
        if uploads >= max_uploads {
            break;
        }
        if !ctx.pending.jobs[i].task.is_finished() {
            i += 1;
            continue;
        }
        let job = ctx.pending.jobs.swap_remove(i);
        let completed = futures::executor::block_on(job.task);
        let (cx, cz) = job.coords;

        let view = ctx.world.view_distance + EVICT_MARGIN;
        let wanted =
            (cx - center.0).abs().max((cz - center.1).abs()) <= view;
        if !wanted {
            // The viewer moved on while the job ran; drop the result and
            // the placeholder record with it.
            ctx.world.chunks.remove(&(cx, cz));
            ctx.diag.discarded_results += 1;
            continue;
        }

        let origin = completed.chunk.world_origin();
        let was_spawned;
        {
            let Some(record) = ctx.world.chunks.get_mut(&(cx, cz)) else {
                continue;
            };
            record.adopt_generated(completed.chunk);
            record.state = ChunkState::Ready;

            apply_pass(
                &mut ctx.commands,
                &mut ctx.meshes,
                &completed.staged.opaque,
                materials.opaque.clone(),
                origin,
                (cx, cz),
                &mut record.opaque_mesh,
                &mut record.opaque_entity,
            );
            apply_pass(
                &mut ctx.commands,
                &mut ctx.meshes,
                &completed.staged.transparent,
                materials.transparent.clone(),
                origin,
                (cx, cz),
                &mut record.transparent_mesh,
                &mut record.transparent_entity,
            );
            record.mesh_data = Some(completed.staged);
            record.state = ChunkState::Complete;
            was_spawned = record.has_spawned;
            record.has_spawned = true;
        }

        ctx.world.batches.register_coords(cx, cz);
        if !was_spawned {
            ctx.world.register_chunk_chests(cx, cz);
        }
        ctx.diag.uploads_total += 1;
        uploads += 1;
    }
}

/// Upload or refresh one render pass of a chunk (or clear it when the
/// staged pass came back empty).
#[allow(clippy::too_many_arguments)]
pub fn apply_pass(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    staged: &StagedBuffers,
    material: Handle<crate::material::VoxelExtendedMaterial>,
    origin: Vec3,
    coords: (i32, i32),
    mesh_slot: &mut Option<Handle<Mesh>>,
    entity_slot: &mut Option<Entity>,
) {
    if staged.is_empty() {
        if let Some(handle) = mesh_slot.take() {
            meshes.remove(&handle);
        }
        if let Some(entity) = entity_slot.take() {
            commands.entity(entity).despawn();
        }
        return;
    }

    let mesh = staged.clone().into_mesh();
    match mesh_slot.as_ref() {
        Some(handle) => {
            if let Some(existing) = meshes.get_mut(handle) {
                *existing = mesh;
            } else {
                let handle = meshes.add(mesh);
                *mesh_slot = Some(handle.clone());
                if let Some(entity) = entity_slot.as_ref() {
                    commands.entity(*entity).insert(handle);
                }
            }
        }
        None => {
            let handle = meshes.add(mesh);
            *mesh_slot = Some(handle.clone());
            let entity = commands
                .spawn((
                    MaterialMeshBundle {
                        mesh: handle,
                        material,
                        transform: Transform::from_translation(origin),
                        ..default()
                    },
                    ChunkEntity { chunk_x: coords.0, chunk_z: coords.1 },
                ))
                .id();
            *entity_slot = Some(entity);
        }
    }
}

/// Synchronously remesh edited chunks from the dirty list.
///
/// Chunks not yet `Complete` stay queued for a later frame; everything else
/// is rebuilt in place and its batch invalidated.
fn remesh_dirty(
    ctx: &mut StreamChunksCtx<'_, '_>,
    atlas: &AtlasUVMap,
    materials: &VoxelMaterialHandles,
) {
    let mut remaining = ctx.world.dirty_len().min(REMESH_BUDGET_PER_FRAME * 4);
    let mut remeshed = 0usize;
    while remaining > 0 && remeshed < REMESH_BUDGET_PER_FRAME {
        remaining -= 1;
        let Some((cx, cz)) = ctx.world.pop_dirty() else {
            break;
        };
        let Some(record) = ctx.world.chunks.get_mut(&(cx, cz)) else {
            continue; // evicted while queued
        };
        if record.state != ChunkState::Complete {
            ctx.world.push_dirty(cx, cz);
            continue;
        }
        if !record.needs_remesh {
            record.in_dirty_list = false;
            continue;
        }

        let staged = build_chunk_mesh(record, atlas);
        let origin = record.world_origin();
        apply_pass(
            &mut ctx.commands,
            &mut ctx.meshes,
            &staged.opaque,
            materials.opaque.clone(),
            origin,
            (cx, cz),
            &mut record.opaque_mesh,
            &mut record.opaque_entity,
        );
        apply_pass(
            &mut ctx.commands,
            &mut ctx.meshes,
            &staged.transparent,
            materials.transparent.clone(),
            origin,
            (cx, cz),
            &mut record.transparent_mesh,
            &mut record.transparent_entity,
        );
        record.mesh_data = Some(staged);
        record.needs_remesh = false;
        record.in_dirty_list = false;
        ctx.world.batches.invalidate(cx, cz);
        remeshed += 1;
    }
}

/// Drop chunks far outside the view distance. Generating chunks are left
/// alone; their results are discarded on drain instead.
fn evict_far_chunks(ctx: &mut StreamChunksCtx<'_, '_>, center: (i32, i32)) {
    let limit = ctx.world.view_distance + EVICT_MARGIN;
    let to_remove: Vec<(i32, i32)> = ctx
        .world
        .chunks
        .iter()
        .filter(|((cx, cz), chunk)| {
            chunk.state != ChunkState::Generating
                && (cx - center.0).abs().max((cz - center.1).abs()) > limit
        })
        .map(|(k, _)| *k)
        .collect();

    for (cx, cz) in to_remove {
        let Some(chunk) = ctx.world.chunks.remove(&(cx, cz)) else {
            continue;
        };
        ctx.world.batches.unregister_coords(cx, cz);
        for handle in [chunk.opaque_mesh, chunk.transparent_mesh].into_iter().flatten() {
            ctx.meshes.remove(&handle);
        }
        for entity in [chunk.opaque_entity, chunk.transparent_entity]
            .into_iter()
            .flatten()
        {
            ctx.commands.entity(entity).despawn();
        }
        ctx.diag.evictions_total += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainParams;

    /// The worker job body, run synchronously: generation, lighting and
    /// staged meshing must compose without the task pool.
    #[test]
    fn worker_job_pipeline_produces_a_complete_result() {
        let noise = crate::noise::WorldNoise::new(42);
        let params = TerrainParams::default();
        let atlas = AtlasUVMap::default();

        let mut chunk = Chunk::new(0, 0);
        crate::terrain::generate_chunk(&mut chunk, &noise, &params);
        crate::chunk::light::compute_skylight(&mut chunk);
        let staged = build_chunk_mesh(&chunk, &atlas);

        assert!(!chunk.is_empty(), "default terrain at origin has ground");
        assert!(
            staged.opaque.vertex_count() > 0,
            "non-empty chunk must stage opaque geometry"
        );
        assert_eq!(staged.opaque.indices.len() % 6, 0);
    }

    #[test]
    fn all_air_chunk_stages_no_geometry() {
        let atlas = AtlasUVMap::default();
        let chunk = Chunk::new(0, 0);
        let staged = build_chunk_mesh(&chunk, &atlas);
        assert!(chunk.is_empty());
        assert!(staged.opaque.is_empty());
        assert!(staged.transparent.is_empty());
    }

    #[test]
    fn priority_ordering_is_ascending_distance_squared() {
        let mut wanted = vec![(5, 0, 25i64), (1, 0, 1), (3, 0, 9), (0, 0, 0)];
        wanted.sort_by_key(|&(_, _, d)| d);
        let coords: Vec<i32> = wanted.iter().map(|w| w.0).collect();
        assert_eq!(coords, vec![0, 1, 3, 5]);
    }
}
