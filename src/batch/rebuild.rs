//! Main-thread batch rebuilds and the batch/fallback visibility swap.

use super::{combine_pass, BatchEntity};
use crate::material::VoxelMaterialHandles;
use crate::world::World;
use bevy::prelude::*;

/// Rebuild up to `budget` dirty batches: concatenate the members' staged
/// buffers, upload one combined mesh per pass, and spawn/update the batch
/// entities. Batches that end up with no members are dropped entirely.
pub fn rebuild_batches(
    world: &mut World,
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &VoxelMaterialHandles,
    budget: usize,
) {
    // Split borrows: member mesh data lives in the chunk map, the batch
    // records in the batch table.
    let (chunks, batches) = world.chunks_and_batches();
    for _ in 0..budget {
        let Some(key) = batches.pop_dirty() else {
            break;
        };
        let Some(batch) = batches.batches.get_mut(&key) else {
            continue;
        };

        let mut members = Vec::new();
        for coords in batch.slots.iter().flatten() {
            if let Some(chunk) = chunks.get(coords) {
                if let Some(data) = &chunk.mesh_data {
                    members.push((*coords, data));
                }
            }
        }

        let opaque = combine_pass(batch.bx, batch.bz, &members, false);
        let transparent = combine_pass(batch.bx, batch.bz, &members, true);
        batch.opaque_vertex_count = opaque.vertex_count();
        batch.transparent_vertex_count = transparent.vertex_count();

        let origin = batch.world_origin();
        let (bx, bz) = (batch.bx, batch.bz);
        apply_batch_pass(
            commands,
            meshes,
            &opaque,
            materials.opaque.clone(),
            origin,
            (bx, bz),
            &mut batch.opaque_mesh,
            &mut batch.opaque_entity,
        );
        apply_batch_pass(
            commands,
            meshes,
            &transparent,
            materials.transparent.clone(),
            origin,
            (bx, bz),
            &mut batch.transparent_mesh,
            &mut batch.transparent_entity,
        );

        if batch.slots.iter().all(Option::is_none) {
            // Last member unregistered; both passes were just cleared.
            batches.batches.remove(&key);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_batch_pass(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    staged: &crate::chunk::StagedBuffers,
    material: Handle<crate::material::VoxelExtendedMaterial>,
    origin: Vec3,
    key: (i32, i32),
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
                    BatchEntity { bx: key.0, bz: key.1 },
                ))
                .id();
            *entity_slot = Some(entity);
        }
    }
}

/// Swap between combined batch meshes and per-chunk fallback rendering.
///
/// Batches whose center lies inside the expanded view box draw their
/// combined meshes and hide their members' individual entities; batches
/// still waiting on a rebuild leave the members visible. Everything outside
/// the box is hidden until streaming catches up or evicts it.
#[allow(clippy::needless_pass_by_value)]
pub fn update_batch_visibility(world: Res<World>, mut visibilities: Query<&mut Visibility>) {
    let (ccx, ccz) = world.center_chunk;
    let batch_view = world.view_distance / 2 + 1;
    let (cbx, cbz) = (ccx.div_euclid(super::BATCH_SPAN), ccz.div_euclid(super::BATCH_SPAN));

    let mut set = |entity: Option<Entity>, visible: bool| {
        if let Some(entity) = entity {
            if let Ok(mut v) = visibilities.get_mut(entity) {
                *v = if visible { Visibility::Visible } else { Visibility::Hidden };
            }
        }
    };

    for batch in world.batches.batches.values() {
        let in_box = (batch.bx - cbx).abs() <= batch_view && (batch.bz - cbz).abs() <= batch_view;
        let combined = batch.has_combined_mesh();

        set(batch.opaque_entity, in_box && combined);
        set(batch.transparent_entity, in_box && combined);

        for coords in batch.slots.iter().flatten() {
            if let Some(chunk) = world.chunks.get(coords) {
                let fallback = in_box && !combined;
                set(chunk.opaque_entity, fallback);
                set(chunk.transparent_entity, fallback);
            }
        }
    }
}
