//! 2×2 chunk batching: merge neighboring chunk meshes into super-meshes.
//!
//! Batches cut draw calls by roughly 4× away from the edit frontier. A
//! batch is keyed by the floored half of its chunks' coordinates and holds
//! up to four member slots. Any member change (register, unregister, edit)
//! marks the batch dirty; a bounded number of dirty batches is rebuilt per
//! frame by concatenating the members' staged CPU buffers with their local
//! offset inside the batch. While a batch has no combined mesh, the member
//! chunks' own entities keep rendering as the fallback path.

pub mod rebuild;

pub use rebuild::{rebuild_batches, update_batch_visibility};

use crate::chunk::{ChunkMeshData, StagedBuffers, CHUNK_SIZE_I32};
use bevy::prelude::*;
use std::collections::{HashMap, VecDeque};

/// Chunks per batch side.
pub const BATCH_SPAN: i32 = 2;
/// Soft cap on live batches; registration beyond it falls back to
/// per-chunk rendering.
pub const BATCH_MAX_COUNT: usize = 512;

/// Marker component for spawned batch mesh entities.
#[derive(Component)]
pub struct BatchEntity {
    pub bx: i32,
    pub bz: i32,
}

/// Batch key for a chunk coordinate. Floored division keeps negative
/// coordinates in the right cell.
#[must_use]
pub fn batch_key(cx: i32, cz: i32) -> (i32, i32) {
    (cx.div_euclid(BATCH_SPAN), cz.div_euclid(BATCH_SPAN))
}

/// Slot index of a chunk inside its batch (0..4, row-major).
#[must_use]
pub fn batch_slot(cx: i32, cz: i32) -> usize {
    let sx = cx.rem_euclid(BATCH_SPAN);
    let sz = cz.rem_euclid(BATCH_SPAN);
    (sx + sz * BATCH_SPAN) as usize
}

pub struct Batch {
    pub bx: i32,
    pub bz: i32,
    /// Member chunk coordinates; a nulled slot contributes no vertices.
    pub slots: [Option<(i32, i32)>; 4],
    pub dirty: bool,
    pub opaque_mesh: Option<Handle<Mesh>>,
    pub transparent_mesh: Option<Handle<Mesh>>,
    pub opaque_entity: Option<Entity>,
    pub transparent_entity: Option<Entity>,
    pub opaque_vertex_count: usize,
    pub transparent_vertex_count: usize,
}

impl Batch {
    fn new(bx: i32, bz: i32) -> Self {
        Batch {
            bx,
            bz,
            slots: [None; 4],
            dirty: false,
            opaque_mesh: None,
            transparent_mesh: None,
            opaque_entity: None,
            transparent_entity: None,
            opaque_vertex_count: 0,
            transparent_vertex_count: 0,
        }
    }

    /// True when the combined opaque pass exists and can replace the
    /// members' individual draws.
    #[must_use]
    pub fn has_combined_mesh(&self) -> bool {
        self.opaque_mesh.is_some() || self.transparent_mesh.is_some()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_origin(&self) -> Vec3 {
        Vec3::new(
            (self.bx * BATCH_SPAN * CHUNK_SIZE_I32) as f32,
            0.0,
            (self.bz * BATCH_SPAN * CHUNK_SIZE_I32) as f32,
        )
    }
}

/// All live batches plus the dirty queue consumed by the rebuild budget.
#[derive(Default)]
pub struct BatchMap {
    pub batches: HashMap<(i32, i32), Batch>,
    dirty_queue: VecDeque<(i32, i32)>,
}

impl BatchMap {
    /// Place a chunk into its batch slot, creating the batch if needed.
    pub fn register_coords(&mut self, cx: i32, cz: i32) {
        let key = batch_key(cx, cz);
        if !self.batches.contains_key(&key) {
            if self.batches.len() >= BATCH_MAX_COUNT {
                warn!("batch table full; chunk ({cx}, {cz}) renders unbatched");
                return;
            }
            self.batches.insert(key, Batch::new(key.0, key.1));
        }
        let batch = self.batches.get_mut(&key).expect("just inserted");
        batch.slots[batch_slot(cx, cz)] = Some((cx, cz));
        Self::mark_dirty(&mut self.dirty_queue, batch, key);
    }

    /// Null a chunk's slot and mark the batch for rebuild.
    pub fn unregister_coords(&mut self, cx: i32, cz: i32) {
        let key = batch_key(cx, cz);
        if let Some(batch) = self.batches.get_mut(&key) {
            batch.slots[batch_slot(cx, cz)] = None;
            Self::mark_dirty(&mut self.dirty_queue, batch, key);
        }
    }

    /// Mark the batch containing `(cx, cz)` dirty (block edit, remesh).
    pub fn invalidate(&mut self, cx: i32, cz: i32) {
        let key = batch_key(cx, cz);
        if let Some(batch) = self.batches.get_mut(&key) {
            Self::mark_dirty(&mut self.dirty_queue, batch, key);
        }
    }

    fn mark_dirty(queue: &mut VecDeque<(i32, i32)>, batch: &mut Batch, key: (i32, i32)) {
        if !batch.dirty {
            batch.dirty = true;
            queue.push_back(key);
        }
    }

    #[must_use]
    pub fn is_dirty(&self, cx: i32, cz: i32) -> bool {
        self.batches
            .get(&batch_key(cx, cz))
            .is_some_and(|b| b.dirty)
    }

    /// Next batch awaiting rebuild, clearing its dirty flag.
    pub fn pop_dirty(&mut self) -> Option<(i32, i32)> {
        while let Some(key) = self.dirty_queue.pop_front() {
            if let Some(batch) = self.batches.get_mut(&key) {
                if batch.dirty {
                    batch.dirty = false;
                    return Some(key);
                }
            }
        }
        None
    }

    #[must_use]
    pub fn dirty_len(&self) -> usize {
        self.dirty_queue.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

/// Concatenate one render pass across up to four member chunks.
///
/// Vertex X/Z are shifted by each member's offset inside the batch; indices
/// are rebased past the vertices already appended.
#[must_use]
pub fn combine_pass(
    bx: i32,
    bz: i32,
    members: &[((i32, i32), &ChunkMeshData)],
    transparent: bool,
) -> StagedBuffers {
    let mut combined = StagedBuffers { valid: true, ..Default::default() };
    for ((cx, cz), data) in members {
        let pass = if transparent { &data.transparent } else { &data.opaque };
        if pass.is_empty() {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let dx = ((cx - bx * BATCH_SPAN) * CHUNK_SIZE_I32) as f32;
        #[allow(clippy::cast_precision_loss)]
        let dz = ((cz - bz * BATCH_SPAN) * CHUNK_SIZE_I32) as f32;

        let base = combined.positions.len() as u32;
        combined
            .positions
            .extend(pass.positions.iter().map(|p| [p[0] + dx, p[1], p[2] + dz]));
        combined.normals.extend_from_slice(&pass.normals);
        combined.uvs.extend_from_slice(&pass.uvs);
        combined.colors.extend_from_slice(&pass.colors);
        combined.indices.extend(pass.indices.iter().map(|i| i + base));
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasUVMap;
    use crate::block::{Block, BlockType};
    use crate::chunk::{mesh::build_chunk_mesh, Chunk};

    #[test]
    fn batch_key_uses_floored_division() {
        assert_eq!(batch_key(0, 0), (0, 0));
        assert_eq!(batch_key(1, 1), (0, 0));
        assert_eq!(batch_key(2, 3), (1, 1));
        assert_eq!(batch_key(-1, -1), (-1, -1));
        assert_eq!(batch_key(-2, -3), (-1, -2));
        assert_eq!(batch_key(-3, 2), (-2, 1));
    }

    #[test]
    fn slots_cover_the_four_members_exactly() {
        let mut seen = [false; 4];
        for (cx, cz) in [(4, 6), (5, 6), (4, 7), (5, 7)] {
            assert_eq!(batch_key(cx, cz), (2, 3));
            seen[batch_slot(cx, cz)] = true;
        }
        assert_eq!(seen, [true; 4]);
        // Negative coordinates land in distinct slots too.
        let mut seen = [false; 4];
        for (cx, cz) in [(-2, -2), (-1, -2), (-2, -1), (-1, -1)] {
            assert_eq!(batch_key(cx, cz), (-1, -1));
            seen[batch_slot(cx, cz)] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn register_marks_dirty_once() {
        let mut map = BatchMap::default();
        map.register_coords(0, 0);
        map.register_coords(1, 0);
        map.register_coords(0, 1);
        assert_eq!(map.len(), 1);
        assert_eq!(map.dirty_len(), 1);
        assert_eq!(map.pop_dirty(), Some((0, 0)));
        assert_eq!(map.pop_dirty(), None);
    }

    #[test]
    fn unregister_nulls_the_slot_and_redirties() {
        let mut map = BatchMap::default();
        map.register_coords(2, 2);
        while map.pop_dirty().is_some() {}
        map.unregister_coords(2, 2);
        assert!(map.is_dirty(2, 2));
        let batch = map.batches.get(&(1, 1)).unwrap();
        assert!(batch.slots.iter().all(Option::is_none));
    }

    #[test]
    fn combined_vertex_count_is_the_sum_of_members() {
        let atlas = AtlasUVMap::default();
        let mut members = Vec::new();
        let mut data = Vec::new();
        for (cx, cz) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let mut chunk = Chunk::new(cx, cz);
            // Distinct block counts per member so the sum is meaningful.
            for i in 0..=(cx + cz * 2) as usize {
                chunk.set(2 + i * 2, 50, 2, Block::of(BlockType::Stone));
            }
            data.push(((cx, cz), build_chunk_mesh(&chunk, &atlas)));
        }
        let mut expected = 0;
        for ((cx, cz), d) in &data {
            expected += d.opaque.vertex_count();
            members.push(((*cx, *cz), d));
        }
        let combined = combine_pass(0, 0, &members, false);
        assert_eq!(combined.vertex_count(), expected);
        assert_eq!(combined.indices.len() % 6, 0);
    }

    #[test]
    fn combine_offsets_member_positions_into_batch_space() {
        let atlas = AtlasUVMap::default();
        let mut chunk = Chunk::new(1, 1);
        chunk.set(0, 50, 0, Block::of(BlockType::Stone));
        let data = build_chunk_mesh(&chunk, &atlas);
        let combined = combine_pass(0, 0, &[((1, 1), &data)], false);
        // Chunk (1,1) sits 16 blocks over in both axes inside batch (0,0).
        let max_x = combined.positions.iter().map(|p| p[0]).fold(0.0f32, f32::max);
        let max_z = combined.positions.iter().map(|p| p[2]).fold(0.0f32, f32::max);
        assert!((16.0..=32.0).contains(&max_x));
        assert!((16.0..=32.0).contains(&max_z));
    }

    #[test]
    fn null_slots_contribute_nothing() {
        let combined = combine_pass(0, 0, &[], false);
        assert!(combined.is_empty());
    }
}
