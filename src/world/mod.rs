//! World storage: the chunk map, block access and the edit fan-out.
//!
//! The `World` resource owns every loaded chunk (keyed by chunk coordinates)
//! together with the schedulers that react to block edits: the dirty list of
//! chunks awaiting a main-thread remesh, the water scheduler, the leaf-decay
//! scheduler and the 2×2 batch aggregator. `set_block` is the single edit
//! entry point — it writes the cell, relights the chunk, queues the remesh,
//! invalidates the containing batch and notifies the schedulers, so every
//! caller (mining, water flow, leaf decay) propagates identically.
//!
//! Block coordinates are world-space integers; chunk coordinates use floored
//! division so negative positions do not collapse toward zero.

pub mod raycast;

use crate::batch::BatchMap;
use crate::block::{Block, BlockType};
use crate::chunk::{Chunk, ChunkState, CHUNK_HEIGHT_I32, CHUNK_SIZE_I32};
use crate::noise::{hash3, WorldNoise};
use crate::terrain::decay::LeafDecayQueue;
use crate::terrain::TerrainParams;
use crate::water::WaterQueue;
use bevy::math::IVec3;
use bevy::prelude::Resource;
use std::collections::{HashMap, VecDeque};

/// Convert a world X/Z coordinate to its chunk coordinate (floored).
#[must_use]
pub fn world_to_chunk(w: i32) -> i32 {
    w.div_euclid(CHUNK_SIZE_I32)
}

/// Split world coordinates into chunk coordinates and in-chunk locals.
/// Locals are always in `[0, 15]`, including for negative inputs.
#[must_use]
pub fn world_to_local(wx: i32, wy: i32, wz: i32) -> (i32, i32, usize, usize, usize) {
    let cx = wx.div_euclid(CHUNK_SIZE_I32);
    let cz = wz.div_euclid(CHUNK_SIZE_I32);
    let lx = wx.rem_euclid(CHUNK_SIZE_I32) as usize;
    let lz = wz.rem_euclid(CHUNK_SIZE_I32) as usize;
    (cx, cz, lx, wy as usize, lz)
}

/// The world resource. See the module docs for the ownership story; the
/// short version: this map is the only owner of chunk data, and only the
/// main thread touches it.
#[derive(Resource)]
pub struct World {
    pub seed: u32,
    pub noise: WorldNoise,
    pub params: TerrainParams,
    pub chunks: HashMap<(i32, i32), Chunk>,
    /// Chunks queued for a synchronous remesh, each at most once
    /// (`in_dirty_list` guards re-insertion).
    dirty: VecDeque<(i32, i32)>,
    pub batches: BatchMap,
    pub water: WaterQueue,
    pub decay: LeafDecayQueue,
    /// Dungeon chests surviving remeshes: world cell → loot seed.
    pub chests: HashMap<IVec3, u32>,
    pub view_distance: i32,
    pub batch_rebuilds_per_frame: usize,
    pub max_uploads_per_frame: usize,
    pub game_tick: u64,
    pub center_chunk: (i32, i32),
}

impl World {
    #[must_use]
    pub fn new(seed: u32, params: TerrainParams) -> Self {
        World {
            seed,
            noise: WorldNoise::new(seed),
            params,
            chunks: HashMap::new(),
            dirty: VecDeque::new(),
            batches: BatchMap::default(),
            water: WaterQueue::default(),
            decay: LeafDecayQueue::default(),
            chests: HashMap::new(),
            view_distance: 8,
            batch_rebuilds_per_frame: 4,
            max_uploads_per_frame: 4,
            game_tick: 0,
            center_chunk: (0, 0),
        }
    }

    /// Read a block at world coordinates. Unloaded cells and cells outside
    /// the vertical range read as air.
    #[must_use]
    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block {
        if wy < 0 || wy >= CHUNK_HEIGHT_I32 {
            return Block::AIR;
        }
        let (cx, cz, lx, ly, lz) = world_to_local(wx, wy, wz);
        self.chunks
            .get(&(cx, cz))
            .map_or(Block::AIR, |c| c.get(lx, ly, lz))
    }

    /// Write a block and fan the edit out to every dependent system.
    ///
    /// Writes to unloaded chunks or chunks still being generated are
    /// silently ignored (the map is never grown by writes). Returns the
    /// modified chunk's coordinates when the write landed.
    pub fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> Option<(i32, i32)> {
        if wy < 0 || wy >= CHUNK_HEIGHT_I32 {
            return None;
        }
        let (cx, cz, lx, ly, lz) = world_to_local(wx, wy, wz);
        let old = {
            let chunk = self.chunks.get_mut(&(cx, cz))?;
            if chunk.state == ChunkState::Generating {
                return None; // worker owns the grid right now
            }
            let old = chunk.get(lx, ly, lz);
            chunk.set(lx, ly, lz, block);
            crate::chunk::light::compute_skylight(chunk);
            old
        };

        self.mark_dirty(cx, cz);
        self.batches.invalidate(cx, cz);
        self.notify_water(wx, wy, wz);
        if old.kind.is_wood() && block.kind == BlockType::Air {
            self.queue_leaf_decay_around(wx, wy, wz);
        }
        Some((cx, cz))
    }

    /// Schedule water updates around an edited cell: every water neighbor,
    /// plus the edited cell itself when it holds water.
    fn notify_water(&mut self, wx: i32, wy: i32, wz: i32) {
        let mut to_schedule: Vec<(i32, i32, i32)> = Vec::new();
        if self.get_block(wx, wy, wz).kind == BlockType::Water {
            to_schedule.push((wx, wy, wz));
        }
        for (dx, dy, dz) in [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)] {
            let (nx, ny, nz) = (wx + dx, wy + dy, wz + dz);
            if self.get_block(nx, ny, nz).kind == BlockType::Water {
                to_schedule.push((nx, ny, nz));
            }
        }
        for (x, y, z) in to_schedule {
            self.water.schedule(x, y, z, crate::water::EDIT_DELAY_TICKS);
        }
    }

    /// Enqueue every natural leaf within decay range of a removed wood cell.
    fn queue_leaf_decay_around(&mut self, wx: i32, wy: i32, wz: i32) {
        let r = crate::terrain::decay::LEAF_DECAY_RANGE;
        let mut leaves = Vec::new();
        for dy in -r..=r {
            for dz in -r..=r {
                for dx in -r..=r {
                    let (nx, ny, nz) = (wx + dx, wy + dy, wz + dz);
                    let b = self.get_block(nx, ny, nz);
                    if b.kind.is_leaves() && b.is_natural() {
                        leaves.push((nx, ny, nz));
                    }
                }
            }
        }
        for (x, y, z) in leaves {
            self.decay.schedule(x, y, z);
        }
    }

    /// Add a chunk to the dirty list unless it is already queued.
    pub fn mark_dirty(&mut self, cx: i32, cz: i32) {
        if let Some(chunk) = self.chunks.get_mut(&(cx, cz)) {
            chunk.needs_remesh = true;
            if !chunk.in_dirty_list {
                chunk.in_dirty_list = true;
                self.dirty.push_back((cx, cz));
            }
        }
    }

    /// Pop the next dirty entry, if any. The caller clears `in_dirty_list`
    /// (or re-pushes) depending on what it does with the chunk.
    pub fn pop_dirty(&mut self) -> Option<(i32, i32)> {
        self.dirty.pop_front()
    }

    pub fn push_dirty(&mut self, cx: i32, cz: i32) {
        self.dirty.push_back((cx, cz));
    }

    #[must_use]
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// Split borrow for the batch rebuilder: it reads member mesh data from
    /// the chunk map while mutating batch records.
    #[must_use]
    pub fn chunks_and_batches(&mut self) -> (&HashMap<(i32, i32), Chunk>, &mut BatchMap) {
        (&self.chunks, &mut self.batches)
    }

    /// Record a ready chunk's dungeon chests into the registry.
    /// Runs once per chunk, guarded by `has_spawned` at the call site.
    pub fn register_chunk_chests(&mut self, cx: i32, cz: i32) {
        let Some(chunk) = self.chunks.get_mut(&(cx, cz)) else {
            return;
        };
        let pending = std::mem::take(&mut chunk.pending_chests);
        for (lx, ly, lz) in pending {
            let pos = IVec3::new(
                cx * CHUNK_SIZE_I32 + lx as i32,
                ly as i32,
                cz * CHUNK_SIZE_I32 + lz as i32,
            );
            let loot_seed = hash3(pos.x, pos.y, pos.z) ^ self.seed;
            self.chests.insert(pos, loot_seed);
        }
    }

    /// Run one water scheduler tick (invoked on even game ticks).
    pub fn water_tick(&mut self) {
        crate::water::process_tick(self);
    }

    /// Fire due leaf-decay entries against the current time.
    pub fn leaf_decay_tick(&mut self, now: f64) {
        crate::terrain::decay::process(self, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CHUNK_SIZE;

    fn world_with_chunk(cx: i32, cz: i32) -> World {
        let mut world = World::new(1, TerrainParams::default());
        let mut chunk = Chunk::new(cx, cz);
        chunk.state = ChunkState::Complete;
        world.chunks.insert((cx, cz), chunk);
        world
    }

    #[test]
    fn coordinate_round_trip_holds_for_negatives() {
        for wx in -40..40 {
            for wz in -40..40 {
                let (cx, cz, lx, _, lz) = world_to_local(wx, 0, wz);
                assert_eq!(cx * CHUNK_SIZE_I32 + lx as i32, wx);
                assert_eq!(cz * CHUNK_SIZE_I32 + lz as i32, wz);
                assert!(lx < CHUNK_SIZE && lz < CHUNK_SIZE);
            }
        }
    }

    #[test]
    fn floored_chunk_coords_do_not_collapse_at_zero() {
        assert_eq!(world_to_chunk(0), 0);
        assert_eq!(world_to_chunk(15), 0);
        assert_eq!(world_to_chunk(16), 1);
        assert_eq!(world_to_chunk(-1), -1);
        assert_eq!(world_to_chunk(-16), -1);
        assert_eq!(world_to_chunk(-17), -2);
    }

    #[test]
    fn get_block_outside_loaded_area_is_air() {
        let world = world_with_chunk(0, 0);
        assert_eq!(world.get_block(500, 50, 500).kind, BlockType::Air);
        assert_eq!(world.get_block(0, -1, 0).kind, BlockType::Air);
        assert_eq!(world.get_block(0, 256, 0).kind, BlockType::Air);
    }

    #[test]
    fn set_block_outside_loaded_area_is_ignored() {
        let mut world = world_with_chunk(0, 0);
        assert_eq!(world.set_block(500, 50, 500, Block::of(BlockType::Stone)), None);
        assert!(world.chunks.get(&(31, 31)).is_none());
    }

    #[test]
    fn set_block_marks_dirty_once_and_invalidates_batch() {
        let mut world = world_with_chunk(0, 0);
        world.batches.register_coords(0, 0);
        // Batches start dirty on registration; clear for the test.
        while world.batches.pop_dirty().is_some() {}

        world.set_block(3, 50, 3, Block::of(BlockType::Stone));
        world.set_block(4, 50, 3, Block::of(BlockType::Stone));
        assert_eq!(world.dirty_len(), 1, "chunk must be queued exactly once");
        let chunk = world.chunks.get(&(0, 0)).unwrap();
        assert!(chunk.needs_remesh);
        assert!(chunk.in_dirty_list);
        assert!(world.batches.is_dirty(0, 0));
    }

    #[test]
    fn edits_during_generation_are_refused() {
        let mut world = world_with_chunk(0, 0);
        world.chunks.get_mut(&(0, 0)).unwrap().state = ChunkState::Generating;
        assert_eq!(world.set_block(1, 50, 1, Block::of(BlockType::Stone)), None);
    }

    #[test]
    fn breaking_wood_schedules_nearby_natural_leaves() {
        let mut world = world_with_chunk(0, 0);
        {
            let chunk = world.chunks.get_mut(&(0, 0)).unwrap();
            chunk.set(8, 100, 8, Block::natural(BlockType::OakWood));
            chunk.set(8, 101, 8, Block::natural(BlockType::OakLeaves));
            chunk.set(9, 100, 8, Block::of(BlockType::OakLeaves)); // player-built
        }
        world.set_block(8, 100, 8, Block::AIR);
        assert_eq!(world.decay.len(), 1, "only the natural leaf decays");
    }

    #[test]
    fn editing_next_to_water_schedules_an_update() {
        let mut world = world_with_chunk(0, 0);
        world
            .chunks
            .get_mut(&(0, 0))
            .unwrap()
            .set(8, 61, 8, Block::water(0, false));
        world.set_block(8, 60, 8, Block::AIR);
        assert!(world.water.len() > 0);
    }

    #[test]
    fn placing_then_breaking_changes_the_mesh_by_six_faces() {
        use crate::atlas::AtlasUVMap;
        use crate::chunk::mesh::build_chunk_mesh;

        let mut world = world_with_chunk(0, 0);
        let atlas = AtlasUVMap::default();
        let baseline = build_chunk_mesh(world.chunks.get(&(0, 0)).unwrap(), &atlas)
            .opaque
            .face_count();

        // Place a stone into open air: six new exposed faces.
        world.set_block(8, 120, 8, Block::of(BlockType::Stone));
        let chunk = world.chunks.get(&(0, 0)).unwrap();
        assert!(chunk.needs_remesh);
        let placed = build_chunk_mesh(chunk, &atlas).opaque.face_count();
        assert_eq!(placed, baseline + 6);

        // Break it again: the faces disappear.
        world.set_block(8, 120, 8, Block::AIR);
        let broken = build_chunk_mesh(world.chunks.get(&(0, 0)).unwrap(), &atlas)
            .opaque
            .face_count();
        assert_eq!(broken, baseline);
    }

    #[test]
    fn chest_registration_fires_once_per_chunk() {
        let mut world = world_with_chunk(2, 3);
        world
            .chunks
            .get_mut(&(2, 3))
            .unwrap()
            .pending_chests
            .push((4, 20, 5));
        world.register_chunk_chests(2, 3);
        assert_eq!(world.chests.len(), 1);
        assert!(world.chests.contains_key(&IVec3::new(2 * 16 + 4, 20, 3 * 16 + 5)));
        // Second call is a no-op: pending list was drained.
        world.register_chunk_chests(2, 3);
        assert_eq!(world.chests.len(), 1);
    }
}
