//! Chunk data: the 16×256×16 block grid and its lifecycle bookkeeping.
//!
//! A chunk owns a dense block grid plus everything the streaming pipeline
//! needs to track it: the generation state machine, remesh/dirty flags, GPU
//! mesh handles for both render passes, and the CPU-side staged vertex data
//! kept for batch rebuilds. Block writes maintain `solid_block_count`
//! incrementally so emptiness checks are O(1).

use crate::block::{Block, BlockType};
use bevy::prelude::*;

pub mod light;
pub mod mesh;
pub mod streaming;

pub use mesh::{ChunkMeshData, StagedBuffers};
pub use streaming::{stream_chunks, PendingChunks, StreamingDiagnostics};

/// Horizontal extent of a chunk in blocks.
pub const CHUNK_SIZE: usize = 16;
/// Vertical extent of a chunk in blocks (fixed world height).
pub const CHUNK_HEIGHT: usize = 256;

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const CHUNK_HEIGHT_I32: i32 = CHUNK_HEIGHT as i32;

/// Generation lifecycle. Advances monotonically within one generation cycle;
/// later block edits only toggle `needs_remesh`, never regress the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Cell exists in the world map but holds no generated data yet.
    Empty,
    /// A worker task owns the block grid; nothing else may touch it.
    Generating,
    /// Worker finished; staged mesh waits in the completed queue.
    Ready,
    /// Data merged into the map and meshes uploaded to the GPU.
    Complete,
}

/// Marker component attached to spawned chunk mesh entities.
#[derive(Component)]
pub struct ChunkEntity {
    pub chunk_x: i32,
    pub chunk_z: i32,
}

pub struct Chunk {
    pub cx: i32,
    pub cz: i32,
    blocks: Vec<Block>,
    solid_block_count: u32,
    pub state: ChunkState,
    pub needs_remesh: bool,
    pub in_dirty_list: bool,
    /// Set once the on-chunk-ready hook (chest registration etc.) has fired.
    pub has_spawned: bool,
    /// GPU handles for the two passes; `None` when the pass had no geometry.
    pub opaque_mesh: Option<Handle<Mesh>>,
    pub transparent_mesh: Option<Handle<Mesh>>,
    /// Entities drawing the per-chunk meshes (fallback path when the
    /// containing batch has no combined mesh yet).
    pub opaque_entity: Option<Entity>,
    pub transparent_entity: Option<Entity>,
    /// CPU copy of the latest staged vertex data, kept for batch rebuilds.
    pub mesh_data: Option<ChunkMeshData>,
    /// Dungeon chest cells found during generation, in local coordinates.
    pub pending_chests: Vec<(usize, usize, usize)>,
}

impl Chunk {
    /// Create an all-air chunk at chunk coordinates `(cx, cz)`.
    #[must_use]
    pub fn new(cx: i32, cz: i32) -> Self {
        Chunk {
            cx,
            cz,
            blocks: vec![Block::AIR; CHUNK_SIZE * CHUNK_HEIGHT * CHUNK_SIZE],
            solid_block_count: 0,
            state: ChunkState::Empty,
            needs_remesh: false,
            in_dirty_list: false,
            has_spawned: false,
            opaque_mesh: None,
            transparent_mesh: None,
            opaque_entity: None,
            transparent_entity: None,
            mesh_data: None,
            pending_chests: Vec::new(),
        }
    }

    #[inline]
    fn index(x: usize, y: usize, z: usize) -> usize {
        x + y * CHUNK_SIZE + z * CHUNK_SIZE * CHUNK_HEIGHT
    }

    /// Read the block at local coordinates, `AIR` when out of bounds.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Block {
        if x >= CHUNK_SIZE || y >= CHUNK_HEIGHT || z >= CHUNK_SIZE {
            Block::AIR
        } else {
            self.blocks[Self::index(x, y, z)]
        }
    }

    /// Write the block at local coordinates, maintaining the solid count.
    /// Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, z: usize, block: Block) {
        if x >= CHUNK_SIZE || y >= CHUNK_HEIGHT || z >= CHUNK_SIZE {
            return;
        }
        let idx = Self::index(x, y, z);
        let old = self.blocks[idx];
        if old.kind != BlockType::Air && block.kind == BlockType::Air {
            self.solid_block_count -= 1;
        } else if old.kind == BlockType::Air && block.kind != BlockType::Air {
            self.solid_block_count += 1;
        }
        self.blocks[idx] = block;
    }

    /// Update only the light value of a cell (no solid-count bookkeeping).
    pub fn set_light(&mut self, x: usize, y: usize, z: usize, light: u8) {
        if x < CHUNK_SIZE && y < CHUNK_HEIGHT && z < CHUNK_SIZE {
            self.blocks[Self::index(x, y, z)].light = light;
        }
    }

    #[must_use]
    pub fn solid_block_count(&self) -> u32 {
        self.solid_block_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solid_block_count == 0
    }

    #[must_use]
    pub fn mesh_generated(&self) -> bool {
        self.opaque_mesh.is_some()
    }

    #[must_use]
    pub fn transparent_mesh_generated(&self) -> bool {
        self.transparent_mesh.is_some()
    }

    /// World-space origin of the chunk (minimum corner).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_origin(&self) -> Vec3 {
        Vec3::new(
            (self.cx * CHUNK_SIZE_I32) as f32,
            0.0,
            (self.cz * CHUNK_SIZE_I32) as f32,
        )
    }

    /// World-space axis-aligned bounds of the chunk volume.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_bounds(&self) -> (Vec3, Vec3) {
        let min = self.world_origin();
        (
            min,
            min + Vec3::new(CHUNK_SIZE as f32, CHUNK_HEIGHT as f32, CHUNK_SIZE as f32),
        )
    }

    /// Move generated data (blocks, light, chest markers) out of a
    /// worker-produced chunk into this map-owned record.
    pub fn adopt_generated(&mut self, generated: Chunk) {
        debug_assert_eq!((self.cx, self.cz), (generated.cx, generated.cz));
        self.blocks = generated.blocks;
        self.solid_block_count = generated.solid_block_count;
        self.pending_chests = generated.pending_chests;
        self.needs_remesh = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    #[test]
    fn new_chunk_is_empty_air() {
        let c = Chunk::new(3, -2);
        assert!(c.is_empty());
        assert_eq!(c.solid_block_count(), 0);
        assert_eq!(c.get(0, 0, 0).kind, BlockType::Air);
        assert_eq!(c.get(15, 255, 15).kind, BlockType::Air);
    }

    #[test]
    fn solid_count_tracks_every_write() {
        let mut c = Chunk::new(0, 0);
        c.set(1, 2, 3, Block::of(BlockType::Stone));
        c.set(4, 5, 6, Block::of(BlockType::Dirt));
        assert_eq!(c.solid_block_count(), 2);
        // Overwriting solid with solid keeps the count.
        c.set(1, 2, 3, Block::of(BlockType::Grass));
        assert_eq!(c.solid_block_count(), 2);
        // Clearing drops it.
        c.set(1, 2, 3, Block::AIR);
        assert_eq!(c.solid_block_count(), 1);
        c.set(4, 5, 6, Block::AIR);
        assert!(c.is_empty());
    }

    #[test]
    fn count_matches_exhaustive_scan_after_random_writes() {
        let mut c = Chunk::new(0, 0);
        let mut state = 0x1234_5678u32;
        for _ in 0..2000 {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let x = (state >> 8) as usize % CHUNK_SIZE;
            let y = (state >> 12) as usize % CHUNK_HEIGHT;
            let z = (state >> 20) as usize % CHUNK_SIZE;
            let kind = if state & 1 == 0 { BlockType::Stone } else { BlockType::Air };
            c.set(x, y, z, Block::of(kind));
        }
        let mut scanned = 0;
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    if c.get(x, y, z).kind != BlockType::Air {
                        scanned += 1;
                    }
                }
            }
        }
        assert_eq!(c.solid_block_count(), scanned);
        assert_eq!(c.is_empty(), scanned == 0);
    }

    #[test]
    fn out_of_bounds_access_is_air_and_ignored() {
        let mut c = Chunk::new(0, 0);
        c.set(CHUNK_SIZE, 0, 0, Block::of(BlockType::Stone));
        c.set(0, CHUNK_HEIGHT, 0, Block::of(BlockType::Stone));
        assert!(c.is_empty());
        assert_eq!(c.get(99, 99, 99).kind, BlockType::Air);
    }
}
