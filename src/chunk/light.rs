//! Per-chunk skylight computation.
//!
//! Two phases over the chunk's own grid (light is chunk-local; border cells
//! are patched up by the mesher's edge assumptions):
//!
//! 1. every XZ column is walked top to bottom, carrying full daylight
//!    through air and transparent cells until the first opaque cell, below
//!    which the column stays at the ambient floor;
//! 2. a bucketed breadth-first flood spreads light sideways, losing one
//!    level per step, so cave mouths and overhangs receive a falloff instead
//!    of a hard shadow edge.
//!
//! Block emission (glowstone) seeds the flood alongside sky-lit cells.

use super::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};
use crate::block::LIGHT_MAX;

/// Light level assigned below the first opaque occluder in a column.
const AMBIENT_FLOOR: u8 = 0;

/// Recompute the whole chunk's light field in place.
///
/// Called by worker jobs after terrain generation and by the main thread
/// after any block edit in the chunk.
pub fn compute_skylight(chunk: &mut Chunk) {
    // Bucket queues indexed by light level; level 0 never propagates.
    let mut buckets: [Vec<(usize, usize, usize)>; LIGHT_MAX as usize + 1] = Default::default();

    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            let mut sky = true;
            for y in (0..CHUNK_HEIGHT).rev() {
                let block = chunk.get(x, y, z);
                if sky && block.kind.is_opaque() {
                    sky = false;
                }
                let mut level = if sky { LIGHT_MAX } else { AMBIENT_FLOOR };
                let emission = block.kind.emission();
                if emission > level {
                    level = emission;
                }
                chunk.set_light(x, y, z, level);
                if level > 1 && (!block.kind.is_opaque() || emission > 0) {
                    buckets[level as usize].push((x, y, z));
                }
            }
        }
    }

    // Lateral flood, brightest first so every cell is finalized on first
    // assignment at its level.
    for level in (2..=LIGHT_MAX).rev() {
        let mut i = 0;
        while i < buckets[level as usize].len() {
            let (x, y, z) = buckets[level as usize][i];
            i += 1;
            if chunk.get(x, y, z).light != level {
                continue; // superseded by a brighter pass
            }
            let spread = level - 1;
            for (dx, dy, dz) in NEIGHBORS {
                let nx = x as i32 + dx;
                let ny = y as i32 + dy;
                let nz = z as i32 + dz;
                if nx < 0
                    || nz < 0
                    || ny < 0
                    || nx >= CHUNK_SIZE as i32
                    || nz >= CHUNK_SIZE as i32
                    || ny >= CHUNK_HEIGHT as i32
                {
                    continue;
                }
                let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
                let neighbor = chunk.get(nx, ny, nz);
                if neighbor.kind.is_opaque() || neighbor.light >= spread {
                    continue;
                }
                chunk.set_light(nx, ny, nz, spread);
                if spread > 1 {
                    buckets[spread as usize].push((nx, ny, nz));
                }
            }
        }
        buckets[level as usize].clear();
    }
}

const NEIGHBORS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, BlockType};

    #[test]
    fn open_column_is_fully_lit() {
        let mut c = Chunk::new(0, 0);
        compute_skylight(&mut c);
        for y in [0, 64, 255] {
            assert_eq!(c.get(8, y, 8).light, LIGHT_MAX);
        }
    }

    #[test]
    fn opaque_roof_shadows_the_column() {
        let mut c = Chunk::new(0, 0);
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                c.set(x, 100, z, Block::of(BlockType::Stone));
            }
        }
        compute_skylight(&mut c);
        assert_eq!(c.get(8, 120, 8).light, LIGHT_MAX);
        // A full roof leaves no lateral path: everything below is ambient.
        assert_eq!(c.get(8, 50, 8).light, AMBIENT_FLOOR);
    }

    #[test]
    fn transparent_roof_passes_daylight() {
        let mut c = Chunk::new(0, 0);
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                c.set(x, 100, z, Block::of(BlockType::Glass));
            }
        }
        compute_skylight(&mut c);
        assert_eq!(c.get(8, 50, 8).light, LIGHT_MAX);
    }

    #[test]
    fn light_falls_off_one_per_step_under_a_ledge() {
        let mut c = Chunk::new(0, 0);
        // Roof over x in 0..8 at y=100, open sky at x >= 8.
        for z in 0..CHUNK_SIZE {
            for x in 0..8 {
                c.set(x, 100, z, Block::of(BlockType::Stone));
            }
        }
        compute_skylight(&mut c);
        // Directly under the roof edge, one step in from the lit column.
        assert_eq!(c.get(8, 99, 8).light, LIGHT_MAX);
        assert_eq!(c.get(7, 99, 8).light, LIGHT_MAX - 1);
        assert_eq!(c.get(6, 99, 8).light, LIGHT_MAX - 2);
        assert_eq!(c.get(0, 99, 8).light, LIGHT_MAX - 8);
    }

    #[test]
    fn skylight_is_deterministic() {
        let mut a = Chunk::new(0, 0);
        let mut b = Chunk::new(0, 0);
        for c in [&mut a, &mut b] {
            c.set(4, 80, 4, Block::of(BlockType::Stone));
            c.set(5, 80, 4, Block::of(BlockType::Stone));
            compute_skylight(c);
        }
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    assert_eq!(a.get(x, y, z).light, b.get(x, y, z).light);
                }
            }
        }
    }

    #[test]
    fn glowstone_lights_a_sealed_room() {
        let mut c = Chunk::new(0, 0);
        // Seal a 5x5x5 room fully under an opaque shell.
        for y in 50..=56 {
            for z in 4..=10 {
                for x in 4..=10 {
                    let shell = y == 50 || y == 56 || z == 4 || z == 10 || x == 4 || x == 10;
                    if shell {
                        c.set(x, y, z, Block::of(BlockType::Stone));
                    }
                }
            }
        }
        // Roof the whole chunk so no skylight reaches the room laterally.
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                c.set(x, 60, z, Block::of(BlockType::Stone));
            }
        }
        c.set(7, 53, 7, Block::of(BlockType::Glowstone));
        compute_skylight(&mut c);
        assert_eq!(c.get(8, 53, 7).light, 14);
        assert_eq!(c.get(9, 53, 7).light, 13);
    }
}
