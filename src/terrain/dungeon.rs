//! Deterministic dungeon rooms.
//!
//! At most one room per chunk, decided by a coordinate hash against
//! `dungeon_frequency`. The room is a hollow box of stone-brick variants
//! (a 3D noise "damage field" picks mossy or cracked pieces), an air
//! interior, a 2×3 corridor punched through one wall, and one chest cell
//! recorded for the on-chunk-ready hook.

use super::{HeightMap, TerrainParams};
use crate::block::{Block, BlockType};
use crate::chunk::{Chunk, CHUNK_SIZE};
use crate::noise::{hash2, hash3, WorldNoise};

/// Wall material from the damage field at a world position.
fn wall_block(noise: &WorldNoise, wx: i32, wy: i32, wz: i32) -> BlockType {
    let v = noise.noise3(
        f64::from(wx) * 0.35,
        f64::from(wy) * 0.35,
        f64::from(wz) * 0.35,
    );
    if v > 0.4 {
        BlockType::MossyCobblestone
    } else if v < -0.3 {
        BlockType::CrackedStoneBrick
    } else {
        BlockType::StoneBrick
    }
}

/// Roll and, on success, stamp this chunk's dungeon.
pub fn try_place_dungeon(
    chunk: &mut Chunk,
    noise: &WorldNoise,
    params: &TerrainParams,
    heights: &HeightMap,
) {
    let roll = hash2(chunk.cx, chunk.cz);
    if f64::from(roll % 1000) / 1000.0 >= params.dungeon_frequency {
        return;
    }

    let span = (params.dungeon_max_size - params.dungeon_min_size).max(1) as u32;
    let bits = hash2(roll as i32, 0x5EED);
    let sx = params.dungeon_min_size + (bits % span) as i32;
    let sz = params.dungeon_min_size + ((bits >> 8) % span) as i32;
    let sy = 5 + ((bits >> 16) % 3) as i32;

    let max_x0 = (CHUNK_SIZE as i32 - sx - 1).max(0);
    let max_z0 = (CHUNK_SIZE as i32 - sz - 1).max(0);
    let x0 = ((bits >> 4) % (max_x0 as u32 + 1)) as i32;
    let z0 = ((bits >> 12) % (max_z0 as u32 + 1)) as i32;

    let y_span = (params.dungeon_max_y - params.dungeon_min_y).max(1) as u32;
    let mut y0 = params.dungeon_min_y + ((bits >> 20) % y_span) as i32;

    // Keep the ceiling at least 5 blocks under the shallowest covered column.
    let mut min_surface = i32::MAX;
    for z in z0..(z0 + sz).min(CHUNK_SIZE as i32) {
        for x in x0..(x0 + sx).min(CHUNK_SIZE as i32) {
            min_surface = min_surface.min(heights[z as usize][x as usize]);
        }
    }
    if y0 + sy > min_surface - 5 {
        y0 = (min_surface - 5 - sy).max(params.bedrock_start + 1);
    }
    if y0 + sy > min_surface - 5 {
        return; // no room for a room
    }

    let base_x = chunk.cx * CHUNK_SIZE as i32;
    let base_z = chunk.cz * CHUNK_SIZE as i32;

    for y in y0..=(y0 + sy) {
        for z in z0..=(z0 + sz) {
            for x in x0..=(x0 + sx) {
                let shell =
                    x == x0 || x == x0 + sx || z == z0 || z == z0 + sz || y == y0 || y == y0 + sy;
                let block = if shell {
                    Block::of(wall_block(noise, base_x + x, y, base_z + z))
                } else {
                    Block::AIR
                };
                chunk.set(x as usize, y as usize, z as usize, block);
            }
        }
    }

    // Corridor: width 2, height 3, through the side picked by hash bits.
    let side = (bits >> 28) % 4;
    let cy0 = y0 + 1;
    for dy in 0..3 {
        for dw in 0..2 {
            let (cx, cz) = match side {
                0 => (x0, z0 + sz / 2 + dw),          // west wall
                1 => (x0 + sx, z0 + sz / 2 + dw),     // east wall
                2 => (x0 + sx / 2 + dw, z0),          // north wall
                _ => (x0 + sx / 2 + dw, z0 + sz),     // south wall
            };
            if cx >= 0 && cz >= 0 && (cx as usize) < CHUNK_SIZE && (cz as usize) < CHUNK_SIZE {
                chunk.set(cx as usize, (cy0 + dy) as usize, cz as usize, Block::AIR);
            }
        }
    }

    // One chest on the floor, away from the corridor wall.
    let chest_x = (x0 + 1 + (hash3(chunk.cx, chunk.cz, 7) % (sx - 1).max(1) as u32) as i32)
        .min(x0 + sx - 1);
    let chest_z = (z0 + 1 + (hash3(chunk.cx, chunk.cz, 13) % (sz - 1).max(1) as u32) as i32)
        .min(z0 + sz - 1);
    chunk
        .pending_chests
        .push((chest_x as usize, (y0 + 1) as usize, chest_z as usize));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::WorldNoise;

    fn flat_chunk(cx: i32, cz: i32) -> (Chunk, HeightMap) {
        let mut chunk = Chunk::new(cx, cz);
        let heights = [[120i32; CHUNK_SIZE]; CHUNK_SIZE];
        for y in 0..=120usize {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    chunk.set(x, y, z, Block::of(BlockType::Stone));
                }
            }
        }
        (chunk, heights)
    }

    fn winning_coords(params: &TerrainParams) -> (i32, i32) {
        for cx in 0..200 {
            let roll = hash2(cx, 0);
            if f64::from(roll % 1000) / 1000.0 < params.dungeon_frequency {
                return (cx, 0);
            }
        }
        panic!("no dungeon roll succeeded in 200 chunks");
    }

    #[test]
    fn winning_chunk_gets_a_room_with_a_chest() {
        let noise = WorldNoise::new(3);
        let params = TerrainParams::default();
        let (cx, cz) = winning_coords(&params);
        let (mut chunk, heights) = flat_chunk(cx, cz);
        try_place_dungeon(&mut chunk, &noise, &params, &heights);

        assert_eq!(chunk.pending_chests.len(), 1);
        let (x, y, z) = chunk.pending_chests[0];
        // The chest cell sits in carved interior air above the brick floor.
        assert_eq!(chunk.get(x, y, z).kind, BlockType::Air);
        let floor = chunk.get(x, y - 1, z).kind;
        assert!(
            matches!(
                floor,
                BlockType::StoneBrick | BlockType::MossyCobblestone | BlockType::CrackedStoneBrick
            ),
            "floor under chest was {floor:?}"
        );
    }

    #[test]
    fn losing_chunk_is_untouched() {
        let noise = WorldNoise::new(3);
        let params = TerrainParams::default();
        let mut cx = 0;
        loop {
            let roll = hash2(cx, 5);
            if f64::from(roll % 1000) / 1000.0 >= params.dungeon_frequency {
                break;
            }
            cx += 1;
        }
        let (mut chunk, heights) = flat_chunk(cx, 5);
        let before = chunk.solid_block_count();
        try_place_dungeon(&mut chunk, &noise, &params, &heights);
        assert_eq!(chunk.solid_block_count(), before);
        assert!(chunk.pending_chests.is_empty());
    }

    #[test]
    fn dungeon_is_deterministic() {
        let noise = WorldNoise::new(3);
        let params = TerrainParams::default();
        let (cx, cz) = winning_coords(&params);
        let (mut a, heights) = flat_chunk(cx, cz);
        let (mut b, _) = flat_chunk(cx, cz);
        try_place_dungeon(&mut a, &noise, &params, &heights);
        try_place_dungeon(&mut b, &noise, &params, &heights);
        assert_eq!(a.solid_block_count(), b.solid_block_count());
        assert_eq!(a.pending_chests, b.pending_chests);
    }

    #[test]
    fn room_never_breaches_the_surface_margin() {
        let noise = WorldNoise::new(3);
        let params = TerrainParams::default();
        let (cx, cz) = winning_coords(&params);
        // Shallow terrain forces the clamp path.
        let mut chunk = Chunk::new(cx, cz);
        let heights = [[30i32; CHUNK_SIZE]; CHUNK_SIZE];
        for y in 0..=30usize {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    chunk.set(x, y, z, Block::of(BlockType::Stone));
                }
            }
        }
        try_place_dungeon(&mut chunk, &noise, &params, &heights);
        // Nothing above `surface - 5` may have been replaced.
        for y in 26..=30usize {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    assert_eq!(chunk.get(x, y, z).kind, BlockType::Stone);
                }
            }
        }
    }
}
