//! Procedural terrain: heightmap, strata, ores, caves and decoration passes.
//!
//! `generate_chunk` fills a chunk's block grid purely from the world noise,
//! the [`TerrainParams`] and the chunk coordinates — two calls with the same
//! inputs produce byte-identical grids, which the streaming pipeline relies
//! on (chunks are regenerated, never persisted).
//!
//! Per column the classifier runs top-down priority rules (air, surface,
//! subsurface, mixed strata, bedrock, ores, pockets, noise caves, stone).
//! After the column pass the chunk is decorated in order: worm tunnels,
//! ellipsoid rooms, a possible dungeon, trees/cacti. Skylight is computed by
//! the caller once decoration is done.

pub mod caves;
pub mod decay;
pub mod dungeon;
pub mod trees;

use crate::biome::BiomeType;
use crate::block::{Block, BlockType};
use crate::chunk::{Chunk, CHUNK_HEIGHT_I32, CHUNK_SIZE, CHUNK_SIZE_I32};
use crate::noise::WorldNoise;
use serde::{Deserialize, Serialize};

/// One ore (or pocket) family: how often it replaces stone and in which
/// vertical band it may appear.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OreParams {
    pub frequency: f64,
    pub min_y: i32,
    pub max_y: i32,
}

/// Complete worldgen configuration. Copied by value into every worker job so
/// tasks never hold a reference back into the world.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub height_offset: f64,
    pub height_scale: f64,
    pub height_octaves: u32,
    pub height_frequency: f64,
    pub height_lacunarity: f64,
    pub height_persistence: f64,

    pub generate_caves: bool,
    pub cave_threshold: f64,
    pub cave_frequency: f64,
    pub cave_octaves: u32,
    pub cave_min_depth: i32,

    pub dirt_depth: i32,
    pub subsoil_depth: i32,
    pub deep_stone_start: i32,
    pub bedrock_start: i32,
    pub bedrock_solid: i32,

    pub coal: OreParams,
    pub iron: OreParams,
    pub gold: OreParams,
    pub diamond: OreParams,
    pub clay: OreParams,
    pub gravel: OreParams,

    pub generate_dungeons: bool,
    pub dungeon_frequency: f64,
    pub dungeon_min_y: i32,
    pub dungeon_max_y: i32,
    pub dungeon_min_size: i32,
    pub dungeon_max_size: i32,

    pub tunnel_radius_min: f64,
    pub tunnel_radius_max: f64,
    pub tunnel_segments: u32,
    pub tunnels_per_chunk: u32,

    pub room_radius_min: f64,
    pub room_radius_max: f64,
    pub rooms_per_chunk: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            height_offset: 160.0,
            height_scale: 24.0,
            height_octaves: 4,
            height_frequency: 0.005,
            height_lacunarity: 2.0,
            height_persistence: 0.5,

            generate_caves: true,
            cave_threshold: 0.55,
            cave_frequency: 0.02,
            cave_octaves: 3,
            cave_min_depth: 8,

            dirt_depth: 4,
            subsoil_depth: 4,
            deep_stone_start: 32,
            bedrock_start: 7,
            bedrock_solid: 3,

            coal: OreParams { frequency: 0.08, min_y: 5, max_y: 128 },
            iron: OreParams { frequency: 0.06, min_y: 5, max_y: 64 },
            gold: OreParams { frequency: 0.035, min_y: 5, max_y: 32 },
            diamond: OreParams { frequency: 0.025, min_y: 5, max_y: 16 },
            clay: OreParams { frequency: 0.04, min_y: 40, max_y: 70 },
            gravel: OreParams { frequency: 0.05, min_y: 10, max_y: 110 },

            generate_dungeons: true,
            dungeon_frequency: 0.04,
            dungeon_min_y: 10,
            dungeon_max_y: 40,
            dungeon_min_size: 5,
            dungeon_max_size: 11,

            tunnel_radius_min: 1.5,
            tunnel_radius_max: 3.0,
            tunnel_segments: 64,
            tunnels_per_chunk: 2,

            room_radius_min: 4.0,
            room_radius_max: 8.0,
            rooms_per_chunk: 1,
        }
    }
}

/// Terrain surface height for a world column, biome scaling applied.
#[must_use]
pub fn terrain_height_at(noise: &WorldNoise, params: &TerrainParams, wx: i32, wz: i32) -> i32 {
    let biome = BiomeType::at(noise, wx, wz);
    let h = params.height_offset
        + noise.fbm2(
            f64::from(wx),
            f64::from(wz),
            params.height_octaves,
            params.height_frequency,
            1.0,
            params.height_lacunarity,
            params.height_persistence,
        ) * params.height_scale
            * biome.properties().height_scale;
    (h.floor() as i32).clamp(1, CHUNK_HEIGHT_I32 - 1)
}

fn ore_at(noise: &WorldNoise, ore: &OreParams, offset: f64, wx: i32, wy: i32, wz: i32) -> bool {
    if wy < ore.min_y || wy > ore.max_y {
        return false;
    }
    let v = noise.noise3(
        (f64::from(wx) + offset) * 0.1,
        (f64::from(wy) + offset) * 0.1,
        (f64::from(wz) + offset) * 0.1,
    );
    v > 1.0 - ore.frequency
}

fn pocket_at(
    noise: &WorldNoise,
    pocket: &OreParams,
    scale: f64,
    offset: f64,
    wx: i32,
    wy: i32,
    wz: i32,
) -> bool {
    if wy < pocket.min_y || wy > pocket.max_y {
        return false;
    }
    let v = noise.noise3(
        (f64::from(wx) + offset) * scale,
        (f64::from(wy) + offset) * scale,
        (f64::from(wz) + offset) * scale,
    );
    v > 1.0 - pocket.frequency
}

/// Noise-cave membership test (§ classifier step before stone).
///
/// Depth below the surface must clear `cave_min_depth`; the acceptance
/// threshold relaxes with depth so deep rock is riddled while the surface
/// crust stays mostly intact.
fn is_noise_cave(
    noise: &WorldNoise,
    params: &TerrainParams,
    wx: i32,
    wy: i32,
    wz: i32,
    terrain_height: i32,
) -> bool {
    if !params.generate_caves || wy < params.bedrock_start {
        return false;
    }
    let depth = terrain_height - wy;
    if depth < params.cave_min_depth || depth > 150 {
        return false;
    }
    let depth_factor = (f64::from(depth) / 100.0).min(1.0);
    let threshold = params.cave_threshold + (1.0 - depth_factor) * 0.15;
    noise.fbm3(
        f64::from(wx),
        f64::from(wy),
        f64::from(wz),
        params.cave_octaves,
        params.cave_frequency,
        1.0,
        2.0,
        0.5,
    ) > threshold
}

/// Classify one cell of a column. First matching rule wins.
#[allow(clippy::too_many_arguments)]
fn classify(
    noise: &WorldNoise,
    params: &TerrainParams,
    biome: BiomeType,
    wx: i32,
    wy: i32,
    wz: i32,
    terrain_height: i32,
) -> BlockType {
    let props = biome.properties();
    if wy > terrain_height {
        return BlockType::Air;
    }
    if wy == terrain_height {
        return props.surface_block;
    }
    if wy > terrain_height - params.dirt_depth {
        return props.subsurface_block;
    }
    if wy > terrain_height - params.dirt_depth - params.subsoil_depth {
        // Mixed transition band: clay / dirt / gravel picked by 3D noise.
        let v = noise.noise3(
            f64::from(wx) * 0.1,
            f64::from(wy) * 0.1,
            f64::from(wz) * 0.1,
        );
        return if v > 0.5 {
            BlockType::Clay
        } else if v < -0.5 {
            BlockType::Gravel
        } else {
            BlockType::Dirt
        };
    }
    if wy <= params.bedrock_solid {
        return BlockType::Bedrock;
    }
    if wy <= params.bedrock_start {
        // Ragged bedrock top: chance grows toward the solid floor.
        let chance = f64::from(params.bedrock_start - wy) / 4.0;
        let oracle = (noise.noise3(
            f64::from(wx) * 0.1,
            f64::from(wy) * 0.1,
            f64::from(wz) * 0.1,
        ) + 1.0)
            / 2.0;
        if oracle < chance {
            return BlockType::Bedrock;
        }
    }
    if wy <= params.deep_stone_start {
        if ore_at(noise, &params.diamond, 3_000.0, wx, wy, wz) {
            return BlockType::DiamondOre;
        }
        if ore_at(noise, &params.gold, 4_000.0, wx, wy, wz) {
            return BlockType::GoldOre;
        }
        if is_noise_cave(noise, params, wx, wy, wz, terrain_height) {
            return BlockType::Air;
        }
        return BlockType::DeepStone;
    }
    if pocket_at(noise, &params.gravel, 0.15, 5_000.0, wx, wy, wz) {
        return BlockType::Gravel;
    }
    if pocket_at(noise, &params.clay, 0.12, 6_000.0, wx, wy, wz) {
        return BlockType::Clay;
    }
    if ore_at(noise, &params.iron, 1_000.0, wx, wy, wz) {
        return BlockType::IronOre;
    }
    if ore_at(noise, &params.coal, 2_000.0, wx, wy, wz) {
        return BlockType::CoalOre;
    }
    if is_noise_cave(noise, params, wx, wy, wz, terrain_height) {
        return BlockType::Air;
    }
    BlockType::Stone
}

/// Per-chunk cache of column heights, shared by the decoration passes.
pub type HeightMap = [[i32; CHUNK_SIZE]; CHUNK_SIZE];

/// Fill `chunk` from scratch. The caller computes skylight afterwards.
pub fn generate_chunk(chunk: &mut Chunk, noise: &WorldNoise, params: &TerrainParams) {
    let base_x = chunk.cx * CHUNK_SIZE_I32;
    let base_z = chunk.cz * CHUNK_SIZE_I32;

    let mut heights: HeightMap = [[0; CHUNK_SIZE]; CHUNK_SIZE];
    let mut biomes = [[BiomeType::Plains; CHUNK_SIZE]; CHUNK_SIZE];
    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            let wx = base_x + x as i32;
            let wz = base_z + z as i32;
            biomes[z][x] = BiomeType::at(noise, wx, wz);
            heights[z][x] = terrain_height_at(noise, params, wx, wz);
        }
    }

    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            let wx = base_x + x as i32;
            let wz = base_z + z as i32;
            let th = heights[z][x];
            let biome = biomes[z][x];
            for y in 0..CHUNK_HEIGHT_I32 {
                let kind = classify(noise, params, biome, wx, y, wz, th);
                if kind != BlockType::Air {
                    chunk.set(x, y as usize, z, Block::of(kind));
                }
            }
        }
    }

    caves::carve_tunnels(chunk, noise, params, &heights);
    caves::carve_rooms(chunk, params, &heights);
    if params.generate_dungeons {
        dungeon::try_place_dungeon(chunk, noise, params, &heights);
    }
    trees::plant_chunk(chunk, noise, &heights, &biomes);

    chunk.needs_remesh = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::CHUNK_HEIGHT;

    fn generated(seed: u32, cx: i32, cz: i32) -> Chunk {
        let noise = WorldNoise::new(seed);
        let params = TerrainParams::default();
        let mut chunk = Chunk::new(cx, cz);
        generate_chunk(&mut chunk, &noise, &params);
        crate::chunk::light::compute_skylight(&mut chunk);
        chunk
    }

    #[test]
    fn generation_is_byte_identical_for_same_inputs() {
        let a = generated(42, 5, -3);
        let b = generated(42, 5, -3);
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    assert_eq!(
                        a.get(x, y, z),
                        b.get(x, y, z),
                        "mismatch at ({x}, {y}, {z})"
                    );
                }
            }
        }
        assert_eq!(a.solid_block_count(), b.solid_block_count());
    }

    #[test]
    fn different_seeds_differ() {
        let a = generated(1, 0, 0);
        let b = generated(2, 0, 0);
        let mut diffs = 0;
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    if a.get(x, y, z).kind != b.get(x, y, z).kind {
                        diffs += 1;
                    }
                }
            }
        }
        assert!(diffs > 100, "seeds 1 and 2 nearly identical ({diffs} diffs)");
    }

    #[test]
    fn column_structure_matches_the_classifier_contract() {
        let noise = WorldNoise::new(42);
        let params = TerrainParams::default();
        let chunk = generated(42, 0, 0);
        let th = terrain_height_at(&noise, &params, 8, 8);
        let surface = BiomeType::at(&noise, 8, 8).properties().surface_block;

        assert_eq!(chunk.get(8, th as usize, 8).kind, surface);
        // Above the surface: air all the way up.
        assert_eq!(chunk.get(8, (th + 20) as usize, 8).kind, BlockType::Air);
        assert_eq!(chunk.get(8, CHUNK_HEIGHT - 1, 8).kind, BlockType::Air);
        // Immediately below: biome subsurface for dirt_depth - 1 cells.
        let sub = BiomeType::at(&noise, 8, 8).properties().subsurface_block;
        for dy in 1..params.dirt_depth {
            assert_eq!(chunk.get(8, (th - dy) as usize, 8).kind, sub);
        }
        // The solid bedrock floor is unconditional.
        for y in 0..=params.bedrock_solid {
            assert_eq!(chunk.get(8, y as usize, 8).kind, BlockType::Bedrock);
        }
    }

    #[test]
    fn ores_stay_inside_their_bands() {
        let params = TerrainParams::default();
        for cx in -2..2 {
            let chunk = generated(7, cx, 0);
            for y in 0..CHUNK_HEIGHT {
                for z in 0..CHUNK_SIZE {
                    for x in 0..CHUNK_SIZE {
                        let kind = chunk.get(x, y, z).kind;
                        let y = y as i32;
                        match kind {
                            BlockType::DiamondOre => {
                                assert!(y >= params.diamond.min_y && y <= params.diamond.max_y);
                            }
                            BlockType::GoldOre => {
                                assert!(y >= params.gold.min_y && y <= params.gold.max_y);
                            }
                            BlockType::IronOre => {
                                assert!(y >= params.iron.min_y && y <= params.iron.max_y);
                            }
                            BlockType::CoalOre => {
                                assert!(y >= params.coal.min_y && y <= params.coal.max_y);
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn caves_never_pierce_bedrock_floor() {
        let params = TerrainParams::default();
        for cz in -2..2 {
            let chunk = generated(99, 0, cz);
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    for y in 0..=params.bedrock_solid as usize {
                        assert_eq!(chunk.get(x, y, z).kind, BlockType::Bedrock);
                    }
                }
            }
        }
    }

    #[test]
    fn skylight_is_part_of_the_deterministic_fingerprint() {
        let a = generated(1234, -7, 11);
        let b = generated(1234, -7, 11);
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    assert_eq!(a.get(x, y, z).light, b.get(x, y, z).light);
                }
            }
        }
    }
}
