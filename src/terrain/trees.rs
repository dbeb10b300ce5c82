//! Tree and cactus stamping.
//!
//! Each tree is a deterministic list of block stamps relative to its trunk
//! base, built per `(kind, size)` pair. Placement walks every surface cell
//! of a tree-eligible column, rolls a detail-noise value, enforces a 7×7
//! spacing neighborhood (chunk-local), and stamps with clipping — stamps
//! falling outside the chunk are silently dropped and solid non-leaf blocks
//! are never overwritten. All tree cells carry the natural metadata bit so
//! leaf decay ignores player-built wood.

use super::HeightMap;
use crate::biome::BiomeType;
use crate::block::{Block, BlockType};
use crate::chunk::{Chunk, CHUNK_HEIGHT_I32, CHUNK_SIZE, CHUNK_SIZE_I32};
use crate::noise::{hash2, WorldNoise};

/// The four grown tree species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeKind {
    Oak,
    Birch,
    Spruce,
    Acacia,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeSize {
    Small,
    Medium,
    Large,
}

impl TreeKind {
    #[must_use]
    pub fn wood(self) -> BlockType {
        match self {
            TreeKind::Oak => BlockType::OakWood,
            TreeKind::Birch => BlockType::BirchWood,
            TreeKind::Spruce => BlockType::SpruceWood,
            TreeKind::Acacia => BlockType::AcaciaWood,
        }
    }

    #[must_use]
    pub fn leaves(self) -> BlockType {
        match self {
            TreeKind::Oak => BlockType::OakLeaves,
            TreeKind::Birch => BlockType::BirchLeaves,
            TreeKind::Spruce => BlockType::SpruceLeaves,
            TreeKind::Acacia => BlockType::AcaciaLeaves,
        }
    }

    fn trunk_height(self, size: TreeSize) -> i32 {
        match (self, size) {
            (TreeKind::Oak | TreeKind::Acacia, TreeSize::Small) => 4,
            (TreeKind::Oak | TreeKind::Acacia, TreeSize::Medium) => 5,
            (TreeKind::Oak | TreeKind::Acacia, TreeSize::Large) => 6,
            (TreeKind::Birch, TreeSize::Small) => 5,
            (TreeKind::Birch, TreeSize::Medium) => 6,
            (TreeKind::Birch, TreeSize::Large) => 7,
            (TreeKind::Spruce, TreeSize::Small) => 6,
            (TreeKind::Spruce, TreeSize::Medium) => 8,
            (TreeKind::Spruce, TreeSize::Large) => 10,
        }
    }
}

/// Block stamp relative to the trunk base (`dy = 0` is the first block
/// above the surface cell).
pub type Stamp = (i32, i32, i32, BlockType);

/// Build the stamp list for one tree variant.
#[must_use]
pub fn stamps(kind: TreeKind, size: TreeSize) -> Vec<Stamp> {
    let trunk_h = kind.trunk_height(size);
    let wood = kind.wood();
    let leaves = kind.leaves();
    let mut out: Vec<Stamp> = Vec::new();

    for dy in 0..trunk_h {
        out.push((0, dy, 0, wood));
    }

    let mut canopy = |dy: i32, radius: i32, skip_corners: bool| {
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                if skip_corners && dx.abs() == radius && dz.abs() == radius {
                    continue;
                }
                if dx == 0 && dz == 0 && dy < trunk_h {
                    continue; // trunk cell
                }
                out.push((dx, dy, dz, leaves));
            }
        }
    };

    match kind {
        TreeKind::Oak | TreeKind::Birch => {
            let wide = if kind == TreeKind::Oak { 2 } else { 1 };
            canopy(trunk_h - 2, wide, true);
            canopy(trunk_h - 1, wide, true);
            canopy(trunk_h, 1, true);
            canopy(trunk_h + 1, 0, false);
        }
        TreeKind::Spruce => {
            // Conical: wide rings low, narrowing to a single tip.
            let mut radius = 2;
            let mut dy = trunk_h - 4;
            while dy < trunk_h {
                canopy(dy, radius, true);
                radius = (radius - 1).max(1);
                dy += 1;
            }
            canopy(trunk_h, 1, true);
            canopy(trunk_h + 1, 0, false);
        }
        TreeKind::Acacia => {
            // Flat umbrella crown.
            canopy(trunk_h - 1, 2, true);
            canopy(trunk_h, 2, false);
        }
    }
    out
}

const CACTUS_THRESHOLD: f64 = 0.75;
/// Vertical window above the surface scanned for spacing conflicts.
const SPACING_SCAN_HEIGHT: i32 = 4;
const SPACING_RADIUS: i32 = 3;

/// Plant trees and cacti on every eligible surface cell of the chunk.
pub fn plant_chunk(
    chunk: &mut Chunk,
    noise: &WorldNoise,
    heights: &HeightMap,
    biomes: &[[BiomeType; CHUNK_SIZE]; CHUNK_SIZE],
) {
    let base_x = chunk.cx * CHUNK_SIZE_I32;
    let base_z = chunk.cz * CHUNK_SIZE_I32;

    for z in 0..CHUNK_SIZE {
        for x in 0..CHUNK_SIZE {
            let biome = biomes[z][x].properties();
            if !biome.has_trees && !biome.has_cacti {
                continue;
            }
            let th = heights[z][x];
            if chunk.get(x, th as usize, z).kind != biome.surface_block {
                continue; // column surface was carved or replaced
            }

            let wx = base_x + x as i32;
            let wz = base_z + z as i32;
            let vnoise = noise.noise2_detail(
                f64::from(wx) * 0.08 + 5_000.0,
                f64::from(wz) * 0.08 + 5_000.0,
            );

            if biome.has_cacti && vnoise > CACTUS_THRESHOLD {
                let height = 1 + (hash2(wx, wz) % 3) as i32;
                for dy in 1..=height {
                    let y = th + dy;
                    if y >= CHUNK_HEIGHT_I32
                        || chunk.get(x, y as usize, z).kind != BlockType::Air
                    {
                        break;
                    }
                    chunk.set(x, y as usize, z, Block::natural(BlockType::Cactus));
                }
                continue;
            }

            if !biome.has_trees || vnoise <= 1.0 - biome.tree_density {
                continue;
            }
            if neighborhood_occupied(chunk, x as i32, th, z as i32) {
                continue;
            }

            let bits = hash2(wx, wz);
            let size = match bits % 3 {
                0 => TreeSize::Small,
                1 => TreeSize::Medium,
                _ => TreeSize::Large,
            };
            // Separate bit range so size and species roll independently.
            let species_roll = f64::from((bits >> 8) & 0xFF) / 255.0;
            let kind = if species_roll < biome.secondary_chance {
                biome.secondary_tree
            } else {
                biome.primary_tree
            };

            stamp_tree(chunk, x as i32, th + 1, z as i32, kind, size);
        }
    }
}

/// 7×7 chunk-local scan for wood or cactus in the first few cells above the
/// surface; keeps trees from growing into each other.
fn neighborhood_occupied(chunk: &Chunk, x: i32, th: i32, z: i32) -> bool {
    for dz in -SPACING_RADIUS..=SPACING_RADIUS {
        for dx in -SPACING_RADIUS..=SPACING_RADIUS {
            let nx = x + dx;
            let nz = z + dz;
            if nx < 0 || nz < 0 || nx >= CHUNK_SIZE_I32 || nz >= CHUNK_SIZE_I32 {
                continue;
            }
            for dy in 1..=SPACING_SCAN_HEIGHT {
                let y = th + dy;
                if y < 0 || y >= CHUNK_HEIGHT_I32 {
                    continue;
                }
                let kind = chunk.get(nx as usize, y as usize, nz as usize).kind;
                if kind.is_wood() || kind == BlockType::Cactus {
                    return true;
                }
            }
        }
    }
    false
}

/// Stamp one tree with clipping. Never overwrites solid non-leaf cells.
pub fn stamp_tree(chunk: &mut Chunk, x: i32, base_y: i32, z: i32, kind: TreeKind, size: TreeSize) {
    for (dx, dy, dz, block) in stamps(kind, size) {
        let tx = x + dx;
        let ty = base_y + dy;
        let tz = z + dz;
        if tx < 0 || tz < 0 || ty < 0 || tx >= CHUNK_SIZE_I32 || tz >= CHUNK_SIZE_I32 || ty >= CHUNK_HEIGHT_I32
        {
            continue;
        }
        let existing = chunk.get(tx as usize, ty as usize, tz as usize).kind;
        let replaceable = !existing.is_solid() || existing.is_leaves();
        // Trunk wood wins over its own canopy; nothing else is displaced.
        if replaceable || (block == kind.wood() && existing == kind.leaves()) {
            chunk.set(tx as usize, ty as usize, tz as usize, Block::natural(block));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_trunk_and_canopy() {
        for kind in [TreeKind::Oak, TreeKind::Birch, TreeKind::Spruce, TreeKind::Acacia] {
            for size in [TreeSize::Small, TreeSize::Medium, TreeSize::Large] {
                let list = stamps(kind, size);
                let wood = list.iter().filter(|s| s.3 == kind.wood()).count();
                let leaves = list.iter().filter(|s| s.3 == kind.leaves()).count();
                assert_eq!(wood as i32, kind.trunk_height(size));
                assert!(leaves >= 5, "{kind:?} {size:?} canopy too small");
            }
        }
    }

    #[test]
    fn stamp_clips_at_chunk_borders() {
        let mut chunk = Chunk::new(0, 0);
        stamp_tree(&mut chunk, 0, 100, 0, TreeKind::Oak, TreeSize::Large);
        // Trunk present, canopy partially clipped, nothing panicked.
        assert!(chunk.get(0, 100, 0).kind.is_wood());
        assert!(chunk.solid_block_count() > 6);
    }

    #[test]
    fn stamp_does_not_displace_solid_blocks() {
        let mut chunk = Chunk::new(0, 0);
        chunk.set(9, 103, 8, Block::of(BlockType::Stone));
        stamp_tree(&mut chunk, 8, 100, 8, TreeKind::Oak, TreeSize::Medium);
        assert_eq!(chunk.get(9, 103, 8).kind, BlockType::Stone);
    }

    #[test]
    fn stamped_cells_are_marked_natural() {
        let mut chunk = Chunk::new(0, 0);
        stamp_tree(&mut chunk, 8, 100, 8, TreeKind::Birch, TreeSize::Small);
        assert!(chunk.get(8, 100, 8).is_natural());
    }

    #[test]
    fn planted_trees_keep_their_spacing() {
        // A flat all-grass forest chunk: after planting, no two trunks may
        // stand within the spacing radius of each other.
        let noise = WorldNoise::new(4);
        let mut chunk = Chunk::new(0, 0);
        let heights = [[100i32; CHUNK_SIZE]; CHUNK_SIZE];
        let biomes = [[BiomeType::Forest; CHUNK_SIZE]; CHUNK_SIZE];
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                for y in 0..=100usize {
                    chunk.set(x, y, z, Block::of(BlockType::Stone));
                }
                chunk.set(x, 100, z, Block::of(BlockType::Grass));
            }
        }
        plant_chunk(&mut chunk, &noise, &heights, &biomes);

        let mut trunks = Vec::new();
        for z in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                if chunk.get(x, 101, z).kind.is_wood() {
                    trunks.push((x as i32, z as i32));
                }
            }
        }
        for (i, a) in trunks.iter().enumerate() {
            for b in trunks.iter().skip(i + 1) {
                let cheb = (a.0 - b.0).abs().max((a.1 - b.1).abs());
                assert!(cheb > SPACING_RADIUS, "trunks at {a:?} and {b:?} too close");
            }
        }
    }

    #[test]
    fn planting_is_deterministic() {
        let noise = WorldNoise::new(4);
        let heights = [[100i32; CHUNK_SIZE]; CHUNK_SIZE];
        let biomes = [[BiomeType::Forest; CHUNK_SIZE]; CHUNK_SIZE];
        let build = || {
            let mut chunk = Chunk::new(2, 2);
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    for y in 0..=100usize {
                        chunk.set(x, y, z, Block::of(BlockType::Stone));
                    }
                    chunk.set(x, 100, z, Block::of(BlockType::Grass));
                }
            }
            plant_chunk(&mut chunk, &noise, &heights, &biomes);
            chunk
        };
        let a = build();
        let b = build();
        assert_eq!(a.solid_block_count(), b.solid_block_count());
    }
}
