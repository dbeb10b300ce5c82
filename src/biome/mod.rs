//! Biome classification and per-biome generation properties.
//!
//! A single low-frequency 2D noise field tags every world column with one of
//! four biomes; the properties table tells the terrain generator which
//! surface/subsurface blocks to lay down, how to scale terrain height, and
//! which trees (if any) the column may grow. The table is compiled in and
//! read-only, so biome lookups are safe from worker tasks.

use crate::noise::WorldNoise;
use crate::terrain::trees::TreeKind;

/// Sampling offset so the biome field does not mirror the height field,
/// which shares the same underlying generator.
const BIOME_NOISE_OFFSET: f64 = 10_000.0;
const BIOME_NOISE_FREQUENCY: f64 = 0.003;
const BIOME_NOISE_OCTAVES: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeType {
    Desert,
    Plains,
    Forest,
    Tundra,
}

/// Generation parameters for one biome.
#[derive(Clone, Copy, Debug)]
pub struct BiomeProperties {
    pub name: &'static str,
    pub surface_block: crate::block::BlockType,
    pub subsurface_block: crate::block::BlockType,
    pub height_scale: f64,
    /// Fraction of eligible surface cells that sprout a tree (0..1).
    pub tree_density: f64,
    pub has_trees: bool,
    pub has_cacti: bool,
    pub primary_tree: TreeKind,
    pub secondary_tree: TreeKind,
    /// Probability that a sprouting tree uses the secondary kind.
    pub secondary_chance: f64,
}

impl BiomeType {
    /// Classify the biome at world column `(wx, wz)`.
    #[must_use]
    pub fn at(noise: &WorldNoise, wx: i32, wz: i32) -> Self {
        let v = noise.fbm2(
            f64::from(wx) + BIOME_NOISE_OFFSET,
            f64::from(wz) + BIOME_NOISE_OFFSET,
            BIOME_NOISE_OCTAVES,
            BIOME_NOISE_FREQUENCY,
            1.0,
            2.0,
            0.5,
        );
        match v {
            n if n < -0.3 => BiomeType::Desert,
            n if n < 0.1 => BiomeType::Plains,
            n if n < 0.5 => BiomeType::Forest,
            _ => BiomeType::Tundra,
        }
    }

    /// Static properties table lookup.
    #[must_use]
    pub fn properties(self) -> &'static BiomeProperties {
        use crate::block::BlockType;
        match self {
            BiomeType::Desert => &BiomeProperties {
                name: "desert",
                surface_block: BlockType::Sand,
                subsurface_block: BlockType::Sandstone,
                height_scale: 0.6,
                tree_density: 0.0,
                has_trees: false,
                has_cacti: true,
                primary_tree: TreeKind::Acacia,
                secondary_tree: TreeKind::Acacia,
                secondary_chance: 0.0,
            },
            BiomeType::Plains => &BiomeProperties {
                name: "plains",
                surface_block: BlockType::Grass,
                subsurface_block: BlockType::Dirt,
                height_scale: 0.8,
                tree_density: 0.02,
                has_trees: true,
                has_cacti: false,
                primary_tree: TreeKind::Oak,
                secondary_tree: TreeKind::Birch,
                secondary_chance: 0.2,
            },
            BiomeType::Forest => &BiomeProperties {
                name: "forest",
                surface_block: BlockType::Grass,
                subsurface_block: BlockType::Dirt,
                height_scale: 1.0,
                tree_density: 0.12,
                has_trees: true,
                has_cacti: false,
                primary_tree: TreeKind::Oak,
                secondary_tree: TreeKind::Birch,
                secondary_chance: 0.35,
            },
            BiomeType::Tundra => &BiomeProperties {
                name: "tundra",
                surface_block: BlockType::Snow,
                subsurface_block: BlockType::Dirt,
                height_scale: 1.2,
                tree_density: 0.05,
                has_trees: true,
                has_cacti: false,
                primary_tree: TreeKind::Spruce,
                secondary_tree: TreeKind::Spruce,
                secondary_chance: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_stable() {
        let noise = WorldNoise::new(42);
        for i in -32..32 {
            let wx = i * 57;
            let wz = i * -13;
            assert_eq!(BiomeType::at(&noise, wx, wz), BiomeType::at(&noise, wx, wz));
        }
    }

    #[test]
    fn all_biomes_reachable_over_a_large_area() {
        use std::collections::HashSet;
        let noise = WorldNoise::new(7);
        let mut seen = HashSet::new();
        for x in (-4000..4000).step_by(97) {
            for z in (-4000..4000).step_by(89) {
                seen.insert(BiomeType::at(&noise, x, z));
            }
        }
        assert!(seen.len() >= 3, "expected several biomes, saw {seen:?}");
    }

    #[test]
    fn desert_grows_cacti_not_trees() {
        let p = BiomeType::Desert.properties();
        assert!(p.has_cacti);
        assert!(!p.has_trees);
        assert_eq!(p.surface_block, crate::block::BlockType::Sand);
    }
}
