//! Block cell representation and the block kind enumeration.
//!
//! A world cell is a [`Block`]: a kind, a skylight value and a metadata
//! byte. Metadata is overloaded per kind — water packs its flow level and
//! falling flag into it, tree blocks use it to mark naturally generated
//! wood/leaves (so leaf decay only touches world-grown trees).

pub mod catalog;
pub mod interaction;

pub use catalog::{BlockProps, ItemStack};
pub use interaction::block_interaction;

use serde::{Deserialize, Serialize};

/// Highest skylight value a cell can carry.
pub const LIGHT_MAX: u8 = 15;

/// Water metadata layout: bits 0–2 flow level (0 = source .. 7 = thinnest),
/// bit 3 set while the column is falling.
pub const WATER_LEVEL_MASK: u8 = 0b0000_0111;
pub const WATER_FALLING_BIT: u8 = 0b0000_1000;
/// Tree metadata: bit 0 marks naturally generated wood/leaves.
pub const TREE_NATURAL_BIT: u8 = 0b0000_0001;

/// Every block kind the generator or the player can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    Air,
    Stone,
    DeepStone,
    Grass,
    Dirt,
    Sand,
    Sandstone,
    Snow,
    Gravel,
    Clay,
    Bedrock,
    CoalOre,
    IronOre,
    GoldOre,
    DiamondOre,
    Water,
    OakWood,
    BirchWood,
    SpruceWood,
    AcaciaWood,
    OakLeaves,
    BirchLeaves,
    SpruceLeaves,
    AcaciaLeaves,
    Cactus,
    StoneBrick,
    MossyCobblestone,
    CrackedStoneBrick,
    Glass,
    Glowstone,
}

impl BlockType {
    /// Whether the kind occupies its cell (everything except air).
    #[must_use]
    pub fn is_solid(self) -> bool {
        self.props().solid
    }

    /// Whether the kind lets light and sight through (leaves, water, glass).
    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.props().transparent
    }

    /// Solid and not transparent: blocks light and occludes faces fully.
    #[must_use]
    pub fn is_opaque(self) -> bool {
        let p = self.props();
        p.solid && !p.transparent
    }

    /// True for all four wood kinds.
    #[must_use]
    pub fn is_wood(self) -> bool {
        matches!(
            self,
            BlockType::OakWood | BlockType::BirchWood | BlockType::SpruceWood | BlockType::AcaciaWood
        )
    }

    /// True for all four leaf kinds.
    #[must_use]
    pub fn is_leaves(self) -> bool {
        matches!(
            self,
            BlockType::OakLeaves
                | BlockType::BirchLeaves
                | BlockType::SpruceLeaves
                | BlockType::AcaciaLeaves
        )
    }

    /// Light emitted by the kind itself (0 for almost everything).
    #[must_use]
    pub fn emission(self) -> u8 {
        self.props().emission
    }

    /// What mining this kind yields, if anything.
    #[must_use]
    pub fn drop_for(self) -> Option<ItemStack> {
        self.props().drop
    }
}

/// One world cell. Kept at three bytes so a chunk grid stays under 200 KiB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockType,
    pub light: u8,
    pub meta: u8,
}

impl Block {
    pub const AIR: Block = Block { kind: BlockType::Air, light: 0, meta: 0 };

    /// A plain cell of `kind` with no light and empty metadata.
    #[must_use]
    pub fn of(kind: BlockType) -> Self {
        Block { kind, light: 0, meta: 0 }
    }

    /// A water cell with the given flow `level` and `falling` flag.
    #[must_use]
    pub fn water(level: u8, falling: bool) -> Self {
        let mut meta = level & WATER_LEVEL_MASK;
        if falling {
            meta |= WATER_FALLING_BIT;
        }
        Block { kind: BlockType::Water, light: 0, meta }
    }

    /// A naturally generated tree cell (wood or leaves).
    #[must_use]
    pub fn natural(kind: BlockType) -> Self {
        Block { kind, light: 0, meta: TREE_NATURAL_BIT }
    }

    /// Flow level of a water cell; 0 is a source.
    #[must_use]
    pub fn water_level(self) -> u8 {
        self.meta & WATER_LEVEL_MASK
    }

    #[must_use]
    pub fn is_falling_water(self) -> bool {
        self.kind == BlockType::Water && self.meta & WATER_FALLING_BIT != 0
    }

    #[must_use]
    pub fn is_natural(self) -> bool {
        self.meta & TREE_NATURAL_BIT != 0
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::AIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn water_metadata_round_trip() {
        for level in 0..=7u8 {
            for falling in [false, true] {
                let b = Block::water(level, falling);
                assert_eq!(b.water_level(), level);
                assert_eq!(b.is_falling_water(), falling);
            }
        }
    }

    #[test]
    fn natural_flag_marks_tree_blocks() {
        let wood = Block::natural(BlockType::OakWood);
        assert!(wood.is_natural());
        assert!(!Block::of(BlockType::OakWood).is_natural());
    }

    #[test]
    fn cell_is_three_bytes() {
        assert_eq!(std::mem::size_of::<Block>(), 3);
    }
}
