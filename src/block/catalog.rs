//! Static per-kind block properties.
//!
//! The catalog is a compiled-in table: solidity, transparency, light
//! emission and the mining drop for every [`BlockType`]. It is read-only by
//! construction, so it can be consulted from worker tasks without any
//! synchronization.

use super::BlockType;

/// A mined-block yield: what lands in the player's hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemStack {
    pub kind: BlockType,
    pub count: u32,
}

/// Render/physics properties of one block kind.
#[derive(Clone, Copy, Debug)]
pub struct BlockProps {
    pub solid: bool,
    pub transparent: bool,
    pub emission: u8,
    pub drop: Option<ItemStack>,
}

const fn drops(kind: BlockType) -> Option<ItemStack> {
    Some(ItemStack { kind, count: 1 })
}

const OPAQUE: BlockProps = BlockProps { solid: true, transparent: false, emission: 0, drop: None };
const SEE_THROUGH: BlockProps =
    BlockProps { solid: true, transparent: true, emission: 0, drop: None };

impl BlockType {
    /// Look up the static properties for this kind.
    #[must_use]
    pub const fn props(self) -> BlockProps {
        match self {
            BlockType::Air => {
                BlockProps { solid: false, transparent: true, emission: 0, drop: None }
            }
            BlockType::Stone => BlockProps { drop: drops(BlockType::Stone), ..OPAQUE },
            BlockType::DeepStone => BlockProps { drop: drops(BlockType::DeepStone), ..OPAQUE },
            BlockType::Grass => BlockProps { drop: drops(BlockType::Dirt), ..OPAQUE },
            BlockType::Dirt => BlockProps { drop: drops(BlockType::Dirt), ..OPAQUE },
            BlockType::Sand => BlockProps { drop: drops(BlockType::Sand), ..OPAQUE },
            BlockType::Sandstone => BlockProps { drop: drops(BlockType::Sandstone), ..OPAQUE },
            BlockType::Snow => BlockProps { drop: drops(BlockType::Dirt), ..OPAQUE },
            BlockType::Gravel => BlockProps { drop: drops(BlockType::Gravel), ..OPAQUE },
            BlockType::Clay => BlockProps { drop: drops(BlockType::Clay), ..OPAQUE },
            // Bedrock is unbreakable: no drop, and interaction refuses to mine it.
            BlockType::Bedrock => OPAQUE,
            BlockType::CoalOre => BlockProps { drop: drops(BlockType::CoalOre), ..OPAQUE },
            BlockType::IronOre => BlockProps { drop: drops(BlockType::IronOre), ..OPAQUE },
            BlockType::GoldOre => BlockProps { drop: drops(BlockType::GoldOre), ..OPAQUE },
            BlockType::DiamondOre => BlockProps { drop: drops(BlockType::DiamondOre), ..OPAQUE },
            BlockType::Water => SEE_THROUGH,
            BlockType::OakWood => BlockProps { drop: drops(BlockType::OakWood), ..OPAQUE },
            BlockType::BirchWood => BlockProps { drop: drops(BlockType::BirchWood), ..OPAQUE },
            BlockType::SpruceWood => BlockProps { drop: drops(BlockType::SpruceWood), ..OPAQUE },
            BlockType::AcaciaWood => BlockProps { drop: drops(BlockType::AcaciaWood), ..OPAQUE },
            BlockType::OakLeaves
            | BlockType::BirchLeaves
            | BlockType::SpruceLeaves
            | BlockType::AcaciaLeaves => SEE_THROUGH,
            BlockType::Cactus => BlockProps { drop: drops(BlockType::Cactus), ..SEE_THROUGH },
            BlockType::StoneBrick => BlockProps { drop: drops(BlockType::StoneBrick), ..OPAQUE },
            BlockType::MossyCobblestone => {
                BlockProps { drop: drops(BlockType::MossyCobblestone), ..OPAQUE }
            }
            BlockType::CrackedStoneBrick => {
                BlockProps { drop: drops(BlockType::CrackedStoneBrick), ..OPAQUE }
            }
            BlockType::Glass => SEE_THROUGH,
            BlockType::Glowstone => BlockProps {
                solid: true,
                transparent: false,
                emission: 15,
                drop: drops(BlockType::Glowstone),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_neither_solid_nor_opaque() {
        assert!(!BlockType::Air.is_solid());
        assert!(!BlockType::Air.is_opaque());
        assert!(BlockType::Air.is_transparent());
    }

    #[test]
    fn transparent_kinds_are_solid_but_not_opaque() {
        for kind in [
            BlockType::Water,
            BlockType::OakLeaves,
            BlockType::Glass,
            BlockType::Cactus,
        ] {
            assert!(kind.is_solid(), "{kind:?} should occupy its cell");
            assert!(kind.is_transparent(), "{kind:?} should be transparent");
            assert!(!kind.is_opaque(), "{kind:?} should not occlude fully");
        }
    }

    #[test]
    fn grass_drops_dirt_and_bedrock_drops_nothing() {
        assert_eq!(
            BlockType::Grass.drop_for(),
            Some(ItemStack { kind: BlockType::Dirt, count: 1 })
        );
        assert_eq!(BlockType::Bedrock.drop_for(), None);
        assert_eq!(BlockType::Water.drop_for(), None);
    }

    #[test]
    fn only_glowstone_emits() {
        assert_eq!(BlockType::Glowstone.emission(), 15);
        assert_eq!(BlockType::Stone.emission(), 0);
        assert_eq!(BlockType::Water.emission(), 0);
    }
}
