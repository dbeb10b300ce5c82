//! Atlas builder: paint per-block tiles and pack them into one texture.
//!
//! The builder composes a square tile grid with the `image` crate: one tile
//! per block face slot (top/bottom/side), filled with the block's base color
//! plus a deterministic per-pixel dither so flat faces still read as
//! texture. The packed image is converted into a bevy `Image` (nearest
//! sampling, sRGB) and the tile positions become the [`AtlasUVMap`].

use super::{AtlasUVMap, BlockAtlasUVs, UVBounds};
use crate::block::BlockType;
use crate::noise::hash3;
use bevy::prelude::{Handle, Image, Resource};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::render::texture::ImageSampler;
use image::{ImageBuffer, Rgba, RgbaImage};
use std::collections::HashMap;
use std::sync::Arc;

/// Side length of one tile in pixels.
const TILE_SIZE: u32 = 16;

/// Handle to the packed atlas image stored in bevy assets.
#[derive(Resource, Clone, Debug)]
pub struct AtlasTextureHandle(pub Handle<Image>);

/// All block kinds that receive tiles, in packing order.
const TILED_KINDS: [BlockType; 29] = [
    BlockType::Stone,
    BlockType::DeepStone,
    BlockType::Grass,
    BlockType::Dirt,
    BlockType::Sand,
    BlockType::Sandstone,
    BlockType::Snow,
    BlockType::Gravel,
    BlockType::Clay,
    BlockType::Bedrock,
    BlockType::CoalOre,
    BlockType::IronOre,
    BlockType::GoldOre,
    BlockType::DiamondOre,
    BlockType::Water,
    BlockType::OakWood,
    BlockType::BirchWood,
    BlockType::SpruceWood,
    BlockType::AcaciaWood,
    BlockType::OakLeaves,
    BlockType::BirchLeaves,
    BlockType::SpruceLeaves,
    BlockType::AcaciaLeaves,
    BlockType::Cactus,
    BlockType::StoneBrick,
    BlockType::MossyCobblestone,
    BlockType::CrackedStoneBrick,
    BlockType::Glass,
    BlockType::Glowstone,
];

#[derive(Clone, Copy)]
enum Slot {
    Top,
    Bottom,
    Side,
}

/// Base RGBA for a block face tile. Alpha below 255 marks see-through kinds.
fn tile_color(kind: BlockType, slot: Slot) -> [u8; 4] {
    match (kind, slot) {
        (BlockType::Grass, Slot::Top) => [106, 170, 64, 255],
        (BlockType::Grass, Slot::Side) => [121, 116, 58, 255],
        (BlockType::Grass, Slot::Bottom) => [134, 96, 67, 255],
        (BlockType::Dirt, _) => [134, 96, 67, 255],
        (BlockType::Stone, _) => [125, 125, 125, 255],
        (BlockType::DeepStone, _) => [80, 80, 86, 255],
        (BlockType::Sand, _) => [219, 207, 163, 255],
        (BlockType::Sandstone, _) => [203, 189, 136, 255],
        (BlockType::Snow, Slot::Top) => [240, 246, 246, 255],
        (BlockType::Snow, Slot::Side) => [214, 222, 222, 255],
        (BlockType::Snow, Slot::Bottom) => [134, 96, 67, 255],
        (BlockType::Gravel, _) => [136, 126, 126, 255],
        (BlockType::Clay, _) => [159, 164, 177, 255],
        (BlockType::Bedrock, _) => [50, 50, 50, 255],
        (BlockType::CoalOre, _) => [105, 105, 105, 255],
        (BlockType::IronOre, _) => [175, 142, 119, 255],
        (BlockType::GoldOre, _) => [197, 176, 90, 255],
        (BlockType::DiamondOre, _) => [120, 190, 200, 255],
        (BlockType::Water, _) => [52, 95, 218, 168],
        (BlockType::OakWood, Slot::Side) => [102, 81, 50, 255],
        (BlockType::OakWood, _) => [151, 122, 73, 255],
        (BlockType::BirchWood, Slot::Side) => [216, 215, 210, 255],
        (BlockType::BirchWood, _) => [169, 152, 108, 255],
        (BlockType::SpruceWood, Slot::Side) => [58, 37, 16, 255],
        (BlockType::SpruceWood, _) => [106, 82, 48, 255],
        (BlockType::AcaciaWood, Slot::Side) => [103, 96, 86, 255],
        (BlockType::AcaciaWood, _) => [154, 88, 60, 255],
        (BlockType::OakLeaves, _) => [58, 121, 40, 220],
        (BlockType::BirchLeaves, _) => [98, 138, 70, 220],
        (BlockType::SpruceLeaves, _) => [44, 84, 44, 220],
        (BlockType::AcaciaLeaves, _) => [110, 136, 46, 220],
        (BlockType::Cactus, Slot::Side) => [58, 114, 42, 255],
        (BlockType::Cactus, _) => [74, 131, 56, 255],
        (BlockType::StoneBrick, _) => [118, 118, 118, 255],
        (BlockType::MossyCobblestone, _) => [94, 112, 84, 255],
        (BlockType::CrackedStoneBrick, _) => [108, 104, 102, 255],
        (BlockType::Glass, _) => [208, 236, 240, 96],
        (BlockType::Glowstone, _) => [244, 220, 120, 255],
        // Air never reaches the painter; magenta makes it obvious if it does.
        (BlockType::Air, _) => [255, 0, 255, 255],
    }
}

// Binary-search ceil(sqrt(n)) without floats.
fn ceil_sqrt(n: usize) -> usize {
    if n <= 1 {
        return n;
    }
    let mut low = 1usize;
    let mut high = n;
    while low + 1 < high {
        let mid = usize::midpoint(low, high);
        if mid.saturating_mul(mid) >= n {
            high = mid;
        } else {
            low = mid;
        }
    }
    high
}

fn paint_tile(atlas: &mut RgbaImage, x0: u32, y0: u32, tile_index: u32, base: [u8; 4]) {
    for py in 0..TILE_SIZE {
        for px in 0..TILE_SIZE {
            // Hash-based dither keeps the atlas byte-stable across runs.
            let h = hash3(px as i32, py as i32, tile_index as i32);
            let jitter = (h % 17) as i16 - 8;
            let mut rgba = [0u8; 4];
            for (i, channel) in base.iter().enumerate().take(3) {
                rgba[i] = (i16::from(*channel) + jitter).clamp(0, 255) as u8;
            }
            rgba[3] = base[3];
            atlas.put_pixel(x0 + px, y0 + py, Rgba(rgba));
        }
    }
}

/// Paint and pack the block atlas.
///
/// Returns the packed image (ready to insert into `Assets<Image>`) and the
/// UV map resource. A spare "default" magenta tile is packed last and used
/// as the fallback for unmapped kinds.
#[must_use]
pub fn build_block_atlas() -> (Image, AtlasUVMap) {
    let tile_count = TILED_KINDS.len() * 3 + 1;
    let cols = ceil_sqrt(tile_count) as u32;
    let rows = (tile_count as u32).div_ceil(cols);
    let width = cols * TILE_SIZE;
    let height = rows * TILE_SIZE;

    let mut atlas: RgbaImage = ImageBuffer::new(width, height);
    let mut block_uvs: HashMap<BlockType, BlockAtlasUVs> = HashMap::new();

    let bounds_of = |index: u32| -> UVBounds {
        let x = (index % cols) * TILE_SIZE;
        let y = (index / cols) * TILE_SIZE;
        #[allow(clippy::cast_precision_loss)]
        UVBounds {
            min_u: x as f32 / width as f32,
            max_u: (x + TILE_SIZE) as f32 / width as f32,
            min_v: y as f32 / height as f32,
            max_v: (y + TILE_SIZE) as f32 / height as f32,
        }
    };

    let mut index = 0u32;
    for kind in TILED_KINDS {
        let mut uvs = BlockAtlasUVs::default();
        for slot in [Slot::Top, Slot::Bottom, Slot::Side] {
            let x = (index % cols) * TILE_SIZE;
            let y = (index / cols) * TILE_SIZE;
            paint_tile(&mut atlas, x, y, index, tile_color(kind, slot));
            let b = bounds_of(index);
            match slot {
                Slot::Top => uvs.top = b,
                Slot::Bottom => uvs.bottom = b,
                Slot::Side => uvs.side = b,
            }
            index += 1;
        }
        block_uvs.insert(kind, uvs);
    }

    // Fallback tile: loud magenta so lookup bugs are visible in-world.
    let default_index = index;
    let dx = (default_index % cols) * TILE_SIZE;
    let dy = (default_index / cols) * TILE_SIZE;
    paint_tile(&mut atlas, dx, dy, default_index, [255, 0, 255, 255]);
    let default_bounds = bounds_of(default_index);
    let default_uvs =
        BlockAtlasUVs { top: default_bounds, bottom: default_bounds, side: default_bounds };

    // Best-effort debug copy; failure only costs the inspection aid.
    let saved = std::fs::create_dir_all("debug")
        .map_err(image::ImageError::IoError)
        .and_then(|()| atlas.save("debug/atlas.png"));
    if let Err(e) = saved {
        bevy::log::debug!("could not save debug atlas copy: {e}");
    }

    let mut image = Image::new(
        Extent3d { width, height, depth_or_array_layers: 1 },
        TextureDimension::D2,
        atlas.into_raw(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::nearest();

    #[allow(clippy::cast_precision_loss)]
    let uv_range = TILE_SIZE as f32 / width as f32;
    let map = AtlasUVMap::new(Arc::new(block_uvs), uv_range, default_uvs);
    (image, map)
}
