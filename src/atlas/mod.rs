//! Texture atlas types and the runtime UV-lookup resource.
//!
//! The atlas maps `(block kind, face) → UV sub-rect` inside one packed
//! texture. Tiles are painted procedurally at startup (see [`builder`]), so
//! the repo ships no image assets; the lookup surface is the same as it
//! would be for a file-based atlas.

use crate::block::BlockType;
use bevy::prelude::Resource;
use std::collections::HashMap;
use std::sync::Arc;

pub mod builder;

pub use builder::{build_block_atlas, AtlasTextureHandle};

/// One of the six cube faces, used for UV lookup and shading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    Top,
    Bottom,
    East,
    West,
    South,
    North,
}

impl Face {
    /// Collapse the four lateral faces onto the shared side tile.
    #[must_use]
    pub fn is_side(self) -> bool {
        !matches!(self, Face::Top | Face::Bottom)
    }
}

/// Axis-aligned UV bounds (min/max U and V) for a single texture tile.
#[derive(Clone, Copy, Debug, Default)]
pub struct UVBounds {
    pub min_u: f32,
    pub max_u: f32,
    pub min_v: f32,
    pub max_v: f32,
}

/// Per-face UV bounds for a block kind (sides share one tile).
#[derive(Clone, Copy, Debug, Default)]
pub struct BlockAtlasUVs {
    pub top: UVBounds,
    pub bottom: UVBounds,
    pub side: UVBounds,
}

/// Resource storing atlas UV mappings for every block kind.
#[derive(Resource, Clone, Default)]
pub struct AtlasUVMap {
    pub block_uvs: Arc<HashMap<BlockType, BlockAtlasUVs>>,
    /// Size of one tile in UV space.
    pub uv_range: f32,
    /// Fallback for kinds missing from the map.
    pub default_uvs: BlockAtlasUVs,
}

impl AtlasUVMap {
    #[must_use]
    pub fn new(
        block_uvs: Arc<HashMap<BlockType, BlockAtlasUVs>>,
        uv_range: f32,
        default_uvs: BlockAtlasUVs,
    ) -> Self {
        Self { block_uvs, uv_range, default_uvs }
    }

    /// UV bounds for a block face; the default tile when the kind is
    /// unmapped so every `(kind, face)` pair resolves to a valid sub-rect.
    #[must_use]
    pub fn get_face_uvs(&self, kind: BlockType, face: Face) -> UVBounds {
        let uvs = self.block_uvs.get(&kind).copied().unwrap_or(self.default_uvs);
        match face {
            Face::Top => uvs.top,
            Face::Bottom => uvs.bottom,
            _ => uvs.side,
        }
    }
}
