//! Rendering material for chunk and batch meshes.
//!
//! The voxel material extends bevy's `StandardMaterial` (which carries the
//! texture atlas as its base color texture and multiplies in the baked
//! per-vertex brightness) with a small set of world uniforms: the ambient
//! tint used to color shadowed geometry with the time of day, an underwater
//! flag, and the running time for the underwater wobble. The binding
//! indices are fixed; `shaders/voxel_material.wgsl` relies on them.

use bevy::asset::Asset;
use bevy::pbr::{ExtendedMaterial, MaterialExtension, StandardMaterial};
use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderRef};

/// Concrete material type used by every chunk and batch entity.
pub type VoxelExtendedMaterial = ExtendedMaterial<StandardMaterial, VoxelMaterial>;

#[derive(AsBindGroup, Asset, TypePath, Clone)]
pub struct VoxelMaterial {
    /// Tint applied against shadowed fragments. RGB = tint color,
    /// A = strength (0.0..1.0).
    #[uniform(100)]
    pub ambient_tint: Vec4,

    /// 1 while the camera is submerged; switches the fog/tint path.
    #[uniform(101)]
    pub underwater: u32,

    /// Seconds since startup, for the underwater wobble.
    #[uniform(102)]
    pub time: f32,
}

impl Default for VoxelMaterial {
    fn default() -> Self {
        Self {
            ambient_tint: Vec4::new(0.02, 0.02, 0.03, 0.7),
            underwater: 0,
            time: 0.0,
        }
    }
}

impl MaterialExtension for VoxelMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/voxel_material.wgsl".into()
    }
}

/// Shared handles for the two render passes. The transparent variant blends
/// and never writes depth-sorted artifacts over the opaque pass.
#[derive(Resource, Clone)]
pub struct VoxelMaterialHandles {
    pub opaque: Handle<VoxelExtendedMaterial>,
    pub transparent: Handle<VoxelExtendedMaterial>,
}

/// Build the two pass materials around the atlas texture.
#[must_use]
pub fn make_pass_materials(
    atlas_texture: Handle<Image>,
    materials: &mut Assets<VoxelExtendedMaterial>,
) -> VoxelMaterialHandles {
    let base = |alpha: AlphaMode| StandardMaterial {
        base_color_texture: Some(atlas_texture.clone()),
        perceptual_roughness: 1.0,
        reflectance: 0.05,
        alpha_mode: alpha,
        ..Default::default()
    };

    let opaque = materials.add(ExtendedMaterial {
        base: base(AlphaMode::Opaque),
        extension: VoxelMaterial::default(),
    });
    let transparent = materials.add(ExtendedMaterial {
        base: base(AlphaMode::Blend),
        extension: VoxelMaterial::default(),
    });
    VoxelMaterialHandles { opaque, transparent }
}
