pub mod voxel_material;

pub use voxel_material::{
    make_pass_materials, VoxelExtendedMaterial, VoxelMaterial, VoxelMaterialHandles,
};
