//! Per-face chunk meshing with ambient occlusion and baked brightness.
//!
//! The mesher walks every solid cell and emits a quad for each face whose
//! neighbor does not fully occlude it: a face between cell `A` and neighbor
//! `N` exists iff `A` is solid and `N` is either not solid or transparent.
//! Opaque kinds land in the opaque stream, transparent kinds (water, leaves,
//! glass, cactus) in the transparent stream, so the two passes can use
//! different blend states.
//!
//! Shading is baked into the vertex color: a per-face directional
//! brightness, a per-vertex ambient-occlusion factor from the three corner
//! neighbors, and a per-cell light factor. The light factor is computed once
//! per cell (max of the six neighbors, floored) and shared by all of the
//! cell's faces so mining a neighbor never makes individual facets pop.
//!
//! Meshing runs on worker tasks and produces plain vertex vectors
//! ([`StagedBuffers`]); converting to a GPU `Mesh` asset happens on the main
//! thread via [`StagedBuffers::into_mesh`].

use super::{Chunk, CHUNK_HEIGHT, CHUNK_SIZE};
use crate::atlas::{AtlasUVMap, Face};
use crate::block::{Block, LIGHT_MAX};
use bevy::prelude::Mesh;
use bevy::render::render_asset::RenderAssetUsages;

/// Ambient-occlusion factors indexed by `3 - (side1 + side2 + corner)`.
const AO_TABLE: [f32; 4] = [0.4, 0.6, 0.8, 1.0];

/// Light floor for fully enclosed cells (never pitch black).
const CELL_LIGHT_FLOOR: u8 = 3;
/// Light assumed to leak in from unseen neighbor chunks at XZ edges.
const CHUNK_EDGE_LIGHT: u8 = 8;

/// CPU-side vertex streams for one render pass of one chunk.
#[derive(Default, Clone)]
pub struct StagedBuffers {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
    /// Cleared when the initial reservation failed; the pass then stays
    /// empty instead of aborting the process.
    pub valid: bool,
}

impl StagedBuffers {
    fn with_reservation(quad_estimate: usize) -> Self {
        let mut buffers = StagedBuffers { valid: true, ..Default::default() };
        let verts = quad_estimate * 4;
        let ok = buffers.positions.try_reserve(verts).is_ok()
            && buffers.normals.try_reserve(verts).is_ok()
            && buffers.uvs.try_reserve(verts).is_ok()
            && buffers.colors.try_reserve(verts).is_ok()
            && buffers.indices.try_reserve(quad_estimate * 6).is_ok();
        if !ok {
            buffers = StagedBuffers { valid: false, ..Default::default() };
        }
        buffers
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of emitted quads (each quad is four vertices, six indices).
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }

    fn shrink(&mut self) {
        self.positions.shrink_to_fit();
        self.normals.shrink_to_fit();
        self.uvs.shrink_to_fit();
        self.colors.shrink_to_fit();
        self.indices.shrink_to_fit();
    }

    /// Convert the staged streams into a render-ready `Mesh`.
    ///
    /// Main-thread only by convention: worker tasks stop at staged buffers.
    #[must_use]
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            bevy::render::mesh::PrimitiveTopology::TriangleList,
            RenderAssetUsages::default(),
        );
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(bevy::render::mesh::Indices::U32(self.indices));
        mesh
    }
}

/// Both render passes for one chunk, as produced on a worker.
#[derive(Default, Clone)]
pub struct ChunkMeshData {
    pub opaque: StagedBuffers,
    pub transparent: StagedBuffers,
}

struct FaceSpec {
    face: Face,
    normal: [i32; 3],
    /// Corner offsets in `{0,1}³`, counter-clockwise seen from outside.
    corners: [[i32; 3]; 4],
    brightness: f32,
}

const FACES: [FaceSpec; 6] = [
    FaceSpec {
        face: Face::Top,
        normal: [0, 1, 0],
        corners: [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]],
        brightness: 1.0,
    },
    FaceSpec {
        face: Face::Bottom,
        normal: [0, -1, 0],
        corners: [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]],
        brightness: 0.8,
    },
    FaceSpec {
        face: Face::East,
        normal: [1, 0, 0],
        corners: [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
        brightness: 0.95,
    },
    FaceSpec {
        face: Face::West,
        normal: [-1, 0, 0],
        corners: [[0, 0, 1], [0, 1, 1], [0, 1, 0], [0, 0, 0]],
        brightness: 0.95,
    },
    FaceSpec {
        face: Face::South,
        normal: [0, 0, 1],
        corners: [[1, 0, 1], [1, 1, 1], [0, 1, 1], [0, 0, 1]],
        brightness: 0.9,
    },
    FaceSpec {
        face: Face::North,
        normal: [0, 0, -1],
        corners: [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
        brightness: 0.9,
    },
];

/// Sample a cell for meshing decisions. Outside the grid: the void below
/// bedrock counts as opaque stone (its faces can never be seen), everything
/// else — above the top and across XZ chunk borders — counts as air.
fn sample(chunk: &Chunk, x: i32, y: i32, z: i32) -> Block {
    if y < 0 {
        Block::of(crate::block::BlockType::Bedrock)
    } else if y >= CHUNK_HEIGHT as i32 || x < 0 || z < 0 || x >= CHUNK_SIZE as i32 || z >= CHUNK_SIZE as i32
    {
        Block::AIR
    } else {
        chunk.get(x as usize, y as usize, z as usize)
    }
}

/// Blended light for a cell: the brightest of its six neighbors, floored at
/// [`CELL_LIGHT_FLOOR`]. XZ-edge cells assume [`CHUNK_EDGE_LIGHT`] from the
/// unseen neighbor chunk; the open sky above the grid contributes full light.
fn cell_light(chunk: &Chunk, x: i32, y: i32, z: i32) -> u8 {
    let mut light = CELL_LIGHT_FLOOR;
    if x == 0 || z == 0 || x == CHUNK_SIZE as i32 - 1 || z == CHUNK_SIZE as i32 - 1 {
        light = light.max(CHUNK_EDGE_LIGHT);
    }
    for spec in &FACES {
        let nx = x + spec.normal[0];
        let ny = y + spec.normal[1];
        let nz = z + spec.normal[2];
        if ny >= CHUNK_HEIGHT as i32 {
            light = light.max(LIGHT_MAX);
        } else if nx >= 0
            && nz >= 0
            && ny >= 0
            && nx < CHUNK_SIZE as i32
            && nz < CHUNK_SIZE as i32
        {
            light = light.max(chunk.get(nx as usize, ny as usize, nz as usize).light);
        }
    }
    light
}

fn ao_factor(chunk: &Chunk, base: [i32; 3], du: [i32; 3], dv: [i32; 3]) -> f32 {
    let solid = |p: [i32; 3]| sample(chunk, p[0], p[1], p[2]).kind.is_opaque();
    let side1 = solid([base[0] + du[0], base[1] + du[1], base[2] + du[2]]);
    let side2 = solid([base[0] + dv[0], base[1] + dv[1], base[2] + dv[2]]);
    let corner = solid([
        base[0] + du[0] + dv[0],
        base[1] + du[1] + dv[1],
        base[2] + du[2] + dv[2],
    ]);
    if side1 && side2 {
        return AO_TABLE[0];
    }
    let occluders = usize::from(side1) + usize::from(side2) + usize::from(corner);
    AO_TABLE[3 - occluders]
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn emit_face(
    chunk: &Chunk,
    out: &mut StagedBuffers,
    atlas: &AtlasUVMap,
    spec: &FaceSpec,
    cell: [i32; 3],
    kind: crate::block::BlockType,
    light: u8,
) {
    let uv = atlas.get_face_uvs(kind, spec.face);
    let light_factor = f32::from(light) / f32::from(LIGHT_MAX);

    // Tangent axes: the two axes orthogonal to the face normal.
    let normal_axis = spec.normal.iter().position(|v| *v != 0).unwrap_or(0);
    let (u_axis, v_axis) = match normal_axis {
        0 => (2usize, 1usize),
        1 => (0, 2),
        _ => (0, 1),
    };

    let base = [
        cell[0] + spec.normal[0],
        cell[1] + spec.normal[1],
        cell[2] + spec.normal[2],
    ];
    let start = out.positions.len() as u32;
    let normal = [spec.normal[0] as f32, spec.normal[1] as f32, spec.normal[2] as f32];

    for corner in &spec.corners {
        out.positions.push([
            (cell[0] + corner[0]) as f32,
            (cell[1] + corner[1]) as f32,
            (cell[2] + corner[2]) as f32,
        ]);
        out.normals.push(normal);

        // Texture coordinates: U runs along the u-axis; V is flipped on
        // vertical faces so texture tops face world-up.
        let frac_u = corner[u_axis] as f32;
        let frac_v = if normal_axis == 1 { corner[v_axis] as f32 } else { 1.0 - corner[v_axis] as f32 };
        out.uvs.push([
            uv.min_u + frac_u * (uv.max_u - uv.min_u),
            uv.min_v + frac_v * (uv.max_v - uv.min_v),
        ]);

        // AO: signs point from the face center toward this corner.
        let mut du = [0i32; 3];
        let mut dv = [0i32; 3];
        du[u_axis] = if corner[u_axis] == 0 { -1 } else { 1 };
        dv[v_axis] = if corner[v_axis] == 0 { -1 } else { 1 };
        let ao = ao_factor(chunk, base, du, dv);

        let shade = (spec.brightness * light_factor * ao * 255.0).round() / 255.0;
        out.colors.push([shade, shade, shade, 1.0]);
    }
    out.indices.extend_from_slice(&[start, start + 1, start + 2, start, start + 2, start + 3]);
}

/// Mesh a whole chunk into staged opaque and transparent buffers.
///
/// Pure function of the chunk contents and the atlas; safe on workers.
#[must_use]
pub fn build_chunk_mesh(chunk: &Chunk, atlas: &AtlasUVMap) -> ChunkMeshData {
    // A filled chunk exposes on the order of its top surface; reserve for a
    // couple of quads per column and let the vectors grow past that.
    let quad_estimate = CHUNK_SIZE * CHUNK_SIZE * 8;
    let mut opaque = StagedBuffers::with_reservation(quad_estimate);
    let mut transparent = StagedBuffers::with_reservation(quad_estimate / 4);

    for y in 0..CHUNK_HEIGHT as i32 {
        for z in 0..CHUNK_SIZE as i32 {
            for x in 0..CHUNK_SIZE as i32 {
                let block = chunk.get(x as usize, y as usize, z as usize);
                if !block.kind.is_solid() {
                    continue;
                }
                let out = if block.kind.is_transparent() {
                    &mut transparent
                } else {
                    &mut opaque
                };
                if !out.valid {
                    continue;
                }

                let mut light = None;
                for spec in &FACES {
                    let neighbor = sample(
                        chunk,
                        x + spec.normal[0],
                        y + spec.normal[1],
                        z + spec.normal[2],
                    );
                    let visible = !neighbor.kind.is_solid() || neighbor.kind.is_transparent();
                    if !visible {
                        continue;
                    }
                    let l = *light.get_or_insert_with(|| cell_light(chunk, x, y, z));
                    emit_face(chunk, out, atlas, spec, [x, y, z], block.kind, l);
                }
            }
        }
    }

    opaque.shrink();
    transparent.shrink();
    ChunkMeshData { opaque, transparent }
}
