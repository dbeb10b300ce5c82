//! Carved cave features: worm tunnels and ellipsoidal rooms.
//!
//! Both are seeded per chunk from coordinate hashes and carve only inside
//! the owning chunk's grid — a tunnel that reaches the border simply stops
//! there, and the neighbor's own tunnels supply the apparent continuation.
//! Carving never opens the surface crust (`cave_min_depth` guard per
//! column) and never breaches the bedrock band.

use super::{HeightMap, TerrainParams};
use crate::block::Block;
use crate::chunk::{Chunk, CHUNK_SIZE};
use crate::noise::{hash2, WorldNoise};
use bevy::math::DVec3;

/// Map hash bits onto `[lo, hi)`.
fn unit(h: u32, lo: f64, hi: f64) -> f64 {
    lo + (f64::from(h) / f64::from(u32::MAX)) * (hi - lo)
}

/// Clear one cell if carving is allowed there.
///
/// The per-column surface guard uses the carved column's own height so a
/// tunnel hugging a hillside cannot punch through the lawn above it.
fn carve_cell(chunk: &mut Chunk, heights: &HeightMap, params: &TerrainParams, x: i32, y: i32, z: i32) {
    if x < 0 || z < 0 || x >= CHUNK_SIZE as i32 || z >= CHUNK_SIZE as i32 || y < 0 {
        return;
    }
    let th = heights[z as usize][x as usize];
    if y > th - params.cave_min_depth || y <= params.bedrock_start {
        return;
    }
    chunk.set(x as usize, y as usize, z as usize, Block::AIR);
}

fn carve_sphere(
    chunk: &mut Chunk,
    heights: &HeightMap,
    params: &TerrainParams,
    center: DVec3,
    radius: f64,
) {
    let r = radius.ceil() as i32;
    #[allow(clippy::cast_possible_truncation)]
    let (cx, cy, cz) = (center.x.floor() as i32, center.y.floor() as i32, center.z.floor() as i32);
    for dy in -r..=r {
        for dz in -r..=r {
            for dx in -r..=r {
                let p = DVec3::new(
                    f64::from(cx + dx) + 0.5,
                    f64::from(cy + dy) + 0.5,
                    f64::from(cz + dz) + 0.5,
                );
                if p.distance_squared(center) <= radius * radius {
                    carve_cell(chunk, heights, params, cx + dx, cy + dy, cz + dz);
                }
            }
        }
    }
}

/// Carve this chunk's worm tunnels.
pub fn carve_tunnels(
    chunk: &mut Chunk,
    noise: &WorldNoise,
    params: &TerrainParams,
    heights: &HeightMap,
) {
    if !params.generate_caves {
        return;
    }
    let seed = hash2(chunk.cx.wrapping_mul(7), chunk.cz.wrapping_mul(13));
    let count = seed % (params.tunnels_per_chunk + 1);

    for t in 0..count {
        let h = hash2(seed as i32, t as i32);
        let lx = unit(h, 0.0, CHUNK_SIZE as f64);
        let lz = unit(h.rotate_left(8), 0.0, CHUNK_SIZE as f64);
        #[allow(clippy::cast_possible_truncation)]
        let th = heights[(lz as usize).min(CHUNK_SIZE - 1)][(lx as usize).min(CHUNK_SIZE - 1)];

        let y_max = f64::from(th - params.cave_min_depth - 10);
        let y_min = f64::from((th - 150).max(params.bedrock_start + 2));
        if y_max <= y_min {
            continue;
        }
        let mut pos = DVec3::new(lx, unit(h.rotate_left(16), y_min, y_max), lz);

        // Mostly horizontal start direction: gentle pitch, arbitrary yaw.
        let yaw = unit(h.rotate_left(24), 0.0, std::f64::consts::TAU);
        let pitch = unit(hash2(h as i32, 1), -0.25, 0.25);
        let mut dir = DVec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
        let radius = unit(hash2(h as i32, 2), params.tunnel_radius_min, params.tunnel_radius_max);

        // Noise channel coordinate unique to this tunnel.
        let track = f64::from(hash2(h as i32, 3) % 10_000);

        for seg in 0..params.tunnel_segments {
            carve_sphere(chunk, heights, params, pos, radius);

            let s = f64::from(seg) * 0.17;
            let wobble = DVec3::new(
                noise.noise3(track, s, 0.0),
                noise.noise3(track, s, 50.0) * 0.5,
                noise.noise3(track, s, 100.0),
            ) * 0.4;

            if seg % 12 == 11 {
                // Periodic re-aim keeps long tunnels from running straight.
                dir = (dir + wobble * 1.5).normalize_or_zero();
                dir.y = dir.y.clamp(-0.5, 0.5);
                dir = dir.normalize_or_zero();
            }

            // Steer away from the surface crust and the bedrock band.
            if pos.y > y_max - 3.0 {
                dir.y = -dir.y.abs();
            } else if pos.y < y_min + 3.0 {
                dir.y = dir.y.abs();
            }

            pos += dir + wobble;
        }
    }
}

/// Carve this chunk's ellipsoidal rooms: fewer and wider than tunnels,
/// a single axis-aligned ellipsoid each.
pub fn carve_rooms(chunk: &mut Chunk, params: &TerrainParams, heights: &HeightMap) {
    if !params.generate_caves {
        return;
    }
    let seed = hash2(chunk.cx.wrapping_mul(31), chunk.cz.wrapping_mul(17));
    let count = seed % (params.rooms_per_chunk + 1);

    for r in 0..count {
        let h = hash2(seed as i32, r as i32);
        let lx = unit(h, 2.0, CHUNK_SIZE as f64 - 2.0);
        let lz = unit(h.rotate_left(7), 2.0, CHUNK_SIZE as f64 - 2.0);
        #[allow(clippy::cast_possible_truncation)]
        let th = heights[(lz as usize).min(CHUNK_SIZE - 1)][(lx as usize).min(CHUNK_SIZE - 1)];

        let y_max = f64::from(th - params.cave_min_depth - 12);
        let y_min = f64::from((th - 140).max(params.bedrock_start + 4));
        if y_max <= y_min {
            continue;
        }
        let center = DVec3::new(lx, unit(h.rotate_left(14), y_min, y_max), lz);

        let rx = unit(hash2(h as i32, 10), params.room_radius_min, params.room_radius_max);
        let ry = unit(hash2(h as i32, 11), params.room_radius_min * 0.5, params.room_radius_max * 0.6);
        let rz = unit(hash2(h as i32, 12), params.room_radius_min, params.room_radius_max);

        let bx = rx.ceil() as i32;
        let by = ry.ceil() as i32;
        let bz = rz.ceil() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let (ox, oy, oz) =
            (center.x.floor() as i32, center.y.floor() as i32, center.z.floor() as i32);
        for dy in -by..=by {
            for dz in -bz..=bz {
                for dx in -bx..=bx {
                    let px = (f64::from(ox + dx) + 0.5 - center.x) / rx;
                    let py = (f64::from(oy + dy) + 0.5 - center.y) / ry;
                    let pz = (f64::from(oz + dz) + 0.5 - center.z) / rz;
                    if px * px + py * py + pz * pz <= 1.0 {
                        carve_cell(chunk, heights, params, ox + dx, oy + dy, oz + dz);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;
    use crate::chunk::CHUNK_HEIGHT;
    use crate::noise::WorldNoise;

    fn solid_chunk(cx: i32, cz: i32) -> (Chunk, HeightMap) {
        let mut chunk = Chunk::new(cx, cz);
        let heights = [[200i32; CHUNK_SIZE]; CHUNK_SIZE];
        for y in 0..200usize {
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    chunk.set(x, y, z, Block::of(BlockType::Stone));
                }
            }
        }
        (chunk, heights)
    }

    #[test]
    fn tunnels_are_deterministic() {
        let noise = WorldNoise::new(5);
        let params = TerrainParams::default();
        let (mut a, heights) = solid_chunk(3, 4);
        let (mut b, _) = solid_chunk(3, 4);
        carve_tunnels(&mut a, &noise, &params, &heights);
        carve_tunnels(&mut b, &noise, &params, &heights);
        assert_eq!(a.solid_block_count(), b.solid_block_count());
    }

    #[test]
    fn carving_respects_surface_and_bedrock_guards() {
        let noise = WorldNoise::new(11);
        let params = TerrainParams::default();
        // Try several chunks so at least one rolls a tunnel and a room.
        let mut carved_any = false;
        for c in 0..12 {
            let (mut chunk, heights) = solid_chunk(c, -c);
            let before = chunk.solid_block_count();
            carve_tunnels(&mut chunk, &noise, &params, &heights);
            carve_rooms(&mut chunk, &params, &heights);
            if chunk.solid_block_count() < before {
                carved_any = true;
            }
            for z in 0..CHUNK_SIZE {
                for x in 0..CHUNK_SIZE {
                    // Surface crust intact (cells above `th - cave_min_depth`).
                    for y in (201 - params.cave_min_depth as usize)..200 {
                        assert_eq!(chunk.get(x, y, z).kind, BlockType::Stone);
                    }
                    // Bedrock band intact.
                    for y in 0..=params.bedrock_start as usize {
                        assert_eq!(chunk.get(x, y, z).kind, BlockType::Stone);
                    }
                }
            }
            for y in 200..CHUNK_HEIGHT {
                assert_eq!(chunk.get(0, y, 0).kind, BlockType::Air);
            }
        }
        assert!(carved_any, "no chunk in the sample carved anything");
    }

    #[test]
    fn room_carving_stays_inside_the_chunk() {
        // Carving near the border must clip silently, not wrap or panic.
        let noise = WorldNoise::new(23);
        let params = TerrainParams::default();
        for c in 0..8 {
            let (mut chunk, heights) = solid_chunk(c * 97, c * -53);
            carve_tunnels(&mut chunk, &noise, &params, &heights);
            carve_rooms(&mut chunk, &params, &heights);
        }
    }
}
