//! Flowing water: scheduled, metadata-encoded cell updates.
//!
//! Water cells encode `(level, falling)` in block metadata — level 0 is a
//! source, levels 1..=7 thin out with distance. Updates are never applied
//! immediately: edits and spreads schedule queue entries a tick or two
//! ahead, the queue deduplicates per cell (keeping the earlier tick), and
//! each scheduler tick processes a bounded batch so a broken dam costs
//! frames, not a stall. All cell writes go through `World::set_block`, which
//! re-schedules affected neighbors, so flow propagates without any
//! recursion.

use crate::block::{Block, BlockType};
use crate::world::World;

/// Delay for updates scheduled from a block edit.
pub const EDIT_DELAY_TICKS: u64 = 1;
/// Delay between a placement and the placed cell's own update.
const SPREAD_DELAY_TICKS: u64 = 1;
/// Entries processed per scheduler tick; the rest roll over.
const MAX_UPDATES_PER_TICK: usize = 100;
/// Thinnest flowing level.
const LEVEL_MIN: u8 = 7;

struct WaterEntry {
    x: i32,
    y: i32,
    z: i32,
    tick: u64,
}

/// The scheduled-update queue. Main-thread only.
#[derive(Default)]
pub struct WaterQueue {
    entries: Vec<WaterEntry>,
    current_tick: u64,
}

impl WaterQueue {
    /// Schedule an update for a cell `delay` water ticks from now.
    /// A cell already queued keeps whichever tick comes first.
    pub fn schedule(&mut self, x: i32, y: i32, z: i32, delay: u64) {
        let when = self.current_tick + delay;
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.x == x && e.y == y && e.z == z)
        {
            e.tick = e.tick.min(when);
            return;
        }
        self.entries.push(WaterEntry { x, y, z, tick: when });
    }

    fn merge(&mut self, entry: WaterEntry) {
        if let Some(e) = self
            .entries
            .iter_mut()
            .find(|e| e.x == entry.x && e.y == entry.y && e.z == entry.z)
        {
            e.tick = e.tick.min(entry.tick);
            return;
        }
        self.entries.push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }
}

const HORIZONTAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Advance the scheduler one tick and run up to the per-tick budget of
/// eligible cell updates.
pub fn process_tick(world: &mut World) {
    world.water.current_tick += 1;
    let now = world.water.current_tick;

    let mut entries = std::mem::take(&mut world.water.entries);
    let mut processed = 0;
    let mut i = 0;
    while i < entries.len() {
        if entries[i].tick <= now && processed < MAX_UPDATES_PER_TICK {
            let e = entries.swap_remove(i);
            processed += 1;
            update_cell(world, e.x, e.y, e.z);
        } else {
            i += 1;
        }
    }

    // Newly scheduled entries landed in the fresh queue during processing;
    // fold the leftovers back in, keeping the earlier of duplicate ticks.
    for e in entries {
        world.water.merge(e);
    }
}

fn update_cell(world: &mut World, x: i32, y: i32, z: i32) {
    let cell = world.get_block(x, y, z);
    if cell.kind != BlockType::Water {
        return;
    }
    let level = cell.water_level();

    // Flowing water dries up without a feed: a cell above, or a horizontal
    // neighbor strictly closer to a source. Sources persist on their own.
    if level > 0 {
        let fed_from_above = world.get_block(x, y + 1, z).kind == BlockType::Water;
        let fed_sideways = HORIZONTAL.iter().any(|(dx, dz)| {
            let n = world.get_block(x + dx, y, z + dz);
            n.kind == BlockType::Water && n.water_level() < level
        });
        if !fed_from_above && !fed_sideways {
            world.set_block(x, y, z, Block::AIR);
            return;
        }
    }

    // Gravity first: falling swallows horizontal spread entirely.
    let below = world.get_block(x, y - 1, z);
    if below.kind == BlockType::Air && y > 0 {
        world.set_block(x, y - 1, z, Block::water(1, true));
        world.water.schedule(x, y - 1, z, SPREAD_DELAY_TICKS);
        return;
    }
    if below.kind == BlockType::Water && !cell.is_falling_water() {
        world.set_block(x, y, z, Block::water(level, true));
    }

    if level >= LEVEL_MIN || below.kind == BlockType::Air {
        return;
    }
    let spread_level = level + 1;
    for (dx, dz) in HORIZONTAL {
        let (nx, nz) = (x + dx, z + dz);
        let n = world.get_block(nx, y, nz);
        let place = match n.kind {
            BlockType::Air => true,
            BlockType::Water => n.water_level() > spread_level,
            _ => false,
        };
        if place {
            world.set_block(nx, y, nz, Block::water(spread_level, false));
            world.water.schedule(nx, y, nz, SPREAD_DELAY_TICKS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, ChunkState};
    use crate::terrain::TerrainParams;

    /// A complete chunk with a walled stone basin at `y = 64`, walls at
    /// `y = 65`, centered at local (8, 8).
    fn basin_world(half: i32) -> World {
        let mut world = World::new(1, TerrainParams::default());
        let mut chunk = Chunk::new(0, 0);
        chunk.state = ChunkState::Complete;
        for dz in -half..=half {
            for dx in -half..=half {
                let (x, z) = ((8 + dx) as usize, (8 + dz) as usize);
                chunk.set(x, 64, z, Block::of(BlockType::Stone));
                if dx.abs() == half || dz.abs() == half {
                    chunk.set(x, 65, z, Block::of(BlockType::Stone));
                }
            }
        }
        world.chunks.insert((0, 0), chunk);
        world
    }

    fn run_ticks(world: &mut World, n: usize) {
        for _ in 0..n {
            process_tick(world);
        }
    }

    #[test]
    fn source_spreads_by_manhattan_distance() {
        let mut world = basin_world(4);
        world.set_block(8, 65, 8, Block::water(0, false));
        world.water.schedule(8, 65, 8, 1);
        run_ticks(&mut world, 40);

        for dz in -3i32..=3 {
            for dx in -3i32..=3 {
                let dist = (dx.abs() + dz.abs()) as u8;
                let b = world.get_block(8 + dx, 65, 8 + dz);
                assert_eq!(b.kind, BlockType::Water, "no water at ({dx}, {dz})");
                assert_eq!(b.water_level(), dist, "wrong level at ({dx}, {dz})");
            }
        }
    }

    #[test]
    fn removing_the_source_drains_everything() {
        let mut world = basin_world(3);
        world.set_block(8, 65, 8, Block::water(0, false));
        world.water.schedule(8, 65, 8, 1);
        run_ticks(&mut world, 30);

        world.set_block(8, 65, 8, Block::AIR);
        run_ticks(&mut world, 60);
        for dz in -2i32..=2 {
            for dx in -2i32..=2 {
                assert_eq!(
                    world.get_block(8 + dx, 65, 8 + dz).kind,
                    BlockType::Air,
                    "stale water at ({dx}, {dz})"
                );
            }
        }
    }

    #[test]
    fn water_on_a_ledge_falls_before_it_spreads() {
        let mut world = World::new(1, TerrainParams::default());
        let mut chunk = Chunk::new(0, 0);
        chunk.state = ChunkState::Complete;
        // Stone floor at y=63 everywhere; the source ledge cell at y=65
        // sits on a single stone pillar, air at y=64 all around.
        for z in 0..16 {
            for x in 0..16 {
                chunk.set(x, 63, z, Block::of(BlockType::Stone));
            }
        }
        chunk.set(8, 64, 8, Block::of(BlockType::Stone));
        world.chunks.insert((0, 0), chunk);

        world.set_block(8, 65, 8, Block::water(0, false));
        world.water.schedule(8, 65, 8, 1);
        run_ticks(&mut world, 30);

        // Spread cells around the source immediately fall: level-1 falling
        // water below each, then pooling on the floor.
        for (dx, dz) in HORIZONTAL {
            let spread = world.get_block(8 + dx, 65, 8 + dz);
            assert_eq!(spread.kind, BlockType::Water);
            assert_eq!(spread.water_level(), 1);
            let fallen = world.get_block(8 + dx, 64, 8 + dz);
            assert_eq!(fallen.kind, BlockType::Water);
            assert!(fallen.is_falling_water());
            assert_eq!(fallen.water_level(), 1);
        }
    }

    #[test]
    fn queue_deduplicates_keeping_the_earlier_tick() {
        let mut queue = WaterQueue::default();
        queue.schedule(1, 2, 3, 5);
        queue.schedule(1, 2, 3, 2);
        queue.schedule(1, 2, 3, 9);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.entries[0].tick, 2);
    }

    #[test]
    fn per_tick_budget_defers_excess_updates() {
        let mut world = basin_world(1);
        // Schedule far more dead entries than one tick may process.
        for i in 0..250 {
            world.water.schedule(100 + i, 200, 100, 1);
        }
        process_tick(&mut world);
        assert_eq!(world.water.len(), 150);
        process_tick(&mut world);
        assert_eq!(world.water.len(), 50);
        process_tick(&mut world);
        assert_eq!(world.water.len(), 0);
    }
}
