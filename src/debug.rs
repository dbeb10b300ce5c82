//! World-state dump for bug reports: F4 writes a timestamped snapshot of
//! streaming and scheduler state under `debug/`.

use crate::chunk::{ChunkState, PendingChunks, StreamingDiagnostics};
use crate::world::World;
use bevy::prelude::*;
use chrono::Utc;

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, dump_on_key);
    }
}

#[allow(clippy::needless_pass_by_value)]
fn dump_on_key(
    keys: Res<ButtonInput<KeyCode>>,
    world: Option<Res<World>>,
    pending: Res<PendingChunks>,
    streaming: Res<StreamingDiagnostics>,
) {
    if !keys.just_pressed(KeyCode::F4) {
        return;
    }
    let Some(world) = world else {
        return;
    };

    let mut by_state = [0usize; 4];
    for chunk in world.chunks.values() {
        let slot = match chunk.state {
            ChunkState::Empty => 0,
            ChunkState::Generating => 1,
            ChunkState::Ready => 2,
            ChunkState::Complete => 3,
        };
        by_state[slot] += 1;
    }

    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let path = format!("debug/world-{stamp}.txt");
    let report = format!(
        "world dump @ {} UTC\n\
         seed: {}\n\
         center chunk: {:?}  view distance: {}\n\
         game tick: {}  water tick: {}\n\
         chunks: {} (empty {}, generating {}, ready {}, complete {})\n\
         jobs in flight: {}\n\
         dirty chunks: {}\n\
         batches: {} ({} dirty)\n\
         water queue: {}\n\
         decay queue: {}\n\
         chests: {}\n\
         uploads total: {}  evictions total: {}  discarded results: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        world.seed,
        world.center_chunk,
        world.view_distance,
        world.game_tick,
        world.water.current_tick(),
        world.chunks.len(),
        by_state[0],
        by_state[1],
        by_state[2],
        by_state[3],
        pending.jobs.len(),
        world.dirty_len(),
        world.batches.len(),
        world.batches.dirty_len(),
        world.water.len(),
        world.decay.len(),
        world.chests.len(),
        streaming.uploads_total,
        streaming.evictions_total,
        streaming.discarded_results,
    );

    if let Err(e) = std::fs::create_dir_all("debug").and_then(|()| std::fs::write(&path, report)) {
        warn!("failed to write {path}: {e}");
    } else {
        info!("world state dumped to {path}");
    }
}
