//! Debug overlay: F3 toggles a corner readout of frame rate, streaming
//! state and process memory.

use crate::chunk::{ChunkState, PendingChunks, StreamingDiagnostics};
use crate::world::World;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

#[derive(Component)]
pub struct DebugOverlayText;

/// Process-memory sampler; refreshing is not free, so it runs on a timer.
#[derive(Resource)]
pub struct MemorySampler {
    system: System,
    last_refresh: f64,
    pub resident_bytes: u64,
}

impl Default for MemorySampler {
    fn default() -> Self {
        MemorySampler { system: System::new(), last_refresh: -10.0, resident_bytes: 0 }
    }
}

pub fn setup_debug_overlay(mut commands: Commands) {
    commands.insert_resource(MemorySampler::default());
    let mut overlay = TextBundle::from_section(
        String::new(),
        TextStyle { font_size: 14.0, color: Color::WHITE, ..default() },
    )
    .with_style(Style {
        position_type: PositionType::Absolute,
        top: Val::Px(6.0),
        left: Val::Px(6.0),
        ..default()
    });
    overlay.visibility = Visibility::Hidden;
    commands.spawn((overlay, DebugOverlayText));
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    keys: Res<ButtonInput<KeyCode>>,
    mut query: Query<&mut Visibility, With<DebugOverlayText>>,
) {
    if !keys.just_pressed(KeyCode::F3) {
        return;
    }
    for mut visibility in &mut query {
        *visibility = match *visibility {
            Visibility::Hidden => Visibility::Visible,
            _ => Visibility::Hidden,
        };
    }
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct OverlayCtx<'w, 's> {
    pub time: Res<'w, Time>,
    pub diagnostics: Res<'w, DiagnosticsStore>,
    pub world: Option<Res<'w, World>>,
    pub pending: Res<'w, PendingChunks>,
    pub streaming: Res<'w, StreamingDiagnostics>,
    pub memory: ResMut<'w, MemorySampler>,
    pub query: Query<'w, 's, (&'static mut Text, &'static Visibility), With<DebugOverlayText>>,
}

#[allow(clippy::needless_pass_by_value)]
pub fn update_debug_overlay(mut ctx: OverlayCtx<'_, '_>) {
    let Some(world) = ctx.world.as_ref() else {
        return;
    };
    let Ok((mut text, visibility)) = ctx.query.get_single_mut() else {
        return;
    };
    if *visibility != Visibility::Visible {
        return;
    }

    let now = ctx.time.elapsed_seconds_f64();
    if now - ctx.memory.last_refresh > 1.0 {
        ctx.memory.last_refresh = now;
        let pid = Pid::from_u32(std::process::id());
        ctx.memory.system.refresh_process(pid);
        if let Some(process) = ctx.memory.system.process(pid) {
            ctx.memory.resident_bytes = process.memory();
        }
    }

    let fps = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(bevy::diagnostic::Diagnostic::smoothed)
        .unwrap_or(0.0);

    let mut complete = 0usize;
    let mut generating = 0usize;
    for chunk in world.chunks.values() {
        match chunk.state {
            ChunkState::Complete => complete += 1,
            ChunkState::Generating => generating += 1,
            _ => {}
        }
    }

    text.sections[0].value = format!(
        "fps: {:.0}\n\
         chunks: {} loaded / {} complete / {} generating\n\
         jobs: {} in flight, dirty: {}, batches: {} ({} dirty)\n\
         water queue: {}  decay queue: {}  chests: {}\n\
         uploads: {}  evictions: {}\n\
         center: ({}, {})  tick: {}\n\
         rss: {:.1} MiB",
        fps,
        world.chunks.len(),
        complete,
        generating,
        ctx.pending.jobs.len(),
        world.dirty_len(),
        world.batches.len(),
        world.batches.dirty_len(),
        world.water.len(),
        world.decay.len(),
        world.chests.len(),
        ctx.streaming.uploads_total,
        ctx.streaming.evictions_total,
        world.center_chunk.0,
        world.center_chunk.1,
        world.game_tick,
        ctx.memory.resident_bytes as f64 / (1024.0 * 1024.0),
    );
}
