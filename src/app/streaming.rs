//! Push hot-reloaded settings into the world tunables.

use regolith::settings::Settings;
use regolith::world::World;
use bevy::prelude::*;

#[allow(clippy::needless_pass_by_value)]
pub fn sync_streaming_settings(settings: Res<Settings>, world: Option<ResMut<World>>) {
    if !settings.is_changed() {
        return;
    }
    let Some(mut world) = world else {
        return;
    };
    world.view_distance = settings.graphics.view_distance as i32;
    world.max_uploads_per_frame = settings.performance.max_uploads_per_frame;
    world.batch_rebuilds_per_frame = settings.performance.batch_rebuilds_per_frame;
}
