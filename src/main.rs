use bevy::diagnostic::{FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin};
use bevy::pbr::MaterialPlugin;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use bevy_atmosphere::prelude::*;
use regolith::batch::update_batch_visibility;
use regolith::block::interaction::{Hotbar, Inventory};
use regolith::block::block_interaction;
use regolith::chunk::{stream_chunks, PendingChunks, StreamingDiagnostics};
use regolith::debug::DebugDumpPlugin;
use regolith::material::VoxelExtendedMaterial;
use regolith::player::{camera_look, camera_movement, cursor_grab};
use regolith::settings::loader as settings_loader;
use regolith::ui::{setup_debug_overlay, toggle_debug_overlay, update_debug_overlay};

mod app;
use app::{
    daylight_cycle, setup, sync_atmosphere_settings, sync_streaming_settings,
    sync_vsync_settings,
};

fn main() {
    let settings = settings_loader::load_settings();
    let settings_watcher = settings_loader::setup_settings_watcher()
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "regolith".to_string(),
            position: WindowPosition::Centered(MonitorSelection::Primary),
            present_mode: if settings.graphics.vsync {
                PresentMode::AutoVsync
            } else {
                PresentMode::AutoNoVsync
            },
            ..default()
        }),
        ..default()
    }))
    .add_plugins(MaterialPlugin::<VoxelExtendedMaterial>::default())
    .add_plugins(FrameTimeDiagnosticsPlugin)
    .add_plugins(LogDiagnosticsPlugin::default())
    .add_plugins(DebugDumpPlugin);

    if settings.atmosphere.enabled {
        app.add_plugins(AtmospherePlugin)
            .insert_resource(AtmosphereModel::default())
            .insert_resource(bevy_atmosphere::settings::AtmosphereSettings {
                resolution: settings.atmosphere.resolution,
                dithering: settings.atmosphere.dithering,
                ..Default::default()
            });
    }

    app.insert_resource(settings);
    app.insert_resource(settings_watcher);
    app.insert_resource(PendingChunks::default());
    app.insert_resource(StreamingDiagnostics::default());
    app.insert_resource(Hotbar::default());
    app.insert_resource(Inventory::default());

    app.add_systems(Startup, setup);
    app.add_systems(Startup, setup_debug_overlay);

    app.add_systems(Update, stream_chunks);
    app.add_systems(Update, update_batch_visibility.after(stream_chunks));
    app.add_systems(Update, daylight_cycle);
    app.add_systems(Update, block_interaction);

    app.add_systems(Update, cursor_grab);
    app.add_systems(Update, camera_look);
    app.add_systems(Update, camera_movement);

    app.add_systems(Update, toggle_debug_overlay);
    app.add_systems(Update, update_debug_overlay);

    app.add_systems(Update, settings_loader::check_settings_changes);
    app.add_systems(Update, sync_streaming_settings);
    app.add_systems(Update, sync_vsync_settings);
    app.add_systems(Update, sync_atmosphere_settings);

    app.run();
}
