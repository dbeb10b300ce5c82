pub mod atmosphere;
pub mod display;
pub mod lighting;
pub mod setup;
pub mod streaming;

pub use atmosphere::sync_atmosphere_settings;
pub use display::sync_vsync_settings;
pub use lighting::{daylight_cycle, Sun, TimeOfDay};
pub use setup::setup;
pub use streaming::sync_streaming_settings;
