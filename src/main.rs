use bevy::prelude::*;

use meadow::grass::{GrassPlugin, GrassSettings, SettingsLoadError};

mod input;
mod setup;

use input::{camera_controller, map_pan_keys, PanInput};

const SETTINGS_PATH: &str = "assets/grass/field.ron";

fn main() {
    let mut app = App::new();
    // core engine plugins (installs logging, so settings errors below are visible)
    app.add_plugins(DefaultPlugins);

    let settings = match GrassSettings::load(SETTINGS_PATH) {
        Ok(s) => {
            info!("Meadow: settings loaded from '{}'", SETTINGS_PATH);
            s
        }
        Err(SettingsLoadError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Meadow: '{}' not found, using default settings", SETTINGS_PATH);
            GrassSettings::default()
        }
        Err(e) => {
            error!("Meadow: cannot use '{}': {}", SETTINGS_PATH, e);
            return;
        }
    };
    info!(
        "Meadow: {} blades over {} tiles, field {}x{}, LOD at {}",
        settings.blade_count,
        settings.tile_count,
        settings.field_size,
        settings.field_size,
        settings.lod_distance
    );

    app
        // settings go in before the plugin so its init_resource keeps them
        .insert_resource(settings)
        .add_plugins(GrassPlugin)
        .init_resource::<PanInput>()
        // camera, light, ground
        .add_systems(Startup, setup::setup)
        // input + camera each frame
        .add_systems(Update, (map_pan_keys, camera_controller).chain())
        .run();
}
