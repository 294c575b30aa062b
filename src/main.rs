use bevy::prelude::*;

mod actions;
mod config;
mod elevation;
mod input;
mod setup;
mod terrain;

use actions::ActionState;
use config::TerrainSettings;
use input::{flight_controller, input_mapping_system};
use terrain::TerrainPlugin;

const SETTINGS_PATH: &str = "assets/terrain.ron";

fn main() {
    // Configuration problems are fatal before any frame runs.
    let settings = TerrainSettings::load_or_default(SETTINGS_PATH)
        .expect("failed to load terrain settings");
    settings.validate().expect("invalid terrain settings");

    App::new()
        .add_plugins(DefaultPlugins)
        // terrain streaming core + its scene mirroring
        .add_plugins(TerrainPlugin { settings })
        // flight input & kinematics (the observer the core follows)
        .init_resource::<ActionState>()
        .add_systems(Startup, setup::setup)
        .add_systems(Update, (input_mapping_system, flight_controller).chain())
        .run();
}
