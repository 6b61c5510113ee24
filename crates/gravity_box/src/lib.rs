use bevy::prelude::*;

pub mod collision;
pub mod levels;
pub mod placement;
pub mod progression;
pub mod screen;
pub mod simulation;

use collision::CollisionPlugin;
use placement::PlacementPlugin;
use progression::ProgressionPlugin;
use screen::ScreenPlugin;
use simulation::{GameState, SimulationPlugin};

pub fn run() {
    game_helpers::new_app(env!("CARGO_PKG_NAME"))
        .init_state::<GameState>()
        .add_plugins(SimulationPlugin)
        .add_plugins(PlacementPlugin)
        .add_plugins(CollisionPlugin)
        .add_plugins(ProgressionPlugin)
        .add_plugins(ScreenPlugin)
        .add_systems(Startup, setup_camera)
        .run();
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
