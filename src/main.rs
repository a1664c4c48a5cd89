use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use nbody_core::SimConfig;
use nbody_render::NBodyRenderPlugin;
use nbody_sim::{SimSettings, SimulationPlugin};

fn main() {
    let config = SimConfig::default();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "N-Body Galaxy Simulator".into(),
                resolution: (1600.0, 900.0).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.02)))
        .insert_resource(SimSettings(config))
        .add_plugins(SimulationPlugin::default())
        .add_plugins(NBodyRenderPlugin)
        .run();
}
