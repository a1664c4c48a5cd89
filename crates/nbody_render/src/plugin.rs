use bevy::prelude::*;

use super::camera;
use super::particles;
use super::ui;

/// Main render plugin: particle entities, HUD, keyboard and camera
pub struct NBodyRenderPlugin;

impl Plugin for NBodyRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ui::HudThrottle>()
            .init_resource::<particles::RenderSync>()
            .init_resource::<particles::ParticleAssets>()
            .add_systems(Startup, (camera::spawn_camera, ui::spawn_hud))
            .add_systems(
                Update,
                (
                    ui::sim_controls,
                    camera::orbit_controls,
                    camera::orbit_camera_system.after(camera::orbit_controls),
                    particles::sync_particle_entities,
                    particles::update_particle_visuals.after(particles::sync_particle_entities),
                    ui::update_hud,
                ),
            );
    }
}
