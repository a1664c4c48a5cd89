use bevy::prelude::*;
use nbody_core::{ColorPalette, ParticleVisual};
use nbody_sim::Simulation;
use std::collections::HashMap;

/// Marker for particle point entities in the render world. `slot` is the
/// position in the sampled sequence, not the simulation index.
#[derive(Component)]
pub struct ParticlePoint {
    pub slot: usize,
}

/// Marker for central-mass (black hole) markers
#[derive(Component)]
pub struct CentralMarker {
    pub index: usize,
}

/// Maximum rendered particles (subset of simulation for performance)
pub const MAX_RENDER_PARTICLES: usize = 20_000;

/// What the spawned entities currently mirror
#[derive(Resource, Default)]
pub struct RenderSync {
    epoch: Option<u32>,
    palette: Option<ColorPalette>,
}

/// Shared mesh plus one material per distinct colour
#[derive(Resource, Default)]
pub struct ParticleAssets {
    mesh: Option<Handle<Mesh>>,
    materials: HashMap<[u32; 4], Handle<StandardMaterial>>,
}

impl ParticleAssets {
    fn material(
        &mut self,
        color: [f32; 4],
        materials: &mut Assets<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        self.materials
            .entry(color_key(color))
            .or_insert_with(|| {
                let color = Color::srgba(color[0], color[1], color[2], color[3]);
                materials.add(StandardMaterial {
                    base_color: color,
                    emissive: LinearRgba::from(color) * 3.0,
                    unlit: true,
                    ..default()
                })
            })
            .clone()
    }
}

/// Materials are keyed by the exact colour bits
pub fn color_key(color: [f32; 4]) -> [u32; 4] {
    color.map(f32::to_bits)
}

/// Distance between rendered particles so at most `max` of `total` are drawn
pub fn render_stride(total: usize, max: usize) -> usize {
    if max == 0 { 1 } else { total.div_ceil(max).max(1) }
}

/// Evenly strided subset of the population, at most `max` of them
pub fn sampled<I>(visuals: I, max: usize) -> impl Iterator<Item = ParticleVisual>
where
    I: ExactSizeIterator<Item = ParticleVisual>,
{
    let stride = render_stride(visuals.len(), max);
    visuals.step_by(stride).take(max)
}

/// Respawn particle entities when a new epoch starts, recolour them when only the
/// palette changed
pub fn sync_particle_entities(
    mut commands: Commands,
    sim: Res<Simulation>,
    mut sync: ResMut<RenderSync>,
    mut assets: ResMut<ParticleAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, Or<(With<ParticlePoint>, With<CentralMarker>)>>,
    mut points: Query<(&ParticlePoint, &mut MeshMaterial3d<StandardMaterial>)>,
) {
    if sync.epoch != Some(sim.epoch()) {
        for entity in existing.iter() {
            commands.entity(entity).despawn();
        }

        // Low-poly sphere (12 triangles), scaled per particle
        let mesh = assets
            .mesh
            .get_or_insert_with(|| {
                let sphere = Sphere::new(1.0);
                let mesh = sphere.mesh().ico(0).unwrap_or_else(|_| sphere.mesh().uv(8, 6));
                meshes.add(mesh)
            })
            .clone();

        let mut spawned = 0;
        for (slot, visual) in sampled(sim.visuals(), MAX_RENDER_PARTICLES).enumerate() {
            let material = assets.material(visual.color, &mut materials);
            commands.spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material),
                Transform::from_translation(Vec3::from(visual.position))
                    .with_scale(Vec3::splat(visual.size)),
                ParticlePoint { slot },
            ));
            spawned += 1;
        }

        let marker = assets.material([0.02, 0.02, 0.02, 1.0], &mut materials);
        for (index, central) in sim.central_masses().iter().enumerate() {
            commands.spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(marker.clone()),
                Transform::from_translation(central.position).with_scale(Vec3::splat(2.5)),
                CentralMarker { index },
            ));
        }

        info!(
            "Spawned {} render particles from {} simulation particles (epoch {})",
            spawned,
            sim.particle_count(),
            sim.epoch()
        );
        sync.epoch = Some(sim.epoch());
        sync.palette = Some(sim.palette().clone());
        return;
    }

    if sync.palette.as_ref() != Some(sim.palette()) {
        let colors: Vec<[f32; 4]> = sampled(sim.visuals(), MAX_RENDER_PARTICLES)
            .map(|v| v.color)
            .collect();
        for (point, mut material) in points.iter_mut() {
            if let Some(&color) = colors.get(point.slot) {
                material.0 = assets.material(color, &mut materials);
            }
        }
        sync.palette = Some(sim.palette().clone());
    }
}

/// Update particle positions from the readable frame buffer
pub fn update_particle_visuals(
    sim: Res<Simulation>,
    mut points: Query<(&mut Transform, &ParticlePoint), Without<CentralMarker>>,
    mut markers: Query<(&mut Transform, &CentralMarker), Without<ParticlePoint>>,
) {
    if sim.is_paused() {
        return;
    }

    let positions: Vec<Vec3> = sampled(sim.visuals(), MAX_RENDER_PARTICLES)
        .map(|v| Vec3::from(v.position))
        .collect();
    for (mut transform, point) in points.iter_mut() {
        if let Some(&position) = positions.get(point.slot) {
            transform.translation = position;
        }
    }

    for (mut transform, marker) in markers.iter_mut() {
        if let Some(central) = sim.central_masses().get(marker.index) {
            transform.translation = central.position;
        }
    }
}
