use bevy::prelude::*;
use bevy::render::renderer::{RenderDevice, RenderQueue};
use nbody_core::{ColorPalette, GpuParticle, ParticleVisual, SimConfig};
use nbody_gpu::{GpuError, GpuStepper, SimParams};
use nbody_physics::central_mass::advance_central_masses;
use nbody_physics::procgen::{self, InitialConditions};
use nbody_physics::{CentralMass, ForceParams, InteractionSampler, integrator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::frame_buffer::FrameBuffers;

/// The simulation engine, tracked as a Bevy Resource.
///
/// Owns a private snapshot of the configuration, the double-buffered population and
/// the central masses. Steps, restarts and recolours all need `&mut self`, so Bevy's
/// scheduler never lets them overlap with each other or with a reader.
#[derive(Resource)]
pub struct Simulation {
    config: SimConfig,
    buffers: FrameBuffers,
    central_masses: Vec<CentralMass>,
    palette: ColorPalette,
    palette_rng: ChaCha8Rng,
    /// Steps taken in the current epoch; also seeds interaction sampling
    step: u64,
    paused: bool,
    /// Bumped whenever the readable slot changes outside a GPU step
    revision: u64,
}

impl Simulation {
    pub fn new(config: &SimConfig) -> Self {
        let config = config.sanitized();
        let mut palette_rng = ChaCha8Rng::seed_from_u64(config.seed.rotate_left(17));
        let palette = if config.use_random_colors {
            ColorPalette::random(&mut palette_rng)
        } else {
            ColorPalette::fixed()
        };

        let mut sim = Self {
            config,
            buffers: FrameBuffers::default(),
            central_masses: Vec::new(),
            palette,
            palette_rng,
            step: 0,
            paused: false,
            revision: 0,
        };
        sim.restart();
        sim
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn epoch(&self) -> u32 {
        self.buffers.epoch()
    }

    pub fn particle_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn particles(&self) -> &[GpuParticle] {
        self.buffers.readable()
    }

    pub fn visuals(&self) -> impl ExactSizeIterator<Item = ParticleVisual> + '_ {
        self.buffers.visuals()
    }

    pub fn central_masses(&self) -> &[CentralMass] {
        &self.central_masses
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn is_consistent(&self) -> bool {
        self.buffers.is_consistent()
    }

    /// Throw away the population and generate a fresh one under a new epoch.
    /// If the new population cannot be installed the old one keeps running.
    pub fn restart(&mut self) {
        let next_epoch = self.buffers.epoch().wrapping_add(1);
        let mut rng = procgen::generation_rng(self.config.seed, next_epoch);
        let InitialConditions { particles, central_masses } =
            procgen::generate(&self.config, &self.palette, &mut rng);

        match self.buffers.regenerate(&particles) {
            Ok(epoch) => {
                self.central_masses = central_masses;
                self.step = 0;
                self.revision = self.revision.wrapping_add(1);
                info!(
                    "Epoch {}: generated {} {} particles, {} central mass(es)",
                    epoch,
                    particles.len(),
                    self.config.sim_type.name(),
                    self.central_masses.len()
                );
            }
            Err(err) => error!("Restart failed, keeping previous population: {}", err),
        }
    }

    /// New palette (random if enabled, otherwise the fixed one) applied to the
    /// current population; positions and velocities are untouched
    pub fn regenerate_colors(&mut self) {
        self.refresh_palette();
        self.buffers.recolor(&self.palette);
        self.revision = self.revision.wrapping_add(1);
    }

    fn refresh_palette(&mut self) {
        self.palette = if self.config.use_random_colors {
            ColorPalette::random(&mut self.palette_rng)
        } else {
            ColorPalette::fixed()
        };
    }

    /// Take a new configuration. Returns true if it forced a regeneration;
    /// otherwise the change applies from the next step.
    pub fn apply_config(&mut self, next: &SimConfig) -> bool {
        let next = next.sanitized();
        if next == self.config {
            return false;
        }

        let regenerate = self.config.requires_regeneration(&next);
        let colors_changed = self.config.use_random_colors != next.use_random_colors;
        self.config = next;

        if regenerate {
            // The new population is coloured from the palette the new config asks for
            if colors_changed {
                self.refresh_palette();
            }
            self.restart();
        } else if colors_changed {
            self.regenerate_colors();
        }
        regenerate
    }

    fn step_inputs(&self) -> (ForceParams, InteractionSampler, f32) {
        let sampler = InteractionSampler::new(
            self.config.interaction_rate,
            self.buffers.len(),
            self.config.seed,
            self.step,
        );
        (ForceParams::from_config(&self.config), sampler, self.config.time_step)
    }

    fn finish_step(&mut self, dt: f32) {
        if !self.config.anchor_central_masses {
            advance_central_masses(
                &mut self.central_masses,
                self.config.gravitational_force,
                self.config.black_hole_gravity_multiplier,
                dt,
            );
        }
        self.buffers.publish();
        self.step += 1;
    }

    /// One fixed step on the CPU
    pub fn tick(&mut self) {
        if self.paused || self.buffers.is_empty() {
            return;
        }

        let (force, sampler, dt) = self.step_inputs();
        let (current, back) = self.buffers.write_pair();
        integrator::advance(current, back, &force, &self.central_masses, &sampler, dt);

        self.finish_step(dt);
        self.revision = self.revision.wrapping_add(1);
    }

    /// One fixed step on the GPU. On error nothing is published and the caller
    /// can retry the same step with `tick`.
    pub fn tick_gpu(
        &mut self,
        gpu: &mut GpuStepper,
        device: &RenderDevice,
        queue: &RenderQueue,
    ) -> Result<(), GpuError> {
        if self.paused || self.buffers.is_empty() {
            return Ok(());
        }

        let (force, sampler, dt) = self.step_inputs();
        let params = SimParams::new(&force, &sampler, &self.central_masses, self.buffers.len(), dt);
        let revision = self.revision;
        let (current, back) = self.buffers.write_pair();
        gpu.step(device, queue, current, back, revision, &params)?;

        self.finish_step(dt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbody_core::SimulationType;

    fn small_config() -> SimConfig {
        SimConfig { particle_count: 1_000, ..SimConfig::default() }
    }

    #[test]
    fn test_new_starts_at_epoch_one() {
        let sim = Simulation::new(&small_config());
        assert_eq!(sim.epoch(), 1);
        assert_eq!(sim.particle_count(), 1_000);
        assert!(sim.is_consistent());
    }

    #[test]
    fn test_tick_moves_and_stays_finite() {
        let mut sim = Simulation::new(&small_config());
        let before = sim.particles().to_vec();
        sim.tick();
        assert_eq!(sim.step_count(), 1);
        assert_eq!(sim.particle_count(), 1_000);
        assert!(sim.particles().iter().all(|p| p.is_finite()));
        assert_ne!(sim.particles(), &before[..]);
        assert!(sim.is_consistent());
    }

    #[test]
    fn test_pause_blocks_steps() {
        let mut sim = Simulation::new(&small_config());
        sim.toggle_pause();
        let before = sim.particles().to_vec();
        sim.tick();
        assert_eq!(sim.particles(), &before[..]);
        assert_eq!(sim.step_count(), 0);
        assert!(!sim.toggle_pause());
    }

    #[test]
    fn test_restart_bumps_epoch() {
        let mut sim = Simulation::new(&small_config());
        sim.tick();
        sim.restart();
        assert_eq!(sim.epoch(), 2);
        assert_eq!(sim.step_count(), 0);
        assert!(sim.particles().iter().all(|p| p.epoch == 2));
    }

    #[test]
    fn test_regenerate_colors_keeps_physics() {
        let config = SimConfig { use_random_colors: true, ..small_config() };
        let mut sim = Simulation::new(&config);
        sim.tick();
        let before = sim.particles().to_vec();
        let epoch = sim.epoch();

        sim.regenerate_colors();
        assert_eq!(sim.epoch(), epoch);
        for (old, new) in before.iter().zip(sim.particles()) {
            assert_eq!(old.position, new.position);
            assert_eq!(old.velocity, new.velocity);
            assert_eq!(new.color, sim.palette().color(old.palette_slot));
        }
    }

    #[test]
    fn test_apply_config() {
        let mut sim = Simulation::new(&small_config());

        let stronger = SimConfig { gravitational_force: 4.0, ..small_config() };
        assert!(!sim.apply_config(&stronger));
        assert_eq!(sim.epoch(), 1);
        assert_eq!(sim.config().gravitational_force, 4.0);

        let collision = SimConfig { sim_type: SimulationType::Collision, ..stronger };
        assert!(sim.apply_config(&collision));
        assert_eq!(sim.epoch(), 2);
        assert_eq!(sim.config().sim_type, SimulationType::Collision);
    }

    #[test]
    fn test_regeneration_picks_up_color_toggle() {
        let mut sim = Simulation::new(&small_config());
        assert_eq!(sim.palette(), &ColorPalette::fixed());

        let next = SimConfig { particle_count: 2_000, use_random_colors: true, ..small_config() };
        assert!(sim.apply_config(&next));
        assert_eq!(sim.epoch(), 2);
        assert_ne!(sim.palette(), &ColorPalette::fixed());
        for p in sim.particles() {
            assert_eq!(p.color, sim.palette().color(p.palette_slot));
        }

        let back = SimConfig { particle_count: 1_000, ..small_config() };
        assert!(sim.apply_config(&back));
        assert_eq!(sim.palette(), &ColorPalette::fixed());
    }

    #[test]
    fn test_two_black_holes_move_toward_each_other() {
        let mut config = SimConfig {
            sim_type: SimulationType::Collision,
            particle_count: 1_000,
            collision_velocity: 0.0,
            black_hole_gravity_multiplier: 5.0,
            ..SimConfig::default()
        };
        config.second_black_hole.enabled = true;
        let mut sim = Simulation::new(&config);
        let gap = |sim: &Simulation| sim.central_masses()[0].position.distance(sim.central_masses()[1].position);
        let start = gap(&sim);
        for _ in 0..10 {
            sim.tick();
        }
        assert!(gap(&sim) < start);
    }

    #[test]
    fn test_anchored_central_masses_stay_put() {
        let mut config = SimConfig {
            sim_type: SimulationType::Collision,
            particle_count: 1_000,
            black_hole_gravity_multiplier: 5.0,
            anchor_central_masses: true,
            ..SimConfig::default()
        };
        config.second_black_hole.enabled = true;
        let mut sim = Simulation::new(&config);
        let start: Vec<_> = sim.central_masses().iter().map(|c| c.position).collect();
        for _ in 0..10 {
            sim.tick();
        }
        let end: Vec<_> = sim.central_masses().iter().map(|c| c.position).collect();
        assert_eq!(start.len(), 2);
        assert_eq!(start, end);

        // Switching takes effect on the next step without a new population
        config.anchor_central_masses = false;
        assert!(!sim.apply_config(&config));
        sim.tick();
        assert_ne!(sim.central_masses()[0].position, start[0]);
    }

    #[test]
    fn test_scenario_thousand_particle_galaxy() {
        let config = SimConfig {
            particle_count: 1_000,
            radius: 100.0,
            thickness: 10.0,
            gravitational_force: 1.0,
            smoothing: 5.0,
            time_step: 0.01,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(&config);
        for p in sim.particles() {
            let [x, y, z] = p.pos();
            assert!((x * x + y * y).sqrt() <= 100.0 * (1.0 + 1e-5));
            assert!(z.abs() <= 5.0 + 1e-5);
        }
        sim.tick();
        assert_eq!(sim.particle_count(), 1_000);
        assert!(sim.particles().iter().all(|p| p.is_finite()));
    }
}
