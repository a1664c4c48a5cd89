use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PARTICLES, MIN_PARTICLES};

/// Which initial mass distribution to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimulationType {
    /// A single rotating disk
    #[default]
    Galaxy,
    /// Two disks on an approach course
    Collision,
    /// Several small disks scattered through a larger volume
    Universe,
}

impl SimulationType {
    pub const ALL: [SimulationType; 3] = [Self::Galaxy, Self::Collision, Self::Universe];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Galaxy => "Galaxy",
            Self::Collision => "Collision",
            Self::Universe => "Universe",
        }
    }

    /// Parse a user-facing name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

/// Settings for one optional central mass (black hole)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralMassConfig {
    pub enabled: bool,
    /// Point mass, 100 - 100,000
    pub mass: f32,
    /// Signed spin rate, -0.05 - 0.05. Positive is counter-clockwise about the disk normal.
    pub spin: f32,
    /// Softening radius used for this mass's point force
    pub softening: f32,
}

impl CentralMassConfig {
    pub const MASS_RANGE: (f32, f32) = (100.0, 100_000.0);
    pub const SPIN_RANGE: (f32, f32) = (-0.05, 0.05);
    pub const MIN_SOFTENING: f32 = 0.01;

    fn sanitized(self, fallback: Self) -> Self {
        Self {
            enabled: self.enabled,
            mass: clamp_or(self.mass, Self::MASS_RANGE, fallback.mass),
            spin: clamp_or(self.spin, Self::SPIN_RANGE, fallback.spin),
            softening: clamp_or(
                self.softening,
                (Self::MIN_SOFTENING, f32::MAX),
                fallback.softening,
            ),
        }
    }
}

/// Simulation configuration. Single source of truth for every tunable parameter;
/// edited by the UI, snapshotted by the engine once per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub sim_type: SimulationType,
    /// Number of particles, 1,000 - 100,000
    pub particle_count: u32,
    /// Random seed for deterministic generation and interaction sampling
    pub seed: u64,
    /// Gravitational constant G, 0 - 20
    pub gravitational_force: f32,
    /// Softening length added in quadrature to every pair separation, 0 - 100
    pub smoothing: f32,
    /// Fraction of pairwise interactions evaluated per step, 0 - 1
    pub interaction_rate: f32,
    /// Display size range; min is always strictly below max
    pub min_particle_size: f32,
    pub max_particle_size: f32,
    /// Disk radius, 1 - 10,000
    pub radius: f32,
    /// Disk thickness, 0 - radius
    pub thickness: f32,
    /// Solid-body rotation added at generation, 0 - 40
    pub initial_rotation: f32,
    /// Extra rotation concentrated in the core, 0 - 40
    pub initial_core_spin: f32,
    /// Approach speed of the colliding pair, 0 - 0.5
    pub collision_velocity: f32,
    /// Total particle mass, shared out across the population
    pub total_mass: f32,
    /// Simulated time advanced per fixed tick
    pub time_step: f32,
    pub black_hole: CentralMassConfig,
    /// Only used by the collision variant
    pub second_black_hole: CentralMassConfig,
    /// Scales the force between the two central masses when both are active, 0 - 10
    pub black_hole_gravity_multiplier: f32,
    /// Pin central masses where they were generated instead of letting them move
    /// under their mutual force and initial velocity
    pub anchor_central_masses: bool,
    /// Draw colours from a randomly generated palette instead of the fixed one
    pub use_random_colors: bool,
    /// Auto mode restart interval in minutes, 1 - 10
    pub auto_restart_minutes: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sim_type: SimulationType::Galaxy,
            particle_count: 20_000,
            seed: 42,
            gravitational_force: 1.0,
            smoothing: 5.0,
            interaction_rate: 0.05,
            min_particle_size: 0.1,
            max_particle_size: 1.5,
            radius: 100.0,
            thickness: 10.0,
            initial_rotation: 1.0,
            initial_core_spin: 1.0,
            collision_velocity: 0.1,
            total_mass: 10_000.0,
            time_step: 0.01,
            black_hole: CentralMassConfig {
                enabled: true,
                mass: 2_000.0,
                spin: 0.01,
                softening: 10.0,
            },
            second_black_hole: CentralMassConfig {
                enabled: false,
                mass: 2_000.0,
                spin: -0.01,
                softening: 10.0,
            },
            black_hole_gravity_multiplier: 1.0,
            anchor_central_masses: false,
            use_random_colors: false,
            auto_restart_minutes: 3.0,
        }
    }
}

impl SimConfig {
    pub const GRAVITY_RANGE: (f32, f32) = (0.0, 20.0);
    pub const SMOOTHING_RANGE: (f32, f32) = (0.0, 100.0);
    pub const INTERACTION_RATE_RANGE: (f32, f32) = (0.0, 1.0);
    pub const MIN_SIZE_RANGE: (f32, f32) = (0.01, 1.0);
    pub const MAX_SIZE_RANGE: (f32, f32) = (1.01, 5.0);
    pub const RADIUS_RANGE: (f32, f32) = (1.0, 10_000.0);
    pub const ROTATION_RANGE: (f32, f32) = (0.0, 40.0);
    pub const COLLISION_VELOCITY_RANGE: (f32, f32) = (0.0, 0.5);
    pub const MULTIPLIER_RANGE: (f32, f32) = (0.0, 10.0);
    pub const AUTO_RESTART_RANGE: (f32, f32) = (1.0, 10.0);

    /// Particle count clamped to the supported range
    pub fn clamped_particle_count(&self) -> u32 {
        self.particle_count.clamp(MIN_PARTICLES, MAX_PARTICLES)
    }

    /// Raise or lower the minimum size, pushing the maximum up if they would cross
    pub fn set_min_particle_size(&mut self, value: f32) {
        self.min_particle_size = clamp_or(value, Self::MIN_SIZE_RANGE, self.min_particle_size);
        if self.min_particle_size >= self.max_particle_size {
            self.max_particle_size = (self.min_particle_size + 1.0)
                .clamp(Self::MAX_SIZE_RANGE.0, Self::MAX_SIZE_RANGE.1);
        }
    }

    /// Raise or lower the maximum size, pulling the minimum down if they would cross
    pub fn set_max_particle_size(&mut self, value: f32) {
        self.max_particle_size = clamp_or(value, Self::MAX_SIZE_RANGE, self.max_particle_size);
        if self.max_particle_size <= self.min_particle_size {
            self.min_particle_size = (self.max_particle_size - 1.0)
                .clamp(Self::MIN_SIZE_RANGE.0, Self::MIN_SIZE_RANGE.1);
        }
    }

    /// Set the radius; thickness follows it down if needed
    pub fn set_radius(&mut self, value: f32) {
        self.radius = clamp_or(value, Self::RADIUS_RANGE, self.radius);
        self.thickness = self.thickness.min(self.radius);
    }

    pub fn set_thickness(&mut self, value: f32) {
        self.thickness = clamp_or(value, (0.0, self.radius), self.thickness);
    }

    pub fn set_auto_restart_minutes(&mut self, minutes: f32) {
        self.auto_restart_minutes =
            clamp_or(minutes, Self::AUTO_RESTART_RANGE, self.auto_restart_minutes);
    }

    /// Central masses that participate for the current simulation type.
    /// The second mass only exists in the collision variant.
    pub fn active_central_masses(&self) -> [Option<CentralMassConfig>; 2] {
        let first = self.black_hole.enabled.then_some(self.black_hole);
        let second = (self.sim_type == SimulationType::Collision && self.second_black_hole.enabled)
            .then_some(self.second_black_hole);
        [first, second]
    }

    /// A copy with every field pulled back into range and all invariants restored.
    /// Non-finite values fall back to the defaults.
    pub fn sanitized(&self) -> Self {
        let d = Self::default();
        let radius = clamp_or(self.radius, Self::RADIUS_RANGE, d.radius);
        let min_size = clamp_or(self.min_particle_size, Self::MIN_SIZE_RANGE, d.min_particle_size);
        let max_size = clamp_or(self.max_particle_size, Self::MAX_SIZE_RANGE, d.max_particle_size);
        // MIN_SIZE_RANGE tops out below MAX_SIZE_RANGE, so clamping alone keeps min < max

        Self {
            sim_type: self.sim_type,
            particle_count: self.clamped_particle_count(),
            seed: self.seed,
            gravitational_force: clamp_or(
                self.gravitational_force,
                Self::GRAVITY_RANGE,
                d.gravitational_force,
            ),
            smoothing: clamp_or(self.smoothing, Self::SMOOTHING_RANGE, d.smoothing),
            interaction_rate: clamp_or(
                self.interaction_rate,
                Self::INTERACTION_RATE_RANGE,
                d.interaction_rate,
            ),
            min_particle_size: min_size,
            max_particle_size: max_size,
            radius,
            thickness: clamp_or(self.thickness, (0.0, radius), d.thickness.min(radius)),
            initial_rotation: clamp_or(
                self.initial_rotation,
                Self::ROTATION_RANGE,
                d.initial_rotation,
            ),
            initial_core_spin: clamp_or(
                self.initial_core_spin,
                Self::ROTATION_RANGE,
                d.initial_core_spin,
            ),
            collision_velocity: clamp_or(
                self.collision_velocity,
                Self::COLLISION_VELOCITY_RANGE,
                d.collision_velocity,
            ),
            total_mass: clamp_or(self.total_mass, (f32::MIN_POSITIVE, f32::MAX), d.total_mass),
            time_step: clamp_or(self.time_step, (f32::MIN_POSITIVE, 1.0), d.time_step),
            black_hole: self.black_hole.sanitized(d.black_hole),
            second_black_hole: self.second_black_hole.sanitized(d.second_black_hole),
            black_hole_gravity_multiplier: clamp_or(
                self.black_hole_gravity_multiplier,
                Self::MULTIPLIER_RANGE,
                d.black_hole_gravity_multiplier,
            ),
            anchor_central_masses: self.anchor_central_masses,
            use_random_colors: self.use_random_colors,
            auto_restart_minutes: clamp_or(
                self.auto_restart_minutes,
                Self::AUTO_RESTART_RANGE,
                d.auto_restart_minutes,
            ),
        }
    }

    /// Whether moving from `self` to `next` needs a fresh population
    /// rather than just new parameters on the next step.
    pub fn requires_regeneration(&self, next: &SimConfig) -> bool {
        self.sim_type != next.sim_type
            || self.clamped_particle_count() != next.clamped_particle_count()
            || self.seed != next.seed
            || self.radius != next.radius
            || self.thickness != next.thickness
            || self.total_mass != next.total_mass
            || self.black_hole.enabled != next.black_hole.enabled
            || self.second_black_hole.enabled != next.second_black_hole.enabled
    }
}

fn clamp_or(value: f32, (lo, hi): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_already_sane() {
        let config = SimConfig::default();
        assert_eq!(config.sanitized(), config);
    }

    #[test]
    fn test_particle_count_clamped() {
        let low = SimConfig { particle_count: 10, ..SimConfig::default() };
        let high = SimConfig { particle_count: 5_000_000, ..SimConfig::default() };
        assert_eq!(low.sanitized().particle_count, MIN_PARTICLES);
        assert_eq!(high.sanitized().particle_count, MAX_PARTICLES);
    }

    #[test]
    fn test_thickness_clamped_to_radius() {
        let config = SimConfig { radius: 50.0, thickness: 80.0, ..SimConfig::default() };
        let s = config.sanitized();
        assert_eq!(s.thickness, 50.0);

        let mut config = SimConfig::default();
        config.set_radius(5.0);
        assert!(config.thickness <= config.radius);
        config.set_thickness(100.0);
        assert_eq!(config.thickness, 5.0);
    }

    #[test]
    fn test_size_setters_keep_min_below_max() {
        let mut config = SimConfig::default();
        for v in [0.0, 0.01, 0.5, 1.0, 1.01, 2.0, 5.0, 9.0, -3.0] {
            config.set_min_particle_size(v);
            assert!(config.min_particle_size < config.max_particle_size, "min={v}");
            config.set_max_particle_size(v);
            assert!(config.min_particle_size < config.max_particle_size, "max={v}");
        }
    }

    #[test]
    fn test_min_size_pushes_max() {
        // Built by hand, bypassing the setters
        let mut config = SimConfig { min_particle_size: 0.5, max_particle_size: 0.6, ..SimConfig::default() };
        config.set_min_particle_size(0.8);
        assert!((config.max_particle_size - 1.8).abs() < 1e-6);
    }

    #[test]
    fn test_max_size_pulls_min() {
        let mut config = SimConfig { min_particle_size: 3.0, max_particle_size: 4.0, ..SimConfig::default() };
        config.set_max_particle_size(2.5);
        assert!((config.min_particle_size - 1.0).abs() < 1e-6);
        assert!(config.min_particle_size < config.max_particle_size);
    }

    #[test]
    fn test_non_finite_falls_back() {
        let config = SimConfig {
            gravitational_force: f32::NAN,
            smoothing: f32::INFINITY,
            ..SimConfig::default()
        };
        let s = config.sanitized();
        assert_eq!(s.gravitational_force, 1.0);
        assert_eq!(s.smoothing, 5.0);
    }

    #[test]
    fn test_second_black_hole_only_in_collision() {
        let mut config = SimConfig::default();
        config.second_black_hole.enabled = true;
        assert!(config.active_central_masses()[1].is_none());
        config.sim_type = SimulationType::Collision;
        assert!(config.active_central_masses()[1].is_some());
    }

    #[test]
    fn test_regeneration_triggers() {
        let base = SimConfig::default();
        let gravity_only = SimConfig { gravitational_force: 3.0, ..base.clone() };
        assert!(!base.requires_regeneration(&gravity_only));
        let more = SimConfig { particle_count: 30_000, ..base.clone() };
        assert!(base.requires_regeneration(&more));
    }

    #[test]
    fn test_simulation_type_names() {
        for t in SimulationType::ALL {
            assert_eq!(SimulationType::from_name(&t.name().to_lowercase()), Some(t));
        }
        assert_eq!(SimulationType::from_name("spiral"), None);
    }
}
