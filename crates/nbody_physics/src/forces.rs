use glam::Vec3;
use nbody_core::{GpuParticle, MIN_DISTANCE_SQ, SimConfig};

use crate::sampling::InteractionSampler;

/// Force-law parameters, snapshotted from the config once per step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// Gravitational constant
    pub g: f32,
    /// Softening length for particle-particle pairs
    pub softening: f32,
}

impl ForceParams {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            g: config.gravitational_force,
            softening: config.smoothing,
        }
    }
}

/// Softened gravitational acceleration on a body at `pos_i` from mass `mass_j` at `pos_j`.
/// Magnitude is `g * mass_j / (d^2 + softening^2)`, directed along the separation.
/// Returns None for coincident points, separations below the exclusion threshold,
/// or a non-finite result.
pub fn softened_acceleration(
    pos_i: Vec3,
    pos_j: Vec3,
    mass_j: f32,
    g: f32,
    softening: f32,
) -> Option<Vec3> {
    let delta = pos_j - pos_i;
    let d2 = delta.length_squared();
    let denom = d2 + softening * softening;
    if d2 == 0.0 || denom < MIN_DISTANCE_SQ {
        return None;
    }

    let magnitude = g * mass_j / denom;
    let acc = delta * (magnitude / d2.sqrt());
    acc.is_finite().then_some(acc)
}

/// Sampled pairwise gravity on particle `i`, rescaled so the expected magnitude
/// matches the full sum over all other particles
pub fn pairwise_acceleration(
    particles: &[GpuParticle],
    i: usize,
    params: &ForceParams,
    sampler: &InteractionSampler,
) -> Vec3 {
    let n = particles.len();
    if n < 2 || !sampler.is_enabled() {
        return Vec3::ZERO;
    }

    let pos_i = Vec3::from_slice(&particles[i].position);
    let mut sum = Vec3::ZERO;
    let mut evaluated = 0usize;

    for j in sampler.indices(n) {
        if j == i {
            continue;
        }
        evaluated += 1;
        let other = &particles[j];
        if let Some(acc) = softened_acceleration(
            pos_i,
            Vec3::from_slice(&other.position),
            other.mass(),
            params.g,
            params.softening,
        ) {
            sum += acc;
        }
    }

    if evaluated == 0 {
        return Vec3::ZERO;
    }
    sum * ((n - 1) as f32 / evaluated as f32)
}
