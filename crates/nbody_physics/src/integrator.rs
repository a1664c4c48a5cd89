use glam::Vec3;
use nbody_core::{GpuParticle, MAX_POSITION, MAX_SPEED};
use rayon::prelude::*;

use crate::central_mass::CentralMass;
use crate::forces::{ForceParams, pairwise_acceleration};
use crate::sampling::InteractionSampler;

/// Net acceleration on particle `i`: sampled pairwise gravity plus every active central mass
pub fn net_acceleration(
    particles: &[GpuParticle],
    i: usize,
    params: &ForceParams,
    central_masses: &[CentralMass],
    sampler: &InteractionSampler,
) -> Vec3 {
    let pos = Vec3::from_slice(&particles[i].position);
    let mut acc = pairwise_acceleration(particles, i, params, sampler);
    for central in central_masses {
        acc += central.acceleration_on(pos, params.g);
    }
    acc
}

/// Semi-implicit Euler update with clamping.
/// Non-finite velocity is zeroed, non-finite position keeps the previous value,
/// and both are limited in magnitude.
pub fn integrate(pos: Vec3, vel: Vec3, acc: Vec3, dt: f32) -> (Vec3, Vec3) {
    let acc = if acc.is_finite() { acc } else { Vec3::ZERO };

    let mut new_vel = vel + acc * dt;
    if !new_vel.is_finite() {
        new_vel = Vec3::ZERO;
    }
    let new_vel = new_vel.clamp_length_max(MAX_SPEED);

    let mut new_pos = pos + new_vel * dt;
    if !new_pos.is_finite() {
        new_pos = if pos.is_finite() { pos } else { Vec3::ZERO };
    }
    (new_pos.clamp_length_max(MAX_POSITION), new_vel)
}

/// Advance one generation: read `input`, write the next generation into `output`.
///
/// `input` is never written. Every particle is computed independently from the
/// shared read-only snapshot, so the work is spread across the rayon pool.
/// Mass, size, colour and epoch are carried over unchanged.
pub fn advance(
    input: &[GpuParticle],
    output: &mut [GpuParticle],
    params: &ForceParams,
    central_masses: &[CentralMass],
    sampler: &InteractionSampler,
    dt: f32,
) {
    debug_assert_eq!(input.len(), output.len());
    if input.is_empty() {
        return;
    }

    output
        .par_iter_mut()
        .zip(input.par_iter())
        .enumerate()
        .for_each(|(i, (out, current))| {
            let acc = net_acceleration(input, i, params, central_masses, sampler);
            let (pos, vel) = integrate(
                Vec3::from_slice(&current.position),
                Vec3::from_slice(&current.velocity),
                acc,
                dt,
            );
            *out = *current;
            out.set_pos(pos.to_array());
            out.set_vel(vel.to_array());
        });
}
