use glam::{Quat, Vec3};
use nbody_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::central_mass::CentralMass;

/// Everything a fresh epoch starts from
#[derive(Debug, Clone, Default)]
pub struct InitialConditions {
    pub particles: Vec<GpuParticle>,
    pub central_masses: Vec<CentralMass>,
}

/// Random source for one generation. Restarts with the same seed reproduce the
/// same population only within the same epoch.
pub fn generation_rng(seed: u64, epoch: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.wrapping_add(epoch as u64 * 7919))
}

/// Build the initial population for the configured simulation type.
/// The config is sanitised first, so the particle count is always in range.
pub fn generate(config: &SimConfig, palette: &ColorPalette, rng: &mut impl Rng) -> InitialConditions {
    let config = config.sanitized();
    let mut initial = match config.sim_type {
        SimulationType::Galaxy => galaxy(&config, palette, rng),
        SimulationType::Collision => collision(&config, palette, rng),
        SimulationType::Universe => universe(&config, palette, rng),
    };
    initial.particles.shrink_to_fit();
    initial
}

/// One exponential disk to be populated
#[derive(Debug, Clone, Copy)]
struct Disk {
    center: Vec3,
    bulk_velocity: Vec3,
    orientation: Quat,
    radius: f32,
    thickness: f32,
    count: usize,
    /// Total particle mass in this disk
    mass: f32,
    /// Point mass sitting at the centre, counted in the enclosed mass
    central_mass: f32,
    /// Signed multiplier on the tangential speed
    rotation: f32,
}

impl Disk {
    fn normal(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }
}

fn galaxy(config: &SimConfig, palette: &ColorPalette, rng: &mut impl Rng) -> InitialConditions {
    let n = config.particle_count as usize;
    let disk = Disk {
        center: Vec3::ZERO,
        bulk_velocity: Vec3::ZERO,
        orientation: Quat::IDENTITY,
        radius: config.radius,
        thickness: config.thickness,
        count: n,
        mass: config.total_mass,
        central_mass: central_mass_of(config.black_hole),
        rotation: 1.0,
    };

    let mut particles = Vec::with_capacity(n);
    populate_disk(&disk, config, palette, rng, &mut particles);

    let central_masses = config
        .active_central_masses()
        .into_iter()
        .flatten()
        .map(|bh| CentralMass::from_config(&bh, disk.center, disk.bulk_velocity, disk.normal()))
        .collect();

    InitialConditions { particles, central_masses }
}

fn collision(config: &SimConfig, palette: &ColorPalette, rng: &mut impl Rng) -> InitialConditions {
    let n = config.particle_count as usize;
    let r = config.radius;
    let v_ref = (config.gravitational_force * config.total_mass / r).sqrt();
    let speed = config.collision_velocity * COLLISION_SPEED_SCALE * v_ref.max(1.0);

    let [first_bh, second_bh] = config.active_central_masses();
    let counts = [n.div_ceil(2), n / 2];

    let disks = [
        Disk {
            center: Vec3::new(-1.5 * r, -0.125 * r, 0.0),
            bulk_velocity: Vec3::X * speed,
            orientation: Quat::IDENTITY,
            radius: r,
            thickness: config.thickness,
            count: counts[0],
            mass: config.total_mass * counts[0] as f32 / n as f32,
            central_mass: first_bh.map_or(0.0, |bh| bh.mass),
            rotation: 1.0,
        },
        Disk {
            center: Vec3::new(1.5 * r, 0.125 * r, 0.0),
            bulk_velocity: -Vec3::X * speed,
            orientation: Quat::from_rotation_x(30f32.to_radians()),
            radius: r,
            thickness: config.thickness,
            count: counts[1],
            mass: config.total_mass * counts[1] as f32 / n as f32,
            central_mass: second_bh.map_or(0.0, |bh| bh.mass),
            rotation: 1.0,
        },
    ];

    let mut particles = Vec::with_capacity(n);
    for disk in &disks {
        populate_disk(disk, config, palette, rng, &mut particles);
    }

    let central_masses = disks
        .iter()
        .zip([first_bh, second_bh])
        .filter_map(|(disk, bh)| {
            bh.map(|bh| CentralMass::from_config(&bh, disk.center, disk.bulk_velocity, disk.normal()))
        })
        .collect();

    InitialConditions { particles, central_masses }
}

fn universe(config: &SimConfig, palette: &ColorPalette, rng: &mut impl Rng) -> InitialConditions {
    const PLACEMENT_TRIES: usize = 32;

    let n = config.particle_count as usize;
    let k = (n / 5_000).clamp(3, 12);
    let cluster_radius = config.radius / 3.0;
    let min_separation = 2.5 * cluster_radius;
    let volume_radius = 3.0 * config.radius;
    let v_ref = (config.gravitational_force * config.total_mass / config.radius).sqrt().max(1.0);

    // Rejection sampling; after the retry budget the last candidate is taken as is
    let mut centers: Vec<Vec3> = Vec::with_capacity(k);
    for _ in 0..k {
        let mut candidate = random_in_sphere(rng, volume_radius);
        for _ in 0..PLACEMENT_TRIES {
            if centers.iter().all(|c| c.distance(candidate) >= min_separation) {
                break;
            }
            candidate = random_in_sphere(rng, volume_radius);
        }
        centers.push(candidate);
    }

    let mut particles = Vec::with_capacity(n);
    for (i, center) in centers.into_iter().enumerate() {
        let count = n / k + usize::from(i < n % k);
        let axis = random_unit(rng);
        let sign: f32 = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let disk = Disk {
            center,
            bulk_velocity: random_unit(rng) * rng.gen_range(0.0..0.05f32) * v_ref,
            orientation: Quat::from_rotation_arc(Vec3::Z, axis),
            radius: cluster_radius,
            thickness: config.thickness.min(cluster_radius) / 3.0,
            count,
            mass: config.total_mass * count as f32 / n as f32,
            central_mass: 0.0,
            rotation: sign * rng.gen_range(0.2..=0.6f32),
        };
        populate_disk(&disk, config, palette, rng, &mut particles);
    }

    let central_masses = config
        .active_central_masses()
        .into_iter()
        .flatten()
        .map(|bh| CentralMass::from_config(&bh, Vec3::ZERO, Vec3::ZERO, Vec3::Z))
        .collect();

    InitialConditions { particles, central_masses }
}

/// Append `disk.count` particles drawn from a truncated exponential disk
fn populate_disk(
    disk: &Disk,
    config: &SimConfig,
    palette: &ColorPalette,
    rng: &mut impl Rng,
    out: &mut Vec<GpuParticle>,
) {
    if disk.count == 0 {
        return;
    }

    let radius = disk.radius;
    let scale = radius / 4.0;
    let truncation = 1.0 - (-radius / scale).exp();
    let half_thickness = disk.thickness * 0.5;
    let softening_sq = config.smoothing * config.smoothing;
    let g = config.gravitational_force;
    let mean_mass = config.total_mass / config.particle_count as f32;
    let (min_size, max_size) = (config.min_particle_size, config.max_particle_size);

    for _ in 0..disk.count {
        // Inverse CDF of e^{-r/h} truncated at the disk radius
        let u: f32 = rng.gen_range(0.0..1.0);
        let r = (-scale * (1.0 - u * truncation).ln()).clamp(0.0, radius);
        let theta = rng.gen_range(0.0..std::f32::consts::TAU);
        let (sin, cos) = theta.sin_cos();

        // Thinner toward the rim, and never outside the sphere of the disk radius
        let taper = 1.0 - 0.7 * (r / radius);
        let z_limit = (half_thickness * taper).min((radius * radius - r * r).max(0.0).sqrt());
        let z = rng.gen_range(-1.0..=1.0f32) * z_limit;

        let enclosed_fraction = (1.0 - (-r / scale).exp()) / truncation;
        let enclosed = disk.mass * enclosed_fraction + disk.central_mass;
        let r2 = r * r;
        let circular = (g * enclosed * r2 / (r2 + softening_sq).powf(1.5)).max(0.0).sqrt();
        let bulk = config.initial_rotation * ROTATION_SCALE * r;
        let core = config.initial_core_spin * ROTATION_SCALE * radius * (-r / scale).exp();
        let tangential = (circular + bulk + core) * disk.rotation;

        let local_pos = Vec3::new(r * cos, r * sin, z);
        let local_vel = Vec3::new(-sin, cos, 0.0) * tangential;

        let pos = disk.center + disk.orientation * local_pos;
        let vel = disk.bulk_velocity + disk.orientation * local_vel;

        let mass = (mean_mass * rng.gen_range(0.5..1.5f32)).max(MIN_PARTICLE_MASS);
        let size = rng.gen_range(min_size..max_size);

        let slot = palette.slot_for(r / radius + rng.gen_range(-0.08..0.08f32));
        let mut particle = GpuParticle::new(pos.to_array(), vel.to_array(), mass, size);
        particle.palette_slot = slot;
        particle.color = palette.color(slot);
        out.push(particle);
    }
}

fn central_mass_of(config: CentralMassConfig) -> f32 {
    if config.enabled { config.mass } else { 0.0 }
}

fn random_unit(rng: &mut impl Rng) -> Vec3 {
    let z: f32 = rng.gen_range(-1.0..=1.0);
    let phi = rng.gen_range(0.0..std::f32::consts::TAU);
    let rho = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(rho * phi.cos(), rho * phi.sin(), z)
}

fn random_in_sphere(rng: &mut impl Rng, radius: f32) -> Vec3 {
    random_unit(rng) * radius * rng.gen_range(0.0..1.0f32).cbrt()
}
