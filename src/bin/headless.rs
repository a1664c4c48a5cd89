//! Runs the simulation without a window on the CPU and prints a short report.

use clap::Parser;
use nbody_core::{SimConfig, SimulationType};
use nbody_sim::Simulation;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "headless")]
#[command(about = "Step an N-body population on the CPU and report on it", long_about = None)]
struct Args {
    /// Number of particles, clamped to 1,000 - 100,000
    #[arg(short, long, default_value_t = SimConfig::default().particle_count)]
    particles: u32,

    /// galaxy, collision or universe
    #[arg(short = 't', long = "type", default_value = "galaxy", value_parser = parse_sim_type)]
    sim_type: SimulationType,

    /// Fixed steps to run
    #[arg(short, long, default_value_t = 600)]
    steps: u32,

    #[arg(long, default_value_t = SimConfig::default().seed)]
    seed: u64,

    /// Fraction of pairwise interactions evaluated per step
    #[arg(long, default_value_t = SimConfig::default().interaction_rate)]
    rate: f32,

    /// Keep black holes where they were generated
    #[arg(long)]
    anchor_black_holes: bool,
}

fn parse_sim_type(name: &str) -> Result<SimulationType, String> {
    SimulationType::from_name(name).ok_or_else(|| format!("unknown simulation type '{}'", name))
}

impl Args {
    fn config(&self) -> SimConfig {
        let mut config = SimConfig {
            sim_type: self.sim_type,
            particle_count: self.particles,
            seed: self.seed,
            interaction_rate: self.rate,
            anchor_central_masses: self.anchor_black_holes,
            ..SimConfig::default()
        };
        if config.sim_type == SimulationType::Collision {
            config.second_black_hole.enabled = true;
        }
        config
    }
}

/// Mass-weighted centre, mean speed and RMS radius of the population
fn summarize(sim: &Simulation) -> ([f32; 3], f32, f32) {
    let particles = sim.particles();
    if particles.is_empty() {
        return ([0.0; 3], 0.0, 0.0);
    }

    let mut total_mass = 0.0f64;
    let mut center = [0.0f64; 3];
    let mut speed_sum = 0.0f64;
    let mut r2_sum = 0.0f64;
    for p in particles {
        let m = p.mass() as f64;
        let [x, y, z] = p.pos();
        let [vx, vy, vz] = p.vel();
        total_mass += m;
        center[0] += x as f64 * m;
        center[1] += y as f64 * m;
        center[2] += z as f64 * m;
        speed_sum += ((vx * vx + vy * vy + vz * vz) as f64).sqrt();
        r2_sum += (x * x + y * y + z * z) as f64;
    }

    let n = particles.len() as f64;
    (
        center.map(|c| (c / total_mass.max(f64::MIN_POSITIVE)) as f32),
        (speed_sum / n) as f32,
        (r2_sum / n).sqrt() as f32,
    )
}

fn main() {
    let args = Args::parse();
    let config = args.config();
    let steps = args.steps;

    eprintln!(
        "Generating {} {} particles (seed {})...",
        config.clamped_particle_count(),
        config.sim_type.name(),
        config.seed
    );
    let mut sim = Simulation::new(&config);
    let (_, speed0, radius0) = summarize(&sim);

    let start = Instant::now();
    for step in 0..steps {
        sim.tick();
        if (step + 1) % 100 == 0 {
            eprint!("  {}/{}...\r", step + 1, steps);
        }
    }
    let elapsed = start.elapsed();
    eprintln!("Done.");

    let (center, speed, radius) = summarize(&sim);
    let finite = sim.particles().iter().filter(|p| p.is_finite()).count();

    println!();
    println!("N-BODY HEADLESS RUN");
    println!("  Type:        {}", sim.config().sim_type.name());
    println!("  Particles:   {} ({} finite)", sim.particle_count(), finite);
    println!("  Epoch:       {}", sim.epoch());
    println!("  Steps:       {} x dt {}", sim.step_count(), sim.config().time_step);
    println!(
        "  Wall time:   {:.2?} ({:.1} steps/s)",
        elapsed,
        steps as f64 / elapsed.as_secs_f64().max(1e-9)
    );
    println!("  Centre:      ({:.2}, {:.2}, {:.2})", center[0], center[1], center[2]);
    println!("  Mean speed:  {:.3} -> {:.3}", speed0, speed);
    println!("  RMS radius:  {:.2} -> {:.2}", radius0, radius);
    for (i, central) in sim.central_masses().iter().enumerate() {
        println!(
            "  Central #{}:  mass {:.0} at ({:.2}, {:.2}, {:.2})",
            i + 1,
            central.mass,
            central.position.x,
            central.position.y,
            central.position.z
        );
    }
}
