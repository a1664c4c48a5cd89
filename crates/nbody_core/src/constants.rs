// Simulation units are arbitrary and chosen for on-screen plausibility:
// - Distance: galaxy radius defaults to 100 units
// - Mass: total particle mass defaults to 10^4 units
// - Time: one step advances `SimConfig::time_step` units
// With G = 1 a default disk completes an outer orbit in roughly 60 time units.

/// Smallest particle population the generator will produce
pub const MIN_PARTICLES: u32 = 1_000;

/// Largest particle population; also the fixed capacity of each frame buffer slot
pub const MAX_PARTICLES: u32 = 100_000;

/// Below this squared (softened) separation a pair is excluded from the force sum
pub const MIN_DISTANCE_SQ: f32 = 1e-6;

/// Velocity magnitude clamp applied after every integration step
pub const MAX_SPEED: f32 = 10_000.0;

/// Position magnitude clamp applied after every integration step
pub const MAX_POSITION: f32 = 1.0e7;

/// Smallest mass assigned to a generated particle
pub const MIN_PARTICLE_MASS: f32 = 1e-6;

/// Converts the `initial_rotation` / `initial_core_spin` sliders to rad per time unit
pub const ROTATION_SCALE: f32 = 0.01;

/// Converts the `collision_velocity` slider to a multiple of the characteristic orbital speed
pub const COLLISION_SPEED_SCALE: f32 = 10.0;

/// Fixed simulation tick rate (ticks per wall-clock second)
pub const TICK_RATE: f64 = 60.0;

/// Upper bound on ticks run in one rendered frame; excess time is dropped
pub const MAX_STEPS_PER_FRAME: u32 = 2;

/// Number of colours in a generated palette
pub const PALETTE_SIZE: usize = 8;

/// Workgroup size for GPU compute shaders
pub const WORKGROUP_SIZE: u32 = 256;
