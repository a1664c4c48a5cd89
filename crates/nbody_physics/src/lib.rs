pub mod central_mass;
pub mod forces;
pub mod integrator;
pub mod procgen;
pub mod sampling;

pub use central_mass::CentralMass;
pub use forces::ForceParams;
pub use procgen::InitialConditions;
pub use sampling::InteractionSampler;
