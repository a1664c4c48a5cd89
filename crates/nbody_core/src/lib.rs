pub mod config;
pub mod constants;
pub mod palette;
pub mod types;

pub use config::{CentralMassConfig, SimConfig, SimulationType};
pub use constants::*;
pub use palette::ColorPalette;
pub use types::*;
