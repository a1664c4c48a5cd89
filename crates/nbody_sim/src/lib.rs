pub mod auto_restart;
pub mod clock;
pub mod engine;
pub mod frame_buffer;
pub mod pipeline;

pub use auto_restart::AutoRestart;
pub use engine::Simulation;
pub use frame_buffer::{BufferError, FrameBuffers};
pub use pipeline::{SimCommand, SimSettings, SimulationPlugin, Telemetry};
