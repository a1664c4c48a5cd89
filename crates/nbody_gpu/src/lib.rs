pub mod buffers;
pub mod context;
pub mod dispatch;
pub mod error;

pub use context::{GpuContext, SimParams};
pub use error::GpuError;

use bevy::render::renderer::{RenderDevice, RenderQueue};
use nbody_core::GpuParticle;

/// Runs simulation steps on the GPU and reads each result back into a CPU slot.
///
/// The GPU keeps its own copy of the population between steps. `revision` identifies
/// the CPU-side population the caller expects the GPU to hold; whenever it changes
/// (new epoch, recolour, a step taken on the CPU) the input is uploaded again.
pub struct GpuStepper {
    ctx: GpuContext,
    uploaded_revision: Option<u64>,
}

impl GpuStepper {
    pub fn new(device: &RenderDevice, capacity: usize) -> Self {
        Self {
            ctx: GpuContext::new(device, capacity),
            uploaded_revision: None,
        }
    }

    /// Advance `input` by one step and write the result into `output`
    pub fn step(
        &mut self,
        device: &RenderDevice,
        queue: &RenderQueue,
        input: &[GpuParticle],
        output: &mut [GpuParticle],
        revision: u64,
        params: &SimParams,
    ) -> Result<(), GpuError> {
        if input.len() != output.len() {
            return Err(GpuError::SizeMismatch {
                expected: input.len() as u64,
                actual: output.len() as u64,
            });
        }
        if input.is_empty() {
            return Ok(());
        }

        if self.uploaded_revision != Some(revision) {
            // Clear first so a failed upload is retried
            self.uploaded_revision = None;
            self.ctx.upload(queue, input)?;
            self.uploaded_revision = Some(revision);
        }

        dispatch::dispatch_nbody(device, queue, &mut self.ctx, params);

        if let Err(err) = self.ctx.readback.read_into(device, output) {
            self.uploaded_revision = None;
            return Err(err);
        }
        Ok(())
    }
}
