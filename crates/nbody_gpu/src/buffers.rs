use bevy::render::render_resource::*;
use bevy::render::renderer::RenderDevice;
use nbody_core::GpuParticle;

use crate::error::GpuError;

/// Staging buffer for reading particles back from GPU to CPU
pub struct ReadbackBuffer {
    pub staging: Buffer,
    pub size: u64,
}

impl ReadbackBuffer {
    pub fn new(device: &RenderDevice, particle_count: usize) -> Self {
        let size = (std::mem::size_of::<GpuParticle>() * particle_count) as u64;
        let staging = device.create_buffer(&BufferDescriptor {
            label: Some("readback_staging"),
            size,
            usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { staging, size }
    }

    /// Block until the first `output.len()` particles of the staging buffer are
    /// mapped, then copy them out
    pub fn read_into(&self, device: &RenderDevice, output: &mut [GpuParticle]) -> Result<(), GpuError> {
        let bytes = (std::mem::size_of::<GpuParticle>() * output.len()) as u64;
        if bytes == 0 {
            return Ok(());
        }
        if bytes > self.size {
            return Err(GpuError::SizeMismatch {
                expected: bytes,
                actual: self.size,
            });
        }

        let slice = self.staging.slice(..bytes);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(Maintain::Wait);

        match rx.try_recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(GpuError::MapFailed(err.to_string())),
            Err(_) => return Err(GpuError::MapFailed("map callback never ran".into())),
        }

        let copied = {
            let data = slice.get_mapped_range();
            copy_particles(&data, output)
        };
        // Unmapped whether or not the copy succeeded
        self.staging.unmap();
        copied
    }
}

/// Copy mapped staging bytes into `output`, which must be exactly as long
fn copy_particles(data: &[u8], output: &mut [GpuParticle]) -> Result<(), GpuError> {
    let expected = std::mem::size_of_val(output) as u64;
    let mismatch = || GpuError::SizeMismatch {
        expected,
        actual: data.len() as u64,
    };
    let mapped: &[GpuParticle] = bytemuck::try_cast_slice(data).map_err(|_| mismatch())?;
    if mapped.len() != output.len() {
        return Err(mismatch());
    }
    output.copy_from_slice(mapped);
    Ok(())
}
