use super::context::{GpuContext, SimParams};
use bevy::render::render_resource::*;
use bevy::render::renderer::{RenderDevice, RenderQueue};
use nbody_core::GpuParticle;
use nbody_core::constants::WORKGROUP_SIZE;

/// Dispatch the N-body compute shader for one simulation step and queue a copy
/// of the result into the readback staging buffer
pub fn dispatch_nbody(
    device: &RenderDevice,
    queue: &RenderQueue,
    ctx: &mut GpuContext,
    params: &SimParams,
) {
    if ctx.particle_count == 0 {
        return;
    }

    queue.write_buffer(&ctx.params_buffer, 0, bytemuck::bytes_of(params));

    let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
        label: Some("nbody_compute_encoder"),
    });

    {
        let mut pass = encoder.begin_compute_pass(&ComputePassDescriptor {
            label: Some("nbody_compute_pass"),
            timestamp_writes: None,
        });

        pass.set_pipeline(&ctx.pipeline);

        // Select bind group based on ping-pong state
        let bind_group = if ctx.current_buffer == 0 {
            &ctx.bind_group_a
        } else {
            &ctx.bind_group_b
        };
        pass.set_bind_group(0, bind_group, &[]);

        pass.dispatch_workgroups(ctx.particle_count.div_ceil(WORKGROUP_SIZE), 1, 1);
    }

    // Flip ping-pong; the freshly written buffer becomes the read buffer
    ctx.current_buffer = 1 - ctx.current_buffer;

    let bytes = (std::mem::size_of::<GpuParticle>() * ctx.particle_count as usize) as u64;
    encoder.copy_buffer_to_buffer(ctx.current_read_buffer(), 0, &ctx.readback.staging, 0, bytes);

    queue.submit(std::iter::once(encoder.finish()));
}
