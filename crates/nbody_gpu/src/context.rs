use bevy::render::render_resource::*;
use bevy::render::renderer::{RenderDevice, RenderQueue};
use nbody_core::{GpuParticle, MAX_POSITION, MAX_SPEED, MIN_DISTANCE_SQ};
use nbody_physics::{CentralMass, ForceParams, InteractionSampler};

use crate::buffers::ReadbackBuffer;
use crate::error::GpuError;

/// Most central masses the shader knows about
pub const MAX_CENTRAL_MASSES: usize = 2;

/// One central mass as laid out in the uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuCentralMass {
    /// Position (x, y, z) + mass in w
    pub position: [f32; 4],
    /// Unit spin axis (x, y, z) + signed spin in w
    pub axis: [f32; 4],
    pub softening: f32,
    pub _pad: [f32; 3],
}

impl From<&CentralMass> for GpuCentralMass {
    fn from(mass: &CentralMass) -> Self {
        let [px, py, pz] = mass.position.to_array();
        let [ax, ay, az] = mass.axis.to_array();
        Self {
            position: [px, py, pz, mass.mass],
            axis: [ax, ay, az, mass.spin],
            softening: mass.softening,
            _pad: [0.0; 3],
        }
    }
}

/// Simulation parameters sent to GPU as uniform buffer; mirrors `SimParams` in nbody.wgsl
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SimParams {
    pub dt: f32,
    pub g: f32,
    pub softening: f32,
    pub particle_count: u32,
    /// Zero disables pairwise gravity
    pub stride: u32,
    pub offset: u32,
    pub max_speed: f32,
    pub max_position: f32,
    pub min_distance_sq: f32,
    pub central_count: u32,
    pub _pad: [u32; 2],
    pub central: [GpuCentralMass; MAX_CENTRAL_MASSES],
}

impl SimParams {
    pub fn new(
        force: &ForceParams,
        sampler: &InteractionSampler,
        central_masses: &[CentralMass],
        particle_count: usize,
        dt: f32,
    ) -> Self {
        let mut central = [GpuCentralMass::default(); MAX_CENTRAL_MASSES];
        for (slot, mass) in central.iter_mut().zip(central_masses) {
            *slot = mass.into();
        }

        Self {
            dt,
            g: force.g,
            softening: force.softening,
            particle_count: particle_count as u32,
            stride: sampler.stride() as u32,
            offset: sampler.offset() as u32,
            max_speed: MAX_SPEED,
            max_position: MAX_POSITION,
            min_distance_sq: MIN_DISTANCE_SQ,
            central_count: central_masses.len().min(MAX_CENTRAL_MASSES) as u32,
            _pad: [0; 2],
            central,
        }
    }
}

/// Holds all GPU resources for the compute pipeline.
/// Buffers are sized once for `capacity` particles and reused across epochs.
pub struct GpuContext {
    pub pipeline: ComputePipeline,
    pub bind_group_layout: BindGroupLayout,
    pub particle_buffer_a: Buffer,
    pub particle_buffer_b: Buffer,
    pub params_buffer: Buffer,
    pub bind_group_a: BindGroup,
    pub bind_group_b: BindGroup,
    pub readback: ReadbackBuffer,
    pub capacity: usize,
    pub particle_count: u32,
    pub current_buffer: usize, // 0 = A->B, 1 = B->A (ping-pong)
}

impl GpuContext {
    pub fn new(device: &RenderDevice, capacity: usize) -> Self {
        let particle_bytes = (std::mem::size_of::<GpuParticle>() * capacity.max(1)) as u64;

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("nbody_shader"),
            source: ShaderSource::Wgsl(include_str!("../shaders/nbody.wgsl").into()),
        });

        let storage_entry = |binding: u32, read_only: bool| BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(
            Some("nbody_bind_group_layout"),
            &[
                // particles_in (read)
                storage_entry(0, true),
                // particles_out (read_write)
                storage_entry(1, false),
                // params (uniform)
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::COMPUTE,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        );

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("nbody_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&RawComputePipelineDescriptor {
            label: Some("nbody_compute_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let particle_buffer = |label: &'static str| {
            device.create_buffer(&BufferDescriptor {
                label: Some(label),
                size: particle_bytes,
                usage: BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        };
        let particle_buffer_a = particle_buffer("particles_a");
        let particle_buffer_b = particle_buffer("particles_b");

        let params_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("sim_params"),
            size: std::mem::size_of::<SimParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = |label: &'static str, input: &Buffer, output: &Buffer| {
            device.create_bind_group(
                Some(label),
                &bind_group_layout,
                &[
                    BindGroupEntry {
                        binding: 0,
                        resource: input.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 1,
                        resource: output.as_entire_binding(),
                    },
                    BindGroupEntry {
                        binding: 2,
                        resource: params_buffer.as_entire_binding(),
                    },
                ],
            )
        };
        let bind_group_a = bind_group("nbody_bind_group_a", &particle_buffer_a, &particle_buffer_b);
        let bind_group_b = bind_group("nbody_bind_group_b", &particle_buffer_b, &particle_buffer_a);

        let readback = ReadbackBuffer::new(device, capacity.max(1));

        Self {
            pipeline,
            bind_group_layout,
            particle_buffer_a,
            particle_buffer_b,
            params_buffer,
            bind_group_a,
            bind_group_b,
            readback,
            capacity,
            particle_count: 0,
            current_buffer: 0,
        }
    }

    /// Replace the GPU-side population with `particles`
    pub fn upload(&mut self, queue: &RenderQueue, particles: &[GpuParticle]) -> Result<(), GpuError> {
        if particles.len() > self.capacity {
            return Err(GpuError::CapacityExceeded {
                requested: particles.len(),
                capacity: self.capacity,
            });
        }
        self.current_buffer = 0;
        self.particle_count = particles.len() as u32;
        if !particles.is_empty() {
            queue.write_buffer(&self.particle_buffer_a, 0, bytemuck::cast_slice(particles));
        }
        Ok(())
    }

    /// Get the buffer that has the latest particle data
    pub fn current_read_buffer(&self) -> &Buffer {
        if self.current_buffer == 0 {
            &self.particle_buffer_a
        } else {
            &self.particle_buffer_b
        }
    }
}
