use bytemuck::{Pod, Zeroable};

/// GPU-compatible particle representation
/// Must be repr(C) and Pod for GPU buffer upload; layout mirrors `Particle` in nbody.wgsl
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuParticle {
    /// Position (x, y, z) + mass packed in w
    pub position: [f32; 4],
    /// Velocity (x, y, z) + display size packed in w
    pub velocity: [f32; 4],
    /// RGBA colour taken from the active palette
    pub color: [f32; 4],
    /// Simulation epoch this particle was generated in
    pub epoch: u32,
    /// Palette index chosen at generation; survives recolouring
    pub palette_slot: u32,
    /// Padding for 16-byte alignment
    pub _pad: [u32; 2],
}

impl GpuParticle {
    pub fn new(pos: [f32; 3], vel: [f32; 3], mass: f32, size: f32) -> Self {
        Self {
            position: [pos[0], pos[1], pos[2], mass],
            velocity: [vel[0], vel[1], vel[2], size],
            color: [1.0; 4],
            epoch: 0,
            palette_slot: 0,
            _pad: [0; 2],
        }
    }

    pub fn mass(&self) -> f32 {
        self.position[3]
    }

    pub fn size(&self) -> f32 {
        self.velocity[3]
    }

    pub fn pos(&self) -> [f32; 3] {
        [self.position[0], self.position[1], self.position[2]]
    }

    pub fn vel(&self) -> [f32; 3] {
        [self.velocity[0], self.velocity[1], self.velocity[2]]
    }

    pub fn set_pos(&mut self, pos: [f32; 3]) {
        self.position[..3].copy_from_slice(&pos);
    }

    pub fn set_vel(&mut self, vel: [f32; 3]) {
        self.velocity[..3].copy_from_slice(&vel);
    }

    /// True when position, velocity and mass are all finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|c| c.is_finite())
    }

    pub fn visual(&self) -> ParticleVisual {
        ParticleVisual {
            position: self.pos(),
            size: self.size(),
            color: self.color,
        }
    }
}

/// What the renderer gets to see of a particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleVisual {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
}
