use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Strided subset of interaction partners evaluated in one step.
///
/// Every particle looks at partners `offset, offset + stride, offset + 2 * stride, ...`.
/// The offset is drawn per step from a seeded generator, so over many steps every
/// pair is visited while any single step stays reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionSampler {
    /// Zero means pairwise gravity is switched off
    stride: usize,
    offset: usize,
}

impl InteractionSampler {
    /// Every pair, every step
    pub fn full() -> Self {
        Self { stride: 1, offset: 0 }
    }

    pub fn disabled() -> Self {
        Self { stride: 0, offset: 0 }
    }

    /// Sampler for an interaction rate in [0, 1] on step `step`
    pub fn new(rate: f32, particle_count: usize, seed: u64, step: u64) -> Self {
        if !(rate > 0.0) || particle_count < 2 {
            return Self::disabled();
        }

        let stride = ((1.0 / rate.min(1.0)).round() as usize).clamp(1, particle_count);
        let offset = if stride == 1 {
            0
        } else {
            let mut rng = ChaCha8Rng::seed_from_u64(seed ^ step.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            rng.gen_range(0..stride)
        };

        Self { stride, offset }
    }

    pub fn is_enabled(&self) -> bool {
        self.stride > 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Partner indices for a population of `n`
    pub fn indices(&self, n: usize) -> impl Iterator<Item = usize> {
        let end = if self.is_enabled() { n } else { 0 };
        (self.offset..end).step_by(self.stride.max(1))
    }
}
