use nbody_core::{ColorPalette, GpuParticle, MAX_PARTICLES, ParticleVisual};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("population of {requested} exceeds frame buffer capacity {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },
}

/// Double buffer between the step and the renderer.
///
/// One slot is readable (the last completed generation), the other is the back slot
/// the next step writes into. `publish` swaps them. Every particle in the readable
/// slot carries the current epoch.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    slots: [Vec<GpuParticle>; 2],
    readable: usize,
    capacity: usize,
    epoch: u32,
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self::new(MAX_PARTICLES as usize)
    }
}

impl FrameBuffers {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: [Vec::with_capacity(capacity), Vec::with_capacity(capacity)],
            readable: 0,
            capacity,
            epoch: 0,
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.slots[self.readable].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last completed generation
    pub fn readable(&self) -> &[GpuParticle] {
        &self.slots[self.readable]
    }

    pub fn visuals(&self) -> impl ExactSizeIterator<Item = ParticleVisual> + '_ {
        self.readable().iter().map(GpuParticle::visual)
    }

    /// (readable, back) pair for one step; the readable half can only be borrowed shared
    pub fn write_pair(&mut self) -> (&[GpuParticle], &mut [GpuParticle]) {
        let (first, second) = self.slots.split_at_mut(1);
        if self.readable == 0 {
            (first[0].as_slice(), second[0].as_mut_slice())
        } else {
            (second[0].as_slice(), first[0].as_mut_slice())
        }
    }

    /// Make the back slot readable
    pub fn publish(&mut self) {
        self.readable = 1 - self.readable;
    }

    /// Install a new population in both slots under a fresh epoch.
    /// On error nothing changes.
    pub fn regenerate(&mut self, particles: &[GpuParticle]) -> Result<u32, BufferError> {
        if particles.len() > self.capacity {
            return Err(BufferError::CapacityExceeded {
                requested: particles.len(),
                capacity: self.capacity,
            });
        }

        let epoch = self.epoch.wrapping_add(1);
        for slot in &mut self.slots {
            slot.clear();
            slot.extend(particles.iter().map(|p| GpuParticle { epoch, ..*p }));
        }
        self.epoch = epoch;
        Ok(epoch)
    }

    /// Reassign colours from each particle's palette slot without touching physics state
    pub fn recolor(&mut self, palette: &ColorPalette) {
        let (current, back) = self.write_pair();
        for (next, p) in back.iter_mut().zip(current) {
            *next = GpuParticle { color: palette.color(p.palette_slot), ..*p };
        }
        self.publish();
    }

    /// Every readable particle belongs to the current epoch
    pub fn is_consistent(&self) -> bool {
        self.readable().iter().all(|p| p.epoch == self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(n: usize) -> Vec<GpuParticle> {
        (0..n)
            .map(|i| {
                let mut p = GpuParticle::new([i as f32, 0.0, 0.0], [0.0, 1.0, 0.0], 1.0, 0.5);
                p.palette_slot = i as u32 % 4;
                p
            })
            .collect()
    }

    #[test]
    fn test_regenerate_fills_both_slots() {
        let mut buffers = FrameBuffers::new(16);
        assert_eq!(buffers.regenerate(&population(10)), Ok(1));
        assert_eq!(buffers.len(), 10);
        assert!(buffers.is_consistent());

        buffers.publish();
        assert_eq!(buffers.len(), 10);
        assert!(buffers.is_consistent());
    }

    #[test]
    fn test_capacity_guard_keeps_previous() {
        let mut buffers = FrameBuffers::new(4);
        buffers.regenerate(&population(3)).unwrap();
        let err = buffers.regenerate(&population(5)).unwrap_err();
        assert_eq!(err, BufferError::CapacityExceeded { requested: 5, capacity: 4 });
        assert_eq!(buffers.epoch(), 1);
        assert_eq!(buffers.len(), 3);
    }

    #[test]
    fn test_publish_swaps_slots() {
        let mut buffers = FrameBuffers::new(8);
        buffers.regenerate(&population(2)).unwrap();
        {
            let (current, back) = buffers.write_pair();
            back[0].set_pos([99.0, 0.0, 0.0]);
            assert_eq!(current[0].pos(), [0.0, 0.0, 0.0]);
        }
        assert_eq!(buffers.readable()[0].pos(), [0.0, 0.0, 0.0]);
        buffers.publish();
        assert_eq!(buffers.readable()[0].pos(), [99.0, 0.0, 0.0]);
    }

    #[test]
    fn test_epoch_never_mixed() {
        let mut buffers = FrameBuffers::new(32);
        buffers.regenerate(&population(20)).unwrap();
        for _ in 0..3 {
            let (current, back) = buffers.write_pair();
            back.copy_from_slice(current);
            buffers.publish();
            assert!(buffers.is_consistent());
        }
        buffers.regenerate(&population(30)).unwrap();
        assert_eq!(buffers.epoch(), 2);
        assert!(buffers.readable().iter().all(|p| p.epoch == 2));
    }

    #[test]
    fn test_recolor_keeps_physics() {
        let mut buffers = FrameBuffers::new(16);
        buffers.regenerate(&population(8)).unwrap();
        let before = buffers.readable().to_vec();

        let palette = ColorPalette { colors: vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]] };
        buffers.recolor(&palette);

        for (old, new) in before.iter().zip(buffers.readable()) {
            assert_eq!(old.position, new.position);
            assert_eq!(old.velocity, new.velocity);
            assert_eq!(old.epoch, new.epoch);
            assert_eq!(new.color, palette.color(old.palette_slot));
        }
    }

    #[test]
    fn test_visuals_mirror_readable() {
        let mut buffers = FrameBuffers::new(4);
        buffers.regenerate(&population(4)).unwrap();
        let visuals: Vec<ParticleVisual> = buffers.visuals().collect();
        assert_eq!(visuals.len(), 4);
        assert_eq!(visuals[2].position, [2.0, 0.0, 0.0]);
        assert_eq!(visuals[2].size, 0.5);
    }
}
