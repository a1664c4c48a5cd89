use glam::Vec3;
use nbody_core::{CentralMassConfig, MIN_DISTANCE_SQ};

use crate::forces::softened_acceleration;

/// A massive point attractor (black hole).
///
/// Central masses ignore particle gravity. They only move under their initial
/// velocity and, when two are active, their mutual attraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralMass {
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f32,
    /// Signed spin rate; positive turns particles counter-clockwise about `axis`
    pub spin: f32,
    pub softening: f32,
    /// Unit spin axis, normally the normal of the host disk
    pub axis: Vec3,
}

impl CentralMass {
    pub fn from_config(config: &CentralMassConfig, position: Vec3, velocity: Vec3, axis: Vec3) -> Self {
        Self {
            position,
            velocity,
            mass: config.mass,
            spin: config.spin,
            softening: config.softening,
            axis: axis.try_normalize().unwrap_or(Vec3::Z),
        }
    }

    /// Total acceleration this mass imposes on a particle at `pos`
    pub fn acceleration_on(&self, pos: Vec3, g: f32) -> Vec3 {
        self.pull(pos, g) + self.spin_acceleration(pos, g)
    }

    /// Softened point-mass attraction toward this mass
    pub fn pull(&self, pos: Vec3, g: f32) -> Vec3 {
        softened_acceleration(pos, self.position, self.mass, g, self.softening).unwrap_or(Vec3::ZERO)
    }

    /// Tangential drag around the spin axis, scaled by `spin` and falling off
    /// with the same softened inverse square as the pull
    pub fn spin_acceleration(&self, pos: Vec3, g: f32) -> Vec3 {
        if self.spin == 0.0 {
            return Vec3::ZERO;
        }
        let offset = pos - self.position;
        let denom = offset.length_squared() + self.softening * self.softening;
        if denom < MIN_DISTANCE_SQ {
            return Vec3::ZERO;
        }
        let tangent = self.axis.cross(offset).normalize_or_zero();
        let acc = tangent * (self.spin * g * self.mass / denom);
        if acc.is_finite() { acc } else { Vec3::ZERO }
    }
}

/// Acceleration of `a` due to `b`, scaled by the interaction multiplier.
/// The pair uses the larger of the two softening radii.
pub fn mutual_acceleration(a: &CentralMass, b: &CentralMass, g: f32, multiplier: f32) -> Vec3 {
    let softening = a.softening.max(b.softening);
    softened_acceleration(a.position, b.position, b.mass, g, softening).unwrap_or(Vec3::ZERO)
        * multiplier
}

/// Force on `a` due to `b`
pub fn mutual_force(a: &CentralMass, b: &CentralMass, g: f32, multiplier: f32) -> Vec3 {
    mutual_acceleration(a, b, g, multiplier) * a.mass
}

/// Advance the central masses by one step. With two masses their mutual pull
/// is applied first; every mass then drifts with its velocity.
pub fn advance_central_masses(masses: &mut [CentralMass], g: f32, multiplier: f32, dt: f32) {
    if let [a, b] = &mut *masses {
        let acc_a = mutual_acceleration(a, b, g, multiplier);
        let acc_b = mutual_acceleration(b, a, g, multiplier);
        a.velocity += acc_a * dt;
        b.velocity += acc_b * dt;
    }
    for mass in masses.iter_mut() {
        mass.position += mass.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_hole(position: Vec3, mass: f32, spin: f32) -> CentralMass {
        let config = CentralMassConfig { enabled: true, mass, spin, softening: 2.0 };
        CentralMass::from_config(&config, position, Vec3::ZERO, Vec3::Z)
    }

    #[test]
    fn test_pull_points_inward() {
        let bh = black_hole(Vec3::ZERO, 1000.0, 0.0);
        let acc = bh.acceleration_on(Vec3::new(10.0, 0.0, 0.0), 1.0);
        assert!(acc.x < 0.0);
        assert!(acc.y.abs() < 1e-6);
        let expected = 1000.0 / (100.0 + 4.0);
        assert!((acc.length() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_spin_sign_sets_direction() {
        let ccw = black_hole(Vec3::ZERO, 1000.0, 0.02);
        let cw = black_hole(Vec3::ZERO, 1000.0, -0.02);
        let pos = Vec3::new(10.0, 0.0, 0.0);
        assert!(ccw.spin_acceleration(pos, 1.0).y > 0.0);
        assert!(cw.spin_acceleration(pos, 1.0).y < 0.0);
        assert!(ccw.spin_acceleration(pos, 1.0).dot(pos).abs() < 1e-6, "spin must be tangential");
    }

    #[test]
    fn test_spin_decays_with_distance() {
        let bh = black_hole(Vec3::ZERO, 1000.0, 0.05);
        let near = bh.spin_acceleration(Vec3::new(5.0, 0.0, 0.0), 1.0).length();
        let far = bh.spin_acceleration(Vec3::new(50.0, 0.0, 0.0), 1.0).length();
        assert!(near > far * 10.0);
    }

    #[test]
    fn test_spin_on_axis_is_zero() {
        let bh = black_hole(Vec3::ZERO, 1000.0, 0.05);
        assert_eq!(bh.spin_acceleration(Vec3::new(0.0, 0.0, 5.0), 1.0), Vec3::ZERO);
    }

    #[test]
    fn test_multiplier_scales_mutual_force_exactly() {
        let a = black_hole(Vec3::new(-50.0, 0.0, 0.0), 5000.0, 0.0);
        let b = black_hole(Vec3::new(50.0, 0.0, 0.0), 5000.0, 0.0);
        let unit = mutual_force(&a, &b, 1.0, 1.0);
        let five = mutual_force(&a, &b, 1.0, 5.0);
        let zero = mutual_force(&a, &b, 1.0, 0.0);

        assert!(unit.x > 0.0);
        assert!((five - unit * 5.0).length() <= 1e-6 * five.length());
        assert_eq!(
            mutual_acceleration(&a, &b, 1.0, 5.0),
            mutual_acceleration(&a, &b, 1.0, 1.0) * 5.0
        );
        assert_eq!(zero, Vec3::ZERO);
        // Equal masses: equal and opposite
        assert!((mutual_force(&b, &a, 1.0, 5.0) + five).length() < 1e-3);
    }

    #[test]
    fn test_pair_approaches_lone_mass_stays() {
        let mut pair = [
            black_hole(Vec3::new(-50.0, 0.0, 0.0), 5000.0, 0.0),
            black_hole(Vec3::new(50.0, 0.0, 0.0), 5000.0, 0.0),
        ];
        advance_central_masses(&mut pair, 1.0, 2.0, 0.1);
        assert!(pair[0].position.x > -50.0);
        assert!(pair[1].position.x < 50.0);

        let mut lone = [black_hole(Vec3::new(3.0, 4.0, 0.0), 5000.0, 0.0)];
        advance_central_masses(&mut lone, 1.0, 2.0, 0.1);
        assert_eq!(lone[0].position, Vec3::new(3.0, 4.0, 0.0));
    }
}
