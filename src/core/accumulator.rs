// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f, Vector4f};

/// Front-to-back compositing state for one pixel. `rgb` is premultiplied.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AccumulatedEnergy {
    pub rgb: Vector3f,
    pub a: Float,
}

impl Default for AccumulatedEnergy {
    fn default() -> Self {
        Self { rgb: Vector3f::zeros(), a: 0.0 }
    }
}

impl AccumulatedEnergy {
    /// Folds in the next sample along the ray. Samples must arrive in strictly
    /// increasing distance from the camera; the sample itself is not premultiplied.
    pub fn accumulate(&mut self, sample: Vector4f) {
        let remaining = 1.0 - self.a;
        let weight = sample.w * remaining;
        self.rgb += sample.xyz() * weight;
        self.a += weight;
    }

    pub fn is_saturated(&self, threshold: Float) -> bool {
        self.a >= threshold
    }

    pub fn to_rgba(&self) -> Vector4f {
        Vector4f::new(self.rgb.x, self.rgb.y, self.rgb.z, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_two_half_samples() {
        let mut energy = AccumulatedEnergy::default();
        energy.accumulate(Vector4f::new(1.0, 0.0, 0.0, 0.5));
        energy.accumulate(Vector4f::new(0.0, 1.0, 0.0, 0.5));
        assert!((energy.rgb - Vector3f::new(0.5, 0.25, 0.0)).norm() < 1e-6);
        assert!((energy.a - 0.75).abs() < 1e-6);
        assert_eq!(energy.to_rgba(), Vector4f::new(energy.rgb.x, energy.rgb.y, 0.0, energy.a));
    }

    #[test]
    fn accumulate_order_matters() {
        let mut front_red = AccumulatedEnergy::default();
        front_red.accumulate(Vector4f::new(1.0, 0.0, 0.0, 0.5));
        front_red.accumulate(Vector4f::new(0.0, 1.0, 0.0, 0.5));

        let mut front_green = AccumulatedEnergy::default();
        front_green.accumulate(Vector4f::new(0.0, 1.0, 0.0, 0.5));
        front_green.accumulate(Vector4f::new(1.0, 0.0, 0.0, 0.5));

        assert_eq!(front_red.a, front_green.a);
        assert!(front_red.rgb.x > front_green.rgb.x);
    }

    #[test]
    fn alpha_monotonic_and_bounded() {
        let alphas = [0.0, 0.3, 1.0, 0.7, 0.05, 0.99, 0.0, 0.5, 1.0, 0.25];
        let mut energy = AccumulatedEnergy::default();
        let mut previous = energy.a;
        for _ in 0..20 {
            for a in alphas.iter() {
                energy.accumulate(Vector4f::new(0.3, 0.6, 0.9, *a));
                assert!(energy.a >= previous);
                assert!(energy.a <= 1.0);
                previous = energy.a;
            }
        }
        assert!(energy.is_saturated(0.99));
    }

    #[test]
    fn opaque_sample_blocks_everything_behind() {
        let mut energy = AccumulatedEnergy::default();
        energy.accumulate(Vector4f::new(0.2, 0.4, 0.6, 1.0));
        energy.accumulate(Vector4f::new(1.0, 1.0, 1.0, 1.0));
        assert!((energy.rgb - Vector3f::new(0.2, 0.4, 0.6)).norm() < 1e-6);
        assert_eq!(energy.a, 1.0);
    }
}
