// Copyright @yucwang 2026

use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector3f};

// Uniform value everywhere; stands in for a precomputed illumination volume
// when a scene asks for flat lighting.
pub struct ConstantVolume {
    value: Float,
}

impl ConstantVolume {
    pub fn new(value: Float) -> Self {
        Self { value }
    }
}

impl Volume for ConstantVolume {
    fn dimensions(&self) -> (usize, usize, usize) {
        (1, 1, 1)
    }

    fn fetch(&self, _x: usize, _y: usize, _z: usize) -> Float {
        self.value
    }

    fn eval(&self, _uvw: Vector3f) -> Float {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_volume_scalar() {
        let vol = ConstantVolume::new(0.75);
        assert_eq!(vol.dimensions(), (1, 1, 1));
        assert_eq!(vol.eval(Vector3f::new(0.1, 0.2, 0.3)), 0.75);
        assert_eq!(vol.eval(Vector3f::new(-4.0, 9.0, 0.3)), 0.75);
        assert_eq!(vol.fetch(0, 0, 0), 0.75);
    }
}
