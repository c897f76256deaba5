// Copyright @yucwang 2026

pub mod const_volume;
pub mod grid_volume;
pub mod label_volume;

use crate::math::constants::{Float, Vector3f};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeFilterMode {
    Nearest,
    Trilinear,
}

// Lookups outside the unit cube read the boundary voxels.
pub(crate) fn clamp_coord3(value: Vector3f) -> Vector3f {
    value.map(|v| v.clamp(0.0, 1.0))
}

// Nearest voxel index along one axis: rounds `(size - 1) * p` and clamps into range.
pub(crate) fn nearest_index(p: Float, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    let x = p * (size as Float - 1.0);
    let xi = (x + 0.5).floor() as isize;
    xi.clamp(0, size as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_coord3_pins_to_unit_cube() {
        let p = clamp_coord3(Vector3f::new(1.25, -0.5, 0.25));
        assert_eq!(p, Vector3f::new(1.0, 0.0, 0.25));
    }

    #[test]
    fn nearest_index_rounds_and_clamps() {
        assert_eq!(nearest_index(0.0, 4), 0);
        assert_eq!(nearest_index(1.0, 4), 3);
        assert_eq!(nearest_index(0.4, 4), 1);
        assert_eq!(nearest_index(0.5, 4), 2);
        assert_eq!(nearest_index(2.0, 4), 3);
        assert_eq!(nearest_index(-1.0, 4), 0);
        assert_eq!(nearest_index(0.7, 1), 0);
    }
}
