// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};

/// A read-only scalar 3D resource addressed in UVW space `[0, 1]^3`.
pub trait Volume: Send + Sync {
    fn dimensions(&self) -> (usize, usize, usize);

    /// Raw voxel read, no filtering.
    fn fetch(&self, x: usize, y: usize, z: usize) -> Float;

    /// Filtered read at a UVW position.
    fn eval(&self, uvw: Vector3f) -> Float;
}
