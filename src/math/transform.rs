// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f, Matrix4f };
use super::ray::Ray3f;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix: matrix,
               inv_matrix: matrix.try_inverse().unwrap_or(Matrix4f::identity())}
    }

    /// Swaps the forward and inverse matrices, e.g. turning a to-world into a world-to-local.
    pub fn inverse(&self) -> Self {
        Self { matrix: self.inv_matrix,
               inv_matrix: self.matrix }
    }

    /// Follows this transform with a uniform scale of its output space.
    pub fn then_scale(&self, factor: Float) -> Self {
        Self::new(Matrix4f::new_scaling(factor) * self.matrix)
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        let x = p[0] * self.matrix[(0, 0)] + p[1] * self.matrix[(0, 1)] +
            p[2] * self.matrix[(0, 2)] + self.matrix[(0, 3)];
        let y = p[0] * self.matrix[(1, 0)] + p[1] * self.matrix[(1, 1)] +
            p[2] * self.matrix[(1, 2)] + self.matrix[(1, 3)];
        let z = p[0] * self.matrix[(2, 0)] + p[1] * self.matrix[(2, 1)] +
            p[2] * self.matrix[(2, 2)] + self.matrix[(2, 3)];
        let w = p[0] * self.matrix[(3, 0)] + p[1] * self.matrix[(3, 1)] +
            p[2] * self.matrix[(3, 2)] + self.matrix[(3, 3)];

        Vector3f::new(x / w, y / w, z / w)
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        let x = v[0] * self.matrix[(0, 0)] + v[1] * self.matrix[(0, 1)] + v[2] * self.matrix[(0, 2)];
        let y = v[0] * self.matrix[(1, 0)] + v[1] * self.matrix[(1, 1)] + v[2] * self.matrix[(1, 2)];
        let z = v[0] * self.matrix[(2, 0)] + v[1] * self.matrix[(2, 1)] + v[2] * self.matrix[(2, 2)];

        Vector3f::new(x, y, z)
    }

    /// Maps the ray's origin as a point and its direction as a vector. The
    /// direction is renormalised, so `t` is measured in the output space.
    pub fn apply_ray(&self, ray: &Ray3f) -> Ray3f {
        let new_p = self.apply_point(ray.origin());
        let new_d = self.apply_vector(ray.dir());

        Ray3f::new(new_p, new_d, Some(ray.min_t), Some(ray.max_t))
    }
}
