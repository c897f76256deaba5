// Copyright 2020 @TwoCookingMice

use super::constants::{ Float, Vector3f };
use super::ray::{ Ray3f };

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f
}

impl AABB {
    /// The UVW cube `[0, 1]^3` every volume is marched in.
    pub fn unit() -> Self {
        Self { p_min: Vector3f::new(0.0, 0.0, 0.0),
               p_max: Vector3f::new(1.0, 1.0, 1.0) }
    }

    /// Slab test returning the raw `(t_near, t_far)` interval, without the ray's
    /// `min_t`/`max_t` applied. A miss shows up as `t_near > t_far`.
    ///
    /// Axis-parallel rays are not special-cased: the reciprocal direction holds a
    /// signed infinity on that axis, and `min`/`max` resolve the resulting
    /// `±inf` slab bounds on their own.
    pub fn slab_interval(&self, ray: &Ray3f) -> (Float, Float) {
        let o = ray.origin();
        let inv = ray.inv_dir();

        let mut t_near = std::f32::NEG_INFINITY;
        let mut t_far = std::f32::INFINITY;
        for idx in 0..3 {
            let low = (self.p_min[idx] - o[idx]) * inv[idx];
            let high = (self.p_max[idx] - o[idx]) * inv[idx];
            let closest = low.min(high);
            let furthest = low.max(high);
            t_near = t_near.max(closest);
            t_far = t_far.min(furthest);
        }

        (t_near, t_far)
    }
}

/* Test for AABB */
