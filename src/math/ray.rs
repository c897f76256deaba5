// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

#[derive(Debug, Copy, Clone)]
pub struct Ray3f {
    origin: Vector3f,
    dir: Vector3f,
    inv_dir: Vector3f,
    pub min_t: Float,
    pub max_t: Float
}

impl Ray3f {
    pub fn new(o: Vector3f, d: Vector3f,
               min_t: Option<Float>, max_t: Option<Float>) -> Self {
        let dir = d.normalize();
        // Zero components must turn into signed infinities here, the slab test relies on it.
        let inv_dir = Vector3f::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        Self { origin: o, dir, inv_dir,
               min_t: min_t.unwrap_or(0.0),
               max_t: max_t.unwrap_or(std::f32::INFINITY) }
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn dir(&self) -> Vector3f {
        self.dir
    }

    pub fn inv_dir(&self) -> Vector3f {
        self.inv_dir
    }

    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.dir * t
    }

    pub fn offset_origin(&self, offset: Vector3f) -> Self {
        Self { origin: self.origin + offset, ..*self }
    }
}

/* Tests for Ray */
