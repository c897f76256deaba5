// Copyright @yucwang 2026

use crate::core::sensor::{CameraSample, Sensor};
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector2f, Vector3f};

pub struct PerspectiveCamera {
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_y: Float,
    aspect: Float,
    bitmap: Bitmap,
}

impl PerspectiveCamera {
    pub fn new(origin: Vector3f,
               target: Vector3f,
               up: Vector3f,
               fov_y_radians: Float,
               width: usize,
               height: usize) -> Self {
        let forward = (target - origin).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward).normalize();

        Self {
            origin,
            forward,
            right,
            up,
            tan_half_fov_y: (0.5 * fov_y_radians).tan(),
            aspect: width as Float / height.max(1) as Float,
            bitmap: Bitmap::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.bitmap.width()
    }

    pub fn height(&self) -> usize {
        self.bitmap.height()
    }

    pub fn origin(&self) -> Vector3f {
        self.origin
    }

    pub fn forward(&self) -> Vector3f {
        self.forward
    }
}

impl Sensor for PerspectiveCamera {
    fn sample(&self, u: &Vector2f) -> CameraSample {
        let px = (2.0 * u.x - 1.0) * self.aspect * self.tan_half_fov_y;
        let py = (1.0 - 2.0 * u.y) * self.tan_half_fov_y;

        let view_dir = (self.right * px + self.up * py + self.forward).normalize();
        CameraSample {
            position: self.origin,
            view_dir,
            forward: self.forward,
        }
    }

    fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    fn bitmap_mut(&mut self) -> &mut Bitmap {
        &mut self.bitmap
    }

    fn describe(&self) -> String {
        format!("PerspectiveCamera\n  origin: {:?}\n  forward: {:?}\n  film: {}x{}",
                self.origin, self.forward, self.width(), self.height())
    }
}
