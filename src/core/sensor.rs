// Copyright @yucwang 2026

use crate::math::bitmap::Bitmap;
use crate::math::constants::{Vector2f, Vector3f};

/// What the host hands the per-pixel program about its camera, all in world space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraSample {
    pub position: Vector3f,
    /// Unit direction from the camera through the pixel.
    pub view_dir: Vector3f,
    /// Unit principal axis; scene depth is measured along it.
    pub forward: Vector3f,
}

pub trait Sensor: Sync {
    /// `u` is the film position in `[0, 1]^2`, origin at the top-left.
    fn sample(&self, u: &Vector2f) -> CameraSample;
    fn bitmap(&self) -> &Bitmap;
    fn bitmap_mut(&mut self) -> &mut Bitmap;
    fn describe(&self) -> String {
        String::from("Sensor")
    }
}
