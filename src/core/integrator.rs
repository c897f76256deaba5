// Copyright @yucwang 2026

use crate::core::scene::Scene;
use crate::core::sensor::CameraSample;
use crate::math::constants::{Float, UInt, Vector2u, Vector4f};

/// Everything the host supplies for one pixel of one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PixelContext {
    pub camera: CameraSample,
    /// Distance to the nearest opaque surface along the camera's forward axis.
    pub scene_depth: Float,
    pub pixel: Vector2u,
    pub frame_index: UInt,
}

pub trait Integrator: Sync {
    /// Premultiplied RGBA for one pixel. Pure in its inputs.
    fn shade_pixel(&self, scene: &Scene, context: &PixelContext) -> Vector4f;
    /// Number of temporal frames a renderer averages.
    fn frame_count(&self) -> u32;
    /// Frame index of the first averaged frame.
    fn first_frame_index(&self) -> UInt;
}
