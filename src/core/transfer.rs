// Copyright @yucwang 2026

use crate::core::texture::Texture;
use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector2f, Vector3f, Vector4f};
use std::sync::Arc;

/// Maps one ray-march position to the RGBA contributed by a step of the given
/// relative length. Alpha is already opacity-corrected for that length.
pub trait StepSampler {
    fn sample(&self, uvw: Vector3f, step: Float) -> Vector4f;
}

/// Rescales an opacity measured over a unit step to one measured over `step`
/// units, `1 - (1 - alpha)^step` (Beer-Lambert).
pub fn correct_opacity(alpha: Float, step: Float) -> Float {
    1.0 - (1.0 - alpha.clamp(0.0, 1.0)).powf(step)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntensityDomain {
    pub min: Float,
    pub max: Float,
}

impl Default for IntensityDomain {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl IntensityDomain {
    pub fn new(min: Float, max: Float) -> Self {
        Self { min, max }
    }

    pub fn normalize(&self, intensity: Float) -> Float {
        let span = self.max - self.min;
        if span <= 0.0 {
            // Degenerate window acts as a hard threshold.
            return if intensity >= self.max { 1.0 } else { 0.0 };
        }
        ((intensity - self.min) / span).clamp(0.0, 1.0)
    }
}

// Lookup row used for 1D-style transfer functions stored in a 2D texture.
const TRANSFER_ROW: Float = 0.5;

pub struct TransferFunction {
    texture: Arc<dyn Texture>,
    domain: IntensityDomain,
}

impl TransferFunction {
    pub fn new(texture: Arc<dyn Texture>, domain: IntensityDomain) -> Self {
        Self { texture, domain }
    }

    pub fn domain(&self) -> IntensityDomain {
        self.domain
    }

    pub fn lookup(&self, intensity: Float) -> Vector4f {
        let u = self.domain.normalize(intensity);
        self.texture.eval(Vector2f::new(u, TRANSFER_ROW))
    }

    pub fn describe(&self) -> String {
        format!("{} over [{}, {}]", self.texture.describe(), self.domain.min, self.domain.max)
    }
}

/// Continuous intensity discipline: trilinear data read, transfer function,
/// optional illumination multiply, opacity correction.
pub struct TransferFunctionSampler<'a> {
    pub data: &'a dyn Volume,
    pub transfer_function: &'a TransferFunction,
    /// `None` renders unlit.
    pub illumination: Option<&'a dyn Volume>,
}

impl<'a> StepSampler for TransferFunctionSampler<'a> {
    fn sample(&self, uvw: Vector3f, step: Float) -> Vector4f {
        let intensity = self.data.eval(uvw);
        let base = self.transfer_function.lookup(intensity);
        let light = match self.illumination {
            Some(volume) => volume.eval(uvw),
            None => 1.0,
        };
        let rgb = base.xyz() * light;
        Vector4f::new(rgb.x, rgb.y, rgb.z, correct_opacity(base.w, step))
    }
}
