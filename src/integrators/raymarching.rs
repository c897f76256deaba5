// Copyright @yucwang 2026

use crate::core::accumulator::AccumulatedEnergy;
use crate::core::integrator::{Integrator, PixelContext};
use crate::core::intersector::Intersection;
use crate::core::jitter::jitter_entry;
use crate::core::labels::LabelClassifier;
use crate::core::scene::{ClipPlane, Scene, VolumeContent, VolumeObject};
use crate::core::transfer::{StepSampler, TransferFunctionSampler};
use crate::math::constants::{Float, UInt, Vector2u, Vector4f};
use crate::math::ray::Ray3f;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RaymarchSettings {
    /// Marching increment in UVW units.
    pub step_size: Float,
    /// Step length whose opacity the transfer function and palettes are authored for.
    /// Defaults to one UVW unit, so a sample's exponent is its step length.
    pub reference_step: Option<Float>,
    pub max_steps: u32,
    /// Marching stops once accumulated alpha reaches this value.
    pub termination: Float,
    pub frames: u32,
    pub frame_index: UInt,
    pub jitter: bool,
}

impl Default for RaymarchSettings {
    fn default() -> Self {
        Self {
            step_size: 1.0 / 256.0,
            reference_step: None,
            max_steps: 1024,
            termination: 0.99,
            frames: 1,
            frame_index: 0,
            jitter: true,
        }
    }
}

impl RaymarchSettings {
    pub fn reference_step(&self) -> Float {
        self.reference_step.unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.step_size > 0.0) || !self.step_size.is_finite() {
            return Err(format!("step_size must be positive, got {}", self.step_size));
        }
        if !(self.reference_step() > 0.0) {
            return Err(format!("reference_step must be positive, got {}", self.reference_step()));
        }
        if self.frames == 0 || self.frames > 8 {
            return Err(format!("frames must be within 1..=8, got {}", self.frames));
        }
        Ok(())
    }
}

pub struct RaymarchingIntegrator {
    pub settings: RaymarchSettings,
}

impl RaymarchingIntegrator {
    pub fn new(settings: RaymarchSettings) -> Self {
        Self { settings }
    }

    /// Intersection of the pixel ray with the scene volume, in UVW space.
    pub fn intersect(&self, object: &VolumeObject, context: &PixelContext) -> (Ray3f, Intersection) {
        object.local_frame().intersect(context.camera.position,
                                       context.camera.view_dir,
                                       context.scene_depth,
                                       context.camera.forward)
    }
}

impl Integrator for RaymarchingIntegrator {
    fn shade_pixel(&self, scene: &Scene, context: &PixelContext) -> Vector4f {
        let object = match scene.volume() {
            Some(object) => object,
            None => return Vector4f::zeros(),
        };

        let (ray, hit) = self.intersect(object, context);
        if hit.is_empty() {
            return Vector4f::zeros();
        }

        let clip = object.clip.as_ref();
        let energy = match &object.content {
            VolumeContent::Intensity { data, transfer_function, illumination } => {
                let sampler = TransferFunctionSampler {
                    data: data.as_ref(),
                    transfer_function: transfer_function.as_ref(),
                    illumination: illumination.as_deref(),
                };
                march(&ray, &hit, &sampler, clip, &self.settings, context.pixel, context.frame_index)
            }
            VolumeContent::Labels { volume, palette } => {
                let sampler = LabelClassifier { volume: volume.as_ref(), palette: *palette };
                march(&ray, &hit, &sampler, clip, &self.settings, context.pixel, context.frame_index)
            }
        };
        energy.to_rgba()
    }

    fn frame_count(&self) -> u32 {
        self.settings.frames
    }

    fn first_frame_index(&self) -> UInt {
        self.settings.frame_index
    }
}

/// Front-to-back march through `hit`, starting at the jittered entry point.
/// `floor(thickness / step)` full steps are followed by one partial step over
/// the remainder; both count against `max_steps`.
pub fn march(ray: &Ray3f,
             hit: &Intersection,
             sampler: &dyn StepSampler,
             clip: Option<&ClipPlane>,
             settings: &RaymarchSettings,
             pixel: Vector2u,
             frame_index: UInt) -> AccumulatedEnergy {
    let mut energy = AccumulatedEnergy::default();
    let step = settings.step_size;
    if hit.is_empty() || !(step > 0.0) || settings.max_steps == 0 {
        return energy;
    }

    let step_vec = ray.dir() * step;
    let mut position = if settings.jitter {
        jitter_entry(hit.entry_position, step_vec, pixel, frame_index)
    } else {
        hit.entry_position
    };

    let reference = settings.reference_step();
    let full_relative = step / reference;
    let steps = hit.thickness / step;
    let full_steps = steps.floor();
    let remainder = (hit.thickness - full_steps * step).max(0.0);

    let mut taken: u32 = 0;
    let mut full_remaining = full_steps;
    while full_remaining >= 1.0 {
        if taken >= settings.max_steps {
            return energy;
        }
        if !clip.map_or(false, |c| c.clips(&position)) {
            energy.accumulate(sampler.sample(position, full_relative));
            if energy.is_saturated(settings.termination) {
                return energy;
            }
        }
        position += step_vec;
        full_remaining -= 1.0;
        taken += 1;
    }

    if remainder > 0.0 && taken < settings.max_steps
        && !clip.map_or(false, |c| c.clips(&position)) {
        energy.accumulate(sampler.sample(position, remainder / reference));
    }

    energy
}
