// Copyright @yucwang 2026

use crate::math::constants::{Float, UInt, Vector2u, Vector3f, JITTER_PERIOD};

// Interleaved gradient noise weights, with a per-frame shift of the pixel lattice.
const IGN_X: f64 = 0.06711056;
const IGN_Y: f64 = 0.00583715;
const IGN_SCALE: f64 = 52.9829189;
const FRAME_SHIFT: f64 = 5.588238;

/// Stateless per-pixel, per-frame offset in `[0, 1)`. Equal inputs always give equal
/// outputs, and frame indices are taken modulo the jitter period.
pub fn pixel_hash(pixel: Vector2u, frame_index: UInt) -> Float {
    let frame = (frame_index % JITTER_PERIOD) as f64;
    let x = pixel.x as f64 + FRAME_SHIFT * frame;
    let y = pixel.y as f64 + FRAME_SHIFT * frame;
    let inner = (IGN_X * x + IGN_Y * y).fract();
    let h = (IGN_SCALE * inner).fract();
    // Narrowing can round values just below 1 up to exactly 1.
    let h = h as Float;
    if h >= 1.0 {
        0.0
    } else {
        h
    }
}

/// Pulls the entry point back along the ray by a fraction of one step so the
/// sampling grid shifts from pixel to pixel and frame to frame.
pub fn jitter_entry(entry: Vector3f, step: Vector3f, pixel: Vector2u, frame_index: UInt) -> Vector3f {
    entry - step * pixel_hash(pixel, frame_index)
}
