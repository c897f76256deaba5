// Copyright @yucwang 2026

use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector4f};

// Piecewise-linear RGBA ramp along u; v is ignored.
pub struct GradientTexture {
    stops: Vec<(Float, Vector4f)>,
}

impl GradientTexture {
    pub fn new(mut stops: Vec<(Float, Vector4f)>) -> Result<Self, String> {
        if stops.is_empty() {
            return Err("gradient needs at least one stop".to_string());
        }
        if stops.iter().any(|(p, _)| !p.is_finite()) {
            return Err("gradient stop positions must be finite".to_string());
        }
        stops.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[(Float, Vector4f)] {
        &self.stops
    }
}

impl Texture for GradientTexture {
    fn eval(&self, uv: Vector2f) -> Vector4f {
        let u = uv.x;
        let (first_pos, first) = self.stops[0];
        if u <= first_pos {
            return first;
        }
        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if u <= p1 {
                let span = p1 - p0;
                if span <= 0.0 {
                    return c1;
                }
                let t = (u - p0) / span;
                return c0 * (1.0 - t) + c1 * t;
            }
        }
        self.stops[self.stops.len() - 1].1
    }

    fn describe(&self) -> String {
        format!("GradientTexture ({} stops)", self.stops.len())
    }
}
