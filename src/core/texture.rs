// Copyright @yucwang 2026

use crate::math::constants::{Vector2f, Vector4f};

pub trait Texture: Send + Sync {
    fn eval(&self, uv: Vector2f) -> Vector4f;
    fn describe(&self) -> String {
        String::from("Texture")
    }
}
