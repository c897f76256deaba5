/* Copyright 2020 @Yuchen Wong */

use nalgebra as na;

pub type Float = f32;
pub type UInt = u32;

pub type Vector2f = na::Vector2<Float>;
pub type Vector3f = na::Vector3<Float>;
pub type Vector4f = na::Vector4<Float>;
pub type Vector2u = na::Vector2<UInt>;
pub type Matrix4f = na::Matrix4<Float>;

// Local space spans [-0.5, 0.5]^3; adding this offset maps it onto UVW [0, 1]^3.
pub const UVW_OFFSET: Float = 0.5;

// Temporal jitter cycles through this many frame indices.
pub const JITTER_PERIOD: UInt = 8;
