// Copyright @yucwang 2026

pub mod gradient;
pub mod image;
