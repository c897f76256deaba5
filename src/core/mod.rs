// Copyright @yucwang 2021

pub mod accumulator;
pub mod depth;
pub mod integrator;
pub mod intersector;
pub mod jitter;
pub mod labels;
pub mod scene;
pub mod scene_loader;
pub mod sensor;
pub mod texture;
pub mod transfer;
pub mod volume;
