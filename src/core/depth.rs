// Copyright @yucwang 2026

use crate::io::exr_utils;
use crate::math::constants::{Float, Vector3f};
use crate::math::transform::Transform;

/// Converts an opaque-scene depth, measured along the camera's forward axis in
/// world units, into a distance along the pixel's own ray in local units.
///
/// The forward-aligned depth vector is mapped into local space and measured
/// there, then divided by the cosine between the forward axis and the pixel
/// direction to account for the oblique ray.
pub fn local_depth_bound(world_to_local: &Transform,
                         scene_depth: Float,
                         camera_forward: Vector3f,
                         view_dir: Vector3f) -> Float {
    if scene_depth.is_nan() || scene_depth == std::f32::INFINITY {
        return std::f32::INFINITY;
    }
    if scene_depth <= 0.0 {
        return 0.0;
    }

    let forward = camera_forward.normalize();
    let cos = forward.dot(&view_dir.normalize());
    if cos <= 0.0 {
        return std::f32::INFINITY;
    }

    let local_depth = world_to_local.apply_vector(forward * scene_depth).norm();
    local_depth / cos
}

/// Per-pixel opaque depth, row-major from the top-left pixel. Infinite
/// entries mean nothing opaque was rendered there.
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    data: Vec<Float>,
}

impl DepthBuffer {
    pub fn constant(width: usize, height: usize, depth: Float) -> Self {
        Self { width, height, data: vec![depth; width * height] }
    }

    pub fn infinite(width: usize, height: usize) -> Self {
        Self::constant(width, height, std::f32::INFINITY)
    }

    pub fn from_data(width: usize, height: usize, data: Vec<Float>) -> Result<Self, String> {
        if data.len() != width * height {
            return Err(format!("depth buffer expects {} values, got {}", width * height, data.len()));
        }
        Ok(Self { width, height, data })
    }

    /// Reads depth from the red channel of an EXR image.
    pub fn from_exr(path: &str) -> Result<Self, String> {
        let (width, height, data) = exr_utils::read_exr_red_channel(path)?;
        Self::from_data(width, height, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Out-of-range pixels read as unoccluded.
    pub fn depth_at(&self, x: usize, y: usize) -> Float {
        if x >= self.width || y >= self.height {
            return std::f32::INFINITY;
        }
        self.data[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Matrix4f;

    #[test]
    fn depth_bound_along_forward_axis() {
        let identity = Transform::default();
        let forward = Vector3f::new(0.0, 0.0, -1.0);
        let bound = local_depth_bound(&identity, 3.0, forward, forward);
        assert!((bound - 3.0).abs() < 1e-6);
    }

    #[test]
    fn depth_bound_oblique_ray_is_longer() {
        let identity = Transform::default();
        let forward = Vector3f::new(0.0, 0.0, 1.0);
        let view = Vector3f::new(1.0, 0.0, 1.0);
        let bound = local_depth_bound(&identity, 2.0, forward, view);
        assert!((bound - 2.0 * std::f32::consts::SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn depth_bound_in_scaled_local_space() {
        // A volume four world units wide: local lengths are a quarter of world lengths.
        let world_to_local = Transform::new(Matrix4f::new_scaling(4.0)).inverse();
        let forward = Vector3f::new(0.0, 0.0, 1.0);
        let bound = local_depth_bound(&world_to_local, 2.0, forward, forward);
        assert!((bound - 0.5).abs() < 1e-6);
    }

    #[test]
    fn depth_bound_special_values() {
        let identity = Transform::default();
        let forward = Vector3f::new(0.0, 0.0, 1.0);
        assert!(local_depth_bound(&identity, std::f32::INFINITY, forward, forward).is_infinite());
        assert!(local_depth_bound(&identity, std::f32::NAN, forward, forward).is_infinite());
        assert_eq!(local_depth_bound(&identity, 0.0, forward, forward), 0.0);
        assert!(local_depth_bound(&identity, 1.0, forward, -forward).is_infinite());
    }

    #[test]
    fn depth_buffer_lookup() {
        let buffer = DepthBuffer::from_data(2, 1, vec![1.0, 2.0]).expect("depth");
        assert_eq!(buffer.depth_at(1, 0), 2.0);
        assert!(buffer.depth_at(5, 5).is_infinite());
        assert!(DepthBuffer::from_data(2, 2, vec![1.0]).is_err());
        assert!(DepthBuffer::infinite(3, 3).depth_at(1, 1).is_infinite());
        assert_eq!(DepthBuffer::constant(3, 3, 4.0).depth_at(2, 2), 4.0);
    }
}
