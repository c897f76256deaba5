// Copyright @yucwang 2026

use crate::core::depth::local_depth_bound;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, UVW_OFFSET};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

/// Where a ray crosses the UVW cube. `entry_position` lies in `[0, 1]^3` whenever
/// `thickness > 0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Intersection {
    pub entry_position: Vector3f,
    pub thickness: Float,
    pub t0: Float,
    pub t1: Float,
}

impl Intersection {
    /// Nothing to march: the ray missed, or opaque geometry sits in front of the volume.
    pub fn is_empty(&self) -> bool {
        !(self.thickness > 0.0)
    }
}

/// How the marched cube is placed relative to its own world-to-local transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VolumePlacement {
    Own,
    /// The cube behaves as if uniformly scaled by this factor.
    Scaled(Float),
    /// An arbitrary world-to-local transform replaces the object's own.
    External(Transform),
}

impl Default for VolumePlacement {
    fn default() -> Self {
        VolumePlacement::Own
    }
}

/// World-to-local transform used for the slab test together with the factor that
/// maps a depth bound measured in the unscaled frame into it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalFrame {
    base: Transform,
    pub world_to_local: Transform,
    pub depth_scale: Float,
}

impl LocalFrame {
    pub fn new(own_world_to_local: &Transform, placement: &VolumePlacement) -> Self {
        match placement {
            VolumePlacement::Own => Self {
                base: *own_world_to_local,
                world_to_local: *own_world_to_local,
                depth_scale: 1.0,
            },
            VolumePlacement::Scaled(factor) => {
                let inv = 1.0 / factor;
                Self {
                    base: *own_world_to_local,
                    world_to_local: own_world_to_local.then_scale(inv),
                    depth_scale: inv,
                }
            }
            VolumePlacement::External(external) => Self {
                base: *external,
                world_to_local: *external,
                depth_scale: 1.0,
            },
        }
    }

    /// Local-space distance along the pixel ray to the nearest opaque surface.
    pub fn depth_bound(&self, scene_depth: Float, camera_forward: Vector3f, view_dir: Vector3f) -> Float {
        local_depth_bound(&self.base, scene_depth, camera_forward, view_dir) * self.depth_scale
    }

    /// Builds the UVW-space ray for a world-space camera position and view direction.
    pub fn uvw_ray(&self, camera_position: Vector3f, view_dir: Vector3f) -> Ray3f {
        let world_ray = Ray3f::new(camera_position, view_dir, None, None);
        self.world_to_local.apply_ray(&world_ray)
            .offset_origin(Vector3f::new(UVW_OFFSET, UVW_OFFSET, UVW_OFFSET))
    }

    pub fn intersect(&self,
                     camera_position: Vector3f,
                     view_dir: Vector3f,
                     scene_depth: Float,
                     camera_forward: Vector3f) -> (Ray3f, Intersection) {
        let ray = self.uvw_ray(camera_position, view_dir);
        let bound = self.depth_bound(scene_depth, camera_forward, view_dir);
        let hit = intersect_uvw(&ray, bound);
        (ray, hit)
    }
}

/// Slab test of a UVW-space ray against `[0, 1]^3`, clipped to start no earlier
/// than the origin and to end no later than `depth_bound`.
pub fn intersect_uvw(ray: &Ray3f, depth_bound: Float) -> Intersection {
    let (t_near, t_far) = AABB::unit().slab_interval(ray);
    let t0 = t_near.max(0.0);
    let t1 = t_far.min(depth_bound);
    let thickness = (t1 - t0).max(0.0);

    Intersection {
        entry_position: ray.at(t0),
        thickness,
        t0,
        t1,
    }
}
