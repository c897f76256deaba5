// Copyright @yucwang 2026

use crate::core::depth::DepthBuffer;
use crate::core::intersector::{LocalFrame, VolumePlacement};
use crate::core::labels::LabelPalette;
use crate::core::sensor::Sensor;
use crate::core::transfer::TransferFunction;
use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector3f};
use crate::math::transform::Transform;
use crate::volumes::label_volume::LabelVolume;
use std::sync::Arc;

/// The read-only resources a volume is sampled from.
pub enum VolumeContent {
    Intensity {
        data: Arc<dyn Volume>,
        transfer_function: Arc<TransferFunction>,
        illumination: Option<Arc<dyn Volume>>,
    },
    Labels {
        volume: Arc<LabelVolume>,
        palette: LabelPalette,
    },
}

impl VolumeContent {
    pub fn describe(&self) -> String {
        match self {
            VolumeContent::Intensity { transfer_function, illumination, .. } => {
                let lighting = if illumination.is_some() { "lit" } else { "unlit" };
                format!("intensity ({}), transfer function {}", lighting, transfer_function.describe())
            }
            VolumeContent::Labels { volume, palette } => {
                let (x, y, z) = volume.dimensions();
                format!("labels {}x{}x{}, {:?} palette", x, y, z, palette)
            }
        }
    }
}

/// UVW-space half-space cut. Samples on the side the normal points to are dropped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipPlane {
    pub center: Vector3f,
    pub normal: Vector3f,
}

impl ClipPlane {
    pub fn new(center: Vector3f, normal: Vector3f) -> Self {
        Self { center, normal }
    }

    pub fn clips(&self, uvw: &Vector3f) -> bool {
        (uvw - self.center).dot(&self.normal) > 0.0
    }
}

pub struct VolumeObject {
    pub name: Option<String>,
    world_to_local: Transform,
    pub placement: VolumePlacement,
    pub content: VolumeContent,
    pub clip: Option<ClipPlane>,
}

impl VolumeObject {
    /// `to_world` maps the unit cube `[-0.5, 0.5]^3` onto the volume's world-space box.
    pub fn new(to_world: Transform, content: VolumeContent) -> Self {
        Self {
            name: None,
            world_to_local: to_world.inverse(),
            placement: VolumePlacement::Own,
            content,
            clip: None,
        }
    }

    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    pub fn with_placement(mut self, placement: VolumePlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_clip(mut self, clip: Option<ClipPlane>) -> Self {
        self.clip = clip;
        self
    }

    pub fn world_to_local(&self) -> &Transform {
        &self.world_to_local
    }

    pub fn local_frame(&self) -> LocalFrame {
        LocalFrame::new(&self.world_to_local, &self.placement)
    }
}

pub struct Scene {
    volume: Option<VolumeObject>,
    sensors: Vec<Box<dyn Sensor>>,
    depth: Option<DepthBuffer>,
    base_dir: std::path::PathBuf,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            volume: None,
            sensors: Vec::new(),
            depth: None,
            base_dir: std::path::PathBuf::new(),
        }
    }

    pub fn with_volume(volume: VolumeObject) -> Self {
        let mut scene = Self::new();
        scene.volume = Some(volume);
        scene
    }

    /// Replaces the marched volume; only one is rendered at a time.
    pub fn set_volume(&mut self, volume: VolumeObject) {
        if self.volume.is_some() {
            log::warn!("Scene already holds a volume, replacing it.");
        }
        self.volume = Some(volume);
    }

    pub fn volume(&self) -> Option<&VolumeObject> {
        self.volume.as_ref()
    }

    pub fn volume_mut(&mut self) -> Option<&mut VolumeObject> {
        self.volume.as_mut()
    }

    pub fn set_depth(&mut self, depth: Option<DepthBuffer>) {
        self.depth = depth;
    }

    pub fn depth(&self) -> Option<&DepthBuffer> {
        self.depth.as_ref()
    }

    /// Opaque-scene depth for a pixel; infinite when there is no depth buffer.
    pub fn depth_at(&self, x: usize, y: usize) -> Float {
        match &self.depth {
            Some(depth) => depth.depth_at(x, y),
            None => std::f32::INFINITY,
        }
    }

    pub fn sensors(&self) -> &Vec<Box<dyn Sensor>> {
        &self.sensors
    }

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn take_sensor(&mut self, camera_id: usize) -> Option<Box<dyn Sensor>> {
        if camera_id < self.sensors.len() {
            Some(self.sensors.remove(camera_id))
        } else {
            None
        }
    }

    pub fn insert_sensor(&mut self, camera_id: usize, sensor: Box<dyn Sensor>) {
        if camera_id <= self.sensors.len() {
            self.sensors.insert(camera_id, sensor);
        } else {
            self.sensors.push(sensor);
        }
    }

    pub fn camera(&self, camera_id: usize) -> Option<&dyn Sensor> {
        self.sensors.get(camera_id).map(|s| s.as_ref())
    }

    pub fn set_base_dir(&mut self, base_dir: std::path::PathBuf) {
        self.base_dir = base_dir;
    }

    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }
}
