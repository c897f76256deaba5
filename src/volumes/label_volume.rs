// Copyright @yucwang 2026

use crate::core::volume::Volume;
use crate::math::constants::Vector3f;
use crate::volumes::{clamp_coord3, nearest_index};
use std::fs;

/// Categorical 8-bit volume. Voxels hold class IDs, so there is deliberately no
/// filtered read: every lookup resolves to exactly one stored voxel.
pub struct LabelVolume {
    data: Vec<u8>,
    xres: usize,
    yres: usize,
    zres: usize,
}

impl LabelVolume {
    pub fn from_data(xres: usize, yres: usize, zres: usize, data: Vec<u8>) -> Result<Self, String> {
        if xres == 0 || yres == 0 || zres == 0 {
            return Err("label dimensions must be positive".to_string());
        }
        let expected = xres
            .checked_mul(yres)
            .and_then(|v| v.checked_mul(zres))
            .ok_or_else(|| "label dimensions overflow".to_string())?;
        if data.len() != expected {
            return Err(format!("label volume expects {} voxels, got {}", expected, data.len()));
        }

        Ok(Self { data, xres, yres, zres })
    }

    /// Headerless dump of one byte per voxel, x fastest.
    pub fn from_raw_file(path: &str, xres: usize, yres: usize, zres: usize) -> Result<Self, String> {
        let bytes = fs::read(path).map_err(|e| format!("failed to read {}: {}", path, e))?;
        log::info!("Loaded label volume {} ({}x{}x{}).", path, xres, yres, zres);
        Self::from_data(xres, yres, zres, bytes)
    }

    /// Converts a float grid by rounding each voxel to the nearest ID in `0..=255`.
    pub fn from_volume(volume: &dyn Volume) -> Result<Self, String> {
        let (xres, yres, zres) = volume.dimensions();
        let mut data = Vec::with_capacity(xres * yres * zres);
        for z in 0..zres {
            for y in 0..yres {
                for x in 0..xres {
                    let v = volume.fetch(x, y, z).round().clamp(0.0, 255.0);
                    data.push(v as u8);
                }
            }
        }
        Self::from_data(xres, yres, zres, data)
    }

    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.xres, self.yres, self.zres)
    }

    pub fn fetch(&self, x: usize, y: usize, z: usize) -> u8 {
        self.data[(z * self.yres + y) * self.xres + x]
    }

    /// Nearest voxel at `round((dim - 1) * clamp(uvw, 0, 1))`.
    pub fn label_at(&self, uvw: Vector3f) -> u8 {
        let p = clamp_coord3(uvw);
        let x = nearest_index(p.x, self.xres);
        let y = nearest_index(p.y, self.yres);
        let z = nearest_index(p.z, self.zres);
        self.fetch(x, y, z)
    }
}
