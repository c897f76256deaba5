// Copyright @yucwang 2026

use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector3f};
use crate::volumes::{clamp_coord3, nearest_index, VolumeFilterMode};
use std::fs;

// Dense single-channel grid, x fastest, then y, then z.
pub struct GridVolume {
    data: Vec<Float>,
    xres: usize,
    yres: usize,
    zres: usize,
    filter_mode: VolumeFilterMode,
}

impl GridVolume {
    pub fn from_data(xres: usize, yres: usize, zres: usize, data: Vec<Float>) -> Result<Self, String> {
        if xres == 0 || yres == 0 || zres == 0 {
            return Err("grid dimensions must be positive".to_string());
        }
        let expected = xres
            .checked_mul(yres)
            .and_then(|v| v.checked_mul(zres))
            .ok_or_else(|| "grid dimensions overflow".to_string())?;
        if data.len() != expected {
            return Err(format!("grid expects {} voxels, got {}", expected, data.len()));
        }

        Ok(Self {
            data,
            xres,
            yres,
            zres,
            filter_mode: VolumeFilterMode::Trilinear,
        })
    }

    /// Reads a Mitsuba `.vol` grid (version 3, float32 encoding). Only the first
    /// channel of multi-channel grids is kept.
    pub fn from_file(path: &str) -> Result<Self, String> {
        let bytes = fs::read(path).map_err(|e| format!("failed to read {}: {}", path, e))?;
        let mut cursor = 4usize;

        if bytes.len() < 4 {
            return Err("vol file too small".to_string());
        }
        if &bytes[0..3] != b"VOL" {
            return Err("invalid vol header".to_string());
        }
        let version = bytes[3];
        if version != 3 {
            return Err(format!("unsupported vol version: {}", version));
        }

        let encoding = read_i32(&bytes, &mut cursor)?;
        let xres = read_i32(&bytes, &mut cursor)?;
        let yres = read_i32(&bytes, &mut cursor)?;
        let zres = read_i32(&bytes, &mut cursor)?;
        let channels = read_i32(&bytes, &mut cursor)?;

        if encoding != 1 {
            return Err(format!("unsupported vol encoding: {}", encoding));
        }
        if xres <= 0 || yres <= 0 || zres <= 0 || channels <= 0 {
            return Err("vol dimensions must be positive".to_string());
        }
        let channels = channels as usize;
        if channels != 1 {
            log::warn!("{}: {} channels, keeping only the first", path, channels);
        }

        // The bounding box is irrelevant here: volumes are placed by their transform.
        for _ in 0..6 {
            read_f32(&bytes, &mut cursor)?;
        }

        let xres = xres as usize;
        let yres = yres as usize;
        let zres = zres as usize;
        let expected = xres
            .checked_mul(yres)
            .and_then(|v| v.checked_mul(zres))
            .ok_or_else(|| "vol dimensions overflow".to_string())?;
        let mut data = Vec::with_capacity(expected);

        for _ in 0..expected {
            let v = read_f32(&bytes, &mut cursor)?;
            data.push(v);
            for _ in 1..channels {
                read_f32(&bytes, &mut cursor)?;
            }
        }

        log::info!("Loaded grid volume {} ({}x{}x{}).", path, xres, yres, zres);
        Self::from_data(xres, yres, zres, data)
    }

    pub fn with_filter_mode(mut self, filter_mode: VolumeFilterMode) -> Self {
        self.filter_mode = filter_mode;
        self
    }

    pub fn value_range(&self) -> (Float, Float) {
        self.data.iter().fold((std::f32::INFINITY, std::f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
    }

    fn sample_nearest(&self, p: Vector3f) -> Float {
        let x0 = nearest_index(p.x, self.xres);
        let y0 = nearest_index(p.y, self.yres);
        let z0 = nearest_index(p.z, self.zres);
        self.fetch(x0, y0, z0)
    }

    fn sample_trilinear(&self, p: Vector3f) -> Float {
        let x = p.x * (self.xres as Float - 1.0);
        let y = p.y * (self.yres as Float - 1.0);
        let z = p.z * (self.zres as Float - 1.0);

        let x0 = x.floor() as isize;
        let y0 = y.floor() as isize;
        let z0 = z.floor() as isize;
        let x1 = x0 + 1;
        let y1 = y0 + 1;
        let z1 = z0 + 1;

        let tx = x - x0 as Float;
        let ty = y - y0 as Float;
        let tz = z - z0 as Float;

        let x0u = x0.clamp(0, self.xres as isize - 1) as usize;
        let y0u = y0.clamp(0, self.yres as isize - 1) as usize;
        let z0u = z0.clamp(0, self.zres as isize - 1) as usize;
        let x1u = x1.clamp(0, self.xres as isize - 1) as usize;
        let y1u = y1.clamp(0, self.yres as isize - 1) as usize;
        let z1u = z1.clamp(0, self.zres as isize - 1) as usize;

        let c000 = self.fetch(x0u, y0u, z0u);
        let c100 = self.fetch(x1u, y0u, z0u);
        let c010 = self.fetch(x0u, y1u, z0u);
        let c110 = self.fetch(x1u, y1u, z0u);
        let c001 = self.fetch(x0u, y0u, z1u);
        let c101 = self.fetch(x1u, y0u, z1u);
        let c011 = self.fetch(x0u, y1u, z1u);
        let c111 = self.fetch(x1u, y1u, z1u);

        let c00 = c000 * (1.0 - tx) + c100 * tx;
        let c10 = c010 * (1.0 - tx) + c110 * tx;
        let c01 = c001 * (1.0 - tx) + c101 * tx;
        let c11 = c011 * (1.0 - tx) + c111 * tx;

        let c0 = c00 * (1.0 - ty) + c10 * ty;
        let c1 = c01 * (1.0 - ty) + c11 * ty;

        c0 * (1.0 - tz) + c1 * tz
    }
}

impl Volume for GridVolume {
    fn dimensions(&self) -> (usize, usize, usize) {
        (self.xres, self.yres, self.zres)
    }

    fn fetch(&self, x: usize, y: usize, z: usize) -> Float {
        let idx = (z * self.yres + y) * self.xres + x;
        self.data[idx]
    }

    fn eval(&self, uvw: Vector3f) -> Float {
        let p = clamp_coord3(uvw);

        match self.filter_mode {
            VolumeFilterMode::Nearest => self.sample_nearest(p),
            VolumeFilterMode::Trilinear => self.sample_trilinear(p),
        }
    }
}

fn read_i32(bytes: &[u8], cursor: &mut usize) -> Result<i32, String> {
    if *cursor + 4 > bytes.len() {
        return Err("unexpected eof while reading i32".to_string());
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32(bytes: &[u8], cursor: &mut usize) -> Result<Float, String> {
    if *cursor + 4 > bytes.len() {
        return Err("unexpected eof while reading f32".to_string());
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(Float::from_le_bytes(buf))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    pub(crate) fn write_test_vol(path: &PathBuf, data: &[f32], xres: i32, yres: i32, zres: i32, channels: i32) {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"VOL");
        bytes.push(3u8);
        bytes.extend_from_slice(&1i32.to_le_bytes()); // encoding
        bytes.extend_from_slice(&xres.to_le_bytes());
        bytes.extend_from_slice(&yres.to_le_bytes());
        bytes.extend_from_slice(&zres.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        // bbox 0..1
        for v in [0.0f32, 0.0, 0.0, 1.0, 1.0, 1.0].iter() {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in data {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(path, bytes).expect("write vol");
    }

    #[test]
    fn grid_volume_trilinear_center() {
        let mut path = std::env::temp_dir();
        path.push("volmarch_grid_trilinear_center.vol");
        let data: Vec<f32> = (0..8).map(|v| v as f32).collect();
        write_test_vol(&path, &data, 2, 2, 2, 1);

        let vol = GridVolume::from_file(path.to_str().unwrap()).expect("load vol");
        assert_eq!(vol.dimensions(), (2, 2, 2));
        let v = vol.eval(Vector3f::new(0.5, 0.5, 0.5));
        assert!((v - 3.5).abs() < 1e-4);
        assert_eq!(vol.value_range(), (0.0, 7.0));
    }

    #[test]
    fn grid_volume_multichannel_keeps_first() {
        let mut path = std::env::temp_dir();
        path.push("volmarch_grid_multichannel.vol");
        let data = [1.0f32, 10.0, 100.0, 2.0, 20.0, 200.0];
        write_test_vol(&path, &data, 2, 1, 1, 3);

        let vol = GridVolume::from_file(path.to_str().unwrap()).expect("load vol");
        assert_eq!(vol.fetch(0, 0, 0), 1.0);
        assert_eq!(vol.fetch(1, 0, 0), 2.0);
    }

    #[test]
    fn grid_volume_rejects_bad_header() {
        let mut path = std::env::temp_dir();
        path.push("volmarch_grid_bad_header.vol");
        std::fs::write(&path, b"NOPE0000").expect("write vol");
        assert!(GridVolume::from_file(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn grid_volume_nearest_and_clamp() {
        let data: Vec<f32> = (0..8).map(|v| v as f32).collect();
        let vol = GridVolume::from_data(2, 2, 2, data)
            .expect("grid")
            .with_filter_mode(VolumeFilterMode::Nearest);
        assert_eq!(vol.eval(Vector3f::new(0.1, 0.1, 0.1)), 0.0);
        assert_eq!(vol.eval(Vector3f::new(0.9, 0.1, 0.1)), 1.0);
        // Outside the cube reads clamp to the border voxel.
        assert_eq!(vol.eval(Vector3f::new(1.5, 1.5, 1.5)), 7.0);
    }

    #[test]
    fn grid_volume_rejects_mismatched_data() {
        assert!(GridVolume::from_data(2, 2, 2, vec![0.0; 7]).is_err());
        assert!(GridVolume::from_data(0, 2, 2, vec![]).is_err());
    }
}
