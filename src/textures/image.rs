// Copyright @yucwang 2026

use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector4f};
use exr::prelude::*;
use image::io::Reader as ImageReader;
use image::GenericImageView;
use std::path::Path;

/// Bilinear RGBA lookup texture. Transfer functions are authored as images whose
/// horizontal axis is normalised intensity, so lookups clamp to the edge texels.
pub struct ImageTexture {
    width: usize,
    height: usize,
    data: Vec<Vector4f>,
}

struct ExrTexels {
    width: usize,
    height: usize,
    data: Vec<Vector4f>,
}

fn srgb_to_linear(v: Float) -> Float {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

impl ImageTexture {
    pub fn from_rgba(width: usize, height: usize, data: Vec<Vector4f>) -> std::result::Result<Self, String> {
        if width == 0 || height == 0 {
            return Err("texture dimensions must be positive".to_string());
        }
        if data.len() != width * height {
            return Err(format!("texture expects {} texels, got {}", width * height, data.len()));
        }
        Ok(Self { width, height, data })
    }

    pub fn from_exr(path: &str) -> std::result::Result<Self, String> {
        let image = read()
            .no_deep_data()
            .largest_resolution_level()
            .rgba_channels(
                |resolution, _| ExrTexels {
                    width: resolution.width(),
                    height: resolution.height(),
                    data: vec![Vector4f::zeros(); resolution.width() * resolution.height()],
                },
                |texels: &mut ExrTexels, position, (r, g, b, a): (f32, f32, f32, f32)| {
                    let idx = position.y() * texels.width + position.x();
                    texels.data[idx] = Vector4f::new(r, g, b, a);
                },
            )
            .first_valid_layer()
            .all_attributes()
            .from_file(path)
            .map_err(|e| format!("failed to read exr {}: {}", path, e))?;

        let texels = image.layer_data.channel_data.pixels;
        Self::from_rgba(texels.width, texels.height, texels.data)
    }

    pub fn from_image(path: &str, srgb: bool) -> std::result::Result<Self, String> {
        let img = ImageReader::open(path)
            .map_err(|e| format!("failed to open image {}: {}", path, e))?
            .decode()
            .map_err(|e| format!("failed to decode image {}: {}", path, e))?;

        let (width, height) = img.dimensions();
        let rgba = img.to_rgba32f();
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let p = rgba.get_pixel(x, y);
                let (mut r, mut g, mut b) = (p[0], p[1], p[2]);
                if srgb {
                    r = srgb_to_linear(r);
                    g = srgb_to_linear(g);
                    b = srgb_to_linear(b);
                }
                data.push(Vector4f::new(r, g, b, p[3]));
            }
        }

        Self::from_rgba(width as usize, height as usize, data)
    }

    pub fn from_file(path: &str) -> std::result::Result<Self, String> {
        Self::from_file_with_srgb(path, true)
    }

    pub fn from_file_with_srgb(path: &str, srgb: bool) -> std::result::Result<Self, String> {
        let ext = Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let texture = match ext.as_str() {
            "exr" => Self::from_exr(path),
            "jpg" | "jpeg" | "png" => Self::from_image(path, srgb),
            _ => Err(format!("unsupported texture format: {}", ext)),
        }?;
        log::info!("Loaded texture {} ({}x{}).", path, texture.width, texture.height);
        Ok(texture)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn pixel_at(&self, x: usize, y: usize) -> Vector4f {
        self.data[y * self.width + x]
    }

    fn sample_bilinear(&self, uv: Vector2f) -> Vector4f {
        let uv = Self::clamp_uv(uv);
        let x = uv.x * (self.width as Float) - 0.5;
        let y = (1.0 - uv.y) * (self.height as Float) - 0.5;

        let x0 = x.floor() as isize;
        let y0 = y.floor() as isize;
        let x1 = x0 + 1;
        let y1 = y0 + 1;

        let x0u = Self::clamp_index(x0, self.width);
        let y0u = Self::clamp_index(y0, self.height);
        let x1u = Self::clamp_index(x1, self.width);
        let y1u = Self::clamp_index(y1, self.height);

        let tx = x - x0 as Float;
        let ty = y - y0 as Float;

        let c0 = self.pixel_at(x0u, y0u) * (1.0 - tx) + self.pixel_at(x1u, y0u) * tx;
        let c1 = self.pixel_at(x0u, y1u) * (1.0 - tx) + self.pixel_at(x1u, y1u) * tx;
        c0 * (1.0 - ty) + c1 * ty
    }

    fn clamp_uv(uv: Vector2f) -> Vector2f {
        Vector2f::new(uv.x.clamp(0.0, 1.0), uv.y.clamp(0.0, 1.0))
    }

    fn clamp_index(idx: isize, size: usize) -> usize {
        idx.clamp(0, size as isize - 1) as usize
    }
}

impl Texture for ImageTexture {
    fn describe(&self) -> String {
        format!("ImageTexture {}x{}", self.width, self.height)
    }

    fn eval(&self, uv: Vector2f) -> Vector4f {
        self.sample_bilinear(uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> ImageTexture {
        let data = vec![
            Vector4f::new(0.0, 0.0, 0.0, 0.0),
            Vector4f::new(1.0, 0.5, 0.25, 1.0),
        ];
        ImageTexture::from_rgba(2, 1, data).expect("texture")
    }

    #[test]
    fn image_texture_bilinear_midpoint() {
        let tex = ramp();
        let c = tex.eval(Vector2f::new(0.5, 0.5));
        assert!((c - Vector4f::new(0.5, 0.25, 0.125, 0.5)).norm() < 1e-5);
    }

    #[test]
    fn image_texture_clamps_outside() {
        let tex = ramp();
        assert_eq!(tex.eval(Vector2f::new(-1.0, 0.5)), Vector4f::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(tex.eval(Vector2f::new(2.0, 0.5)), Vector4f::new(1.0, 0.5, 0.25, 1.0));
    }

    #[test]
    fn image_texture_rejects_bad_sizes() {
        assert!(ImageTexture::from_rgba(2, 2, vec![Vector4f::zeros(); 3]).is_err());
        assert!(ImageTexture::from_file("transfer.tiff").is_err());
    }

    #[test]
    fn image_texture_png_roundtrip() {
        let mut path = std::env::temp_dir();
        path.push("volmarch_tf_ramp.png");
        let mut img = ::image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, ::image::Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, ::image::Rgba([255, 255, 255, 255]));
        img.save(&path).expect("save png");

        let tex = ImageTexture::from_file_with_srgb(path.to_str().unwrap(), false).expect("load png");
        assert_eq!(tex.dimensions(), (2, 1));
        let c = tex.eval(Vector2f::new(1.0, 0.5));
        assert!((c - Vector4f::new(1.0, 1.0, 1.0, 1.0)).norm() < 1e-5);
    }
}
