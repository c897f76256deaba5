/* Copyright 2020 @TwoCookingMice */

use crate::math::constants::Float;

use exr::prelude::*;

struct RedChannel {
    width: usize,
    height: usize,
    data: Vec<Float>,
}

// Read the red channel of an EXR image, row-major from the top-left pixel.
pub fn read_exr_red_channel(file_path: &str) -> std::result::Result<(usize, usize, Vec<Float>), String> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _| RedChannel {
                width: resolution.width(),
                height: resolution.height(),
                data: vec![0.0; resolution.width() * resolution.height()],
            },
            |channel: &mut RedChannel, position, (r, _g, _b, _a): (f32, f32, f32, f32)| {
                let idx = position.y() * channel.width + position.x();
                channel.data[idx] = r;
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_file(file_path)
        .map_err(|e| format!("failed to read exr {}: {}", file_path, e))?;

    let channel = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", channel.width, channel.height);
    Ok((channel.width, channel.height, channel.data))
}

// Write EXR Image to file
pub fn write_exr_to_file(image: &[(Float, Float, Float, Float)],
                         width: usize,
                         height: usize,
                         file_path: &str) -> std::result::Result<(), String> {
    log::info!("Starting writing openexr images: {}.", file_path);
    if image.len() != width * height {
        return Err(format!("image holds {} pixels, expected {}", image.len(), width * height));
    }

    write_rgba_file(file_path, width, height, |x, y| {
        let (r, g, b, a) = image[y * width + x];
        (r, g, b, a)
    }).map_err(|e| format!("failed to write exr {}: {}", file_path, e))?;

    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exr_write_then_read_red() {
        let mut path = std::env::temp_dir();
        path.push("volmarch_exr_red.exr");
        let path = path.to_str().unwrap().to_string();

        let pixels = vec![
            (1.5, 0.0, 0.0, 1.0),
            (2.5, 0.0, 0.0, 1.0),
            (std::f32::INFINITY, 0.0, 0.0, 1.0),
            (0.25, 0.0, 0.0, 1.0),
        ];
        write_exr_to_file(&pixels, 2, 2, &path).expect("write exr");

        let (width, height, red) = read_exr_red_channel(&path).expect("read exr");
        assert_eq!((width, height), (2, 2));
        assert_eq!(red[0], 1.5);
        assert_eq!(red[1], 2.5);
        assert!(red[2].is_infinite());
        assert_eq!(red[3], 0.25);
    }

    #[test]
    fn exr_write_rejects_size_mismatch() {
        let pixels = vec![(0.0, 0.0, 0.0, 0.0); 3];
        assert!(write_exr_to_file(&pixels, 2, 2, "unused.exr").is_err());
    }
}
