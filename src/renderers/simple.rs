// Copyright @yucwang 2026

use crate::core::integrator::{Integrator, PixelContext};
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, UInt, Vector2f, Vector2u, Vector4f, JITTER_PERIOD};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

pub use super::renderer::Renderer;

/// Runs the per-pixel program over the whole film in tiles, averaging the
/// integrator's temporal frames.
pub struct SimpleRenderer {
    integrator: Box<dyn Integrator>,
    camera_id: usize,
    show_progress: bool,
}

impl Renderer for SimpleRenderer {
    fn render(&self, scene: &mut Scene) -> Bitmap {
        let mut sensor = match scene.take_sensor(self.camera_id) {
            Some(sensor) => sensor,
            None => {
                log::warn!("No sensor with id {}, nothing rendered.", self.camera_id);
                return Bitmap::new(0, 0);
            }
        };

        let (width, height) = {
            let bmp = sensor.bitmap();
            (bmp.width(), bmp.height())
        };
        if width == 0 || height == 0 {
            scene.insert_sensor(self.camera_id, sensor);
            return Bitmap::new(0, 0);
        }

        let output = self.render_pixels(scene, sensor.as_ref(), width, height);

        let bitmap = sensor.bitmap_mut();
        for y in 0..height {
            for x in 0..width {
                bitmap[(x, y)] = output[x + width * y];
            }
        }
        let bitmap = bitmap.clone();
        scene.insert_sensor(self.camera_id, sensor);
        bitmap
    }
}

impl SimpleRenderer {
    pub fn new(integrator: Box<dyn Integrator>, camera_id: usize) -> Self {
        Self {
            integrator,
            camera_id,
            show_progress: true,
        }
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn integrator(&self) -> &dyn Integrator {
        self.integrator.as_ref()
    }

    /// Average of the integrator's frames for a single pixel.
    pub fn shade_pixel(&self, scene: &Scene, sensor: &dyn Sensor, x: usize, y: usize) -> Vector4f {
        let (width, height) = {
            let bmp = sensor.bitmap();
            (bmp.width(), bmp.height())
        };
        let u = Vector2f::new((x as Float + 0.5) / width as Float,
                              (y as Float + 0.5) / height as Float);
        let camera = sensor.sample(&u);
        let scene_depth = scene.depth_at(x, y);

        let frames = self.integrator.frame_count().max(1);
        let first = self.integrator.first_frame_index();
        let mut sum = Vector4f::zeros();
        for frame in 0..frames {
            let context = PixelContext {
                camera,
                scene_depth,
                pixel: Vector2u::new(x as UInt, y as UInt),
                frame_index: (first + frame) % JITTER_PERIOD,
            };
            sum += self.integrator.shade_pixel(scene, &context);
        }
        sum / frames as Float
    }

    fn render_pixels(&self, scene: &Scene, sensor: &dyn Sensor, width: usize, height: usize) -> Vec<Vector4f> {
        let block_size = 64usize;
        let blocks_x = (width + block_size - 1) / block_size;
        let blocks_y = (height + block_size - 1) / block_size;
        let total_blocks = blocks_x * blocks_y;

        let progress = if self.show_progress {
            ProgressBar::new(total_blocks as u64)
        } else {
            ProgressBar::hidden()
        };
        progress.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} blocks")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let next_block = Arc::new(AtomicUsize::new(0));
        let thread_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        log::info!("Rendering {}x{} in {} blocks on {} threads.", width, height, total_blocks, thread_count);

        let (tx, rx) = mpsc::channel::<(usize, usize, usize, usize, Vec<Vector4f>)>();
        let mut output = vec![Vector4f::zeros(); width * height];

        thread::scope(|scope| {
            for _ in 0..thread_count {
                let next_block = Arc::clone(&next_block);
                let tx = tx.clone();
                scope.spawn(move || {
                    loop {
                        let block_index = next_block.fetch_add(1, Ordering::Relaxed);
                        if block_index >= total_blocks {
                            break;
                        }

                        let bx = block_index % blocks_x;
                        let by = block_index / blocks_x;
                        let x0 = bx * block_size;
                        let y0 = by * block_size;
                        let x1 = (x0 + block_size).min(width);
                        let y1 = (y0 + block_size).min(height);

                        let mut block = vec![Vector4f::zeros(); (x1 - x0) * (y1 - y0)];
                        for y in y0..y1 {
                            for x in x0..x1 {
                                let local_x = x - x0;
                                let local_y = y - y0;
                                block[local_x + (x1 - x0) * local_y] = self.shade_pixel(scene, sensor, x, y);
                            }
                        }
                        if tx.send((x0, y0, x1, y1, block)).is_err() {
                            break;
                        }
                    }
                });
            }

            drop(tx);
            for _ in 0..total_blocks {
                if let Ok((x0, y0, x1, y1, block)) = rx.recv() {
                    for y in y0..y1 {
                        for x in x0..x1 {
                            let local_x = x - x0;
                            let local_y = y - y0;
                            output[x + width * y] = block[local_x + (x1 - x0) * local_y];
                        }
                    }
                    progress.inc(1);
                }
            }
        });
        progress.finish_and_clear();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::labels::LabelPalette;
    use crate::core::scene::{VolumeContent, VolumeObject};
    use crate::integrators::raymarching::{RaymarchSettings, RaymarchingIntegrator};
    use crate::math::constants::Vector3f;
    use crate::math::transform::Transform;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::volumes::label_volume::LabelVolume;

    fn scene(width: usize, height: usize) -> Scene {
        let labels = LabelVolume::from_data(1, 1, 1, vec![1]).expect("labels");
        let object = VolumeObject::new(Transform::default(),
                                       VolumeContent::Labels { volume: Arc::new(labels), palette: LabelPalette::Render });
        let mut scene = Scene::with_volume(object);
        scene.add_sensor(Box::new(PerspectiveCamera::new(Vector3f::new(0.0, 0.0, -3.0),
                                                         Vector3f::zeros(),
                                                         Vector3f::new(0.0, 1.0, 0.0),
                                                         std::f32::consts::FRAC_PI_2,
                                                         width, height)));
        scene
    }

    fn renderer(frames: u32) -> SimpleRenderer {
        let settings = RaymarchSettings { frames, ..RaymarchSettings::default() };
        SimpleRenderer::new(Box::new(RaymarchingIntegrator::new(settings)), 0).without_progress()
    }

    #[test]
    fn test_render_centre_hits_corner_misses() {
        let mut scene = scene(65, 33);
        let bitmap = renderer(1).render(&mut scene);
        assert_eq!((bitmap.width(), bitmap.height()), (65, 33));

        let centre = bitmap[(32, 16)];
        // Unit thickness through a label-1 volume.
        assert!((centre.w - 0.5).abs() < 1e-2, "alpha {}", centre.w);
        assert_eq!(centre.y, 0.0);
        assert_eq!(bitmap[(0, 0)], Vector4f::zeros());
        // The sensor goes back into the scene.
        assert!(scene.camera(0).is_some());
    }

    #[test]
    fn test_render_matches_single_pixel_path() {
        let mut scene = scene(16, 16);
        let r = renderer(4);
        let bitmap = r.render(&mut scene);
        let sensor = scene.camera(0).expect("sensor");
        for &(x, y) in [(8usize, 8usize), (3, 12), (15, 0)].iter() {
            assert_eq!(bitmap[(x, y)], r.shade_pixel(&scene, sensor, x, y));
        }
    }

    #[test]
    fn test_render_missing_sensor() {
        let mut scene = Scene::new();
        let bitmap = renderer(1).render(&mut scene);
        assert_eq!((bitmap.width(), bitmap.height()), (0, 0));
    }
}
