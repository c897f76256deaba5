use volmarch::core::scene_loader::load_scene_with_settings;
use volmarch::integrators::raymarching::RaymarchingIntegrator;
use volmarch::math::constants::{Float, Vector2f};
use volmarch::renderers::simple::SimpleRenderer;
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <scene.xml> <x> <y> [--frames N] [--frame-index N] [--no-jitter] [--camera N]", args[0]);
        std::process::exit(1);
    }

    let scene_path = &args[1];
    let x: usize = args[2].parse().unwrap_or(0);
    let y: usize = args[3].parse().unwrap_or(0);

    let mut frames: Option<u32> = None;
    let mut frame_index: Option<u32> = None;
    let mut jitter = true;
    let mut camera_id: usize = 0;

    let mut i = 4;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" => {
                i += 1;
                frames = args.get(i).and_then(|v| v.parse::<u32>().ok());
            }
            "--frame-index" => {
                i += 1;
                frame_index = args.get(i).and_then(|v| v.parse::<u32>().ok());
            }
            "--no-jitter" => {
                jitter = false;
            }
            "--camera" => {
                i += 1;
                camera_id = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(camera_id);
            }
            _ => {}
        }
        i += 1;
    }

    let load_result = match load_scene_with_settings(scene_path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("failed to load scene: {}", e);
            std::process::exit(1);
        }
    };
    let scene = load_result.scene;
    let mut settings = load_result.settings;
    settings.frames = frames.unwrap_or(settings.frames).max(1).min(8);
    settings.frame_index = frame_index.unwrap_or(settings.frame_index);
    settings.jitter = settings.jitter && jitter;

    let sensor = match scene.camera(camera_id) {
        Some(sensor) => sensor,
        None => {
            eprintln!("camera {} not found", camera_id);
            std::process::exit(2);
        }
    };
    let (width, height) = {
        let bmp = sensor.bitmap();
        (bmp.width(), bmp.height())
    };
    if x >= width || y >= height {
        eprintln!("Pixel out of bounds: ({}, {}) for size {}x{}", x, y, width, height);
        std::process::exit(2);
    }

    let integrator = RaymarchingIntegrator::new(settings);
    let u = Vector2f::new((x as Float + 0.5) / width as Float, (y as Float + 0.5) / height as Float);
    let camera = sensor.sample(&u);
    println!("camera {:?} view {:?} depth {}", camera.position, camera.view_dir, scene.depth_at(x, y));

    if let Some(object) = scene.volume() {
        let frame = object.local_frame();
        let (ray, hit) = frame.intersect(camera.position, camera.view_dir, scene.depth_at(x, y), camera.forward);
        println!(
            "uvw origin {:?} dir {:?} -> t0 {:.6} t1 {:.6} thickness {:.6} entry {:?}",
            ray.origin(), ray.dir(), hit.t0, hit.t1, hit.thickness, hit.entry_position
        );
    } else {
        println!("scene has no volume");
    }

    let renderer = SimpleRenderer::new(Box::new(integrator), camera_id);
    let rgba = renderer.shade_pixel(&scene, sensor, x, y);
    println!(
        "pixel ({}, {}) frames={} -> R {:.6}, G {:.6}, B {:.6}, A {:.6}",
        x, y, settings.frames, rgba.x, rgba.y, rgba.z, rgba.w
    );
}
