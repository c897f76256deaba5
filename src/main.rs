// Copyright 2020 TwoCookingMice

use volmarch::core::scene_loader::load_scene_with_settings;
use volmarch::integrators::raymarching::RaymarchingIntegrator;
use volmarch::io::exr_utils;
use volmarch::renderers::simple::{Renderer, SimpleRenderer};

use std::env;

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <scene.xml> <output.exr> [--frames N] [--frame-index N] [--step-size F] [--no-jitter] [--camera N]", program);
    std::process::exit(1);
}

fn flag_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    match args.get(i).and_then(|v| v.parse::<T>().ok()) {
        Some(value) => value,
        None => {
            eprintln!("Missing or invalid value for {}.", flag);
            usage(&args[0]);
        }
    }
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage(&args[0]);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut frames: Option<u32> = None;
    let mut frame_index: Option<u32> = None;
    let mut step_size: Option<f32> = None;
    let mut jitter = true;
    let mut camera_id: usize = 0;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--frames" => {
                i += 1;
                frames = Some(flag_value(&args, i, "--frames"));
            }
            "--frame-index" => {
                i += 1;
                frame_index = Some(flag_value(&args, i, "--frame-index"));
            }
            "--step-size" => {
                i += 1;
                step_size = Some(flag_value(&args, i, "--step-size"));
            }
            "--no-jitter" => {
                jitter = false;
            }
            "--camera" => {
                i += 1;
                camera_id = flag_value(&args, i, "--camera");
            }
            other => {
                log::warn!("Ignoring unknown argument {}.", other);
            }
        }
        i += 1;
    }

    let load_result = match load_scene_with_settings(input_path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to load scene {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let mut scene = load_result.scene;
    let mut settings = load_result.settings;
    if let Some(frames) = frames {
        settings.frames = frames;
    }
    if let Some(frame_index) = frame_index {
        settings.frame_index = frame_index;
    }
    if let Some(step_size) = step_size {
        settings.step_size = step_size;
    }
    settings.jitter = settings.jitter && jitter;
    if let Err(e) = settings.validate() {
        eprintln!("Invalid settings: {}", e);
        std::process::exit(1);
    }
    log::info!("Raymarching settings: {:?}.", settings);

    let renderer = SimpleRenderer::new(Box::new(RaymarchingIntegrator::new(settings)), camera_id);
    let image = renderer.render(&mut scene);
    if image.width() == 0 || image.height() == 0 {
        eprintln!("Nothing rendered, check the sensor.");
        std::process::exit(1);
    }
    if let Err(e) = exr_utils::write_exr_to_file(&image.raw_copy(), image.width(), image.height(), output_path) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
