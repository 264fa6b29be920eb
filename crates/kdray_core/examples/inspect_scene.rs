//! Example: Load and inspect a scene description.
//!
//! Run with: cargo run --example inspect_scene -- scenes/room.json

use std::env;

use kdray_core::load_scene;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: inspect_scene <path-to-scene-json>");
        return;
    }

    let path = &args[1];
    println!("Loading scene: {}", path);

    match load_scene(path) {
        Ok(scene) => {
            let vp = &scene.viewport;
            println!("\n=== Scene: {} ===", path);
            println!("Resolution: {}x{}", vp.width, vp.height);
            println!("Camera origin: {:?}", vp.origin);
            println!("Triangles: {}", scene.triangles.len());
            println!("Spheres: {}", scene.spheres.len());

            println!("\n--- Materials ---");
            for material in &scene.materials {
                println!(
                    "  {} - {:?}, color {:?}",
                    material.name(),
                    material.kind(),
                    material.color()
                );
            }

            println!("\n--- Lights ---");
            for (i, light) in scene.lights.iter().enumerate() {
                println!(
                    "  [{}] at {:?}, power {} (calibrated {:.3})",
                    i,
                    light.position,
                    light.power,
                    light.calibrated_power()
                );
            }
        }
        Err(e) => {
            eprintln!("Error loading scene: {}", e);
            std::process::exit(1);
        }
    }
}
