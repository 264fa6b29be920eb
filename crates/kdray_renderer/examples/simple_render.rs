//! Simple ray tracer example.
//!
//! Builds a small scene in code (a floor, a mirror wall, a glass ball and a
//! tinted pane) and saves it as PNG.

use std::sync::Arc;

use kdray_renderer::{
    Color, Light, LightReference, Material, Primitive, RenderConfig, Scene, Sphere, Triangle,
    Vec3, Viewport,
};

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("kdray - Simple Example");
    println!("======================");

    let start = std::time::Instant::now();
    let mut scene = Scene::new(
        build_objects(),
        vec![Light::new(
            Vec3::new(0.0, 4.0, 2.0),
            10.0,
            LightReference {
                power: 1.0,
                distance: 1.0,
            },
        )],
        Viewport {
            origin: Vec3::new(0.0, 1.0, 6.0),
            top_left: Vec3::new(-1.6, 2.0, 4.0),
            bottom_left: Vec3::new(-1.6, 0.2, 4.0),
            top_right: Vec3::new(1.6, 2.0, 4.0),
            width: 640,
            height: 360,
        },
        RenderConfig::default(),
    );
    println!("Scene built in {:?}", start.elapsed());

    let start = std::time::Instant::now();
    let image = match scene.render() {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Render failed: {e}");
            std::process::exit(1);
        }
    };
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.png";
    if let Err(e) = image.save(filename) {
        eprintln!("Failed to save image: {e}");
        std::process::exit(1);
    }
    println!("Saved to {}", filename);
}

fn build_objects() -> Vec<Primitive> {
    let mut objects: Vec<Primitive> = Vec::new();

    // Floor (two triangles at y=0)
    let floor = Arc::new(Material::diffuse("floor", Color::new(0.8, 0.8, 0.7)));
    let corners = [
        Vec3::new(-10.0, 0.0, -10.0),
        Vec3::new(10.0, 0.0, -10.0),
        Vec3::new(10.0, 0.0, 10.0),
        Vec3::new(-10.0, 0.0, 10.0),
    ];
    objects.push(quad_half(&corners, [0, 2, 1], floor.clone()));
    objects.push(quad_half(&corners, [0, 3, 2], floor));

    // Mirror wall behind the ball
    let mirror = Arc::new(Material::new("mirror", Color::new(0.9, 0.9, 1.0), 0.8, 0.0, 1.0));
    let wall = [
        Vec3::new(-4.0, 0.0, -3.0),
        Vec3::new(4.0, 0.0, -3.0),
        Vec3::new(4.0, 4.0, -3.0),
        Vec3::new(-4.0, 4.0, -3.0),
    ];
    objects.push(quad_half(&wall, [0, 1, 2], mirror.clone()));
    objects.push(quad_half(&wall, [0, 2, 3], mirror));

    // Glass ball and a matte one
    let glass = Arc::new(Material::new("glass", Color::ONE, 0.0, 1.5, 1.0));
    objects.push(Sphere::new(Vec3::new(-0.8, 0.7, 0.0), 0.7, glass).into());
    let red = Arc::new(Material::diffuse("red", Color::new(0.8, 0.2, 0.2)));
    objects.push(Sphere::new(Vec3::new(1.0, 0.5, -0.5), 0.5, red).into());

    // Tinted pane in front of the matte ball
    let pane = Arc::new(Material::new("pane", Color::new(0.2, 0.4, 0.9), 0.0, 1.0, 0.5));
    objects.push(
        Triangle::new(
            [
                Vec3::new(0.4, 0.0, 0.8),
                Vec3::new(1.6, 0.0, 0.8),
                Vec3::new(1.0, 1.4, 0.8),
            ],
            [Vec3::ZERO; 3],
            pane,
        )
        .into(),
    );

    objects
}

fn quad_half(corners: &[Vec3; 4], order: [usize; 3], material: Arc<Material>) -> Primitive {
    Triangle::new(
        [corners[order[0]], corners[order[1]], corners[order[2]]],
        [Vec3::ZERO; 3],
        material,
    )
    .into()
}
