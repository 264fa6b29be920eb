//! A renderable scene: the built KD-tree, the lights, the viewport and the
//! pixel grid the render writes into.

use std::time::Instant;

use kdray_core::{Color, Light, SceneDescription, Viewport};
use kdray_math::Ray;

use crate::hittable::Primitive;
use crate::integrator::{Integrator, RenderStats};
use crate::kdtree::KdTree;
use crate::renderer::{ImageBuffer, RenderConfig, RenderResult};
use crate::scheduler::render_parallel;
use crate::{Sphere, Triangle};

#[derive(Debug)]
pub struct Scene {
    tree: KdTree,
    lights: Vec<Light>,
    viewport: Viewport,
    config: RenderConfig,
    pixels: ImageBuffer,
    stats: RenderStats,
}

impl Scene {
    /// Build the KD-tree over `objects` and prepare an empty pixel grid.
    pub fn new(
        objects: Vec<Primitive>,
        lights: Vec<Light>,
        viewport: Viewport,
        config: RenderConfig,
    ) -> Self {
        let tree = KdTree::build(objects, &config.build);
        Self {
            tree,
            lights,
            pixels: ImageBuffer::new(viewport.width, viewport.height),
            viewport,
            config,
            stats: RenderStats::new(),
        }
    }

    /// Turn a loaded description into primitives and build the scene.
    pub fn from_description(description: &SceneDescription, config: RenderConfig) -> Self {
        let mut objects: Vec<Primitive> = Vec::with_capacity(description.object_count());

        objects.extend(description.triangles.iter().map(|t| {
            Primitive::from(Triangle::new(
                t.positions,
                t.texture_coords,
                t.material.clone(),
            ))
        }));
        objects.extend(
            description
                .spheres
                .iter()
                .map(|s| Primitive::from(Sphere::new(s.center, s.radius, s.material.clone()))),
        );

        Self::new(
            objects,
            description.lights.clone(),
            description.viewport,
            config,
        )
    }

    /// Shader bound to this scene.
    pub fn integrator(&self) -> Integrator<'_> {
        Integrator::new(&self.tree, &self.lights, &self.config, &self.stats)
    }

    /// Color seen along `ray`.
    pub fn trace_ray(&self, ray: &Ray) -> Color {
        self.integrator().trace_ray(ray)
    }

    /// Render every pixel in parallel and return the filled grid.
    pub fn render(&mut self) -> RenderResult<&ImageBuffer> {
        self.stats.reset();
        let start = Instant::now();

        let image = render_parallel(&self.integrator(), &self.viewport, self.config.workers)?;
        self.pixels = image;

        log::info!(
            "Rendered {}x{} with {} workers in {:.4}s",
            self.viewport.width,
            self.viewport.height,
            self.config.workers,
            start.elapsed().as_secs_f64()
        );
        log::info!(
            "Cast {} rays, deepest recursion level {}",
            self.stats.rays(),
            self.stats.deepest()
        );

        Ok(&self.pixels)
    }

    pub fn pixels(&self) -> &ImageBuffer {
        &self.pixels
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }
}
