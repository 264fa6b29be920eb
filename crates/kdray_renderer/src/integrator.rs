//! Recursive Whitted-style shading.
//!
//! Every surface hit is shaded from the point lights (with shadow rays) and,
//! depending on the material kind, blended with recursively traced
//! reflection and refraction rays up to a fixed depth.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use kdray_core::material::clamp_color;
use kdray_core::{Color, Light, MaterialKind};
use kdray_math::eps::{greater, greater_eq, less};
use kdray_math::{Ray, Vec3};

use crate::hittable::Surface;
use crate::kdtree::{Intersection, KdTree};
use crate::renderer::RenderConfig;

/// Counters shared by every render worker.
#[derive(Debug, Default)]
pub struct RenderStats {
    rays: AtomicU64,
    deepest: AtomicUsize,
}

impl RenderStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_ray(&self) {
        self.rays.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_depth(&self, depth: usize) {
        self.deepest.fetch_max(depth, Ordering::Relaxed);
    }

    /// Number of rays cast into the tree (camera, secondary and shadow).
    pub fn rays(&self) -> u64 {
        self.rays.load(Ordering::Relaxed)
    }

    /// Deepest recursion level that reached the scene.
    pub fn deepest(&self) -> usize {
        self.deepest.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.rays.store(0, Ordering::Relaxed);
        self.deepest.store(0, Ordering::Relaxed);
    }
}

/// Shades rays against a built tree.
#[derive(Debug, Clone, Copy)]
pub struct Integrator<'a> {
    tree: &'a KdTree,
    lights: &'a [Light],
    config: &'a RenderConfig,
    stats: &'a RenderStats,
}

impl<'a> Integrator<'a> {
    pub fn new(
        tree: &'a KdTree,
        lights: &'a [Light],
        config: &'a RenderConfig,
        stats: &'a RenderStats,
    ) -> Self {
        Self {
            tree,
            lights,
            config,
            stats,
        }
    }

    /// Color seen along a camera ray; the background when nothing is hit.
    pub fn trace_ray(&self, ray: &Ray) -> Color {
        match self.cast_ray(ray, 0.0, 0) {
            Some(color) => clamp_color(color),
            None => self.config.background,
        }
    }

    /// Shade the closest hit of `ray` at recursion level `depth`.
    ///
    /// Returns `None` past the depth limit or when the ray hits nothing.
    /// `_extra_light` carries the caller's light intensity down the
    /// recursion but is not added to the local lighting.
    pub fn cast_ray(&self, ray: &Ray, _extra_light: f64, depth: usize) -> Option<Color> {
        if depth > self.config.max_depth {
            return None;
        }

        let hit = self.cast_scene(ray)?;
        self.stats.record_depth(depth);

        let material = hit.object.material();
        let normal = hit.object.normal(hit.point);

        let intensity = self.light_intensity(hit.point, normal);
        let light = intensity.clamp(0.0, 1.0);

        let color = match material.kind() {
            MaterialKind::Diffuse => material.color() * light,
            MaterialKind::ReflectDiffuse => {
                let reflect = material.reflect();
                let reflected = self.trace_secondary(
                    Some(ray.reflect(hit.point, normal)),
                    intensity,
                    depth,
                );
                material.color() * (1.0 - reflect) * light + reflected * reflect
            }
            MaterialKind::ReflectRefract => {
                let kr = fresnel(ray.direction(), normal, material.refract());
                let kt = 1.0 - kr;

                let reflected = self.trace_secondary(
                    Some(ray.reflect(hit.point, normal)),
                    intensity,
                    depth,
                );
                let refracted = self.trace_secondary(
                    refracted_ray(ray, hit.point, normal, material.refract()),
                    intensity,
                    depth,
                );
                reflected * kr + refracted * kt
            }
            MaterialKind::Transparent => {
                let alpha = material.alpha();
                let refracted = self.trace_secondary(
                    refracted_ray(ray, hit.point, normal, material.refract()),
                    intensity,
                    depth,
                );
                material.color() * alpha * light + refracted * (1.0 - alpha)
            }
        };

        Some(clamp_color(color))
    }

    /// Recursive step for a reflection or refraction ray; a missing ray or
    /// a miss contributes black.
    fn trace_secondary(&self, ray: Option<Ray>, intensity: f64, depth: usize) -> Color {
        ray.and_then(|ray| self.cast_ray(&ray, intensity, depth + 1))
            .unwrap_or(Color::ZERO)
    }

    /// Closest hit of `ray` after moving its origin off the surface it
    /// starts on.
    fn cast_scene(&self, ray: &Ray) -> Option<Intersection<'a>> {
        self.stats.record_ray();
        self.tree.cast_ray(&ray.nudged(self.config.ray_offset))
    }

    /// Direct light reaching `point`, plus the ambient floor, capped at 1.
    pub fn light_intensity(&self, point: Vec3, normal: Vec3) -> f64 {
        let mut intensity = 0.0;

        for light in self.lights {
            let shadow_ray = Ray::new(point, light.position);
            let light_coef = shadow_ray.line_coef(light.position);

            let lit = match self.cast_scene(&shadow_ray) {
                None => true,
                Some(occluder) => greater(occluder.t, light_coef),
            };
            if !lit {
                continue;
            }

            let to_light = light.position - point;
            let power = light.calibrated_power() / to_light.length_squared();
            intensity += (normal.dot(to_light.normalize()) * power).max(0.0);
        }

        (intensity + self.config.ambient).min(1.0)
    }
}

/// Refraction ray leaving `point`, or `None` when there is no transmitted
/// direction.
fn refracted_ray(ray: &Ray, point: Vec3, normal: Vec3, ior: f64) -> Option<Ray> {
    let direction = refract(ray.direction(), normal, ior);
    if direction == Vec3::ZERO || !direction.is_finite() {
        return None;
    }
    Some(Ray::from_direction(point, direction))
}

/// Snell's law refraction of `direction` through a surface with normal
/// `normal` and index of refraction `ior`.
///
/// Returns the zero vector on total internal reflection.
pub fn refract(direction: Vec3, normal: Vec3, ior: f64) -> Vec3 {
    let mut cosi = normal.dot(direction).clamp(-1.0, 1.0);
    let (mut etai, mut etat) = (1.0, ior);
    let mut normal = normal;

    if less(cosi, 0.0) {
        // Entering the medium
        cosi = -cosi;
    } else {
        std::mem::swap(&mut etai, &mut etat);
        normal = -normal;
    }

    let eta = etai / etat;
    let k = 1.0 - eta * eta * (1.0 - cosi * cosi);
    if less(k, 0.0) {
        return Vec3::ZERO;
    }
    direction * eta + normal * (eta * cosi - k.sqrt())
}

/// Fresnel reflectance for a dielectric with index of refraction `ior`.
///
/// The total-reflection test compares `sin_t >= 0`, which holds for every
/// angle, so this currently always returns 1.
pub fn fresnel(direction: Vec3, normal: Vec3, ior: f64) -> f64 {
    let cosi = normal.dot(direction).clamp(-1.0, 1.0);
    let (mut etai, mut etat) = (1.0, ior);
    if greater(cosi, 0.0) {
        std::mem::swap(&mut etai, &mut etat);
    }
    let sint = etai / etat * (1.0 - cosi * cosi).max(0.0).sqrt();

    if greater_eq(sint, 0.0) {
        return 1.0;
    }

    let cost = (1.0 - sint * sint).max(0.0).sqrt();
    let cosi = cosi.abs();
    let rs = ((etat * cosi) - (etai * cost)) / ((etat * cosi) + (etai * cost));
    let rp = ((etai * cosi) - (etat * cost)) / ((etai * cosi) + (etat * cost));
    (rs * rs + rp * rp) / 2.0
}
