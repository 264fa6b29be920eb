//! Sphere primitive for ray tracing.

use std::sync::Arc;

use kdray_core::Material;
use kdray_math::eps::{greater, less};
use kdray_math::{Aabb, Ray, Vec3};

use crate::hittable::{RayHit, Surface};

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f64,
    material: Arc<Material>,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f64, material: Arc<Material>) -> Self {
        let rvec = Vec3::splat(radius);
        Self {
            center,
            radius,
            material,
            bbox: Aabb::new(center - rvec, center + rvec),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Surface for Sphere {
    /// # Panics
    ///
    /// Panics if `point` lies farther from the center than the radius.
    fn normal(&self, point: Vec3) -> Vec3 {
        let offset = point - self.center;
        assert!(
            !greater(offset.length(), self.radius),
            "point {point} is outside the sphere at {} with radius {}",
            self.center,
            self.radius
        );
        offset.normalize()
    }

    /// # Panics
    ///
    /// Spheres carry no texture mapping; always panics.
    fn texture_point(&self, _point: Vec3) -> Vec3 {
        panic!("texture coordinates are not defined for spheres")
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        let distance = ray.distance(self.center);
        if greater(distance, self.radius) {
            return None;
        }

        // Half chord around the closest approach
        let half_chord = (self.radius * self.radius - distance * distance).max(0.0).sqrt();
        let closest = ray.line_coef(self.center);

        let mut t = closest - half_chord;
        if less(t, 0.0) {
            // Origin inside the sphere (or sphere behind it)
            t = closest + half_chord;
        }
        Some(RayHit::new(t))
    }

    fn material(&self) -> &Material {
        &self.material
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_sphere(radius: f64) -> Sphere {
        Sphere::new(Vec3::ZERO, radius, Arc::new(Material::default()))
    }

    #[test]
    fn test_sphere_hit_from_outside() {
        let r = 1.5;
        let sphere = unit_sphere(r);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0 * r), Vec3::ZERO);

        let hit = sphere.intersect(&ray).unwrap();
        assert!((hit.t - r).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_hit_from_inside() {
        let sphere = unit_sphere(2.0);
        let ray = Ray::from_direction(Vec3::ZERO, Vec3::X);

        let hit = sphere.intersect(&ray).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_origin_on_surface() {
        let r = 1.0;
        let sphere = unit_sphere(r);
        let ray = Ray::new(Vec3::new(0.0, r, 0.0), Vec3::ZERO);

        // Near root is zero, far root is the opposite pole
        let hit = sphere.intersect(&ray).unwrap();
        assert!(hit.t.abs() < 1e-9);
    }

    #[test]
    fn test_sphere_tangent_ray() {
        let r = 1.0;
        let sphere = unit_sphere(r);
        let ray = Ray::from_direction(Vec3::new(-2.0 * r, r, 0.0), Vec3::X);

        let hit = sphere.intersect(&ray).unwrap();
        assert!((hit.t - 2.0 * r).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = unit_sphere(1.0);
        let ray = Ray::from_direction(Vec3::new(0.0, 2.0, -5.0), Vec3::Z);
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_sphere_normal_and_bbox() {
        let sphere = Sphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0, Arc::new(Material::default()));

        assert_eq!(sphere.normal(Vec3::new(3.0, 0.0, 0.0)), Vec3::X);
        assert_eq!(sphere.normal(Vec3::new(1.0, -1.0, 0.0)), -Vec3::Y);
        assert_eq!(sphere.bounding_box().low, Vec3::new(-1.0, -2.0, -2.0));
        assert_eq!(sphere.bounding_box().high, Vec3::new(3.0, 2.0, 2.0));
    }

    #[test]
    #[should_panic(expected = "outside the sphere")]
    fn test_sphere_normal_outside_panics() {
        unit_sphere(1.0).normal(Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "not defined for spheres")]
    fn test_sphere_texture_point_panics() {
        unit_sphere(1.0).texture_point(Vec3::X);
    }
}
