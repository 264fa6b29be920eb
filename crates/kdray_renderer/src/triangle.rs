//! Triangle primitive for ray tracing.
//!
//! Intersection solves the ray/plane equation and then accepts the hit
//! point only if the three sub-triangles it forms with the edges add up to
//! the triangle's own area.

use std::sync::Arc;

use kdray_core::Material;
use kdray_math::eps::{approx_eq, less};
use kdray_math::{Aabb, Ray, Vec3};

use crate::hittable::{RayHit, Surface};

/// A triangle primitive.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Vertices
    points: [Vec3; 3],
    /// Texture coordinates per vertex
    texture_coords: [Vec3; 3],
    material: Arc<Material>,
    /// Pre-computed face normal (unit length, zero if degenerate)
    normal: Vec3,
    /// `normal · points[0]`
    plane_offset: f64,
    /// `|(p1 - p0) × (p2 - p0)|`
    area: f64,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices and their texture coordinates.
    pub fn new(points: [Vec3; 3], texture_coords: [Vec3; 3], material: Arc<Material>) -> Self {
        let [p0, p1, p2] = points;
        let cross = (p1 - p0).cross(p2 - p0);
        let normal = cross.normalize_or_zero();

        Self {
            points,
            texture_coords,
            material,
            normal,
            plane_offset: normal.dot(p0),
            area: cross.length(),
            bbox: Aabb::new(p0.min(p1).min(p2), p0.max(p1).max(p2)),
        }
    }

    pub fn points(&self) -> &[Vec3; 3] {
        &self.points
    }

    /// Twice the geometric area (the cross product length).
    pub fn area(&self) -> f64 {
        self.area
    }
}

impl Surface for Triangle {
    fn normal(&self, _point: Vec3) -> Vec3 {
        self.normal
    }

    /// Affine interpolation of the texture coordinates anchored at vertex 1.
    fn texture_point(&self, point: Vec3) -> Vec3 {
        let [p0, p1, p2] = self.points;
        let [t0, t1, t2] = self.texture_coords;

        let offset = point - p1;
        let base_x = p2 - p1;
        let base_y = p0 - p1;
        let part_u = (t2 - t1) * (offset.dot(base_x) / base_x.length_squared());
        let part_v = (t0 - t1) * (offset.dot(base_y) / base_y.length_squared());
        part_u + part_v
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        let denom = ray.direction().dot(self.normal);

        // Ray is parallel to the plane (or the triangle is degenerate)
        if approx_eq(denom, 0.0) {
            return None;
        }

        let t = (self.plane_offset - ray.origin().dot(self.normal)) / denom;
        let point = ray.at(t);

        let p = &self.points;
        let area: f64 = (0..3)
            .map(|i| (point - p[i]).cross(point - p[(i + 1) % 3]).length())
            .sum();

        if !approx_eq(area, self.area) || less(area * self.area, 0.0) {
            return None;
        }
        Some(RayHit::new(t))
    }

    fn material(&self) -> &Material {
        &self.material
    }
}
