//! Surface trait and the closed set of scene primitives.

use kdray_core::Material;
use kdray_math::{Aabb, Ray, Vec3};

use crate::{Sphere, Triangle};

/// Ray parameter of a ray-surface intersection.
///
/// The parameter may be zero or negative (surface behind the ray origin);
/// callers decide which hits count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f64,
}

impl RayHit {
    #[inline]
    pub fn new(t: f64) -> Self {
        Self { t }
    }
}

/// Capabilities every renderable surface provides.
pub trait Surface: Send + Sync {
    /// Unit surface normal at `point`.
    fn normal(&self, point: Vec3) -> Vec3;

    /// Texture-space coordinates of `point`.
    fn texture_point(&self, point: Vec3) -> Vec3;

    /// Get the axis-aligned bounding box of this surface.
    fn bounding_box(&self) -> Aabb;

    /// Intersect the ray with the surface's carrier geometry.
    fn intersect(&self, ray: &Ray) -> Option<RayHit>;

    fn material(&self) -> &Material;
}

/// A scene primitive.
///
/// A closed enum rather than `Box<dyn Surface>` so leaf scans dispatch
/// with a match instead of a vtable call.
#[derive(Debug, Clone)]
pub enum Primitive {
    Triangle(Triangle),
    Sphere(Sphere),
}

impl Surface for Primitive {
    #[inline]
    fn normal(&self, point: Vec3) -> Vec3 {
        match self {
            Primitive::Triangle(t) => t.normal(point),
            Primitive::Sphere(s) => s.normal(point),
        }
    }

    #[inline]
    fn texture_point(&self, point: Vec3) -> Vec3 {
        match self {
            Primitive::Triangle(t) => t.texture_point(point),
            Primitive::Sphere(s) => s.texture_point(point),
        }
    }

    #[inline]
    fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Triangle(t) => t.bounding_box(),
            Primitive::Sphere(s) => s.bounding_box(),
        }
    }

    #[inline]
    fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        match self {
            Primitive::Triangle(t) => t.intersect(ray),
            Primitive::Sphere(s) => s.intersect(ray),
        }
    }

    #[inline]
    fn material(&self) -> &Material {
        match self {
            Primitive::Triangle(t) => t.material(),
            Primitive::Sphere(s) => s.material(),
        }
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Primitive::Triangle(triangle)
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}
