use crate::Vec3;

/// A ray in 3D space with an origin and a unit-length direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Create a ray starting at `begin` and pointing towards `end`.
    pub fn new(begin: Vec3, end: Vec3) -> Self {
        Self::from_direction(begin, end - begin)
    }

    /// Create a ray from an origin and a (not necessarily unit) direction.
    pub fn from_direction(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Unit direction of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray parameter of the orthogonal projection of `point` onto the ray line.
    #[inline]
    pub fn line_coef(&self, point: Vec3) -> f64 {
        (point - self.origin).dot(self.direction)
    }

    /// Distance from `point` to the (infinite) ray line.
    pub fn distance(&self, point: Vec3) -> f64 {
        let offset = point - self.origin;
        (offset - self.direction * self.direction.dot(offset)).length()
    }

    /// Same ray with its origin moved `delta` along the direction.
    #[inline]
    pub fn nudged(&self, delta: f64) -> Ray {
        Ray {
            origin: self.at(delta),
            direction: self.direction,
        }
    }

    /// Ray leaving `point` in the mirror direction of this ray about `normal`.
    pub fn reflect(&self, point: Vec3, normal: Vec3) -> Ray {
        let d = self.direction;
        Ray::from_direction(point, d - normal * (2.0 * d.dot(normal)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(1.0, 2.0, 13.0));

        assert_eq!(ray.origin(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(ray.direction(), Vec3::Z);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::from_direction(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0));

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_line_coef_and_distance() {
        let ray = Ray::from_direction(Vec3::ZERO, Vec3::X);
        let point = Vec3::new(4.0, 3.0, 0.0);

        assert_eq!(ray.line_coef(point), 4.0);
        assert!((ray.distance(point) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_nudged_keeps_direction() {
        let ray = Ray::from_direction(Vec3::ZERO, Vec3::Y);
        let nudged = ray.nudged(0.5);

        assert_eq!(nudged.origin(), Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(nudged.direction(), ray.direction());
    }

    #[test]
    fn test_reflect_mirrors_about_normal() {
        let ray = Ray::from_direction(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let reflected = ray.reflect(Vec3::ZERO, Vec3::Y);

        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!((reflected.direction() - expected).length() < 1e-12);
        assert_eq!(reflected.origin(), Vec3::ZERO);
    }
}
