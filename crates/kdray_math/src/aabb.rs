use crate::eps::{approx_eq, less_eq};
use crate::{Ray, Vec3};

/// Axis-Aligned Bounding Box used by the KD-tree.
///
/// The box is stored as two corners, `low` and `high`. They are ordered
/// componentwise for boxes built from points, but a box produced by
/// [`Aabb::split`] may have one axis inverted when the split value lies
/// outside the box. Every per-axis query therefore goes through
/// [`Aabb::axis_min`] / [`Aabb::axis_max`] instead of reading `low`/`high`
/// directly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub low: Vec3,
    pub high: Vec3,
}

impl Aabb {
    /// Create a box from two corners.
    pub fn new(low: Vec3, high: Vec3) -> Self {
        Self { low, high }
    }

    /// Smallest box containing every point. `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let bbox = points.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.low.min(p), acc.high.max(p))
        });
        Some(bbox)
    }

    /// Grow this box in place so that it also encloses `other`.
    pub fn expand(&mut self, other: &Aabb) {
        self.low = self.low.min(other.low);
        self.high = self.high.max(other.high);
    }

    /// Test if `point` lies inside the box (boundary included, within epsilon).
    pub fn contains(&self, point: Vec3) -> bool {
        (0..3).all(|axis| {
            less_eq(self.axis_min(axis), point[axis]) && less_eq(point[axis], self.axis_max(axis))
        })
    }

    /// Lower extent along `axis` (0=X, 1=Y, 2=Z).
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not 0, 1 or 2.
    pub fn axis_min(&self, axis: usize) -> f64 {
        check_axis(axis);
        self.low[axis].min(self.high[axis])
    }

    /// Upper extent along `axis` (0=X, 1=Y, 2=Z).
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not 0, 1 or 2.
    pub fn axis_max(&self, axis: usize) -> f64 {
        check_axis(axis);
        self.low[axis].max(self.high[axis])
    }

    /// Split the box with the plane `axis = value`.
    ///
    /// The left box keeps `low` and has its `high` clamped to `value` on
    /// `axis`; the right box keeps `high` and has its `low` clamped. The
    /// two halves cover the parent and share only the splitting plane.
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not 0, 1 or 2.
    pub fn split(&self, axis: usize, value: f64) -> (Aabb, Aabb) {
        check_axis(axis);
        let mut left_high = self.high;
        let mut right_low = self.low;
        left_high[axis] = value;
        right_low[axis] = value;
        (Aabb::new(self.low, left_high), Aabb::new(right_low, self.high))
    }

    /// SAH weighting term: twice the squared length of the box diagonal.
    ///
    /// This is not the geometric surface area. The KD-tree builder only
    /// ever uses ratios of this quantity between a child and its parent.
    pub fn surface_area(&self) -> f64 {
        let diagonal = self.high - self.low;
        2.0 * diagonal.dot(diagonal)
    }

    /// Intersect a ray with the six faces of the box.
    ///
    /// Returns `(entry, exit)` ray parameters, or `None` if the box is
    /// missed or lies entirely behind the ray origin. When the origin is
    /// inside the box `entry == exit`.
    pub fn intersect(&self, ray: &Ray) -> Option<(f64, f64)> {
        let mut coefs: Vec<f64> = self
            .faces()
            .iter()
            .filter_map(|face| self.face_hit(ray, face))
            .collect();
        coefs.sort_by(f64::total_cmp);

        let exit = *coefs.last()?;
        if exit < 0.0 {
            return None;
        }
        let entry = coefs.iter().copied().find(|&c| c > 0.0).unwrap_or(exit);
        Some((entry, exit))
    }

    /// The six faces as corner triples spanning each face plane.
    fn faces(&self) -> [[Vec3; 3]; 6] {
        let (l, r) = (self.low, self.high);
        [
            [
                Vec3::new(l.x, l.y, l.z),
                Vec3::new(r.x, l.y, l.z),
                Vec3::new(l.x, r.y, l.z),
            ],
            [
                Vec3::new(l.x, l.y, r.z),
                Vec3::new(r.x, l.y, r.z),
                Vec3::new(l.x, r.y, r.z),
            ],
            [
                Vec3::new(l.x, l.y, l.z),
                Vec3::new(l.x, r.y, l.z),
                Vec3::new(l.x, r.y, r.z),
            ],
            [
                Vec3::new(r.x, l.y, l.z),
                Vec3::new(r.x, r.y, l.z),
                Vec3::new(r.x, r.y, r.z),
            ],
            [
                Vec3::new(l.x, l.y, l.z),
                Vec3::new(r.x, l.y, l.z),
                Vec3::new(r.x, l.y, r.z),
            ],
            [
                Vec3::new(l.x, r.y, l.z),
                Vec3::new(r.x, r.y, l.z),
                Vec3::new(r.x, r.y, r.z),
            ],
        ]
    }

    /// Ray parameter where the ray crosses a face plane inside the box.
    fn face_hit(&self, ray: &Ray, [p1, p2, p3]: &[Vec3; 3]) -> Option<f64> {
        // A flat box has faces that span no plane.
        let normal = (*p2 - *p1).cross(*p3 - *p1).normalize_or_zero();
        if normal == Vec3::ZERO {
            return None;
        }
        let denom = ray.direction().dot(normal);
        if approx_eq(denom, 0.0) {
            return None;
        }
        let coef = (normal.dot(*p1) - ray.origin().dot(normal)) / denom;
        self.contains(ray.at(coef)).then_some(coef)
    }
}

fn check_axis(axis: usize) {
    assert!(axis < 3, "axis {axis} is not in range [0, 2]");
}
