//! Surface Area Heuristic plane search for the KD-tree builder.
//!
//! For every axis the object boxes are turned into sorted interval events
//! and swept left to right. At each distinct coordinate the running counts
//! of objects left of, on, and right of the plane feed the cost model, and
//! the cheapest `(axis, value)` over all three axes wins.

use kdray_math::eps::{approx_eq, less, EPS};
use kdray_math::Aabb;

use crate::kdtree::BuildConfig;

/// Kind of an interval event along one axis.
///
/// The declaration order is the tie-break at equal coordinates: closing
/// events first, then zero-extent objects, then opening events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventKind {
    End,
    Belongs,
    Begin,
}

#[derive(Debug, Clone, Copy)]
struct Event {
    value: f64,
    kind: EventKind,
}

/// Best split plane found for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneCandidate {
    pub axis: usize,
    pub value: f64,
    pub cost: f64,
}

/// SAH cost of a split given each child's area ratio and object count.
#[inline]
pub fn cost(config: &BuildConfig, p_left: f64, n_left: usize, p_right: f64, n_right: usize) -> f64 {
    let weighted = p_left * n_left as f64 + p_right * n_right as f64;
    config.traversal_cost + config.intersection_cost * weighted
}

/// Cost of splitting `bbox` at `axis = value`.
///
/// Objects lying on the plane are tried on either side and the cheaper
/// assignment is kept.
pub fn plane_cost(
    config: &BuildConfig,
    bbox: &Aabb,
    axis: usize,
    value: f64,
    n_left: usize,
    n_planar: usize,
    n_right: usize,
) -> f64 {
    let (left, right) = bbox.split(axis, value);
    let area = bbox.surface_area();
    let p_left = left.surface_area() / area;
    let p_right = right.surface_area() / area;

    let planar_left = cost(config, p_left, n_left + n_planar, p_right, n_right);
    let planar_right = cost(config, p_left, n_left, p_right, n_planar + n_right);

    if approx_eq(planar_left, 0.0) || approx_eq(planar_right, 0.0) {
        return f64::MAX;
    }
    planar_left.min(planar_right)
}

/// Sorted interval events of `objects` along `axis`.
fn axis_events(objects: &[usize], bounds: &[Aabb], axis: usize) -> Vec<Event> {
    let mut events = Vec::with_capacity(objects.len() * 2);
    for &index in objects {
        let bbox = &bounds[index];
        let (min, max) = (bbox.axis_min(axis), bbox.axis_max(axis));
        if approx_eq(min, max) {
            events.push(Event { value: min, kind: EventKind::Belongs });
        } else {
            events.push(Event { value: min, kind: EventKind::Begin });
            events.push(Event { value: max, kind: EventKind::End });
        }
    }
    events.sort_by(|a, b| a.value.total_cmp(&b.value).then(a.kind.cmp(&b.kind)));
    events
}

/// Find the cheapest split plane for the objects of a node.
///
/// `objects` indexes into `bounds`. Returns `None` when there is nothing
/// to sweep or every candidate is degenerate.
pub fn find_plane(
    objects: &[usize],
    bounds: &[Aabb],
    bbox: &Aabb,
    config: &BuildConfig,
) -> Option<PlaneCandidate> {
    let mut best: Option<PlaneCandidate> = None;

    for axis in 0..3 {
        let events = axis_events(objects, bounds, axis);

        let mut n_left = 0;
        let mut n_right = objects.len();
        let mut i = 0;

        while i < events.len() {
            let value = events[i].value;
            let (mut begins, mut planar, mut ends) = (0, 0, 0);

            while i < events.len() && approx_eq(value, events[i].value) {
                match events[i].kind {
                    EventKind::Begin => begins += 1,
                    EventKind::Belongs => planar += 1,
                    EventKind::End => ends += 1,
                }
                i += 1;
            }

            n_right -= planar + ends;
            let plane = plane_cost(config, bbox, axis, value, n_left, planar, n_right);
            if less(plane, best.map_or(f64::MAX, |b| b.cost)) {
                best = Some(PlaneCandidate { axis, value, cost: plane });
            }
            n_left += begins + planar;
        }
    }

    best
}

/// Distribute objects between the two children of a split.
///
/// An object goes left if it starts below `value + EPS` and right if it
/// ends above `value - EPS`. Objects straddling or touching the plane go
/// to both, so nothing lying on the plane is lost.
pub fn classify(
    objects: &[usize],
    bounds: &[Aabb],
    plane: &PlaneCandidate,
) -> (Vec<usize>, Vec<usize>) {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for &index in objects {
        let bbox = &bounds[index];
        if bbox.axis_min(plane.axis) < plane.value + EPS {
            left.push(index);
        }
        if bbox.axis_max(plane.axis) > plane.value - EPS {
            right.push(index);
        }
    }

    (left, right)
}
