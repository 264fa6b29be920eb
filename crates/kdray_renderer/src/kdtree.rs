//! SAH KD-tree acceleration structure.
//!
//! The tree owns every scene primitive; nodes refer to them by index so an
//! object straddling a split plane can sit in several leaves without being
//! copied. Children of a split are built concurrently with `rayon::join`.

use std::time::{Duration, Instant};

use kdray_math::eps::{greater, greater_eq, less};
use kdray_math::{Aabb, Ray, Vec3};

use crate::hittable::{Primitive, Surface};
use crate::sah;

/// Tuning constants of the tree builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildConfig {
    /// Cost of visiting an internal node
    pub traversal_cost: f64,
    /// Cost of one ray-object intersection test
    pub intersection_cost: f64,
    /// Depth at which a node becomes a leaf regardless of cost
    pub max_depth: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            traversal_cost: 2.0,
            intersection_cost: 1.0,
            max_depth: 64,
        }
    }
}

/// KD-tree node - either a split with two children or a leaf with objects.
#[derive(Debug)]
pub enum KdNode {
    Leaf {
        /// Indices into the tree's object list
        objects: Vec<usize>,
        bbox: Aabb,
    },
    Split {
        left: Box<KdNode>,
        right: Box<KdNode>,
        axis: usize,
        value: f64,
        bbox: Aabb,
        /// Number of objects this node was built from
        size: usize,
    },
}

impl KdNode {
    pub fn bbox(&self) -> &Aabb {
        match self {
            KdNode::Leaf { bbox, .. } | KdNode::Split { bbox, .. } => bbox,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            KdNode::Leaf { objects, .. } => objects.len(),
            KdNode::Split { size, .. } => *size,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, KdNode::Leaf { .. })
    }
}

/// Closest hit of a ray against the scene.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    pub t: f64,
    pub point: Vec3,
    pub object: &'a Primitive,
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    /// Total object references over all leaves, duplicates included
    pub leaf_references: usize,
}

#[derive(Debug)]
pub struct KdTree {
    objects: Vec<Primitive>,
    root: Option<KdNode>,
    build_time: Duration,
}

impl KdTree {
    /// Build a tree over `objects`.
    ///
    /// An empty object list yields an empty tree that every ray misses.
    pub fn build(objects: Vec<Primitive>, config: &BuildConfig) -> Self {
        let start = Instant::now();

        let bounds: Vec<Aabb> = objects.iter().map(|o| o.bounding_box()).collect();
        let scene_box = bounds.iter().copied().reduce(|mut acc, b| {
            acc.expand(&b);
            acc
        });

        let root = match scene_box {
            Some(bbox) => {
                let indices: Vec<usize> = (0..objects.len()).collect();
                Some(build_node(&bounds, indices, bbox, 0, config))
            }
            None => {
                log::warn!("Building KD-tree over an empty scene");
                None
            }
        };

        let tree = Self {
            objects,
            root,
            build_time: start.elapsed(),
        };

        log::info!(
            "Built KD-tree over {} objects in {:.4}s",
            tree.objects.len(),
            tree.build_time.as_secs_f64()
        );
        log::debug!("KD-tree stats: {:?}", tree.stats());

        tree
    }

    /// Closest hit with a strictly positive ray parameter.
    pub fn cast_ray(&self, ray: &Ray) -> Option<Intersection<'_>> {
        let root = self.root.as_ref()?;
        let (t, index) = self.find_intersection(root, ray)?;
        Some(Intersection {
            t,
            point: ray.at(t),
            object: &self.objects[index],
        })
    }

    /// Visit both children of every split, rejecting subtrees whose box the
    /// ray misses, and keep the nearer hit.
    fn find_intersection(&self, node: &KdNode, ray: &Ray) -> Option<(f64, usize)> {
        if node.size() == 0 || node.bbox().intersect(ray).is_none() {
            return None;
        }

        match node {
            KdNode::Leaf { objects, .. } => {
                let mut closest: Option<(f64, usize)> = None;
                for &index in objects {
                    let Some(hit) = self.objects[index].intersect(ray) else {
                        continue;
                    };
                    let best = closest.map_or(f64::MAX, |(t, _)| t);
                    if greater(hit.t, 0.0) && less(hit.t, best) {
                        closest = Some((hit.t, index));
                    }
                }
                closest
            }
            KdNode::Split { left, right, .. } => {
                let left = self.find_intersection(left, ray);
                let right = self.find_intersection(right, ray);
                match (left, right) {
                    (Some(l), Some(r)) if greater(l.0, r.0) => Some(r),
                    (Some(l), _) => Some(l),
                    (None, r) => r,
                }
            }
        }
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        if let Some(root) = &self.root {
            collect_stats(root, 0, &mut stats);
        }
        stats
    }

    /// Wall-clock duration of the build.
    pub fn build_time(&self) -> Duration {
        self.build_time
    }

    pub fn objects(&self) -> &[Primitive] {
        &self.objects
    }

    pub fn root(&self) -> Option<&KdNode> {
        self.root.as_ref()
    }

    /// Bounding box of the whole scene, `None` for an empty tree.
    pub fn bbox(&self) -> Option<&Aabb> {
        self.root.as_ref().map(KdNode::bbox)
    }
}

/// Recursive construction of a node and its subtree.
fn build_node(
    bounds: &[Aabb],
    objects: Vec<usize>,
    bbox: Aabb,
    depth: usize,
    config: &BuildConfig,
) -> KdNode {
    if depth >= config.max_depth {
        return KdNode::Leaf { objects, bbox };
    }

    let n = objects.len();
    let plane = match sah::find_plane(&objects, bounds, &bbox, config) {
        Some(plane) if !greater_eq(plane.cost, n as f64 * config.intersection_cost) => plane,
        _ => return KdNode::Leaf { objects, bbox },
    };

    let (left_objects, right_objects) = sah::classify(&objects, bounds, &plane);

    // Both sides would hold everything: the split only adds traversal work
    if left_objects.len() == n && right_objects.len() == n {
        return KdNode::Leaf { objects, bbox };
    }

    // A child keeping every object in a box no thinner than ours would pick
    // the same plane again
    let (left_box, right_box) = bbox.split(plane.axis, plane.value);
    let extent = axis_extent(&bbox, plane.axis);
    let stalls = |count: usize, child: &Aabb| {
        count == n && !less(axis_extent(child, plane.axis), extent)
    };
    if stalls(left_objects.len(), &left_box) || stalls(right_objects.len(), &right_box) {
        return KdNode::Leaf { objects, bbox };
    }

    let (left, right) = rayon::join(
        || build_node(bounds, left_objects, left_box, depth + 1, config),
        || build_node(bounds, right_objects, right_box, depth + 1, config),
    );

    KdNode::Split {
        left: Box::new(left),
        right: Box::new(right),
        axis: plane.axis,
        value: plane.value,
        bbox,
        size: n,
    }
}

fn axis_extent(bbox: &Aabb, axis: usize) -> f64 {
    bbox.axis_max(axis) - bbox.axis_min(axis)
}

fn collect_stats(node: &KdNode, depth: usize, stats: &mut TreeStats) {
    stats.nodes += 1;
    stats.max_depth = stats.max_depth.max(depth);
    match node {
        KdNode::Leaf { objects, .. } => {
            stats.leaves += 1;
            stats.leaf_references += objects.len();
        }
        KdNode::Split { left, right, .. } => {
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sphere, Triangle};
    use kdray_core::Material;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn material() -> Arc<Material> {
        Arc::new(Material::default())
    }

    /// `count` unit right triangles in the z=0 plane, spaced 2 apart along x.
    fn triangle_row(count: usize) -> Vec<Primitive> {
        let m = material();
        (0..count)
            .map(|i| {
                let x = i as f64 * 2.0;
                Triangle::new(
                    [
                        Vec3::new(x, 0.0, 0.0),
                        Vec3::new(x + 1.0, 0.0, 0.0),
                        Vec3::new(x, 1.0, 0.0),
                    ],
                    [Vec3::ZERO; 3],
                    m.clone(),
                )
                .into()
            })
            .collect()
    }

    /// Closed UV sphere of radius 2 tessellated into `slices * stacks` quads.
    fn uv_sphere(slices: usize, stacks: usize) -> Vec<Primitive> {
        use std::f64::consts::PI;

        let m = material();
        let point = |i: usize, j: usize| {
            let theta = PI * j as f64 / stacks as f64;
            let phi = 2.0 * PI * i as f64 / slices as f64;
            Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()) * 2.0
        };

        let mut objects = Vec::with_capacity(slices * stacks * 2);
        for i in 0..slices {
            for j in 0..stacks {
                let quad = [point(i, j), point(i + 1, j), point(i + 1, j + 1), point(i, j + 1)];
                for [a, b, c] in [[0, 1, 2], [0, 2, 3]] {
                    objects.push(
                        Triangle::new([quad[a], quad[b], quad[c]], [Vec3::ZERO; 3], m.clone())
                            .into(),
                    );
                }
            }
        }
        objects
    }

    fn leaf_objects(node: &KdNode, out: &mut HashSet<usize>) {
        match node {
            KdNode::Leaf { objects, .. } => out.extend(objects.iter().copied()),
            KdNode::Split { left, right, .. } => {
                leaf_objects(left, out);
                leaf_objects(right, out);
            }
        }
    }

    fn check_split_boxes(node: &KdNode) {
        if let KdNode::Split {
            left,
            right,
            axis,
            value,
            bbox,
            ..
        } = node
        {
            let (l, r) = bbox.split(*axis, *value);
            assert_eq!(*left.bbox(), l);
            assert_eq!(*right.bbox(), r);
            check_split_boxes(left);
            check_split_boxes(right);
        }
    }

    #[test]
    fn test_build_keeps_every_object() {
        let n = 64;
        let tree = KdTree::build(triangle_row(n), &BuildConfig::default());

        let root = tree.root().unwrap();
        assert!(!root.is_leaf());
        assert_eq!(root.size(), n);

        let mut seen = HashSet::new();
        leaf_objects(root, &mut seen);
        assert_eq!(seen.len(), n);

        let stats = tree.stats();
        assert!(stats.leaf_references >= n);
        assert_eq!(stats.nodes, stats.leaves * 2 - 1);
        assert!(stats.max_depth <= BuildConfig::default().max_depth);
    }

    #[test]
    fn test_split_children_cover_parent_box() {
        let tree = KdTree::build(triangle_row(16), &BuildConfig::default());
        check_split_boxes(tree.root().unwrap());
    }

    #[test]
    fn test_small_scene_is_single_leaf() {
        let tree = KdTree::build(triangle_row(1), &BuildConfig::default());
        let stats = tree.stats();
        assert_eq!(stats.nodes, 1);
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.leaf_references, 1);
    }

    #[test]
    fn test_max_depth_cap() {
        let config = BuildConfig {
            max_depth: 2,
            ..BuildConfig::default()
        };
        let tree = KdTree::build(triangle_row(64), &config);
        assert!(tree.stats().max_depth <= 2);

        let mut seen = HashSet::new();
        leaf_objects(tree.root().unwrap(), &mut seen);
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_identical_objects_terminate() {
        let m = material();
        let objects: Vec<Primitive> = (0..32)
            .map(|_| Sphere::new(Vec3::ZERO, 1.0, m.clone()).into())
            .collect();
        let tree = KdTree::build(objects, &BuildConfig::default());

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO);
        let hit = tree.cast_ray(&ray).unwrap();
        assert!((hit.t - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_tree_misses() {
        let tree = KdTree::build(Vec::new(), &BuildConfig::default());
        assert!(tree.root().is_none());
        assert!(tree.bbox().is_none());
        assert_eq!(tree.stats(), TreeStats::default());

        let ray = Ray::from_direction(Vec3::ZERO, Vec3::Z);
        assert!(tree.cast_ray(&ray).is_none());
    }

    #[test]
    fn test_single_object_matches_direct_intersect() {
        let sphere = Sphere::new(Vec3::new(0.5, -0.25, 3.0), 1.0, material());
        let tree = KdTree::build(vec![sphere.clone().into()], &BuildConfig::default());

        let targets = [
            Vec3::new(0.5, -0.25, 3.0),
            Vec3::new(0.9, 0.1, 2.5),
            Vec3::new(0.0, -0.9, 3.2),
            Vec3::new(1.2, -0.25, 3.0),
        ];
        for target in targets {
            let ray = Ray::new(Vec3::new(0.0, 0.0, -2.0), target);
            let direct = sphere.intersect(&ray).unwrap();
            let hit = tree.cast_ray(&ray).unwrap();

            assert_eq!(hit.t, direct.t);
            assert_eq!(hit.point, ray.at(direct.t));
        }
    }

    #[test]
    fn test_cast_ray_returns_nearest() {
        let m = material();
        let objects: Vec<Primitive> = (0..8)
            .map(|i| Sphere::new(Vec3::new(0.0, 0.0, 3.0 * i as f64), 1.0, m.clone()).into())
            .collect();
        let tree = KdTree::build(objects, &BuildConfig::default());

        // From behind the last sphere looking back along -z
        let ray = Ray::from_direction(Vec3::new(0.0, 0.0, 30.0), -Vec3::Z);
        let hit = tree.cast_ray(&ray).unwrap();
        assert!((hit.t - 8.0).abs() < 1e-9);
        match hit.object {
            Primitive::Sphere(s) => assert_eq!(s.center(), Vec3::new(0.0, 0.0, 21.0)),
            Primitive::Triangle(_) => panic!("expected a sphere"),
        }
    }

    #[test]
    fn test_cast_ray_ignores_hits_behind_origin() {
        let tree = KdTree::build(triangle_row(4), &BuildConfig::default());

        let ray = Ray::new(Vec3::new(2.25, 0.25, 1.0), Vec3::new(2.25, 0.25, 0.0));
        let hit = tree.cast_ray(&ray).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-9);

        let away = Ray::from_direction(Vec3::new(2.25, 0.25, 1.0), Vec3::Z);
        assert!(tree.cast_ray(&away).is_none());
    }

    #[test]
    fn test_closed_mesh_build_is_bounded() {
        let objects = uv_sphere(32, 16);
        let n = objects.len();
        let tree = KdTree::build(objects, &BuildConfig::default());

        let stats = tree.stats();
        let cap = BuildConfig::default().max_depth;
        assert!(
            stats.max_depth < cap * 3 / 4,
            "depth {} is close to the cap",
            stats.max_depth
        );
        assert!(
            stats.leaf_references < 8 * n,
            "{} leaf references for {n} triangles",
            stats.leaf_references
        );

        let mut seen = HashSet::new();
        leaf_objects(tree.root().unwrap(), &mut seen);
        assert_eq!(seen.len(), n);
    }

    #[test]
    fn test_closed_mesh_hits_match_brute_force() {
        let objects = uv_sphere(16, 8);
        let tree = KdTree::build(objects.clone(), &BuildConfig::default());

        let origin = Vec3::new(0.3, 0.7, -6.0);
        for k in 0..25 {
            let target = Vec3::new(-1.5 + 0.125 * k as f64, 1.2 - 0.1 * k as f64, 0.0);
            let ray = Ray::new(origin, target);
            let brute = objects
                .iter()
                .filter_map(|o| o.intersect(&ray))
                .map(|h| h.t)
                .filter(|&t| greater(t, 0.0))
                .fold(None, |best: Option<f64>, t| Some(best.map_or(t, |b| b.min(t))));
            let hit = tree.cast_ray(&ray).map(|h| h.t);
            match (brute, hit) {
                (Some(b), Some(h)) => assert!((b - h).abs() < 1e-9, "ray {k}: {b} vs {h}"),
                (None, None) => {}
                other => panic!("ray {k}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_build_time_recorded() {
        let tree = KdTree::build(triangle_row(8), &BuildConfig::default());
        assert!(tree.build_time() < Duration::from_secs(60));
    }
}
