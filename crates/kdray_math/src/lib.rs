//! kdray math types.
//!
//! Everything is double precision: the KD-tree classification and the
//! triangle membership test compare against an absolute epsilon of `1e-9`,
//! which only makes sense with `f64`.

pub use glam::{dvec3, DVec3};

/// 3-component vector used for points, directions and colors.
pub type Vec3 = DVec3;

pub mod eps;

mod aabb;
mod ray;

pub use aabb::Aabb;
pub use ray::Ray;
