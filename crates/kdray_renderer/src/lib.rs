//! kdray renderer - KD-tree accelerated CPU ray tracing
//!
//! Scene primitives are indexed by a Surface Area Heuristic KD-tree built
//! in parallel. A recursive Whitted-style integrator shades each hit with
//! shadow-tested point lights plus mirror reflection and refraction, and a
//! rayon pool renders one job per pixel.
//!
//! # Example
//!
//! ```ignore
//! use kdray_core::load_scene;
//! use kdray_renderer::{RenderConfig, Scene};
//!
//! let description = load_scene("scenes/room.json")?;
//! let mut scene = Scene::from_description(&description, RenderConfig::default());
//! scene.render()?.save("results/res.png")?;
//! ```

mod hittable;
mod integrator;
mod kdtree;
mod renderer;
mod sah;
mod scene;
mod scheduler;
mod sphere;
mod triangle;

pub use hittable::{Primitive, RayHit, Surface};
pub use integrator::{fresnel, refract, Integrator, RenderStats};
pub use kdtree::{BuildConfig, Intersection, KdNode, KdTree, TreeStats};
pub use renderer::{color_to_rgba, ImageBuffer, RenderConfig, RenderError, RenderResult};
pub use sah::{EventKind, PlaneCandidate};
pub use scene::Scene;
pub use scheduler::{render_job, render_parallel, PixelJob};
pub use sphere::Sphere;
pub use triangle::Triangle;

/// Re-export common math and scene types
pub use kdray_core::{Color, Light, LightReference, Material, MaterialKind, Viewport};
pub use kdray_math::{Aabb, Ray, Vec3};
