//! kdray core - scene description for the KD-tree ray tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Material`, `Light`, `Viewport`
//! - **Scene loading**: a JSON description plus a Wavefront OBJ/MTL model
//!
//! # Example
//!
//! ```ignore
//! use kdray_core::load_scene;
//!
//! let scene = load_scene("scenes/room.json")?;
//! println!("Loaded {} triangles, {} lights",
//!     scene.triangles.len(),
//!     scene.lights.len());
//! ```

pub mod light;
pub mod loader;
pub mod material;
pub mod viewport;

// Re-export commonly used types
pub use light::{Light, LightReference};
pub use loader::{
    load_obj_from_buf, load_scene, parse_description, LoadError, LoadResult, SceneDescription,
    SphereSpec, TriangleSpec,
};
pub use material::{Color, Material, MaterialKind};
pub use viewport::Viewport;
