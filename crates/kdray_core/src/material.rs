//! Surface materials.
//!
//! A material is created once by the scene loader and then shared read-only
//! by every primitive that uses it (and by every render worker).

use kdray_math::eps::approx_eq;
use kdray_math::Vec3;

/// Color type alias (RGB, each channel nominally in 0-1).
pub type Color = Vec3;

/// Clamp each channel into [0, 1] by taking its absolute value and
/// capping it at 1.
#[inline]
pub fn clamp_color(color: Color) -> Color {
    color.abs().min(Color::ONE)
}

/// How the integrator shades a surface.
///
/// Derived from the material coefficients, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Plain diffuse surface lit by the scene lights.
    Diffuse,
    /// Diffuse surface blended with a mirror reflection.
    ReflectDiffuse,
    /// Dielectric: reflection and refraction weighted by Fresnel.
    ReflectRefract,
    /// Partially see-through surface (alpha != 1).
    Transparent,
}

impl MaterialKind {
    /// Classify a set of coefficients.
    pub fn classify(reflect: f64, refract: f64, alpha: f64) -> Self {
        if !approx_eq(alpha, 1.0) {
            MaterialKind::Transparent
        } else if approx_eq(reflect, 0.0) && approx_eq(refract, 0.0) {
            MaterialKind::Diffuse
        } else if approx_eq(refract, 0.0) {
            MaterialKind::ReflectDiffuse
        } else {
            MaterialKind::ReflectRefract
        }
    }
}

/// A surface material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    color: Color,
    /// Mirror weight for `ReflectDiffuse`
    reflect: f64,
    /// Index of refraction
    refract: f64,
    /// Opacity (1 = opaque)
    alpha: f64,
    kind: MaterialKind,
}

impl Material {
    /// Create a material; its kind is computed from the coefficients.
    pub fn new(name: impl Into<String>, color: Color, reflect: f64, refract: f64, alpha: f64) -> Self {
        Self {
            name: name.into(),
            color,
            reflect,
            refract,
            alpha,
            kind: MaterialKind::classify(reflect, refract, alpha),
        }
    }

    /// Create an opaque, non-reflective material.
    pub fn diffuse(name: impl Into<String>, color: Color) -> Self {
        Self::new(name, color, 0.0, 0.0, 1.0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn reflect(&self) -> f64 {
        self.reflect
    }

    pub fn refract(&self) -> f64 {
        self.refract
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse("default", Color::splat(0.5)) // Grey default
    }
}
