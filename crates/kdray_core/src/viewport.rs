//! Pinhole viewport: a camera origin and an image plane given by three
//! of its corners.

use kdray_math::{Ray, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Camera position every primary ray starts from
    pub origin: Vec3,
    pub top_left: Vec3,
    pub bottom_left: Vec3,
    pub top_right: Vec3,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl Viewport {
    /// Vector spanning the image plane horizontally.
    pub fn width_base(&self) -> Vec3 {
        self.top_right - self.top_left
    }

    /// Vector spanning the image plane vertically (top to bottom).
    pub fn height_base(&self) -> Vec3 {
        self.bottom_left - self.top_left
    }

    /// World-space center of pixel `(x, y)`.
    pub fn pixel_center(&self, x: u32, y: u32) -> Vec3 {
        let step_w = self.width_base() / self.width as f64;
        let step_h = self.height_base() / self.height as f64;
        let corner = self.top_left + step_w * x as f64 + step_h * y as f64;
        corner + step_w / 2.0 + step_h / 2.0
    }

    /// Primary ray through the center of pixel `(x, y)`.
    pub fn primary_ray(&self, x: u32, y: u32) -> Ray {
        Ray::new(self.origin, self.pixel_center(x, y))
    }
}
