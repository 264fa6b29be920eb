//! Render configuration, errors and the output image.

use std::path::Path;

use kdray_core::Color;
use thiserror::Error;

use crate::kdtree::BuildConfig;

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Deepest reflection/refraction level that is still shaded
    pub max_depth: usize,
    /// Number of render worker threads
    pub workers: usize,
    /// Color of rays that hit nothing
    pub background: Color,
    /// Light floor added to every shaded point
    pub ambient: f64,
    /// Distance a ray origin is moved along its direction before each
    /// scene query, so rays do not hit the surface they leave
    pub ray_offset: f64,
    pub build: BuildConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            workers: 16,
            background: Color::splat(0.2),
            ambient: 0.2,
            ray_offset: 1e-5,
            build: BuildConfig::default(),
        }
    }
}

/// Errors that can occur while rendering or writing the result.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Convert a color to 8-bit RGBA.
///
/// Channels are expected in [0, 1]; they are scaled by 255 and truncated,
/// with no gamma applied.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * color.x.clamp(0.0, 1.0)) as u8;
    let g = (255.0 * color.y.clamp(0.0, 1.0)) as u8;
    let b = (255.0 * color.z.clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Simple image buffer for storing render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major pixels
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|color| color_to_rgba(*color))
            .collect()
    }

    /// Encode the image; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> RenderResult<()> {
        let image = image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(color_to_rgba(self.get(x, y)))
        });
        image.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RenderConfig::default();
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.workers, 16);
        assert_eq!(config.background, Color::splat(0.2));
        assert_eq!(config.build.traversal_cost, 2.0);
        assert_eq!(config.build.intersection_cost, 1.0);
    }

    #[test]
    fn test_color_to_rgba() {
        assert_eq!(color_to_rgba(Color::ONE), [255, 255, 255, 255]);
        assert_eq!(color_to_rgba(Color::ZERO), [0, 0, 0, 255]);
        // Truncated, not rounded, and no gamma
        assert_eq!(color_to_rgba(Color::new(0.5, 0.2, 0.999)), [127, 51, 254, 255]);
    }

    #[test]
    fn test_image_buffer_get_set() {
        let mut image = ImageBuffer::new(3, 2);
        assert_eq!(image.pixels.len(), 6);

        image.set(2, 1, Color::new(1.0, 0.0, 0.0));
        assert_eq!(image.get(2, 1), Color::new(1.0, 0.0, 0.0));
        assert_eq!(image.pixels[5], Color::new(1.0, 0.0, 0.0));
        assert_eq!(image.get(0, 0), Color::ZERO);

        let bytes = image.to_rgba8();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[20..24], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_save_png() {
        let mut image = ImageBuffer::new(4, 4);
        image.set(1, 2, Color::new(0.0, 1.0, 0.0));

        let path = std::env::temp_dir().join(format!("kdray_save_{}.png", std::process::id()));
        image.save(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.get_pixel(1, 2).0, [0, 255, 0, 255]);
        assert_eq!(loaded.get_pixel(0, 0).0, [0, 0, 0, 255]);

        std::fs::remove_file(&path).unwrap();
    }
}
