//! Parallel per-pixel rendering.
//!
//! One job per pixel in row-major order, drained by a fixed-size rayon
//! pool. Each job owns exactly one cell of the output buffer, so the
//! buffer needs no locking.

use kdray_core::{Color, Viewport};

use crate::integrator::Integrator;
use crate::renderer::{ImageBuffer, RenderResult};

/// A unit of render work: one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelJob {
    pub x: u32,
    pub y: u32,
    /// Multi-sample request. Not implemented: flagged jobs still trace a
    /// single ray through the pixel center.
    pub antialiasing: bool,
}

impl PixelJob {
    pub fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            antialiasing: false,
        }
    }

    /// Job for the `index`-th pixel of a row-major image of `width` columns.
    pub fn from_index(index: usize, width: u32) -> Self {
        let width = width as usize;
        Self::new((index % width) as u32, (index / width) as u32)
    }
}

/// Trace the pixel a job stands for.
pub fn render_job(integrator: &Integrator<'_>, viewport: &Viewport, job: PixelJob) -> Color {
    integrator.trace_ray(&viewport.primary_ray(job.x, job.y))
}

/// Render every pixel of `viewport` on a pool of `workers` threads.
pub fn render_parallel(
    integrator: &Integrator<'_>,
    viewport: &Viewport,
    workers: usize,
) -> RenderResult<ImageBuffer> {
    use rayon::prelude::*;

    let mut image = ImageBuffer::new(viewport.width, viewport.height);
    if image.pixels.is_empty() {
        return Ok(image);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("kdray-render-{i}"))
        .build()?;

    let width = viewport.width;
    pool.install(|| {
        image
            .pixels
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, pixel)| {
                *pixel = render_job(integrator, viewport, PixelJob::from_index(index, width));
            });
    });

    Ok(image)
}
