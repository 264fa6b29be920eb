//! kdray - render a scene description to a PNG.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use kdray_renderer::{RenderConfig, Scene};

#[derive(Parser, Debug)]
#[command(name = "kdray")]
#[command(about = "KD-tree accelerated ray tracer", long_about = None)]
struct Cli {
    /// Scene description (JSON) to render
    #[arg(short, long)]
    config: PathBuf,

    /// Output image (format determined by extension)
    #[arg(short, long, default_value = "results/res.png")]
    output: PathBuf,

    /// Number of render worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Maximum reflection/refraction depth
    #[arg(long)]
    max_depth: Option<usize>,
}

impl Cli {
    fn render_config(&self) -> RenderConfig {
        let mut config = RenderConfig::default();
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    log::info!("Loading scene {}", cli.config.display());
    let description = kdray_core::load_scene(&cli.config)
        .with_context(|| format!("failed to load scene {}", cli.config.display()))?;

    let mut scene = Scene::from_description(&description, cli.render_config());
    let build_time = scene.tree().build_time().as_secs_f64();
    println!("Initialisation time: {build_time:.4}s");

    let start = Instant::now();
    let image = scene.render().context("render failed")?;
    println!("Render time: {:.4}s", start.elapsed().as_secs_f64());

    ensure_parent_dir(&cli.output)?;
    image
        .save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    log::info!("Saved {}", cli.output.display());

    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display())),
        _ => Ok(()),
    }
}
