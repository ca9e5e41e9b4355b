// src/main.rs

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Eigene Module deklarieren
pub mod config;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod render;

use config::DatasetConfig;
use pipeline::MapBuilder;

#[derive(Parser)]
#[command(name = "voronoi_atlas")]
#[command(about = "Render Voronoi partition maps from named anchor points and country boundaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a dataset and render it as a PNG map.
    Render {
        /// Dataset description (JSON).
        #[arg(long)]
        config: PathBuf,

        /// Override the output path from the dataset description.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also write an SVG overlay of the intermediate geometry.
        #[arg(long)]
        debug_svg: Option<PathBuf>,
    },

    /// Build a dataset and print its territories without rendering.
    Inspect {
        /// Dataset description (JSON).
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            config,
            out,
            debug_svg,
        } => run_render(&config, out, debug_svg),
        Commands::Inspect { config } => run_inspect(&config),
    }
}

fn run_render(
    config_path: &Path,
    out: Option<PathBuf>,
    debug_svg: Option<PathBuf>,
) -> anyhow::Result<()> {
    let output = pipeline::run_dataset(config_path, out, debug_svg)
        .with_context(|| format!("rendering dataset {}", config_path.display()))?;
    tracing::info!("Map written to {}", output.display());
    Ok(())
}

fn run_inspect(config_path: &Path) -> anyhow::Result<()> {
    let config = DatasetConfig::from_path(config_path)
        .with_context(|| format!("loading dataset {}", config_path.display()))?;
    let unit = match config.projection {
        config::ProjectionKind::PlateCarree => "deg^2",
        config::ProjectionKind::WorldMercator => "m^2",
    };
    let atlas = MapBuilder::new(config)
        .build()
        .with_context(|| format!("building dataset {}", config_path.display()))?;

    println!(
        "{} anchors, {} boundary shapes",
        atlas.anchors.len(),
        atlas.boundaries.len()
    );
    println!(
        "{} closed cells, {} labeled by anchor containment",
        atlas.cell_count, atlas.labeled_count
    );
    println!("{} territories:", atlas.territories.len());

    let mut ranked: Vec<_> = atlas.territories.iter().collect();
    ranked.sort_by(|a, b| {
        b.area
            .partial_cmp(&a.area)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for territory in ranked {
        println!(
            "  {:<28} {:>16.3} {}  ({} parts)",
            territory.name,
            territory.area,
            unit,
            territory.geometry.0.len()
        );
    }
    Ok(())
}
