// src/pipeline.rs

use crate::config::DatasetConfig;
use crate::dataset::{Anchor, CountryShape, load_anchors, load_boundaries, shape_count};
use crate::error::AtlasResult;
use crate::geometry::{
    MapProjection, SeedPoint, Territory, carve_territories, extract_cells, label_cells, union_all,
};
use crate::render::{DebugScene, render_map, save_png, write_debug_svg};
use geo::Coord;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ergebnis eines Pipeline-Laufs bis einschließlich Landmassen-Verschnitt.
/// Territorien liegen wieder in Grad; Flächen in Arbeitsebenen-Einheiten.
#[derive(Debug)]
pub struct Atlas {
    pub anchors: Vec<Anchor>,
    pub boundaries: Vec<CountryShape>,
    pub territories: Vec<Territory>,
    /// Anzahl geschlossener Zellen der Tessellation.
    pub cell_count: usize,
    /// Davon über Ankerpunkte beschriftet.
    pub labeled_count: usize,
}

/// Führt einen Datensatz durch die komplette Pipeline: Laden, Projektion,
/// Tessellation, Beschriftung, Verschnitt, Patches und Rendern.
pub struct MapBuilder {
    config: DatasetConfig,
    debug_svg: Option<PathBuf>,
}

impl MapBuilder {
    pub fn new(config: DatasetConfig) -> Self {
        Self {
            config,
            debug_svg: None,
        }
    }

    /// Zusätzlich ein Diagnose-SVG der Zwischenschritte schreiben.
    pub fn with_debug_svg(mut self, path: Option<PathBuf>) -> Self {
        self.debug_svg = path;
        self
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Rechnet den Datensatz bis zu den fertigen Territorien durch.
    pub fn build(&self) -> AtlasResult<Atlas> {
        let config = &self.config;
        info!("Building dataset {}", config.name);

        let anchors = load_anchors(&config.anchors)?;
        let boundaries = load_boundaries(&config.boundaries)?;
        let projection = MapProjection::new(config.projection);

        // Saatpunkte: tessellierende Anker plus Wächterpunkte, beide in der
        // Arbeitsebene. Die Reihenfolge bestimmt die Zellindizes der Patches.
        let mut seeds: Vec<SeedPoint> = Vec::with_capacity(anchors.len() + config.sentinels.len());
        for anchor in anchors.iter().filter(|a| a.seeds_tessellation) {
            let projected = projection.project(anchor.lon, anchor.lat)?;
            seeds.push(SeedPoint::new(projected.x, projected.y));
        }
        for sentinel in &config.sentinels {
            let projected = projection.project(sentinel[0], sentinel[1])?;
            seeds.push(SeedPoint::new(projected.x, projected.y));
        }
        debug!(
            "Seeding tessellation with {} anchors and {} sentinels",
            seeds.len() - config.sentinels.len(),
            config.sentinels.len()
        );

        let mut cells = extract_cells(&seeds)?;
        let cell_count = cells.len();

        // Beschriftung über Enthaltensein: alle Anker zählen, auch die vom
        // Tessellieren ausgeschlossenen.
        let mut anchor_points: Vec<(String, Coord<f64>)> = Vec::with_capacity(anchors.len());
        for anchor in &anchors {
            let projected = projection.project(anchor.lon, anchor.lat)?;
            anchor_points.push((anchor.territory.clone(), projected));
        }
        let labeled_count = label_cells(&mut cells, &anchor_points);
        info!(
            "Labeled {} of {} closed cells via anchor containment",
            labeled_count, cell_count
        );

        let mut projected_shapes = Vec::with_capacity(boundaries.len());
        for shape in &boundaries {
            projected_shapes.push(projection.project_multi(&shape.geometry)?);
        }
        let landmass = union_all(projected_shapes.iter());
        debug!(
            "Unioned {} boundary features ({} polygons) into landmass",
            boundaries.len(),
            shape_count(&boundaries)
        );

        let mut territories = carve_territories(&cells, &landmass, &config.patches)?;

        if let Some(path) = &self.debug_svg {
            let scene = DebugScene {
                landmass: &landmass,
                cells: &cells,
                territories: &territories,
                seeds: &anchor_points,
            };
            write_debug_svg(path, &scene)?;
        }

        // Zurück nach Grad fürs Rendern; Flächen bleiben Arbeitsebene.
        for territory in &mut territories {
            territory.geometry = projection.unproject_multi(&territory.geometry);
        }

        Ok(Atlas {
            anchors,
            boundaries,
            territories,
            cell_count,
            labeled_count,
        })
    }

    /// Rendert einen gebauten Atlas als PNG an den konfigurierten Pfad.
    pub fn render(&self, atlas: &Atlas) -> AtlasResult<PathBuf> {
        let outlines: Vec<&geo::MultiPolygon<f64>> = atlas
            .boundaries
            .iter()
            .map(|shape| &shape.geometry)
            .collect();
        let image = render_map(
            &atlas.territories,
            &atlas.anchors,
            &outlines,
            &self.config.render,
        )?;
        save_png(&image, &self.config.output)?;
        Ok(self.config.output.clone())
    }
}

/// Komplettlauf eines Datensatzes von der Konfigurationsdatei bis zum Bild.
pub fn run_dataset(
    config_path: &Path,
    output_override: Option<PathBuf>,
    debug_svg: Option<PathBuf>,
) -> AtlasResult<PathBuf> {
    let mut config = DatasetConfig::from_path(config_path)?;
    if let Some(output) = output_override {
        config = config.with_output(output);
    }
    let builder = MapBuilder::new(config).with_debug_svg(debug_svg);
    let atlas = builder.build()?;
    builder.render(&atlas)
}
