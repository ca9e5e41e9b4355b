// src/dataset/boundaries.rs

use crate::config::{BoundaryConfig, BoundaryFilter};
use crate::error::{AtlasError, AtlasResult};
use geo::MultiPolygon;
use geojson::{FeatureCollection, GeoJson};
use tracing::{debug, info, warn};

/// Ein Länder-Feature aus den Verwaltungsgrenzen.
#[derive(Debug, Clone)]
pub struct CountryShape {
    pub name: String,
    pub sovereign: String,
    pub continent: String,
    pub region: String,
    pub geometry: MultiPolygon<f64>,
}

/// Lädt eine GeoJSON-FeatureCollection mit Landesgrenzen und wendet die
/// Auswahlregeln des Datensatzes an. Feature-Properties werden in Natural-
/// Earth-Schreibweise (gross oder klein) akzeptiert.
pub fn load_boundaries(config: &BoundaryConfig) -> AtlasResult<Vec<CountryShape>> {
    let raw = std::fs::read_to_string(&config.path).map_err(|source| AtlasError::DatasetIo {
        path: config.path.clone(),
        source,
    })?;
    let geojson: GeoJson = raw.parse().map_err(|err: geojson::Error| AtlasError::DatasetParse {
        path: config.path.clone(),
        reason: err.to_string(),
    })?;
    let collection: FeatureCollection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(AtlasError::DatasetParse {
                path: config.path.clone(),
                reason: "expected a FeatureCollection".to_string(),
            });
        }
    };

    let mut shapes = Vec::new();
    for feature in collection.features {
        let name = property_string(&feature, &["name", "NAME", "ADMIN"]);
        let sovereign = property_string(&feature, &["sovereignt", "SOVEREIGNT"]);
        let continent = property_string(&feature, &["continent", "CONTINENT"]);
        let region = property_string(&feature, &["region_wb", "REGION_WB"]);

        let Some(name) = name else {
            warn!("Skipping boundary feature without a name property");
            continue;
        };
        let sovereign = sovereign.unwrap_or_else(|| name.clone());
        let continent = continent.unwrap_or_default();
        let region = region.unwrap_or_default();

        if !config.filter.keeps(&name, &sovereign, &continent, &region) {
            continue;
        }

        let Some(geometry) = feature.geometry else {
            warn!("Skipping boundary feature {} without geometry", name);
            continue;
        };
        let geometry = match geo::Geometry::<f64>::try_from(geometry.value) {
            Ok(geo::Geometry::Polygon(polygon)) => MultiPolygon::new(vec![polygon]),
            Ok(geo::Geometry::MultiPolygon(multi)) => multi,
            Ok(_) => {
                warn!("Skipping boundary feature {}: not a polygon", name);
                continue;
            }
            Err(err) => {
                warn!("Skipping boundary feature {}: {}", name, err);
                continue;
            }
        };

        shapes.push(CountryShape {
            name,
            sovereign,
            continent,
            region,
            geometry,
        });
    }

    if shapes.is_empty() {
        return Err(AtlasError::DatasetParse {
            path: config.path.clone(),
            reason: "no boundary features left after filtering".to_string(),
        });
    }
    info!(
        "Loaded {} boundary features from {}",
        shapes.len(),
        config.path.display()
    );
    Ok(shapes)
}

impl BoundaryFilter {
    /// Entscheidet, ob ein Feature in den Datensatz aufgenommen wird.
    pub fn keeps(&self, name: &str, sovereign: &str, continent: &str, region: &str) -> bool {
        let unfiltered =
            self.continents.is_empty() && self.regions.is_empty() && self.include.is_empty();
        let selected = unfiltered
            || self.continents.iter().any(|c| c == continent)
            || self.regions.iter().any(|r| r == region)
            || self.include.iter().any(|n| n == name);
        if !selected {
            return false;
        }
        if self.sovereign_only && name != sovereign {
            let excepted = self
                .sovereign_exceptions
                .iter()
                .any(|fragment| sovereign.contains(fragment));
            if !excepted {
                debug!("Skipping dependent territory {} (sovereign {})", name, sovereign);
                return false;
            }
        }
        true
    }
}

fn property_string(feature: &geojson::Feature, keys: &[&str]) -> Option<String> {
    let properties = feature.properties.as_ref()?;
    for key in keys {
        if let Some(value) = properties.get(*key).and_then(|v| v.as_str()) {
            return Some(value.to_string());
        }
    }
    None
}

/// Anzahl der Einzelpolygone über alle Features (für Diagnoseausgaben).
pub fn shape_count(shapes: &[CountryShape]) -> usize {
    shapes.iter().map(|shape| shape.geometry.0.len()).sum()
}
