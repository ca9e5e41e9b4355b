// src/dataset/anchors.rs

use crate::config::{AnchorConfig, AnchorFormat};
use crate::error::{AtlasError, AtlasResult};
use tracing::{debug, info, warn};

/// Ein benannter Ankerpunkt in Grad-Koordinaten.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    /// Territorium, das dieser Anker beschriftet (Land oder Stadtgebiet).
    pub territory: String,
    /// Anzeigename des Punktes (Hauptstadt bzw. Stadt).
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    /// Dient der Punkt als Saatpunkt der Tessellation?
    pub seeds_tessellation: bool,
}

impl Anchor {
    pub fn new(territory: &str, name: &str, lon: f64, lat: f64) -> Self {
        Self {
            territory: territory.to_string(),
            name: name.to_string(),
            lon,
            lat,
            seeds_tessellation: true,
        }
    }
}

/// Lädt die Ankerliste eines Datensatzes und wendet Overrides und
/// Tessellations-Ausschlüsse an. Die Dateireihenfolge bleibt erhalten.
pub fn load_anchors(config: &AnchorConfig) -> AtlasResult<Vec<Anchor>> {
    let raw = std::fs::read_to_string(&config.path).map_err(|source| AtlasError::DatasetIo {
        path: config.path.clone(),
        source,
    })?;

    let mut anchors = Vec::new();
    for (line_number, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed = match config.format {
            AnchorFormat::Capitals => parse_capitals_line(line, config.continent.as_deref()),
            AnchorFormat::Cities => parse_cities_line(line),
        };
        match parsed {
            LineResult::Anchor(anchor) => anchors.push(anchor),
            LineResult::Filtered => {}
            LineResult::Malformed(reason) => {
                warn!(
                    "Skipping malformed anchor line {} in {}: {}",
                    line_number + 1,
                    config.path.display(),
                    reason
                );
            }
        }
    }

    apply_overrides(&mut anchors, config);
    mark_exclusions(&mut anchors, config);

    info!(
        "Loaded {} anchors from {} ({} seeding the tessellation)",
        anchors.len(),
        config.path.display(),
        anchors.iter().filter(|a| a.seeds_tessellation).count()
    );
    Ok(anchors)
}

enum LineResult {
    Anchor(Anchor),
    Filtered,
    Malformed(String),
}

/// CSV-Zeile `Land,Hauptstadt,lat,lon,...,Kontinent`. Das Kontinent-Feld
/// steht am Zeilenende; dazwischen dürfen weitere Spalten liegen.
fn parse_capitals_line(line: &str, continent: Option<&str>) -> LineResult {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 5 {
        return LineResult::Malformed(format!("expected at least 5 fields, got {}", fields.len()));
    }
    if let Some(wanted) = continent {
        let last = fields[fields.len() - 1];
        if last != wanted {
            return LineResult::Filtered;
        }
    }
    let lat = match fields[2].parse::<f64>() {
        Ok(value) => value,
        Err(_) => return LineResult::Malformed(format!("latitude `{}` is not a number", fields[2])),
    };
    let lon = match fields[3].parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            return LineResult::Malformed(format!("longitude `{}` is not a number", fields[3]));
        }
    };
    LineResult::Anchor(Anchor::new(fields[0], fields[1], lon, lat))
}

/// Zeile der Form `Name, (lat, lon)`; Stadtname dient zugleich als
/// Territoriumsname.
fn parse_cities_line(line: &str) -> LineResult {
    let open = match line.find('(') {
        Some(index) => index,
        None => return LineResult::Malformed("missing `(`".to_string()),
    };
    let close = match line.rfind(')') {
        Some(index) if index > open => index,
        _ => return LineResult::Malformed("missing `)`".to_string()),
    };
    let name = line[..open].trim_end_matches([',', ' ']).trim();
    if name.is_empty() {
        return LineResult::Malformed("empty name".to_string());
    }
    let coords: Vec<&str> = line[open + 1..close].split(',').map(str::trim).collect();
    if coords.len() != 2 {
        return LineResult::Malformed(format!("expected 2 coordinates, got {}", coords.len()));
    }
    let lat = match coords[0].parse::<f64>() {
        Ok(value) => value,
        Err(_) => return LineResult::Malformed(format!("latitude `{}` is not a number", coords[0])),
    };
    let lon = match coords[1].parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            return LineResult::Malformed(format!("longitude `{}` is not a number", coords[1]));
        }
    };
    LineResult::Anchor(Anchor::new(name, name, lon, lat))
}

/// Ersetzt vorhandene Anker gleichen Territoriums oder hängt neue an.
fn apply_overrides(anchors: &mut Vec<Anchor>, config: &AnchorConfig) {
    for entry in &config.overrides {
        match anchors
            .iter_mut()
            .find(|anchor| anchor.territory == entry.territory)
        {
            Some(existing) => {
                debug!(
                    "Overriding anchor for {}: {} at ({}, {})",
                    entry.territory, entry.anchor, entry.lon, entry.lat
                );
                existing.name = entry.anchor.clone();
                existing.lon = entry.lon;
                existing.lat = entry.lat;
            }
            None => {
                debug!(
                    "Adding anchor override for {}: {} at ({}, {})",
                    entry.territory, entry.anchor, entry.lon, entry.lat
                );
                anchors.push(Anchor::new(
                    &entry.territory,
                    &entry.anchor,
                    entry.lon,
                    entry.lat,
                ));
            }
        }
    }
}

fn mark_exclusions(anchors: &mut [Anchor], config: &AnchorConfig) {
    for excluded in &config.exclude_from_tessellation {
        let mut found = false;
        for anchor in anchors.iter_mut() {
            if &anchor.territory == excluded || &anchor.name == excluded {
                anchor.seeds_tessellation = false;
                found = true;
            }
        }
        if !found {
            warn!("Tessellation exclusion `{}` matches no anchor", excluded);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnchorOverride;
    use std::path::PathBuf;

    fn capitals_config() -> AnchorConfig {
        AnchorConfig {
            path: PathBuf::from("unused.txt"),
            format: AnchorFormat::Capitals,
            continent: Some("Europe".to_string()),
            overrides: Vec::new(),
            exclude_from_tessellation: Vec::new(),
        }
    }

    #[test]
    fn test_capitals_line_parses_and_filters() {
        // Continent matches
        match parse_capitals_line("France,Paris,48.8566,2.3522,FR,Europe", Some("Europe")) {
            LineResult::Anchor(anchor) => {
                assert_eq!(anchor.territory, "France");
                assert_eq!(anchor.name, "Paris");
                assert!((anchor.lat - 48.8566).abs() < 1e-9);
                assert!((anchor.lon - 2.3522).abs() < 1e-9);
                assert!(anchor.seeds_tessellation);
            }
            _ => panic!("expected anchor"),
        }

        // Continent mismatch is filtered, not malformed
        match parse_capitals_line("Japan,Tokyo,35.6762,139.6503,JP,Asia", Some("Europe")) {
            LineResult::Filtered => {}
            _ => panic!("expected filtered line"),
        }
    }

    #[test]
    fn test_capitals_line_rejects_bad_numbers() {
        match parse_capitals_line("France,Paris,abc,2.3522,FR,Europe", Some("Europe")) {
            LineResult::Malformed(_) => {}
            _ => panic!("expected malformed line"),
        }
    }

    #[test]
    fn test_cities_line_parses_parenthesized_pair() {
        match parse_cities_line("Istanbul, (41.0082, 28.9784)") {
            LineResult::Anchor(anchor) => {
                assert_eq!(anchor.territory, "Istanbul");
                assert_eq!(anchor.name, "Istanbul");
                assert!((anchor.lat - 41.0082).abs() < 1e-9);
                assert!((anchor.lon - 28.9784).abs() < 1e-9);
            }
            _ => panic!("expected anchor"),
        }
    }

    #[test]
    fn test_cities_line_handles_missing_parens() {
        match parse_cities_line("Istanbul, 41.0 28.9") {
            LineResult::Malformed(_) => {}
            _ => panic!("expected malformed line"),
        }
    }

    #[test]
    fn test_override_replaces_in_place_and_appends() {
        let mut anchors = vec![
            Anchor::new("Italy", "Rome", 12.4964, 41.9028),
            Anchor::new("Vatican", "Vatican City", 12.4964, 41.9028),
        ];
        let mut config = capitals_config();
        config.overrides = vec![
            AnchorOverride {
                territory: "Vatican".to_string(),
                anchor: "Vatican".to_string(),
                lat: 41.9022,
                lon: 12.4539,
            },
            AnchorOverride {
                territory: "Kosovo".to_string(),
                anchor: "Pristina".to_string(),
                lat: 42.6629,
                lon: 21.1655,
            },
        ];

        apply_overrides(&mut anchors, &config);
        assert_eq!(anchors.len(), 3);
        // Replacement keeps position 1
        assert_eq!(anchors[1].name, "Vatican");
        assert!((anchors[1].lon - 12.4539).abs() < 1e-9);
        // Unknown territory appended at the end
        assert_eq!(anchors[2].territory, "Kosovo");
    }

    #[test]
    fn test_exclusion_clears_seed_flag() {
        let mut anchors = vec![
            Anchor::new("Italy", "Rome", 12.4964, 41.9028),
            Anchor::new("Vatican", "Vatican", 12.4539, 41.9022),
        ];
        let mut config = capitals_config();
        config.exclude_from_tessellation = vec!["Vatican".to_string()];

        mark_exclusions(&mut anchors, &config);
        assert!(anchors[0].seeds_tessellation);
        assert!(!anchors[1].seeds_tessellation);
    }
}
