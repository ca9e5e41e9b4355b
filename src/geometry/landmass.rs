// src/geometry/landmass.rs

use crate::config::CellPatch;
use crate::error::{AtlasError, AtlasResult};
use crate::geometry::tessellation::VoronoiCell;
use geo::{Area, BooleanOps, MultiPolygon};
use tracing::{debug, info, warn};

/// Flächen unterhalb dieser Schwelle gelten nach dem Verschnitt als leer
/// (degenerierte Kantenberührungen).
const EMPTY_AREA: f64 = 1e-12;

/// Ein fertiges Territorium: beschriftete, auf Landmasse beschnittene Fläche.
#[derive(Debug, Clone)]
pub struct Territory {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    /// Fläche in Arbeitsebenen-Einheiten (Quadratgrad bzw. Quadratmeter).
    pub area: f64,
}

/// Vereinigt alle Ländergeometrien zu einer Landmasse. Leere Eingabe ergibt
/// eine leere MultiPolygon-Geometrie.
pub fn union_all<'a>(shapes: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> MultiPolygon<f64> {
    let mut iter = shapes.into_iter();
    let Some(first) = iter.next() else {
        return MultiPolygon::new(Vec::new());
    };
    let mut landmass = first.clone();
    for shape in iter {
        landmass = landmass.union(shape);
    }
    landmass
}

/// Verschneidet jede Zelle mit der Landmasse und baut daraus Territorien.
///
/// Beschriftete Zellen werden zu Territorien (gleiche Namen vereinigt),
/// unbeschriftete Fragmente landen in der Patch-Behandlung: in der
/// Patch-Liste benannte Fragmente werden ihrem wahren Besitzer
/// zugeschlagen, alle übrigen mit Warnung verworfen. Wächterzellen ohne
/// Landkontakt verschwinden still.
pub fn carve_territories(
    cells: &[VoronoiCell],
    landmass: &MultiPolygon<f64>,
    patches: &[CellPatch],
) -> AtlasResult<Vec<Territory>> {
    let mut territories: Vec<Territory> = Vec::new();
    let mut orphans: Vec<(usize, MultiPolygon<f64>)> = Vec::new();

    for (index, cell) in cells.iter().enumerate() {
        let cell_shape = MultiPolygon::new(vec![cell.polygon.clone()]);
        let clipped = landmass.intersection(&cell_shape);
        if clipped.0.is_empty() || clipped.unsigned_area() < EMPTY_AREA {
            match &cell.label {
                Some(name) => warn!("Territory {} has no landmass overlap, dropping", name),
                None => debug!("Cell {} has no landmass overlap", index),
            }
            continue;
        }

        match &cell.label {
            Some(name) => match territories.iter_mut().find(|t| &t.name == name) {
                Some(existing) => {
                    existing.geometry = existing.geometry.union(&clipped);
                }
                None => territories.push(Territory {
                    name: name.clone(),
                    geometry: clipped,
                    area: 0.0,
                }),
            },
            None => orphans.push((index, clipped)),
        }
    }

    for patch in patches {
        match orphans.iter().position(|(index, _)| *index == patch.cell) {
            Some(position) => {
                let (_, fragment) = orphans.remove(position);
                let owner = territories
                    .iter_mut()
                    .find(|t| t.name == patch.owner)
                    .ok_or_else(|| AtlasError::UnknownTerritory {
                        name: patch.owner.clone(),
                    })?;
                info!(
                    "Patching orphan cell {} into {} (fragment area {:.6})",
                    patch.cell,
                    patch.owner,
                    fragment.unsigned_area()
                );
                owner.geometry = owner.geometry.union(&fragment);
            }
            None => warn!(
                "Patch for cell {} matches no orphan fragment, ignoring",
                patch.cell
            ),
        }
    }

    for (index, fragment) in &orphans {
        warn!(
            "Dropping unlabeled fragment from cell {} (area {:.6})",
            index,
            fragment.unsigned_area()
        );
    }

    for territory in &mut territories {
        territory.area = territory.geometry.unsigned_area();
    }
    info!(
        "Carved {} territories out of {} cells ({} orphan fragments dropped)",
        territories.len(),
        cells.len(),
        orphans.len()
    );
    Ok(territories)
}
