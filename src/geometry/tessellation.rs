// src/geometry/tessellation.rs

use crate::error::{AtlasError, AtlasResult};
use crate::geometry::{EPSILON, SeedPoint};
use geo::{Area, Coord, LineString, Polygon};
use spade::{DelaunayTriangulation, Triangulation};
use tracing::debug;

/// Eine geschlossene Voronoi-Zelle der Arbeitsebene. Die Beschriftung wird
/// erst nachträglich über Punkt-Enthaltensein vergeben.
#[derive(Debug, Clone)]
pub struct VoronoiCell {
    /// Saatpunkt, der diese Zelle erzeugt hat.
    pub generator: Coord<f64>,
    /// Zellgrenze in CCW-Reihenfolge.
    pub polygon: Polygon<f64>,
    /// Territorium, dessen Anker in der Zelle liegt; `None` für Wächter-
    /// und Streuzellen.
    pub label: Option<String>,
}

impl VoronoiCell {
    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }
}

/// Extrahiert alle geschlossenen Voronoi-Zellen der Saatpunkte.
///
/// Zellen, deren Generator auf der konvexen Hülle liegt, sind unbegrenzt und
/// werden verworfen; die Wächterpunkte des Datensatzes sorgen dafür, dass
/// davon nur sie selbst betroffen sind. Die Reihenfolge der Zellen folgt der
/// stabilen Einfügereihenfolge der Saatpunkte.
pub fn extract_cells(seeds: &[SeedPoint]) -> AtlasResult<Vec<VoronoiCell>> {
    if seeds.len() < 3 {
        return Err(AtlasError::InsufficientAnchors {
            expected: 3,
            actual: seeds.len(),
        });
    }

    let triangulation = DelaunayTriangulation::<SeedPoint>::bulk_load_stable(seeds.to_vec())
        .map_err(|err| AtlasError::TriangulationFailed {
            reason: format!("bulk load of {} seed points failed: {err:?}", seeds.len()),
        })?;
    debug!(
        "Delaunay triangulation with {} vertices and {} inner faces",
        triangulation.num_vertices(),
        triangulation.num_inner_faces()
    );

    let mut cells = Vec::with_capacity(triangulation.num_vertices());
    for vertex in triangulation.vertices() {
        let generator = vertex.position();
        let mut circumcenters: Vec<SeedPoint> = Vec::new();
        let mut touches_hull = false;

        for edge in vertex.out_edges() {
            let face = edge.face();
            if face.is_outer() {
                touches_hull = true;
            } else if let Some(inner) = face.as_inner() {
                circumcenters.push(inner.circumcenter());
            }
        }

        if touches_hull {
            debug!(
                "Discarding unbounded cell of generator ({}, {})",
                generator.x, generator.y
            );
            continue;
        }

        let Some(ring) = close_cell_ring(&circumcenters, &generator) else {
            debug!(
                "Discarding degenerate cell of generator ({}, {}) with {} circumcenters",
                generator.x,
                generator.y,
                circumcenters.len()
            );
            continue;
        };

        cells.push(VoronoiCell {
            generator: Coord {
                x: generator.x,
                y: generator.y,
            },
            polygon: Polygon::new(LineString::from(ring), Vec::new()),
            label: None,
        });
    }

    if cells.is_empty() {
        return Err(AtlasError::EmptyTessellation);
    }
    debug!("Extracted {} closed Voronoi cells", cells.len());
    Ok(cells)
}

/// Ordnet Umkreismittelpunkte winkelmäßig um den Generator und entfernt
/// Beinahe-Duplikate. Ergebnis ist ein einfacher CCW-Ring oder `None`,
/// wenn weniger als drei verschiedene Eckpunkte übrig bleiben.
fn close_cell_ring(circumcenters: &[SeedPoint], generator: &SeedPoint) -> Option<Vec<Coord<f64>>> {
    if circumcenters.len() < 3 {
        return None;
    }

    let mut ordered = circumcenters.to_vec();
    ordered.sort_unstable_by(|a, b| {
        let angle_a = (a.y - generator.y).atan2(a.x - generator.x);
        let angle_b = (b.y - generator.y).atan2(b.x - generator.x);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Duplikat-Toleranz skaliert mit der Koordinatengröße (Grad vs. Meter).
    let scale = generator.x.abs().max(generator.y.abs()).max(1.0);
    let tolerance = EPSILON.max(scale * 1e-12);
    let tolerance_sq = tolerance * tolerance;

    let mut ring: Vec<Coord<f64>> = Vec::with_capacity(ordered.len());
    for point in &ordered {
        let coord = Coord {
            x: point.x,
            y: point.y,
        };
        if let Some(last) = ring.last() {
            let dx = coord.x - last.x;
            let dy = coord.y - last.y;
            if dx * dx + dy * dy < tolerance_sq {
                continue;
            }
        }
        ring.push(coord);
    }
    // Wraparound: erster und letzter Punkt dürfen nicht zusammenfallen.
    if ring.len() >= 2 {
        let first = ring[0];
        let last = ring[ring.len() - 1];
        let dx = first.x - last.x;
        let dy = first.y - last.y;
        if dx * dx + dy * dy < tolerance_sq {
            ring.pop();
        }
    }

    if ring.len() < 3 { None } else { Some(ring) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Contains;
    use geo::Point;

    fn seed(x: f64, y: f64) -> SeedPoint {
        SeedPoint::new(x, y)
    }

    #[test]
    fn test_too_few_seeds_rejected() {
        let result = extract_cells(&[seed(0.0, 0.0), seed(1.0, 0.0)]);
        assert!(matches!(
            result,
            Err(AtlasError::InsufficientAnchors {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_interior_generator_gets_closed_cell() {
        // Four corner seeds and one in the middle: only the middle cell is
        // bounded, and it is the diamond spanned by the edge midpoints.
        let seeds = vec![
            seed(0.0, 0.0),
            seed(2.0, 0.0),
            seed(2.0, 2.0),
            seed(0.0, 2.0),
            seed(1.0, 1.0),
        ];
        let cells = extract_cells(&seeds).unwrap();
        assert_eq!(cells.len(), 1);

        let cell = &cells[0];
        assert_eq!(cell.generator, Coord { x: 1.0, y: 1.0 });
        assert!(cell.label.is_none());
        assert!(cell.polygon.contains(&Point::new(1.0, 1.0)));
        assert!((cell.area() - 2.0).abs() < 1e-9);
        // Closed exterior ring repeats the first coordinate
        assert_eq!(cell.polygon.exterior().0.len() - 1, 4);
    }

    #[test]
    fn test_sentinel_ring_closes_all_inner_cells() {
        // Three real seeds surrounded by four far-away sentinels: every real
        // seed must end up with a closed cell containing it.
        let mut seeds = vec![seed(0.0, 0.0), seed(1.0, 0.2), seed(0.4, 1.0)];
        let real = seeds.clone();
        seeds.extend([
            seed(-50.0, -50.0),
            seed(50.0, -50.0),
            seed(50.0, 50.0),
            seed(-50.0, 50.0),
        ]);

        let cells = extract_cells(&seeds).unwrap();
        assert_eq!(cells.len(), 3);
        for point in &real {
            let hit = cells
                .iter()
                .filter(|cell| cell.polygon.contains(&Point::new(point.x, point.y)))
                .count();
            assert_eq!(hit, 1, "seed ({}, {}) not covered once", point.x, point.y);
        }
    }

    #[test]
    fn test_cells_keep_stable_seed_order() {
        let seeds = vec![
            seed(0.0, 0.1),
            seed(1.0, 0.0),
            seed(0.5, 0.9),
            seed(-20.0, -20.0),
            seed(20.0, -20.0),
            seed(20.0, 20.0),
            seed(-20.0, 20.0),
        ];
        let cells = extract_cells(&seeds).unwrap();
        let generators: Vec<_> = cells.iter().map(|cell| cell.generator).collect();
        assert_eq!(
            generators,
            vec![
                Coord { x: 0.0, y: 0.1 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 0.5, y: 0.9 },
            ]
        );
    }

    #[test]
    fn test_close_cell_ring_orders_and_dedups() {
        let generator = seed(0.0, 0.0);
        // Shuffled square corners with one duplicate
        let circumcenters = vec![
            seed(1.0, 1.0),
            seed(-1.0, -1.0),
            seed(1.0, -1.0),
            seed(1.0, -1.0),
            seed(-1.0, 1.0),
        ];
        let ring = close_cell_ring(&circumcenters, &generator).unwrap();
        assert_eq!(ring.len(), 4);
        // CCW order starting from the smallest angle (third quadrant first)
        assert_eq!(ring[0], Coord { x: -1.0, y: -1.0 });
        assert_eq!(ring[1], Coord { x: 1.0, y: -1.0 });
        assert_eq!(ring[2], Coord { x: 1.0, y: 1.0 });
        assert_eq!(ring[3], Coord { x: -1.0, y: 1.0 });
    }

    #[test]
    fn test_close_cell_ring_rejects_degenerate_input() {
        let generator = seed(0.0, 0.0);
        assert!(close_cell_ring(&[seed(1.0, 0.0), seed(0.0, 1.0)], &generator).is_none());
        // Three points collapsing onto one another
        let collapsed = vec![seed(1.0, 1.0), seed(1.0, 1.0), seed(1.0, 1.0)];
        assert!(close_cell_ring(&collapsed, &generator).is_none());
    }
}
