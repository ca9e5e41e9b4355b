// src/geometry/labeling.rs

use crate::geometry::tessellation::VoronoiCell;
use geo::{Contains, Coord, Point};
use tracing::debug;

/// Heftet Territoriumsnamen an anonyme Zellen: der erste Ankerpunkt, der in
/// einer Zelle liegt, benennt sie. Wächterzellen und Streufragmente bleiben
/// unbeschriftet. Gibt die Anzahl beschrifteter Zellen zurück.
pub fn label_cells(cells: &mut [VoronoiCell], anchor_points: &[(String, Coord<f64>)]) -> usize {
    let mut labeled = 0;
    for cell in cells.iter_mut() {
        for (territory, coord) in anchor_points {
            if cell.polygon.contains(&Point::from(*coord)) {
                cell.label = Some(territory.clone());
                labeled += 1;
                break;
            }
        }
        if cell.label.is_none() {
            debug!(
                "Cell of generator ({}, {}) contains no anchor",
                cell.generator.x, cell.generator.y
            );
        }
    }
    labeled
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon, polygon};

    fn cell(exterior: Polygon<f64>, generator: Coord<f64>) -> VoronoiCell {
        VoronoiCell {
            generator,
            polygon: exterior,
            label: None,
        }
    }

    fn unit_square_at(x0: f64, y0: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + 1.0, y0),
                (x0 + 1.0, y0 + 1.0),
                (x0, y0 + 1.0),
            ]),
            Vec::new(),
        )
    }

    #[test]
    fn test_contained_anchor_labels_cell() {
        let mut cells = vec![
            cell(unit_square_at(0.0, 0.0), Coord { x: 0.5, y: 0.5 }),
            cell(unit_square_at(2.0, 0.0), Coord { x: 2.5, y: 0.5 }),
        ];
        let anchors = vec![
            ("Eastland".to_string(), Coord { x: 2.5, y: 0.5 }),
            ("Westland".to_string(), Coord { x: 0.5, y: 0.5 }),
        ];

        let labeled = label_cells(&mut cells, &anchors);
        assert_eq!(labeled, 2);
        assert_eq!(cells[0].label.as_deref(), Some("Westland"));
        assert_eq!(cells[1].label.as_deref(), Some("Eastland"));
    }

    #[test]
    fn test_outside_anchor_leaves_cell_unlabeled() {
        let mut cells = vec![cell(unit_square_at(0.0, 0.0), Coord { x: 0.5, y: 0.5 })];
        let anchors = vec![("Nowhere".to_string(), Coord { x: 5.0, y: 5.0 })];

        let labeled = label_cells(&mut cells, &anchors);
        assert_eq!(labeled, 0);
        assert!(cells[0].label.is_none());
    }

    #[test]
    fn test_first_matching_anchor_wins() {
        let mut cells = vec![cell(unit_square_at(0.0, 0.0), Coord { x: 0.5, y: 0.5 })];
        let anchors = vec![
            ("First".to_string(), Coord { x: 0.25, y: 0.25 }),
            ("Second".to_string(), Coord { x: 0.75, y: 0.75 }),
        ];

        label_cells(&mut cells, &anchors);
        assert_eq!(cells[0].label.as_deref(), Some("First"));
    }

    #[test]
    fn test_boundary_anchor_does_not_label() {
        // Containment is strict: a point on the cell edge labels nothing.
        let mut cells = vec![cell(
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            Coord { x: 0.5, y: 0.5 },
        )];
        let anchors = vec![("Edge".to_string(), Coord { x: 0.0, y: 0.5 })];

        let labeled = label_cells(&mut cells, &anchors);
        assert_eq!(labeled, 0);
    }
}
