// src/render/svg.rs

use crate::error::{AtlasError, AtlasResult};
use crate::geometry::landmass::Territory;
use crate::geometry::tessellation::VoronoiCell;
use crate::render::palette::{self, Rgb};
use geo::{BoundingRect, Coord, LineString, MultiPolygon};
use std::path::Path;
use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Path as SvgPath, Style};
use tracing::info;

/// Diagnose-Overlay der Zwischenschritte als SVG: Landmasse, rohe Zellen,
/// beschnittene Territorien und Saatpunkte. Alle Eingaben liegen in
/// Arbeitsebenen-Koordinaten; die Y-Achse wird fürs Zeichnen gespiegelt.
pub struct DebugScene<'a> {
    pub landmass: &'a MultiPolygon<f64>,
    pub cells: &'a [VoronoiCell],
    pub territories: &'a [Territory],
    pub seeds: &'a [(String, Coord<f64>)],
}

pub fn write_debug_svg(path: &Path, scene: &DebugScene<'_>) -> AtlasResult<()> {
    let Some(bounds) = scene.landmass.bounding_rect() else {
        return Err(AtlasError::GeometricFailure {
            operation: "debug SVG of an empty landmass".to_string(),
        });
    };
    let pad_x = bounds.width() * 0.05;
    let pad_y = bounds.height() * 0.05;
    let min_x = bounds.min().x - pad_x;
    let width = bounds.width() + 2.0 * pad_x;
    // Y gespiegelt: viewBox-Minimum ist das negierte Maximum.
    let min_y = -(bounds.max().y + pad_y);
    let height = bounds.height() + 2.0 * pad_y;
    let stroke = (width + height) / 2.0 * 0.002;
    let seed_radius = (width + height) / 2.0 * 0.004;

    let style = Style::new(format!(
        ".landmass {{ fill: #e8e4d8; stroke: #999999; stroke-width: {stroke:.6}; }}\n\
         .raw-cell {{ fill: none; stroke: #cc8800; stroke-width: {stroke:.6}; stroke-dasharray: {dash:.6}; }}\n\
         .territory {{ stroke: #333333; stroke-width: {stroke:.6}; fill-opacity: 0.65; }}\n\
         .seed {{ fill: #000000; }}",
        stroke = stroke,
        dash = stroke * 3.0,
    ));

    let mut document = Document::new()
        .set(
            "viewBox",
            format!("{min_x:.6} {min_y:.6} {width:.6} {height:.6}"),
        )
        .add(style);

    document = document.add(multi_polygon_path(scene.landmass).set("class", "landmass"));

    for cell in scene.cells {
        document = document.add(ring_path(cell.polygon.exterior()).set("class", "raw-cell"));
    }

    let colors = territory_palette(scene.territories.len());
    for (territory, color) in scene.territories.iter().zip(colors) {
        document = document.add(
            multi_polygon_path(&territory.geometry)
                .set("class", "territory")
                .set("fill", palette::to_hex(color)),
        );
    }

    for (_, seed) in scene.seeds {
        document = document.add(
            Circle::new()
                .set("cx", format!("{:.6}", seed.x))
                .set("cy", format!("{:.6}", -seed.y))
                .set("r", format!("{seed_radius:.6}"))
                .set("class", "seed"),
        );
    }

    svg::save(path, &document).map_err(|err| AtlasError::RenderFailure {
        reason: format!("could not write {}: {err}", path.display()),
    })?;
    info!("Wrote debug SVG to {}", path.display());
    Ok(())
}

/// Zyklische Füllfarben des Overlays (unabhängig von der Karten-Palette).
fn territory_palette(count: usize) -> Vec<Rgb> {
    (0..count)
        .map(|index| palette::cycle(crate::config::ColormapKind::Tab20, index))
        .collect()
}

fn multi_polygon_path(multi: &MultiPolygon<f64>) -> SvgPath {
    let mut data = Data::new();
    for polygon in &multi.0 {
        data = append_ring(data, polygon.exterior());
        for interior in polygon.interiors() {
            data = append_ring(data, interior);
        }
    }
    SvgPath::new().set("fill-rule", "evenodd").set("d", data)
}

fn ring_path(ring: &LineString<f64>) -> SvgPath {
    SvgPath::new().set("d", append_ring(Data::new(), ring))
}

fn append_ring(mut data: Data, ring: &LineString<f64>) -> Data {
    let mut coords = ring.coords();
    let Some(first) = coords.next() else {
        return data;
    };
    data = data.move_to((first.x, -first.y));
    for coord in coords {
        data = data.line_to((coord.x, -coord.y));
    }
    data.close()
}
