// src/render/raster.rs

use crate::config::RenderConfig;
use crate::dataset::Anchor;
use crate::error::{AtlasError, AtlasResult};
use crate::geometry::landmass::Territory;
use crate::render::palette::{self, Rgb};
use geo::{LineString, MultiPolygon};
use image::RgbImage;
use nalgebra::{Affine2, Matrix3, Point2};
use std::path::Path;
use tracing::{debug, info};

/// Abbildung vom Grad-Ausschnitt auf Pixelkoordinaten (Y wächst nach unten).
#[derive(Debug, Clone)]
pub struct Viewport {
    transform: Affine2<f64>,
    width: u32,
    height: u32,
}

impl Viewport {
    /// Baut die affine Abbildung aus dem konfigurierten Ausschnitt. Die
    /// Bildhöhe folgt aus dem Seitenverhältnis des Ausschnitts.
    pub fn new(config: &RenderConfig) -> Self {
        let [x_min, x_max] = config.viewport.x;
        let [y_min, y_max] = config.viewport.y;
        let width = config.width_px.max(1);
        let aspect = (y_max - y_min) / (x_max - x_min);
        let height = ((width as f64) * aspect).round().max(1.0) as u32;

        let sx = width as f64 / (x_max - x_min);
        let sy = height as f64 / (y_max - y_min);
        let matrix = Matrix3::new(
            sx, 0.0, -x_min * sx, //
            0.0, -sy, y_max * sy, //
            0.0, 0.0, 1.0,
        );
        Self {
            transform: Affine2::from_matrix_unchecked(matrix),
            width,
            height,
        }
    }

    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let point = self.transform.transform_point(&Point2::new(x, y));
        (point.x, point.y)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Rendert Territorien, optionale Umrisse und Ankermarker in ein RGB-Bild.
/// Alle Geometrien werden in Grad erwartet.
pub fn render_map(
    territories: &[Territory],
    anchors: &[Anchor],
    outlines: &[&MultiPolygon<f64>],
    config: &RenderConfig,
) -> AtlasResult<RgbImage> {
    let viewport = Viewport::new(config);
    let background = palette::parse_hex(&config.background)?;
    let colors = palette::territory_colors(&config.palette, territories.len())?;

    let mut image = RgbImage::from_pixel(
        viewport.width(),
        viewport.height(),
        image::Rgb(background),
    );
    debug!(
        "Rendering {} territories onto {}x{} pixels",
        territories.len(),
        viewport.width(),
        viewport.height()
    );

    for (territory, color) in territories.iter().zip(colors.iter()) {
        fill_multi_polygon(&mut image, &viewport, &territory.geometry, *color);
    }

    if config.draw_boundaries {
        for outline in outlines {
            stroke_multi_polygon(&mut image, &viewport, outline, [0, 0, 0]);
        }
    }

    if config.anchor_dot_px > 0 {
        for anchor in anchors {
            let (px, py) = viewport.to_pixel(anchor.lon, anchor.lat);
            draw_dot(&mut image, px, py, config.anchor_dot_px as f64, [0, 0, 0]);
        }
    }

    Ok(image)
}

/// Schreibt das Bild als PNG an den Zielpfad.
pub fn save_png(image: &RgbImage, path: &Path) -> AtlasResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| AtlasError::RenderFailure {
                reason: format!("could not create {}: {err}", parent.display()),
            })?;
        }
    }
    image.save(path).map_err(|err| AtlasError::RenderFailure {
        reason: format!("could not write {}: {err}", path.display()),
    })?;
    info!(
        "Wrote {}x{} map image to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// Scanline-Füllung über alle Ringe einer MultiPolygon-Geometrie.
/// Innenringe bleiben durch die Even-Odd-Regel ausgespart.
fn fill_multi_polygon(
    image: &mut RgbImage,
    viewport: &Viewport,
    multi: &MultiPolygon<f64>,
    color: Rgb,
) {
    let mut rings: Vec<Vec<(f64, f64)>> = Vec::new();
    for polygon in &multi.0 {
        rings.push(ring_pixels(viewport, polygon.exterior()));
        for interior in polygon.interiors() {
            rings.push(ring_pixels(viewport, interior));
        }
    }

    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for ring in &rings {
        for &(_, y) in ring {
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
    }
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }
    let y_start = min_y.floor().max(0.0) as u32;
    let y_end = max_y.ceil().min(image.height() as f64 - 1.0) as u32;
    if y_start > y_end {
        return;
    }

    let pixel = image::Rgb(color);
    let mut crossings: Vec<f64> = Vec::new();
    for y in y_start..=y_end {
        let scan_y = y as f64 + 0.5;
        crossings.clear();
        for ring in &rings {
            for pair in ring.windows(2) {
                let (x1, y1) = pair[0];
                let (x2, y2) = pair[1];
                if (y1 <= scan_y && y2 > scan_y) || (y2 <= scan_y && y1 > scan_y) {
                    let t = (scan_y - y1) / (y2 - y1);
                    crossings.push(x1 + t * (x2 - x1));
                }
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        for span in crossings.chunks(2) {
            if span.len() < 2 {
                continue;
            }
            // Pixelzentren innerhalb [span0, span1]
            let x_start = (span[0] - 0.5).ceil().max(0.0) as i64;
            let x_end = (span[1] - 0.5).floor().min(image.width() as f64 - 1.0) as i64;
            for x in x_start..=x_end {
                image.put_pixel(x as u32, y, pixel);
            }
        }
    }
}

/// Ringkoordinaten in Pixelraum.
fn ring_pixels(viewport: &Viewport, ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords()
        .map(|coord| viewport.to_pixel(coord.x, coord.y))
        .collect()
}

fn stroke_multi_polygon(
    image: &mut RgbImage,
    viewport: &Viewport,
    multi: &MultiPolygon<f64>,
    color: Rgb,
) {
    for polygon in &multi.0 {
        stroke_ring(image, viewport, polygon.exterior(), color);
        for interior in polygon.interiors() {
            stroke_ring(image, viewport, interior, color);
        }
    }
}

fn stroke_ring(image: &mut RgbImage, viewport: &Viewport, ring: &LineString<f64>, color: Rgb) {
    let points = ring_pixels(viewport, ring);
    for pair in points.windows(2) {
        draw_line(
            image,
            pair[0].0.round() as i64,
            pair[0].1.round() as i64,
            pair[1].0.round() as i64,
            pair[1].1.round() as i64,
            color,
        );
    }
}

/// Bresenham-Linie mit Klemmung auf die Bildfläche.
fn draw_line(image: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb) {
    let pixel = image::Rgb(color);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let step_x = if x0 < x1 { 1 } else { -1 };
    let step_y = if y0 < y1 { 1 } else { -1 };
    let mut error = dx + dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        put_clamped(image, x, y, pixel);
        if x == x1 && y == y1 {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }
}

fn draw_dot(image: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Rgb) {
    let pixel = image::Rgb(color);
    let r_squared = radius * radius;
    let x_min = (cx - radius).floor() as i64;
    let x_max = (cx + radius).ceil() as i64;
    let y_min = (cy - radius).floor() as i64;
    let y_max = (cy + radius).ceil() as i64;
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            if dx * dx + dy * dy <= r_squared {
                put_clamped(image, x, y, pixel);
            }
        }
    }
}

fn put_clamped(image: &mut RgbImage, x: i64, y: i64, pixel: image::Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, pixel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportConfig;
    use geo::Polygon;

    fn render_config(x: [f64; 2], y: [f64; 2], width_px: u32) -> RenderConfig {
        RenderConfig {
            viewport: ViewportConfig { x, y },
            width_px,
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_viewport_maps_corners() {
        let config = render_config([-25.0, 41.0], [35.0, 72.0], 660);
        let viewport = Viewport::new(&config);
        assert_eq!(viewport.width(), 660);
        assert_eq!(viewport.height(), 370);

        let (x, y) = viewport.to_pixel(-25.0, 72.0);
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
        let (x, y) = viewport.to_pixel(41.0, 35.0);
        assert!((x - 660.0).abs() < 1e-9 && (y - 370.0).abs() < 1e-9);
        // North stays at smaller pixel rows
        let (_, y_north) = viewport.to_pixel(0.0, 71.0);
        let (_, y_south) = viewport.to_pixel(0.0, 36.0);
        assert!(y_north < y_south);
    }

    #[test]
    fn test_fill_covers_expected_pixel_count() {
        let config = render_config([0.0, 10.0], [0.0, 10.0], 100);
        let viewport = Viewport::new(&config);
        let mut image = RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]));

        let square = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0)]),
            Vec::new(),
        )]);
        fill_multi_polygon(&mut image, &viewport, &square, [200, 0, 0]);

        let filled = image
            .pixels()
            .filter(|pixel| pixel.0 == [200, 0, 0])
            .count();
        // 60x60 pixel interior
        assert_eq!(filled, 3600);
    }

    #[test]
    fn test_fill_leaves_holes_unpainted() {
        let config = render_config([0.0, 10.0], [0.0, 10.0], 100);
        let viewport = Viewport::new(&config);
        let mut image = RgbImage::from_pixel(100, 100, image::Rgb([255, 255, 255]));

        let with_hole = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            vec![LineString::from(vec![
                (4.0, 4.0),
                (6.0, 4.0),
                (6.0, 6.0),
                (4.0, 6.0),
            ])],
        )]);
        fill_multi_polygon(&mut image, &viewport, &with_hole, [0, 120, 0]);

        // Center of the hole keeps the background
        assert_eq!(image.get_pixel(50, 50).0, [255, 255, 255]);
        // Outside the hole the fill applies
        assert_eq!(image.get_pixel(20, 50).0, [0, 120, 0]);
    }

    #[test]
    fn test_fill_clamps_to_image() {
        let config = render_config([0.0, 10.0], [0.0, 10.0], 50);
        let viewport = Viewport::new(&config);
        let mut image = RgbImage::from_pixel(50, 50, image::Rgb([255, 255, 255]));

        // Polygon reaching far outside the viewport must not panic
        let oversized = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![
                (-100.0, -100.0),
                (100.0, -100.0),
                (100.0, 100.0),
                (-100.0, 100.0),
            ]),
            Vec::new(),
        )]);
        fill_multi_polygon(&mut image, &viewport, &oversized, [10, 10, 10]);
        assert!(image.pixels().all(|pixel| pixel.0 == [10, 10, 10]));
    }

    #[test]
    fn test_draw_dot_marks_center() {
        let mut image = RgbImage::from_pixel(20, 20, image::Rgb([255, 255, 255]));
        draw_dot(&mut image, 10.0, 10.0, 2.0, [0, 0, 0]);
        assert_eq!(image.get_pixel(10, 10).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_draw_line_connects_endpoints() {
        let mut image = RgbImage::from_pixel(20, 20, image::Rgb([255, 255, 255]));
        draw_line(&mut image, 2, 3, 15, 11, [0, 0, 0]);
        assert_eq!(image.get_pixel(2, 3).0, [0, 0, 0]);
        assert_eq!(image.get_pixel(15, 11).0, [0, 0, 0]);
    }

    #[test]
    fn test_render_map_with_anchor_dots() {
        let config = RenderConfig {
            viewport: ViewportConfig {
                x: [0.0, 10.0],
                y: [0.0, 10.0],
            },
            width_px: 100,
            anchor_dot_px: 2,
            ..RenderConfig::default()
        };
        let territory = Territory {
            name: "Squareland".to_string(),
            geometry: MultiPolygon::new(vec![Polygon::new(
                LineString::from(vec![(1.0, 1.0), (9.0, 1.0), (9.0, 9.0), (1.0, 9.0)]),
                Vec::new(),
            )]),
            area: 64.0,
        };
        let anchors = vec![Anchor::new("Squareland", "Midtown", 5.0, 5.0)];

        let image = render_map(&[territory], &anchors, &[], &config).unwrap();
        assert_eq!(image.width(), 100);
        assert_eq!(image.height(), 100);
        // Anchor dot is black, surrounding fill is the first cycle color
        assert_eq!(image.get_pixel(50, 50).0, [0, 0, 0]);
        let territory_color = palette::cycle(crate::config::ColormapKind::Viridis, 0);
        assert_eq!(image.get_pixel(20, 50).0, territory_color);
    }

    #[test]
    fn test_fill_ignores_empty_geometry() {
        let config = render_config([0.0, 10.0], [0.0, 10.0], 10);
        let viewport = Viewport::new(&config);
        let mut image = RgbImage::from_pixel(10, 10, image::Rgb([9, 9, 9]));
        fill_multi_polygon(
            &mut image,
            &viewport,
            &MultiPolygon::new(Vec::new()),
            [0, 0, 0],
        );
        assert!(image.pixels().all(|pixel| pixel.0 == [9, 9, 9]));
    }
}
