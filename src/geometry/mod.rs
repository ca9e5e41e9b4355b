// src/geometry/mod.rs

pub mod labeling;
pub mod landmass;
pub mod projection;
pub mod tessellation;

pub use labeling::label_cells;
pub use landmass::{Territory, carve_territories, union_all};
pub use projection::MapProjection;
pub use tessellation::{VoronoiCell, extract_cells};

/// Saatpunkt-Typ der Delaunay-Triangulation.
pub type SeedPoint = spade::Point2<f64>;

/// Toleranz für Koordinatenvergleiche in Grad bzw. Metern.
pub const EPSILON: f64 = 1e-9;

/// Vergleicht zwei Koordinatenwerte mit fester Toleranz.
pub fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}
