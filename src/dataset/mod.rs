// src/dataset/mod.rs

pub mod anchors;
pub mod boundaries;

pub use anchors::{Anchor, load_anchors};
pub use boundaries::{CountryShape, load_boundaries, shape_count};
