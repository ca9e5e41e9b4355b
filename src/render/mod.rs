// src/render/mod.rs

pub mod palette;
pub mod raster;
pub mod svg;

pub use raster::{Viewport, render_map, save_png};
pub use svg::{DebugScene, write_debug_svg};
