// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Insufficient anchor points for tessellation: expected at least {expected}, got {actual}")]
    InsufficientAnchors { expected: usize, actual: usize },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Triangulation failed: {reason}")]
    TriangulationFailed { reason: String },

    #[error("Geometric calculation failed: {operation}")]
    GeometricFailure { operation: String },

    #[error("Failed to read {}: {source}", path.display())]
    DatasetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {reason}", path.display())]
    DatasetParse { path: PathBuf, reason: String },

    #[error("Patch references unknown territory: {name}")]
    UnknownTerritory { name: String },

    #[error("Rendering failed: {reason}")]
    RenderFailure { reason: String },

    #[error("No closed Voronoi cells found.")]
    EmptyTessellation,
}

pub type AtlasResult<T> = Result<T, AtlasError>;
