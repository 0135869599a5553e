// src/grass/error.rs

use crate::grass::core::TileId;

/// Bad field configuration, rejected before any geometry is generated.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("tile count must be at least 1 (got {0})")]
    InvalidTileCount(usize),
    #[error("field size must be finite and positive (got {width} x {height})")]
    InvalidFieldSize { width: f32, height: f32 },
    #[error("{target} blades per tile rounds down to an empty sampling grid")]
    ZeroPointsPerTile { target: f64 },
    #[error("LOD distance must be finite and non-negative (got {0})")]
    InvalidLodThreshold(f32),
}

/// A single mesh asset that could not be resolved.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load mesh '{path}': {reason}")]
pub struct MeshLoadError {
    pub path: String,
    pub reason: String,
}

impl MeshLoadError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { path: path.into(), reason: reason.into() }
    }
}

/// Everything the field-build entry point can surface.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FieldBuildError {
    #[error("invalid grass configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("grass meshes failed to load: {0}")]
    AssetLoad(#[from] MeshLoadError),
    #[error("tile {tile:?} produced no blades; its bounding box is undefined")]
    EmptyTile { tile: TileId },
    #[error("expected {expected} {kind} meshes, got {got}")]
    MeshCountMismatch { kind: &'static str, expected: usize, got: usize },
}

/// Reading `GrassSettings` from disk.
#[derive(thiserror::Error, Debug)]
pub enum SettingsLoadError {
    #[error("I/O while reading grass settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}
