// src/grass/config.rs
//! Data-driven field settings (`assets/grass/field.ron`).

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::core::FieldSeed;
use super::error::{ConfigError, SettingsLoadError};

/// Everything needed to lay out and populate one grass field.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassSettings {
    /// Side length of the square field, centered on the world origin.
    pub field_size: f32,
    /// Nominal total blade count, split evenly across tiles.
    pub blade_count: u32,
    pub tile_count: usize,
    /// Planar camera distance beyond which a tile switches to its low-detail mesh.
    pub lod_distance: f32,
    pub seed: u64,
    pub high_detail_mesh: String,
    pub low_detail_mesh: String,
}

impl Default for GrassSettings {
    fn default() -> Self {
        Self {
            field_size: 100.0,
            blade_count: 40_000,
            tile_count: 4,
            lod_distance: 40.0,
            seed: 1337,
            high_detail_mesh: "grass/grassBladeHigh.glb".to_string(),
            low_detail_mesh: "grass/grassBladeLow.glb".to_string(),
        }
    }
}

impl GrassSettings {
    pub fn field_seed(&self) -> FieldSeed {
        FieldSeed(self.seed)
    }

    /// Nominal blades per tile handed to the sampler (before grid rounding).
    pub fn points_per_tile(&self) -> f64 {
        if self.tile_count == 0 {
            return 0.0;
        }
        self.blade_count as f64 / self.tile_count as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.field_size.is_finite() || self.field_size <= 0.0 {
            return Err(ConfigError::InvalidFieldSize {
                width: self.field_size,
                height: self.field_size,
            });
        }
        if self.tile_count == 0 {
            return Err(ConfigError::InvalidTileCount(self.tile_count));
        }
        let target = self.points_per_tile();
        if crate::grass::placement::grid_size_for(target) == 0 {
            return Err(ConfigError::ZeroPointsPerTile { target });
        }
        if !self.lod_distance.is_finite() || self.lod_distance < 0.0 {
            return Err(ConfigError::InvalidLodThreshold(self.lod_distance));
        }
        Ok(())
    }

    pub fn from_ron_str(src: &str) -> Result<Self, SettingsLoadError> {
        let settings: Self =
            ron::de::from_str(src).map_err(|e| SettingsLoadError::Ron(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsLoadError> {
        let src = std::fs::read_to_string(path)?;
        Self::from_ron_str(&src)
    }
}
