// src/grass/placement/partition.rs
//! Split a centered W x H field into a near-square grid of tiles.

use crate::grass::core::{Tile, TileId};
use crate::grass::error::ConfigError;

/// Grid dimensions chosen for a requested tile count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    pub tiles_per_row: usize,
    pub tiles_per_column: usize,
}

impl GridShape {
    pub fn for_count(tile_count: usize) -> Result<Self, ConfigError> {
        if tile_count == 0 {
            return Err(ConfigError::InvalidTileCount(tile_count));
        }
        let tiles_per_row = (tile_count as f64).sqrt().ceil() as usize;
        let tiles_per_column = tile_count.div_ceil(tiles_per_row);
        Ok(Self { tiles_per_row, tiles_per_column })
    }

    pub fn cells(&self) -> usize {
        self.tiles_per_row * self.tiles_per_column
    }
}

/// Partition the field into `tile_count` tiles, columns outermost.
///
/// Grid cells past `tile_count` are dropped rather than redistributed, so a
/// count that does not fill the grid leaves part of the field uncovered.
pub fn partition(width: f32, height: f32, tile_count: usize) -> Result<Vec<Tile>, ConfigError> {
    if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
        return Err(ConfigError::InvalidFieldSize { width, height });
    }
    let shape = GridShape::for_count(tile_count)?;

    let tile_width = width / shape.tiles_per_row as f32;
    let tile_depth = height / shape.tiles_per_column as f32;

    let mut tiles = Vec::with_capacity(tile_count);
    'outer: for col in 0..shape.tiles_per_row {
        for row in 0..shape.tiles_per_column {
            if tiles.len() == tile_count {
                break 'outer;
            }
            tiles.push(Tile {
                id: TileId(tiles.len() as u32),
                origin_x: col as f32 * tile_width - width * 0.5,
                origin_z: row as f32 * tile_depth - height * 0.5,
                width: tile_width,
                depth: tile_depth,
            });
        }
    }
    Ok(tiles)
}
