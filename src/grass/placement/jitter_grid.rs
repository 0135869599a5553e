// src/grass/placement/jitter_grid.rs
//! Jittered grid sampling (deterministic per seed and tile).

use bevy::math::Vec2;
use rand::Rng;

use super::{grid_size_for, rng_for, TileSampler};
use crate::grass::core::{BoundingBox, FieldSeed, Tile, TileContents};

const JITTER_SALT: u64 = 0xA5A5_5A5A_D3F0_1234;

/// Regular `n x n` grid per tile, each point pushed up to half a cell
/// towards +X / +Z. The offset is one-sided, not centered on the cell.
pub struct JitteredGrid {
    seed: FieldSeed,
}

impl JitteredGrid {
    pub fn new(seed: FieldSeed) -> Self {
        Self { seed }
    }
}

impl TileSampler for JitteredGrid {
    fn sample(&self, tile: &Tile, points_per_tile_target: f64) -> TileContents {
        let n = grid_size_for(points_per_tile_target);
        if n == 0 {
            return TileContents::default();
        }

        let gap = Vec2::new(tile.width / n as f32, tile.depth / n as f32);
        let mut rng = rng_for(self.seed, tile.id, JITTER_SALT);
        let mut points = Vec::with_capacity((n as usize) * (n as usize));
        let mut bounds: Option<BoundingBox> = None;

        for i in 0..n {
            for j in 0..n {
                let base = tile.origin() + Vec2::new(i as f32, j as f32) * gap;
                let jitter = Vec2::new(rng.random::<f32>(), rng.random::<f32>()) * gap * 0.5;
                let p = base + jitter;

                match bounds.as_mut() {
                    Some(b) => b.include(p),
                    None => bounds = Some(BoundingBox { min: p, max: p }),
                }
                points.push(p);
            }
        }

        TileContents::new(points, bounds)
    }
}
