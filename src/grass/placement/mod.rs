// src/grass/placement/mod.rs
//! Field partitioning and deterministic per-tile point sampling.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::grass::core::{FieldSeed, Tile, TileContents, TileId};

mod jitter_grid;
mod partition;

pub use jitter_grid::JitteredGrid;
pub use partition::{partition, GridShape};

/// Strategy that deterministically fills one tile with sample points.
pub trait TileSampler: Send + Sync + 'static {
    /// Must return identical contents for identical inputs.
    fn sample(&self, tile: &Tile, points_per_tile_target: f64) -> TileContents;
}

/// Side length of the square sampling grid for a nominal per-tile target.
///
/// Rounds the target, then takes the floor of its square root, so the actual
/// count per tile is `grid_size^2` and may fall short of the target. The root
/// is taken on integers so large targets next to a perfect square stay exact.
#[inline]
pub fn grid_size_for(points_per_tile_target: f64) -> u32 {
    let rounded = points_per_tile_target.round();
    if !rounded.is_finite() || rounded < 1.0 {
        return 0;
    }
    (rounded as u64).isqrt() as u32
}

/// Stable RNG per (seed, tile, stream). `salt` keeps independent streams apart.
#[inline]
pub fn rng_for(seed: FieldSeed, tile: TileId, salt: u64) -> ChaCha8Rng {
    let mix = seed.0 ^ ((tile.0 as u64) << 32) ^ salt;
    ChaCha8Rng::seed_from_u64(mix)
}
