// src/grass/noise.rs
//! Classic 2D gradient noise over a seeded permutation table.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::core::FieldSeed;

const TABLE_SIZE: usize = 256;

/// Seeded 2D gradient noise. Built once, then shared by reference.
#[derive(Clone)]
pub struct NoiseField {
    /// Permutation of 0..255, repeated once so `perm[a + b]` never wraps.
    perm: [u8; TABLE_SIZE * 2],
}

impl NoiseField {
    pub fn new(seed: FieldSeed) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.0 ^ 0x5EED_0F_9A55_u64);
        let mut base: [u8; TABLE_SIZE] = std::array::from_fn(|i| i as u8);
        base.shuffle(&mut rng);
        Self::from_permutation(base)
    }

    /// Build from an explicit permutation of 0..255.
    pub fn from_permutation(base: [u8; TABLE_SIZE]) -> Self {
        let mut perm = [0u8; TABLE_SIZE * 2];
        perm[..TABLE_SIZE].copy_from_slice(&base);
        perm[TABLE_SIZE..].copy_from_slice(&base);
        Self { perm }
    }

    pub fn permutation(&self) -> &[u8] {
        &self.perm[..TABLE_SIZE]
    }

    #[inline]
    fn hash(&self, x: usize, z: usize) -> u8 {
        self.perm[self.perm[x] as usize + z]
    }

    /// Unclamped noise value (roughly -1..1). Non-finite input yields NaN.
    pub fn sample(&self, x: f32, z: f32) -> f32 {
        let fx = x.floor();
        let fz = z.floor();
        // `as` saturates (NaN -> 0), so the table lookups stay in range.
        let xi = (fx as i32 & 255) as usize;
        let zi = (fz as i32 & 255) as usize;
        let xf = x - fx;
        let zf = z - fz;

        let d00 = gradient_dot(self.hash(xi, zi), xf, zf);
        let d10 = gradient_dot(self.hash(xi + 1, zi), xf - 1.0, zf);
        let d01 = gradient_dot(self.hash(xi, zi + 1), xf, zf - 1.0);
        let d11 = gradient_dot(self.hash(xi + 1, zi + 1), xf - 1.0, zf - 1.0);

        let u = fade(xf);
        let v = fade(zf);
        lerp(u, lerp(v, d00, d01), lerp(v, d10, d11))
    }
}

/// Dot of the corner offset with one of four diagonal gradients.
#[inline]
fn gradient_dot(hash: u8, dx: f32, dz: f32) -> f32 {
    match hash & 3 {
        0 => dx + dz,
        1 => -dx + dz,
        2 => -dx - dz,
        _ => dx - dz,
    }
}

#[inline]
fn fade(t: f32) -> f32 {
    ((6.0 * t - 15.0) * t + 10.0) * t * t * t
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}
