// src/grass/instancing/buffer.rs

use bevy::math::{Mat4, Quat, Vec3};
use rand::Rng;

use crate::grass::core::{FieldSeed, TileContents, TileId};
use crate::grass::noise::NoiseField;
use crate::grass::placement::rng_for;

pub const OFFSET_STRIDE: usize = 2;
pub const RANDOM_PHASE_STRIDE: usize = 1;
pub const NOISE_SCALE_STRIDE: usize = 1;
pub const TRANSFORM_STRIDE: usize = 16;

const PHASE_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Per-instance attributes for one tile, as parallel flat arrays.
///
/// Entry `k` of every array belongs to sample point `k`. Built once and never
/// mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstanceBuffer {
    /// World XZ per blade (noise lookup key in the shader).
    pub offset: Vec<f32>,
    /// Per-blade variation in [-0.5, 0.5).
    pub random_phase: Vec<f32>,
    /// Gradient noise at the blade position (height/lean multiplier).
    pub noise_scale: Vec<f32>,
    /// Column-major 4x4 world matrix per blade.
    pub transform: Vec<f32>,
}

impl InstanceBuffer {
    pub fn len(&self) -> usize {
        self.random_phase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.random_phase.is_empty()
    }

    pub fn offset_at(&self, k: usize) -> Option<[f32; 2]> {
        let s = self.offset.get(k * OFFSET_STRIDE..(k + 1) * OFFSET_STRIDE)?;
        Some([s[0], s[1]])
    }

    pub fn transform_at(&self, k: usize) -> Option<Mat4> {
        let s = self.transform.get(k * TRANSFORM_STRIDE..(k + 1) * TRANSFORM_STRIDE)?;
        Some(Mat4::from_cols_slice(s))
    }
}

/// Packs tile contents into [`InstanceBuffer`]s.
pub struct InstanceBufferBuilder<'a> {
    noise: &'a NoiseField,
    seed: FieldSeed,
}

impl<'a> InstanceBufferBuilder<'a> {
    pub fn new(noise: &'a NoiseField, seed: FieldSeed) -> Self {
        Self { noise, seed }
    }

    pub fn build(&self, tile: TileId, contents: &TileContents) -> InstanceBuffer {
        let n = contents.len();
        let mut rng = rng_for(self.seed, tile, PHASE_SALT);
        let mut out = InstanceBuffer {
            offset: Vec::with_capacity(n * OFFSET_STRIDE),
            random_phase: Vec::with_capacity(n * RANDOM_PHASE_STRIDE),
            noise_scale: Vec::with_capacity(n * NOISE_SCALE_STRIDE),
            transform: Vec::with_capacity(n * TRANSFORM_STRIDE),
        };

        for p in &contents.points {
            out.offset.extend_from_slice(&[p.x, p.y]);
            out.random_phase.push(rng.random::<f32>() - 0.5);
            out.noise_scale.push(self.noise.sample(p.x, p.y));

            let trs = Mat4::from_scale_rotation_translation(
                Vec3::ONE,
                Quat::IDENTITY,
                Vec3::new(p.x, 0.0, p.y),
            );
            out.transform.extend_from_slice(&trs.to_cols_array());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::Vec2;

    fn contents(points: &[(f32, f32)]) -> TileContents {
        let pts: Vec<Vec2> = points.iter().map(|&(x, z)| Vec2::new(x, z)).collect();
        let bounds = crate::grass::core::BoundingBox::from_points(&pts);
        TileContents::new(pts, bounds)
    }

    #[test]
    fn transform_is_pure_translation() {
        let noise = NoiseField::new(FieldSeed(1));
        let buf = InstanceBufferBuilder::new(&noise, FieldSeed(1)).build(TileId(0), &contents(&[(5.0, -3.0)]));
        assert_eq!(buf.transform_at(0), Some(Mat4::from_translation(Vec3::new(5.0, 0.0, -3.0))));
        // Column-major: translation lives in elements 12..15.
        assert_eq!(&buf.transform[12..16], &[5.0, 0.0, -3.0, 1.0]);
    }

    #[test]
    fn strides_and_order_match_points() {
        let noise = NoiseField::new(FieldSeed(3));
        let pts = [(1.25, 2.5), (-7.5, 0.75), (30.1, -12.9)];
        let buf = InstanceBufferBuilder::new(&noise, FieldSeed(3)).build(TileId(2), &contents(&pts));

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.offset.len(), 3 * OFFSET_STRIDE);
        assert_eq!(buf.random_phase.len(), 3 * RANDOM_PHASE_STRIDE);
        assert_eq!(buf.noise_scale.len(), 3 * NOISE_SCALE_STRIDE);
        assert_eq!(buf.transform.len(), 3 * TRANSFORM_STRIDE);

        for (k, &(x, z)) in pts.iter().enumerate() {
            assert_eq!(buf.offset_at(k), Some([x, z]));
            assert_eq!(buf.noise_scale[k], noise.sample(x, z));
            let t = buf.transform_at(k).unwrap();
            assert_eq!(t.w_axis, bevy::math::Vec4::new(x, 0.0, z, 1.0));
        }
        assert_eq!(buf.offset_at(3), None);
    }

    #[test]
    fn random_phase_in_half_open_range() {
        let noise = NoiseField::new(FieldSeed(5));
        let pts: Vec<(f32, f32)> = (0..2_000).map(|i| (i as f32 * 0.1, -(i as f32) * 0.05)).collect();
        let buf = InstanceBufferBuilder::new(&noise, FieldSeed(5)).build(TileId(0), &contents(&pts));
        assert!(buf.random_phase.iter().all(|r| (-0.5..0.5).contains(r)));
        // Not all equal.
        assert!(buf.random_phase.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn empty_contents_give_empty_buffer() {
        let noise = NoiseField::new(FieldSeed(5));
        let buf = InstanceBufferBuilder::new(&noise, FieldSeed(5)).build(TileId(0), &TileContents::default());
        assert!(buf.is_empty());
        assert!(buf.transform.is_empty());
    }
}
