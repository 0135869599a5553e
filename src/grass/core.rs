// src/grass/core.rs
//! Core types for deterministic, tile-aware grass placement.
//! Keep this file dependency-light; everything else in `grass` builds on it.

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

// ---------- Seeds, ids ----------

/// Global field seed; changing this reshuffles noise, jitter and phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSeed(pub u64);

/// Index of a tile inside its field (stable for the lifetime of the field).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

impl TileId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ---------- Tiles ----------

/// Axis-aligned rectangle in field space (XZ). Immutable once partitioned.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub origin_x: f32,
    pub origin_z: f32,
    pub width: f32,
    pub depth: f32,
}

impl Tile {
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.origin_x, self.origin_z)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.depth)
    }
}

/// Exact XZ extents of a set of sample points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl BoundingBox {
    /// Tightest box around `points`; `None` when there are none.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self { min: *first, max: *first };
        for p in rest {
            bounds.include(*p);
        }
        Some(bounds)
    }

    #[inline]
    pub fn include(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_xz(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// Sample points generated for one tile, plus their exact bounds.
///
/// Point order is stable and matches the instance index used by
/// [`InstanceBuffer`](crate::grass::instancing::InstanceBuffer).
#[derive(Clone, Debug, Default)]
pub struct TileContents {
    pub points: Vec<Vec2>,
    bounds: Option<BoundingBox>,
}

impl TileContents {
    pub fn new(points: Vec<Vec2>, bounds: Option<BoundingBox>) -> Self {
        Self { points, bounds }
    }

    /// `None` for a tile that produced no points.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Project a world position onto the ground plane (y = 0) as XZ.
#[inline]
pub fn planar(p: Vec3) -> Vec2 {
    Vec2::new(p.x, p.z)
}
