// src/grass/field.rs
//! The grass field arena: owns every tile's contents and instance buffer and
//! the per-tile LOD controllers that reference them by `TileId`.
//!
//! Building is split in two so a polled loader (the Bevy asset server) can sit
//! between the halves: [`FieldLayout::generate`] does all the CPU work, and
//! [`GrassField::bind`] attaches the loaded meshes. [`build_field`] chains both
//! around an async all-or-nothing load.

use bevy::log::{error, info};
use bevy::math::Vec3;

use super::config::GrassSettings;
use super::core::{Tile, TileContents, TileId};
use super::error::FieldBuildError;
use super::instancing::{InstanceBuffer, InstanceBufferBuilder};
use super::loading::{load_all, MeshLoader};
use super::lod::{LodState, MeshHandle, TileLodController, ViewSubscriptions};
use super::noise::NoiseField;
use super::placement::{partition, JitteredGrid, TileSampler};

/// One tile and the data it exclusively owns.
#[derive(Clone, Debug)]
pub struct TileRecord {
    pub tile: Tile,
    pub contents: TileContents,
    pub buffer: InstanceBuffer,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldStats {
    pub per_tile: Vec<usize>,
    pub total: usize,
}

impl FieldStats {
    fn from_records(records: &[TileRecord]) -> Self {
        let per_tile: Vec<usize> = records.iter().map(|r| r.buffer.len()).collect();
        let total = per_tile.iter().sum();
        Self { per_tile, total }
    }

    pub fn log(&self) {
        for (i, n) in self.per_tile.iter().enumerate() {
            info!("Grass: tile {} -> {} blades", i, n);
        }
        info!("Grass: {} tiles, {} blades total", self.per_tile.len(), self.total);
    }
}

/// Partitioned, sampled and packed tiles, not yet attached to any mesh.
#[derive(Clone, Debug)]
pub struct FieldLayout {
    records: Vec<TileRecord>,
}

impl FieldLayout {
    /// Validate `settings`, then partition, sample and pack every tile with the
    /// default jittered-grid sampler.
    pub fn generate(settings: &GrassSettings, noise: &NoiseField) -> Result<Self, FieldBuildError> {
        Self::generate_with(settings, noise, &JitteredGrid::new(settings.field_seed()))
    }

    pub fn generate_with(
        settings: &GrassSettings,
        noise: &NoiseField,
        sampler: &dyn TileSampler,
    ) -> Result<Self, FieldBuildError> {
        settings.validate()?;
        let tiles = partition(settings.field_size, settings.field_size, settings.tile_count)?;
        let target = settings.points_per_tile();
        let builder = InstanceBufferBuilder::new(noise, settings.field_seed());

        let mut records = Vec::with_capacity(tiles.len());
        for tile in tiles {
            let contents = sampler.sample(&tile, target);
            if contents.bounds().is_none() {
                return Err(FieldBuildError::EmptyTile { tile: tile.id });
            }
            let buffer = builder.build(tile.id, &contents);
            records.push(TileRecord { tile, contents, buffer });
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[TileRecord] {
        &self.records
    }

    pub fn tile_count(&self) -> usize {
        self.records.len()
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats::from_records(&self.records)
    }

    /// Mesh paths to request: one high-detail mesh per tile, then one
    /// low-detail mesh per tile.
    pub fn mesh_paths(&self, settings: &GrassSettings) -> Vec<String> {
        let n = self.records.len();
        std::iter::repeat_n(settings.high_detail_mesh.clone(), n)
            .chain(std::iter::repeat_n(settings.low_detail_mesh.clone(), n))
            .collect()
    }
}

/// A bound field: tile data plus one LOD controller per tile.
pub struct GrassField<H> {
    records: Vec<TileRecord>,
    lods: Vec<TileLodController<H>>,
    subscriptions: ViewSubscriptions,
    threshold: f32,
}

impl<H: MeshHandle> GrassField<H> {
    /// Attach meshes to a generated layout.
    ///
    /// `handles` is laid out as returned by a load of
    /// [`FieldLayout::mesh_paths`]: N high-detail handles, then N low-detail.
    /// Every tile gets the same `material` on both levels and its initial LOD
    /// state is evaluated against `camera`.
    pub fn bind(
        layout: FieldLayout,
        mut handles: Vec<H>,
        material: H::Material,
        threshold: f32,
        camera: Vec3,
    ) -> Result<Self, FieldBuildError>
    where
        H::Material: Clone,
    {
        let n = layout.records.len();
        if handles.len() != 2 * n {
            return Err(FieldBuildError::MeshCountMismatch {
                kind: "grass blade",
                expected: 2 * n,
                got: handles.len(),
            });
        }
        let low = handles.split_off(n);

        let mut subscriptions = ViewSubscriptions::default();
        let mut lods = Vec::with_capacity(n);
        for ((record, high), low) in layout.records.iter().zip(handles).zip(low) {
            let bounds = record.contents.bounds().ok_or(FieldBuildError::EmptyTile { tile: record.tile.id })?;
            let mut lod = TileLodController::new(record.tile.id, high, &record.buffer);
            lod.set_bounding_box(bounds);
            lod.add_low_detail(threshold, low, &record.buffer, &mut subscriptions, camera);
            lod.set_material(material.clone());
            lods.push(lod);
        }

        Ok(Self { records: layout.records, lods, subscriptions, threshold })
    }

    /// Notify every subscribed tile of a camera move. Returns the tiles that
    /// switched and their new state.
    pub fn on_view_changed(&mut self, camera: Vec3) -> Vec<(TileId, LodState)> {
        let mut switched = Vec::new();
        for tile in self.subscriptions.iter() {
            let Some(lod) = self.lods.get_mut(tile.index()) else { continue };
            if let Some(state) = lod.on_view_changed(camera) {
                switched.push((tile, state));
            }
        }
        switched
    }

    pub fn records(&self) -> &[TileRecord] {
        &self.records
    }

    pub fn record(&self, tile: TileId) -> Option<&TileRecord> {
        self.records.get(tile.index())
    }

    pub fn lod(&self, tile: TileId) -> Option<&TileLodController<H>> {
        self.lods.get(tile.index())
    }

    pub fn lods(&self) -> &[TileLodController<H>] {
        &self.lods
    }

    pub fn lods_mut(&mut self) -> &mut [TileLodController<H>] {
        &mut self.lods
    }

    pub fn subscriptions(&self) -> &ViewSubscriptions {
        &self.subscriptions
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats::from_records(&self.records)
    }
}

/// Generate, load and bind a complete field.
///
/// Fails without binding anything if the settings are invalid, a tile comes
/// out empty, or any one mesh load fails.
pub async fn build_field<L>(
    settings: &GrassSettings,
    loader: &L,
    material: <L::Handle as MeshHandle>::Material,
    camera: Vec3,
) -> Result<GrassField<L::Handle>, FieldBuildError>
where
    L: MeshLoader,
    <L::Handle as MeshHandle>::Material: Clone,
{
    settings.validate()?;
    let noise = NoiseField::new(settings.field_seed());
    let layout = FieldLayout::generate(settings, &noise)?;
    layout.stats().log();

    let paths = layout.mesh_paths(settings);
    let handles = load_all(loader, &paths).await.map_err(|e| {
        error!("Grass: {}", e);
        e
    })?;

    GrassField::bind(layout, handles, material, settings.lod_distance, camera)
}
