// src/grass/lod.rs
//! Two-level, distance-triggered LOD per tile.
//!
//! Each tile keeps a high- and a low-detail mesh bound to the same instance
//! buffer. On every camera change the planar distance from the camera to the
//! tile's bounding-box center picks exactly one of them. There is a single
//! threshold and no dead band, so a camera sitting on the boundary can flip
//! the tile on every notification.

use bevy::log::debug;
use bevy::math::Vec3;

use super::core::{planar, BoundingBox, TileId};
use super::instancing::InstanceBuffer;

/// Renderer-side mesh the controller drives. Implemented by the Bevy glue
/// and by test doubles.
pub trait MeshHandle {
    type Material;

    fn bind_instance_buffers(&mut self, buffer: &InstanceBuffer);
    fn set_enabled(&mut self, enabled: bool);
    fn set_material(&mut self, material: Self::Material);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LodState {
    Near,
    Far,
}

impl LodState {
    /// `Far` strictly beyond `threshold`, `Near` otherwise.
    #[inline]
    pub fn pick(distance: f32, threshold: f32) -> Self {
        if distance > threshold {
            LodState::Far
        } else {
            LodState::Near
        }
    }
}

/// Tiles registered for camera-change notifications, in registration order.
#[derive(Clone, Debug, Default)]
pub struct ViewSubscriptions {
    tiles: Vec<TileId>,
}

impl ViewSubscriptions {
    pub fn subscribe(&mut self, tile: TileId) {
        if !self.tiles.contains(&tile) {
            self.tiles.push(tile);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

pub struct TileLodController<H> {
    tile: TileId,
    high: H,
    low: Option<H>,
    threshold: f32,
    bounds: Option<BoundingBox>,
    state: Option<LodState>,
}

impl<H: MeshHandle> TileLodController<H> {
    /// Binds `buffer` to the high-detail mesh.
    pub fn new(tile: TileId, mut high: H, buffer: &InstanceBuffer) -> Self {
        high.bind_instance_buffers(buffer);
        Self { tile, high, low: None, threshold: 0.0, bounds: None, state: None }
    }

    pub fn set_bounding_box(&mut self, bounds: BoundingBox) {
        self.bounds = Some(bounds);
    }

    /// Binds the same buffer to `low`, subscribes the tile to view changes and
    /// evaluates the initial state against `camera`.
    pub fn add_low_detail(
        &mut self,
        threshold: f32,
        mut low: H,
        buffer: &InstanceBuffer,
        subscriptions: &mut ViewSubscriptions,
        camera: Vec3,
    ) -> Option<LodState> {
        low.bind_instance_buffers(buffer);
        self.low = Some(low);
        self.threshold = threshold;
        self.state = None;
        subscriptions.subscribe(self.tile);
        self.on_view_changed(camera)
    }

    /// Re-evaluate for a new camera position. Returns the new state when the
    /// tile switched, `None` when nothing changed or it cannot evaluate yet.
    pub fn on_view_changed(&mut self, camera: Vec3) -> Option<LodState> {
        let bounds = self.bounds?;
        self.low.as_ref()?;

        let distance = planar(camera).distance(bounds.center());
        let next = LodState::pick(distance, self.threshold);
        if self.state == Some(next) {
            return None;
        }

        let near = next == LodState::Near;
        self.high.set_enabled(near);
        if let Some(low) = self.low.as_mut() {
            low.set_enabled(!near);
        }
        debug!("Grass: tile {:?} -> {:?} (d={:.1})", self.tile, next, distance);
        self.state = Some(next);
        Some(next)
    }

    /// Assign one material to both detail levels.
    pub fn set_material(&mut self, material: H::Material)
    where
        H::Material: Clone,
    {
        if let Some(low) = self.low.as_mut() {
            low.set_material(material.clone());
        }
        self.high.set_material(material);
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }

    pub fn state(&self) -> Option<LodState> {
        self.state
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn high(&self) -> &H {
        &self.high
    }

    pub fn low(&self) -> Option<&H> {
        self.low.as_ref()
    }

    pub fn high_mut(&mut self) -> &mut H {
        &mut self.high
    }

    pub fn low_mut(&mut self) -> Option<&mut H> {
        self.low.as_mut()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMesh;
    use super::*;
    use bevy::math::Vec2;

    fn bounds_centered(c: Vec2) -> BoundingBox {
        BoundingBox { min: c - Vec2::splat(5.0), max: c + Vec2::splat(5.0) }
    }

    fn controller(center: Vec2, camera: Vec3, subs: &mut ViewSubscriptions) -> TileLodController<RecordingMesh> {
        let buffer = InstanceBuffer {
            offset: vec![0.0; 6],
            random_phase: vec![0.0; 3],
            noise_scale: vec![0.0; 3],
            transform: vec![0.0; 48],
        };
        let mut lod = TileLodController::new(TileId(0), RecordingMesh::named("high"), &buffer);
        lod.set_bounding_box(bounds_centered(center));
        lod.add_low_detail(40.0, RecordingMesh::named("low"), &buffer, subs, camera);
        lod
    }

    #[test]
    fn far_tile_enables_low_detail() {
        let mut subs = ViewSubscriptions::default();
        let lod = controller(Vec2::new(50.0, 0.0), Vec3::ZERO, &mut subs);
        assert_eq!(lod.state(), Some(LodState::Far));
        assert_eq!(lod.high().enabled, Some(false));
        assert_eq!(lod.low().unwrap().enabled, Some(true));
        assert_eq!(subs.iter().collect::<Vec<_>>(), vec![TileId(0)]);
    }

    #[test]
    fn near_tile_enables_high_detail() {
        let mut subs = ViewSubscriptions::default();
        // Camera height is ignored: distance is measured on the ground plane.
        let lod = controller(Vec2::new(10.0, 20.0), Vec3::new(10.0, 500.0, 0.0), &mut subs);
        assert_eq!(lod.state(), Some(LodState::Near));
        assert_eq!(lod.high().enabled, Some(true));
        assert_eq!(lod.low().unwrap().enabled, Some(false));
    }

    #[test]
    fn both_levels_share_the_buffer() {
        let mut subs = ViewSubscriptions::default();
        let lod = controller(Vec2::ZERO, Vec3::ZERO, &mut subs);
        assert_eq!(lod.high().bound_instances, Some(3));
        assert_eq!(lod.low().unwrap().bound_instances, Some(3));
    }

    #[test]
    fn same_side_notification_changes_nothing() {
        let mut subs = ViewSubscriptions::default();
        let mut lod = controller(Vec2::new(50.0, 0.0), Vec3::ZERO, &mut subs);
        let before = (lod.high().clone(), lod.low().cloned());

        assert_eq!(lod.on_view_changed(Vec3::new(-5.0, 3.0, 1.0)), None);
        assert_eq!((lod.high().clone(), lod.low().cloned()), before);
    }

    #[test]
    fn crossing_threshold_switches_both_ways() {
        let mut subs = ViewSubscriptions::default();
        let mut lod = controller(Vec2::new(50.0, 0.0), Vec3::ZERO, &mut subs);

        assert_eq!(lod.on_view_changed(Vec3::new(45.0, 0.0, 0.0)), Some(LodState::Near));
        assert_eq!(lod.high().enabled, Some(true));
        assert_eq!(lod.low().unwrap().enabled, Some(false));

        assert_eq!(lod.on_view_changed(Vec3::new(-100.0, 0.0, 0.0)), Some(LodState::Far));
        assert_eq!(lod.high().enabled, Some(false));
    }

    #[test]
    fn exactly_at_threshold_is_near_and_no_hysteresis() {
        let mut subs = ViewSubscriptions::default();
        let mut lod = controller(Vec2::new(40.0, 0.0), Vec3::ZERO, &mut subs);
        assert_eq!(lod.state(), Some(LodState::Near));

        // Oscillating across the boundary flips on every notification.
        for _ in 0..3 {
            assert_eq!(lod.on_view_changed(Vec3::new(-0.01, 0.0, 0.0)), Some(LodState::Far));
            assert_eq!(lod.on_view_changed(Vec3::ZERO), Some(LodState::Near));
        }
    }

    #[test]
    fn without_bounds_evaluation_is_a_no_op() {
        let buffer = InstanceBuffer::default();
        let mut subs = ViewSubscriptions::default();
        let mut lod = TileLodController::new(TileId(3), RecordingMesh::named("high"), &buffer);
        let initial = lod.add_low_detail(40.0, RecordingMesh::named("low"), &buffer, &mut subs, Vec3::ZERO);

        assert_eq!(initial, None);
        assert_eq!(lod.on_view_changed(Vec3::new(1000.0, 0.0, 0.0)), None);
        assert_eq!(lod.state(), None);
        assert_eq!(lod.high().enabled, None);
        assert_eq!(lod.low().unwrap().enabled, None);
    }

    #[test]
    fn material_reaches_both_levels() {
        let mut subs = ViewSubscriptions::default();
        let mut lod = controller(Vec2::ZERO, Vec3::ZERO, &mut subs);
        lod.set_material("grass");
        assert_eq!(lod.high().material, Some("grass"));
        assert_eq!(lod.low().unwrap().material, Some("grass"));
    }

    #[test]
    fn subscriptions_do_not_duplicate() {
        let mut subs = ViewSubscriptions::default();
        subs.subscribe(TileId(1));
        subs.subscribe(TileId(1));
        subs.subscribe(TileId(0));
        assert_eq!(subs.iter().collect::<Vec<_>>(), vec![TileId(1), TileId(0)]);
    }
}
