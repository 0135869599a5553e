//! Grass plugin wiring (glue).
//! - GrassSettings + status + shared uniforms
//! - Camera-change event (the LOD subscription channel)
//! - Field build: generate -> load blade meshes -> bind -> spawn
//! - Per-frame: view change -> LOD -> visibility sync, time uniform

use bevy::prelude::*;

use super::config::GrassSettings;
use super::render::GrassUniforms;
use super::systems::{
    apply_lod_on_view_change,
    emit_camera_view_changed,
    poll_field_loads,
    spawn_blade_entities,
    start_field_build,
    sync_blade_entities,
    tick_time_uniform,
    ActiveField,
    GrassFieldStatus,
    PendingField,
};

/// The camera whose position drives tile LOD.
#[derive(Component, Default)]
pub struct GrassViewer;

/// Fired whenever the viewer's world transform changes.
#[derive(Event, Clone, Copy, Debug)]
pub struct CameraViewChanged(pub Vec3);

pub struct GrassPlugin;
impl Plugin for GrassPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GrassSettings>()
            .init_resource::<GrassFieldStatus>()
            .init_resource::<GrassUniforms>()
            .add_event::<CameraViewChanged>()
            .add_systems(Startup, start_field_build)
            .add_systems(Update, tick_time_uniform)

            // ---- build: settle loads, then upload merged meshes once ----
            .add_systems(
                Update,
                (
                    poll_field_loads.run_if(resource_exists::<PendingField>),
                    spawn_blade_entities.run_if(resource_added::<ActiveField>),
                )
                    .chain(),
            )

            // ---- LOD ----
            .add_systems(
                Update,
                (emit_camera_view_changed, apply_lod_on_view_change, sync_blade_entities)
                    .chain()
                    .after(spawn_blade_entities)
                    .run_if(resource_exists::<ActiveField>),
            );
    }
}
