// src/grass/render.rs
//! Bevy side of the renderer contract: a CPU-merged blade mesh that plays the
//! role of a mesh handle, and the shared uniform sink.

use std::collections::HashMap;

use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;

use super::error::MeshLoadError;
use super::instancing::{merge_blade_instances, InstanceBuffer};
use super::lod::MeshHandle;

/// Name of the elapsed-time uniform (milliseconds since startup).
pub const TIME_UNIFORM: &str = "uTime";

/// One detail level of one tile.
///
/// Binding bakes the instance buffer into a merged mesh; the spawn system
/// later moves that mesh into `Assets<Mesh>` and attaches an entity. Enable and
/// material changes are recorded and mirrored onto the entity by the sync system.
pub struct BladeMesh {
    label: String,
    source: Mesh,
    merged: Option<Mesh>,
    material: Option<Handle<StandardMaterial>>,
    entity: Option<Entity>,
    enabled: bool,
    visibility_dirty: bool,
    material_dirty: bool,
}

impl BladeMesh {
    /// Rejects a source mesh that cannot be instanced (no `Float32x3`
    /// positions), naming `label` in the error.
    pub fn new(label: impl Into<String>, source: Mesh) -> Result<Self, MeshLoadError> {
        let label = label.into();
        if !matches!(source.attribute(Mesh::ATTRIBUTE_POSITION), Some(VertexAttributeValues::Float32x3(_))) {
            return Err(MeshLoadError::new(label, "mesh has no Float32x3 vertex positions"));
        }
        Ok(Self {
            label,
            source,
            merged: None,
            material: None,
            entity: None,
            enabled: true,
            visibility_dirty: false,
            material_dirty: false,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn merged(&self) -> Option<&Mesh> {
        self.merged.as_ref()
    }

    /// Hand the merged mesh over for upload; `None` once taken or if unbound.
    pub fn take_merged(&mut self) -> Option<Mesh> {
        self.merged.take()
    }

    pub fn material(&self) -> Option<&Handle<StandardMaterial>> {
        self.material.as_ref()
    }

    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// Spawned entities start in sync with the handle.
    pub fn attach_entity(&mut self, entity: Entity) {
        self.entity = Some(entity);
        self.visibility_dirty = false;
        self.material_dirty = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn visibility(&self) -> Visibility {
        if self.enabled {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        }
    }

    /// Pending visibility for the attached entity, cleared on read.
    pub fn take_visibility_change(&mut self) -> Option<Visibility> {
        if !std::mem::take(&mut self.visibility_dirty) {
            return None;
        }
        Some(self.visibility())
    }

    pub fn take_material_change(&mut self) -> Option<Handle<StandardMaterial>> {
        if !std::mem::take(&mut self.material_dirty) {
            return None;
        }
        self.material.clone()
    }
}

impl MeshHandle for BladeMesh {
    type Material = Handle<StandardMaterial>;

    fn bind_instance_buffers(&mut self, buffer: &InstanceBuffer) {
        self.merged = merge_blade_instances(&self.source, buffer);
        if self.merged.is_none() {
            warn!("Grass: mesh '{}' has no Float32x3 positions; nothing to instance", self.label);
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.visibility_dirty = true;
        }
    }

    fn set_material(&mut self, material: Self::Material) {
        self.material = Some(material);
        self.material_dirty = true;
    }
}

/// Receiver for shader-wide scalar uniforms.
pub trait UniformSink {
    fn set_float(&mut self, name: &str, value: f32);
}

/// Latest value of every shared grass uniform.
#[derive(Resource, Default, Debug)]
pub struct GrassUniforms {
    values: HashMap<String, f32>,
}

impl GrassUniforms {
    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }
}

impl UniformSink for GrassUniforms {
    fn set_float(&mut self, name: &str, value: f32) {
        if let Some(v) = self.values.get_mut(name) {
            *v = value;
        } else {
            self.values.insert(name.to_string(), value);
        }
    }
}
