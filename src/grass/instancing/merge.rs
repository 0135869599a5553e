// src/grass/instancing/merge.rs
//! CPU instancing (mesh merging) for grass tiles.
//! Bakes one copy of the blade mesh per instance transform into a single mesh,
//! and writes the per-instance attributes out as extra vertex attributes so a
//! custom grass shader can pick them up.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, MeshVertexAttribute, PrimitiveTopology, VertexAttributeValues};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::VertexFormat;

use super::buffer::InstanceBuffer;

pub const ATTRIBUTE_BLADE_OFFSET: MeshVertexAttribute =
    MeshVertexAttribute::new("Vertex_BladeOffset", 988_540_917, VertexFormat::Float32x2);
pub const ATTRIBUTE_BLADE_RANDOM: MeshVertexAttribute =
    MeshVertexAttribute::new("Vertex_BladeRandom", 988_540_918, VertexFormat::Float32);
pub const ATTRIBUTE_BLADE_SCALE: MeshVertexAttribute =
    MeshVertexAttribute::new("Vertex_BladeScale", 988_540_919, VertexFormat::Float32);

/// Merge `src` once per instance in `buffer`.
///
/// Returns `None` when the source has no `Float32x3` positions. Normals and UVs
/// are carried over when present.
pub fn merge_blade_instances(src: &Mesh, buffer: &InstanceBuffer) -> Option<Mesh> {
    let positions: &[[f32; 3]] = match src.attribute(Mesh::ATTRIBUTE_POSITION)? {
        VertexAttributeValues::Float32x3(v) => v,
        _ => return None,
    };
    let normals: Option<&[[f32; 3]]> = match src.attribute(Mesh::ATTRIBUTE_NORMAL) {
        Some(VertexAttributeValues::Float32x3(v)) => Some(v),
        _ => None,
    };
    let uvs: Option<&[[f32; 2]]> = match src.attribute(Mesh::ATTRIBUTE_UV_0) {
        Some(VertexAttributeValues::Float32x2(v)) => Some(v),
        _ => None,
    };
    let src_indices: Option<Vec<u32>> = match src.indices() {
        Some(Indices::U32(v)) => Some(v.clone()),
        Some(Indices::U16(v)) => Some(v.iter().map(|&x| x as u32).collect()),
        None => None,
    };

    let vtx = positions.len();
    let total = vtx * buffer.len();

    let mut out_positions = Vec::with_capacity(total);
    let mut out_normals = normals.map(|_| Vec::with_capacity(total));
    let mut out_uvs = uvs.map(|_| Vec::with_capacity(total));
    let mut out_offset: Vec<[f32; 2]> = Vec::with_capacity(total);
    let mut out_random: Vec<f32> = Vec::with_capacity(total);
    let mut out_scale: Vec<f32> = Vec::with_capacity(total);
    let mut out_indices: Vec<u32> =
        Vec::with_capacity(src_indices.as_ref().map_or(0, |ix| ix.len()) * buffer.len());

    for k in 0..buffer.len() {
        let (Some(trs), Some(offset)) = (buffer.transform_at(k), buffer.offset_at(k)) else {
            break;
        };
        let random = buffer.random_phase[k];
        let scale = buffer.noise_scale[k];

        for (i, p) in positions.iter().enumerate() {
            out_positions.push(trs.transform_point3(Vec3::from_array(*p)).to_array());

            if let (Some(src_n), Some(dst_n)) = (normals, out_normals.as_mut()) {
                let n = trs.transform_vector3(Vec3::from_array(src_n[i])).normalize_or_zero();
                dst_n.push(n.to_array());
            }
            if let (Some(src_uv), Some(dst_uv)) = (uvs, out_uvs.as_mut()) {
                dst_uv.push(src_uv[i]);
            }
            out_offset.push(offset);
            out_random.push(random);
            out_scale.push(scale);
        }

        if let Some(ix) = &src_indices {
            let base = (k * vtx) as u32;
            out_indices.extend(ix.iter().map(|&i| i + base));
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, out_positions);
    if let Some(n) = out_normals {
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, n);
    }
    if let Some(uv) = out_uvs {
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uv);
    }
    mesh.insert_attribute(ATTRIBUTE_BLADE_OFFSET, out_offset);
    mesh.insert_attribute(ATTRIBUTE_BLADE_RANDOM, out_random);
    mesh.insert_attribute(ATTRIBUTE_BLADE_SCALE, out_scale);
    if src_indices.is_some() {
        mesh.insert_indices(Indices::U32(out_indices));
    }
    Some(mesh)
}
