// src/terrain/mesh.rs
//! Chunk mesh construction for the renderer. Positions come straight from
//! the chunk's height grid; normals are central differences sampled from the
//! elevation field itself, so they agree across chunk seams without any
//! neighbor bookkeeping.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, Mesh, PrimitiveTopology};

use crate::config::TerrainSettings;
use crate::elevation::{ElevationField, HeightSampler};

use super::chunk::Chunk;

/// World-space step for the normal finite differences.
const NORMAL_PROBE: f32 = 1.0;

pub fn build_chunk_mesh(chunk: &Chunk, field: &ElevationField, settings: &TerrainSettings) -> Mesh {
    let r = chunk.heights.resolution();
    let inv = 1.0 / (r - 1) as f32;

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(r * r);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(r * r);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(r * r);

    for j in 0..r {
        for i in 0..r {
            let p = chunk.heights.sample_pos(chunk.coord, settings, i, j);
            let h = chunk.heights.get(i, j);
            positions.push([p.x, h, p.y]);
            uvs.push([i as f32 * inv, j as f32 * inv]);

            // Gradient of the raw field; carved lake beds keep the uncarved
            // normal, which reads fine under water.
            let hl = field.elevation(p.x - NORMAL_PROBE, p.y);
            let hr = field.elevation(p.x + NORMAL_PROBE, p.y);
            let hd = field.elevation(p.x, p.y - NORMAL_PROBE);
            let hu = field.elevation(p.x, p.y + NORMAL_PROBE);
            let n = Vec3::new(
                (hl - hr) / (2.0 * NORMAL_PROBE),
                1.0,
                (hd - hu) / (2.0 * NORMAL_PROBE),
            )
            .normalize_or_zero();
            normals.push([n.x, n.y, n.z]);
        }
    }

    let mut indices: Vec<u32> = Vec::with_capacity((r - 1) * (r - 1) * 6);
    for j in 0..(r - 1) {
        for i in 0..(r - 1) {
            let i0 = (j * r + i) as u32;
            let i1 = i0 + 1;
            let i2 = i0 + r as u32;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::chunk::ChunkCoord;
    use crate::terrain::decorate::decorate_chunk;

    #[test]
    fn mesh_has_one_vertex_per_height_sample() {
        let settings = TerrainSettings {
            chunk_resolution: 9,
            ..Default::default()
        };
        let field = ElevationField::new(&settings);
        let mut chunk = Chunk::generate(ChunkCoord::new(1, 2), &field, &settings);
        decorate_chunk(&mut chunk, &field, &settings);
        let mesh = build_chunk_mesh(&chunk, &field, &settings);
        assert_eq!(mesh.count_vertices(), 81);
        match mesh.indices() {
            Some(Indices::U32(ix)) => assert_eq!(ix.len(), 8 * 8 * 6),
            other => panic!("unexpected indices: {other:?}"),
        }
    }
}
