// src/terrain/chunk.rs
//! Chunk data: lattice coordinates, the height-sample grid, and the owned
//! decorations. A chunk is fully populated before anyone else sees it and is
//! torn down whole; there is no partially materialized state.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TerrainSettings;
use crate::elevation::{ElevationField, HeightSampler};

/// Integer chunk coordinate in XZ. A chunk's world footprint is
/// `[x*S, (x+1)*S) x [z*S, (z+1)*S)` for chunk size S.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world-space XZ position.
    pub fn from_world(x: f32, z: f32, chunk_size: f32) -> Self {
        Self {
            x: (x / chunk_size).floor() as i32,
            z: (z / chunk_size).floor() as i32,
        }
    }

    /// World-space min corner of the footprint.
    pub fn world_origin(self, chunk_size: f32) -> Vec2 {
        Vec2::new(self.x as f32 * chunk_size, self.z as f32 * chunk_size)
    }

    /// World-space center of the footprint.
    pub fn world_center(self, chunk_size: f32) -> Vec2 {
        self.world_origin(chunk_size) + Vec2::splat(chunk_size * 0.5)
    }

    /// Chessboard distance; the want-set is a Chebyshev ball.
    pub fn chebyshev(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

/// R x R elevation samples covering one chunk footprint, row-major in j.
/// Sample (i, j) sits at world `((cx + i/(R-1)) * S, (cz + j/(R-1)) * S)`,
/// so the last column of one chunk and the first column of its +x neighbor
/// are evaluated at bit-identical world coordinates.
#[derive(Clone, Debug)]
pub struct HeightGrid {
    resolution: usize,
    samples: Vec<f32>,
}

impl HeightGrid {
    /// Sample the elevation field across the footprint of `coord`.
    pub fn generate(coord: ChunkCoord, field: &ElevationField, settings: &TerrainSettings) -> Self {
        let r = settings.chunk_resolution;
        let s = settings.chunk_size;
        let inv = 1.0 / (r - 1) as f32;
        let mut samples = Vec::with_capacity(r * r);
        for j in 0..r {
            let z = (coord.z as f32 + j as f32 * inv) * s;
            for i in 0..r {
                let x = (coord.x as f32 + i as f32 * inv) * s;
                samples.push(field.elevation(x, z));
            }
        }
        Self { resolution: r, samples }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.samples[j * self.resolution + i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, h: f32) {
        self.samples[j * self.resolution + i] = h;
    }

    /// World XZ position of sample (i, j).
    pub fn sample_pos(&self, coord: ChunkCoord, settings: &TerrainSettings, i: usize, j: usize) -> Vec2 {
        let inv = 1.0 / (self.resolution - 1) as f32;
        Vec2::new(
            (coord.x as f32 + i as f32 * inv) * settings.chunk_size,
            (coord.z as f32 + j as f32 * inv) * settings.chunk_size,
        )
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Planar water surface at the global water level, owned by the chunk that
/// spawned it. Sized as a multiple of the chunk size so one seed chunk reads
/// as a lake spanning many chunks.
#[derive(Clone, Copy, Debug)]
pub struct WaterBody {
    pub center: Vec2,
    pub half_extent: f32,
    pub surface_level: f32,
}

/// One placed plant: position on the ground, yaw around +Y, uniform scale.
#[derive(Clone, Copy, Debug)]
pub struct VegetationInstance {
    pub position: Vec3,
    pub yaw: f32,
    pub scale: f32,
}

/// A fixed-size square tile of terrain with its own height samples and
/// decorations. Decoration containers are always present (possibly empty)
/// rather than optional attachments.
pub struct Chunk {
    pub coord: ChunkCoord,
    pub heights: HeightGrid,
    pub water: Option<WaterBody>,
    pub vegetation: Vec<VegetationInstance>,
}

impl Chunk {
    /// Raw, undecorated chunk: heights only. The scheduler runs the decorator
    /// over this before the chunk is inserted anywhere.
    pub fn generate(coord: ChunkCoord, field: &ElevationField, settings: &TerrainSettings) -> Self {
        Self {
            coord,
            heights: HeightGrid::generate(coord, field, settings),
            water: None,
            vegetation: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_world_floors_negative_coordinates() {
        assert_eq!(ChunkCoord::from_world(10.0, 10.0, 200.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(-0.5, -0.5, 200.0), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_world(200.0, -200.0, 200.0), ChunkCoord::new(1, -1));
    }

    #[test]
    fn chebyshev_is_chessboard_distance() {
        let a = ChunkCoord::new(0, 0);
        assert_eq!(a.chebyshev(ChunkCoord::new(3, -2)), 3);
        assert_eq!(a.chebyshev(ChunkCoord::new(-1, 5)), 5);
        assert_eq!(a.chebyshev(a), 0);
    }

    #[test]
    fn regenerated_chunk_is_bit_identical() {
        let settings = TerrainSettings::default();
        let field = ElevationField::new(&settings);
        let a = HeightGrid::generate(ChunkCoord::new(3, -7), &field, &settings);
        let b = HeightGrid::generate(ChunkCoord::new(3, -7), &field, &settings);
        assert_eq!(a.samples().len(), b.samples().len());
        for (x, y) in a.samples().iter().zip(b.samples()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn adjacent_chunks_share_edge_heights_exactly() {
        let settings = TerrainSettings::default();
        let field = ElevationField::new(&settings);
        let r = settings.chunk_resolution;

        let a = HeightGrid::generate(ChunkCoord::new(0, 0), &field, &settings);
        let b = HeightGrid::generate(ChunkCoord::new(1, 0), &field, &settings);
        for j in 0..r {
            assert_eq!(
                a.get(r - 1, j).to_bits(),
                b.get(0, j).to_bits(),
                "seam mismatch at row {j}"
            );
        }

        let c = HeightGrid::generate(ChunkCoord::new(0, 1), &field, &settings);
        for i in 0..r {
            assert_eq!(
                a.get(i, r - 1).to_bits(),
                c.get(i, 0).to_bits(),
                "seam mismatch at column {i}"
            );
        }
    }
}
