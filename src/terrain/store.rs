// src/terrain/store.rs
//! Spatial index of materialized chunks. All mutation goes through the
//! streaming scheduler; everything else reads.

use std::collections::HashMap;

use super::chunk::{Chunk, ChunkCoord};

/// Mapping from chunk coordinate to the live chunk. Never holds two entries
/// for the same coordinate. Duplicate inserts and absent removes indicate
/// scheduler state corruption and panic immediately rather than being
/// swallowed.
#[derive(Default)]
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl ChunkStore {
    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn insert(&mut self, chunk: Chunk) {
        let coord = chunk.coord;
        if self.chunks.insert(coord, chunk).is_some() {
            panic!("ChunkStore: duplicate insert at ({}, {})", coord.x, coord.z);
        }
    }

    pub fn remove(&mut self, coord: ChunkCoord) -> Chunk {
        self.chunks
            .remove(&coord)
            .unwrap_or_else(|| panic!("ChunkStore: remove of absent chunk ({}, {})", coord.x, coord.z))
    }

    pub fn keys(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
