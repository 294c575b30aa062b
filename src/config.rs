// src/config.rs
//! Terrain settings: loaded once at startup from RON, validated before any
//! frame runs. Not hot-reloadable.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything the streaming core is parameterized by. One instance per
/// terrain; fixed for the process lifetime.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// World seed; changing this reshuffles terrain, lakes, and vegetation.
    pub seed: u64,

    /// World-space edge length of one chunk (meters).
    pub chunk_size: f32,
    /// Height samples per chunk edge (>= 2). Sample spacing is
    /// `chunk_size / (chunk_resolution - 1)` so both edges carry samples.
    pub chunk_resolution: usize,

    /// Chebyshev radius (in chunks) of the resident window around the observer.
    pub chunks_visible: i32,
    /// How many chunks ahead along the heading the predicted chunk sits.
    /// Must not exceed `chunks_visible`.
    pub look_ahead_distance: i32,
    /// Max chunk materializations per scheduler step.
    pub chunks_per_frame: usize,
    /// Max chunk evictions per scheduler step; strictly below
    /// `chunks_per_frame` so creation wins contention for the frame budget.
    pub removals_per_frame: usize,
    /// Fractional progress through the current chunk past which chunks in the
    /// travel direction get a directional priority bonus.
    pub load_threshold: f32,

    /// Peak-to-valley elevation range (meters).
    pub height_scale: f32,
    /// Base noise frequency for the first elevation octave.
    pub base_frequency: f32,
    /// Amplitude weight per octave; octave k samples at `2^k` times the base
    /// frequency.
    pub octave_weights: Vec<f32>,

    /// Frequency of the lake-suitability channel (decorrelated from terrain
    /// roughness; evaluated at chunk-center granularity only).
    pub lake_frequency: f32,
    /// Suitability above this spawns a water body on the chunk.
    pub lake_threshold: f32,
    /// Water slab edge length as a multiple of `chunk_size`.
    pub lake_size_factor: f32,
    /// Global water surface elevation (meters).
    pub water_level: f32,
    /// Samples below `water_level + lake_margin` are eligible for carving.
    pub lake_margin: f32,
    /// Basin depth below the water surface at the chunk center.
    pub lake_max_depth: f32,
    /// Minimum basin depth anywhere inside the carved region.
    pub lake_min_depth: f32,

    /// Vegetation candidates per square meter of chunk footprint.
    pub vegetation_density: f32,
    /// Max elevation delta per meter for a candidate to be accepted.
    pub flatness_threshold: f32,
    /// Uniform scale multiplier range for accepted instances.
    pub vegetation_scale: (f32, f32),
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            seed: 1337,
            chunk_size: 200.0,
            chunk_resolution: 33,
            chunks_visible: 5,
            look_ahead_distance: 3,
            chunks_per_frame: 4,
            removals_per_frame: 2,
            load_threshold: 0.7,
            height_scale: 120.0,
            base_frequency: 0.004,
            octave_weights: vec![1.0, 0.4, 0.2, 0.125],
            lake_frequency: 0.0009,
            lake_threshold: 0.72,
            lake_size_factor: 4.0,
            water_level: 34.0,
            lake_margin: 4.0,
            lake_max_depth: 12.0,
            lake_min_depth: 2.0,
            vegetation_density: 0.0015,
            flatness_threshold: 0.6,
            vegetation_scale: (0.8, 1.3),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings RON: {0}")]
    Ron(String),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

impl TerrainSettings {
    /// Load from a RON file, or fall back to defaults when the file does not
    /// exist. Parse errors in an existing file are still fatal.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        ron::de::from_str(&text).map_err(|e| SettingsError::Ron(e.to_string()))
    }

    /// Startup validation. A malformed configuration is a fatal error, not a
    /// runtime fault.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fail = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));

        if !(self.chunk_size > 0.0) {
            return fail("chunk_size must be positive");
        }
        if self.chunk_resolution < 2 {
            return fail("chunk_resolution must be at least 2");
        }
        if self.chunks_visible < 1 {
            return fail("chunks_visible must be at least 1");
        }
        if self.look_ahead_distance < 0 {
            return fail("look_ahead_distance must not be negative");
        }
        if self.look_ahead_distance > self.chunks_visible {
            // Predicting past the retention window thrashes the boundary.
            return fail("look_ahead_distance must not exceed chunks_visible");
        }
        if self.chunks_per_frame == 0 {
            return fail("chunks_per_frame must be at least 1");
        }
        if self.removals_per_frame == 0 {
            return fail("removals_per_frame must be at least 1");
        }
        if self.removals_per_frame >= self.chunks_per_frame {
            return fail("removals_per_frame must be strictly below chunks_per_frame");
        }
        if !(0.0..1.0).contains(&self.load_threshold) {
            return fail("load_threshold must be in [0, 1)");
        }
        if !(self.height_scale > 0.0) {
            return fail("height_scale must be positive");
        }
        if !(self.base_frequency > 0.0) || !(self.lake_frequency > 0.0) {
            return fail("noise frequencies must be positive");
        }
        if self.octave_weights.is_empty() || self.octave_weights.iter().any(|w| *w <= 0.0) {
            return fail("octave_weights must be non-empty and positive");
        }
        if !(self.lake_size_factor > 0.0) {
            return fail("lake_size_factor must be positive");
        }
        if self.lake_min_depth <= 0.0 || self.lake_max_depth < self.lake_min_depth {
            return fail("lake depths must satisfy 0 < min <= max");
        }
        if self.vegetation_density < 0.0 {
            return fail("vegetation_density must not be negative");
        }
        if !(self.flatness_threshold > 0.0) {
            return fail("flatness_threshold must be positive");
        }
        let (lo, hi) = self.vegetation_scale;
        if !(lo > 0.0 && hi >= lo) {
            return fail("vegetation_scale must satisfy 0 < min <= max");
        }
        Ok(())
    }
}
