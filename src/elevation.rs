// src/elevation.rs
//! Stateless elevation field: the deterministic foundation every other part
//! of the terrain core samples. The same (x, z) always yields the same
//! height, from any chunk, which is what keeps shared chunk edges seamless
//! without a stitching step.

use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::config::TerrainSettings;

/// Seed salt for the lake-suitability channel so it lives in a different
/// noise domain than elevation.
const LAKE_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Anything that can answer "how high is the ground at world (x, z)".
/// The decorator places vegetation through this seam so it can be exercised
/// against synthetic fields in tests.
pub trait HeightSampler {
    fn elevation(&self, x: f32, z: f32) -> f32;
}

/// Pure function of (x, z) and the world seed. Holds only the configured
/// noise generators; no per-call state.
pub struct ElevationField {
    terrain: FastNoiseLite,
    lakes: FastNoiseLite,
    octave_weights: Vec<f32>,
    weight_total: f32,
    height_scale: f32,
}

impl ElevationField {
    pub fn new(settings: &TerrainSettings) -> Self {
        let mut terrain = FastNoiseLite::with_seed(settings.seed as i32);
        terrain.set_noise_type(Some(NoiseType::OpenSimplex2));
        terrain.set_frequency(Some(settings.base_frequency));

        let mut lakes = FastNoiseLite::with_seed((settings.seed ^ LAKE_SEED_SALT) as i32);
        lakes.set_noise_type(Some(NoiseType::OpenSimplex2));
        lakes.set_frequency(Some(settings.lake_frequency));

        let weight_total: f32 = settings.octave_weights.iter().sum();
        Self {
            terrain,
            lakes,
            octave_weights: settings.octave_weights.clone(),
            weight_total,
            height_scale: settings.height_scale,
        }
    }

    /// Lake suitability at world (x, z), normalized to [0, 1]. Sampled at
    /// chunk-center granularity by the decorator, never per vertex.
    pub fn lake_suitability(&self, x: f32, z: f32) -> f32 {
        (self.lakes.get_noise_2d(x, z) + 1.0) * 0.5
    }
}

impl HeightSampler for ElevationField {
    /// Weighted sum of OpenSimplex2 octaves at geometrically increasing
    /// frequency, normalized from [-1, 1] to [0, 1] and scaled to meters.
    fn elevation(&self, x: f32, z: f32) -> f32 {
        let mut sum = 0.0;
        let mut freq = 1.0;
        for &w in &self.octave_weights {
            sum += w * self.terrain.get_noise_2d(x * freq, z * freq);
            freq *= 2.0;
        }
        let normalized = (sum / self.weight_total + 1.0) * 0.5;
        normalized * self.height_scale
    }
}
