// src/terrain/decorate.rs
//! Deterministic decoration pass: lake-basin carving and vegetation
//! placement on top of a freshly sampled height grid. Everything here is a
//! pure function of the chunk, the elevation field, and the world seed, so a
//! regenerated chunk makes the same decisions.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::TerrainSettings;
use crate::elevation::{ElevationField, HeightSampler};

use super::chunk::{Chunk, ChunkCoord, VegetationInstance, WaterBody};

/// World-space distance between a candidate and its slope probe points.
const SLOPE_PROBE: f32 = 2.0;

/// Per-chunk RNG, mixed from the world seed and the chunk coordinate.
fn chunk_rng(seed: u64, coord: ChunkCoord) -> ChaCha8Rng {
    let mix = seed
        ^ ((coord.x as u64) << 16)
        ^ ((coord.z as u64) << 32)
        ^ 0x9E37_79B9_7F4A_7C15u64;
    ChaCha8Rng::seed_from_u64(mix)
}

#[inline]
fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Run the full decoration pass over a raw chunk. Producing no water body and
/// no vegetation is a legitimate outcome, not an error.
pub fn decorate_chunk(chunk: &mut Chunk, field: &ElevationField, settings: &TerrainSettings) {
    let center = chunk.coord.world_center(settings.chunk_size);
    let suitability = field.lake_suitability(center.x, center.y);
    if suitability > settings.lake_threshold {
        carve_lake_basin(chunk, settings);
        chunk.water = Some(WaterBody {
            center,
            half_extent: settings.chunk_size * settings.lake_size_factor * 0.5,
            surface_level: settings.water_level,
        });
    }

    chunk.vegetation = place_vegetation(chunk.coord, chunk.water.as_ref(), field, settings);
}

/// Lower eligible samples toward a depth target with a smooth radial falloff
/// from the chunk center: closer to center means deeper, bounded by
/// `lake_min_depth`, and the blend weight fades to zero at the rim so there
/// is no vertical discontinuity against uncarved neighbors.
///
/// The falloff is measured from the grid's edge ring, so it is exactly zero
/// along the entire chunk boundary: shared-edge samples are never rewritten
/// and a lake chunk stays seam-exact against its uncarved neighbors.
fn carve_lake_basin(chunk: &mut Chunk, settings: &TerrainSettings) {
    let band_top = settings.water_level + settings.lake_margin;
    let r = chunk.heights.resolution();
    let half_span = (r - 1) as f32 * 0.5;

    for j in 0..r {
        for i in 0..r {
            let h = chunk.heights.get(i, j);
            if h >= band_top {
                continue;
            }
            // Rings of samples from the boundary inward; 0 on the boundary
            // itself, 1 at the grid center.
            let di = i.min(r - 1 - i);
            let dj = j.min(r - 1 - j);
            let rim = di.min(dj) as f32 / half_span;
            let radial = smoothstep(rim);
            // Fade in across the eligibility band as well, so the band edge
            // itself introduces no step.
            let band = ((band_top - h) / settings.lake_margin).clamp(0.0, 1.0);
            let falloff = radial * band;

            let depth = settings.lake_min_depth
                + falloff * (settings.lake_max_depth - settings.lake_min_depth);
            let target = settings.water_level - depth;
            let carved = h + falloff * (target - h);
            chunk.heights.set(i, j, h.min(carved));
        }
    }
}

/// Draw `floor(area * density)` uniform candidates inside the footprint and
/// keep the ones on ground flat enough to hold a plant. The slope comes from
/// two offset elevation probes, so no slope field is precomputed. When the
/// chunk carries a lake, candidates below the top of the carve band are
/// rejected: the basin pass may have lowered that ground out from under them.
pub fn place_vegetation(
    coord: ChunkCoord,
    water: Option<&WaterBody>,
    sampler: &dyn HeightSampler,
    settings: &TerrainSettings,
) -> Vec<VegetationInstance> {
    let s = settings.chunk_size;
    let count = (s * s * settings.vegetation_density).floor() as usize;
    if count == 0 {
        return Vec::new();
    }

    let origin = coord.world_origin(s);
    let (scale_min, scale_max) = settings.vegetation_scale;
    let mut rng = chunk_rng(settings.seed, coord);
    let mut out = Vec::with_capacity(count);

    for _ in 0..count {
        let x = origin.x + rng.random_range(0.0..s);
        let z = origin.y + rng.random_range(0.0..s);
        // Draw the full tuple before filtering so the RNG stream does not
        // depend on which candidates pass.
        let yaw = rng.random_range(0.0..std::f32::consts::TAU);
        let scale = rng.random_range(scale_min..=scale_max);

        let h = sampler.elevation(x, z);
        let hx = sampler.elevation(x + SLOPE_PROBE, z);
        let hz = sampler.elevation(x, z + SLOPE_PROBE);
        let slope = (hx - h).abs().max((hz - h).abs()) / SLOPE_PROBE;
        if slope > settings.flatness_threshold {
            continue;
        }
        if let Some(w) = water {
            if h < w.surface_level + settings.lake_margin {
                continue;
            }
        }

        out.push(VegetationInstance {
            position: bevy::math::Vec3::new(x, h, z),
            yaw,
            scale,
        });
    }
    out
}
