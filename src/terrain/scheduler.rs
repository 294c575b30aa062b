// src/terrain/scheduler.rs
//! Per-frame streaming scheduler: a budgeted, priority-driven reconciliation
//! between the want-set around the observer and the chunks actually resident.
//! One `StreamedTerrain` is one independent terrain; there is no process-wide
//! state, so tests (or a split-screen setup) can run several side by side.

use bevy::prelude::*;

use crate::config::TerrainSettings;
use crate::elevation::ElevationField;

use super::chunk::{Chunk, ChunkCoord};
use super::decorate::decorate_chunk;
use super::store::ChunkStore;

/// Flat bonus for chunks on the far side of a boundary the observer is about
/// to cross (per axis past `load_threshold`).
const DIRECTIONAL_BONUS: f32 = 4.0;
/// Chebyshev radius of the look-ahead cone around the predicted chunk.
const CONE_RADIUS: i32 = 2;
/// Bonus per ring inside the cone; sized to outrank any distance penalty
/// inside the visible window so cone chunks always drain first.
const CONE_BONUS: f32 = 8.0;

/// Heading components below this are treated as "not travelling on this axis".
const HEADING_EPSILON: f32 = 1e-3;

/// Observer pose sampled once per frame. The core never mutates it.
#[derive(Clone, Copy, Debug)]
pub struct ObserverSample {
    pub position: Vec3,
    /// Direction of travel; only the XZ projection matters here.
    pub heading: Vec3,
}

/// Transient load work item; exists only between enqueue and drain.
struct LoadItem {
    coord: ChunkCoord,
    priority: f32,
}

/// What one scheduler step did, for the rendering collaborator to mirror.
/// Every coordinate in `loaded` is resident (fully decorated) by the time the
/// step returns; every coordinate in `unloaded` is gone.
#[derive(Default)]
pub struct StepOutput {
    pub loaded: Vec<ChunkCoord>,
    pub unloaded: Vec<ChunkCoord>,
}

/// One terrain: settings, elevation field, resident chunks, and the two work
/// queues. The only writer of the store.
pub struct StreamedTerrain {
    settings: TerrainSettings,
    field: ElevationField,
    store: ChunkStore,
    load_queue: Vec<LoadItem>,
    removal_queue: Vec<ChunkCoord>,
}

impl StreamedTerrain {
    /// Expects validated settings; see `TerrainSettings::validate`.
    pub fn new(settings: TerrainSettings) -> Self {
        let field = ElevationField::new(&settings);
        Self {
            settings,
            field,
            store: ChunkStore::default(),
            load_queue: Vec::new(),
            removal_queue: Vec::new(),
        }
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    pub fn field(&self) -> &ElevationField {
        &self.field
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// True once both queues are empty, i.e. the resident set matches the
    /// want-set of the last observed pose.
    pub fn is_settled(&self) -> bool {
        self.load_queue.is_empty() && self.removal_queue.is_empty()
    }

    /// One frame of streaming work. Runs to completion; the budgets
    /// `chunks_per_frame` / `removals_per_frame` are the only throttle.
    pub fn step(&mut self, observer: &ObserverSample) -> StepOutput {
        let s = self.settings.chunk_size;
        let visible = self.settings.chunks_visible;

        let current = ChunkCoord::from_world(observer.position.x, observer.position.z, s);
        let progress = Vec2::new(
            observer.position.x.rem_euclid(s) / s,
            observer.position.z.rem_euclid(s) / s,
        );
        let heading = Vec2::new(observer.heading.x, observer.heading.z).normalize_or_zero();
        let predicted = self.predict(current, heading);

        // Refresh the queues against the new want-set: loads that drifted out
        // of range are dropped without side effects, removals that came back
        // into range are de-queued rather than evicted and recreated.
        self.load_queue
            .retain(|item| current.chebyshev(item.coord) <= visible);
        self.removal_queue
            .retain(|coord| current.chebyshev(*coord) > visible);

        // Re-score what survived; the observer has moved since enqueue.
        for item in &mut self.load_queue {
            item.priority = load_priority(&self.settings, item.coord, current, predicted, heading, progress);
        }

        // Want-set diff: enqueue wanted coordinates that are neither resident
        // nor already queued.
        for dz in -visible..=visible {
            for dx in -visible..=visible {
                let coord = ChunkCoord::new(current.x + dx, current.z + dz);
                if self.store.contains(coord) {
                    continue;
                }
                if self.load_queue.iter().any(|item| item.coord == coord) {
                    continue;
                }
                let priority =
                    load_priority(&self.settings, coord, current, predicted, heading, progress);
                self.load_queue.push(LoadItem { coord, priority });
            }
        }

        // Evict-set: resident chunks outside the retention window.
        let stale: Vec<ChunkCoord> = self
            .store
            .keys()
            .filter(|coord| current.chebyshev(*coord) > visible)
            .filter(|coord| !self.removal_queue.contains(coord))
            .collect();
        self.removal_queue.extend(stale);

        let mut out = StepOutput::default();

        // Highest priority first; the stable sort keeps insertion order among
        // equal priorities, so tie-breaking stays deterministic.
        self.load_queue.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let take = self.settings.chunks_per_frame.min(self.load_queue.len());
        for item in self.load_queue.drain(..take) {
            debug_assert!(!self.store.contains(item.coord));
            let mut chunk = Chunk::generate(item.coord, &self.field, &self.settings);
            decorate_chunk(&mut chunk, &self.field, &self.settings);
            self.store.insert(chunk);
            out.loaded.push(item.coord);
        }

        // Removal is throttled below creation: a late eviction costs memory,
        // a late creation costs visible popping.
        let take = self.settings.removals_per_frame.min(self.removal_queue.len());
        for coord in self.removal_queue.drain(..take) {
            self.store.remove(coord);
            out.unloaded.push(coord);
        }

        if !out.loaded.is_empty() || !out.unloaded.is_empty() {
            debug!(
                "stream step at ({}, {}): +{} -{} resident={} queued={}",
                current.x,
                current.z,
                out.loaded.len(),
                out.unloaded.len(),
                self.store.len(),
                self.load_queue.len(),
            );
        }
        out
    }

    /// Chunk the observer is expected to occupy `look_ahead_distance` chunks
    /// from now, projected along the heading. Falls back to the current chunk
    /// when the observer is not travelling horizontally.
    fn predict(&self, current: ChunkCoord, heading: Vec2) -> ChunkCoord {
        if heading.length_squared() < HEADING_EPSILON {
            return current;
        }
        let d = self.settings.look_ahead_distance as f32;
        ChunkCoord::new(
            current.x + (heading.x * d).round() as i32,
            current.z + (heading.y * d).round() as i32,
        )
    }
}

/// Priority score for loading `coord`. The source used two overlapping
/// "ahead of travel" heuristics; they are consolidated here into one formula
/// with the same observable ordering: distance penalizes, crossing a boundary
/// in the travel direction rewards, proximity to the predicted chunk rewards
/// the most.
fn load_priority(
    settings: &TerrainSettings,
    coord: ChunkCoord,
    current: ChunkCoord,
    predicted: ChunkCoord,
    heading: Vec2,
    progress: Vec2,
) -> f32 {
    let mut score = -(current.chebyshev(coord) as f32);

    // Directional bonus once the observer is most of the way through the
    // current chunk: chunks further along each travelled axis load earlier.
    for (h, prog, delta) in [
        (heading.x, progress.x, coord.x - current.x),
        (heading.y, progress.y, coord.z - current.z),
    ] {
        if h.abs() < HEADING_EPSILON {
            continue;
        }
        let toward_edge = if h > 0.0 { prog } else { 1.0 - prog };
        if toward_edge > settings.load_threshold && (delta as f32) * h > 0.0 {
            score += DIRECTIONAL_BONUS;
        }
    }

    // Look-ahead cone: the closer to the predicted chunk, the larger the
    // bonus.
    let cone_dist = predicted.chebyshev(coord);
    if cone_dist <= CONE_RADIUS {
        score += CONE_BONUS * (CONE_RADIUS - cone_dist + 1) as f32;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> TerrainSettings {
        let settings = TerrainSettings {
            chunk_resolution: 5,
            vegetation_density: 0.0002,
            ..Default::default()
        };
        settings.validate().unwrap();
        settings
    }

    fn at_chunk_center(coord: ChunkCoord, settings: &TerrainSettings) -> ObserverSample {
        let c = coord.world_center(settings.chunk_size);
        ObserverSample {
            position: Vec3::new(c.x, 200.0, c.y),
            heading: Vec3::X,
        }
    }

    fn settle(terrain: &mut StreamedTerrain, observer: &ObserverSample) {
        for _ in 0..10_000 {
            terrain.step(observer);
            if terrain.is_settled() {
                return;
            }
        }
        panic!("terrain never settled");
    }

    #[test]
    fn initial_want_set_drains_to_exactly_121_chunks() {
        let settings = test_settings();
        assert_eq!(settings.chunks_visible, 5);
        let mut terrain = StreamedTerrain::new(settings.clone());
        let observer = ObserverSample {
            position: Vec3::new(0.0, 150.0, 0.0),
            heading: Vec3::X,
        };
        settle(&mut terrain, &observer);

        assert_eq!(terrain.store().len(), 121);
        let current = ChunkCoord::new(0, 0);
        for coord in terrain.store().keys() {
            assert!(current.chebyshev(coord) <= settings.chunks_visible);
        }
    }

    #[test]
    fn a_single_step_respects_both_budgets() {
        let settings = test_settings();
        let mut terrain = StreamedTerrain::new(settings.clone());
        let observer = at_chunk_center(ChunkCoord::new(0, 0), &settings);
        settle(&mut terrain, &observer);

        // Teleport far enough that everything resident becomes stale and a
        // whole new window is wanted.
        let far = at_chunk_center(ChunkCoord::new(100, 100), &settings);
        for _ in 0..200 {
            let out = terrain.step(&far);
            assert!(out.loaded.len() <= settings.chunks_per_frame);
            assert!(out.unloaded.len() <= settings.removals_per_frame);
            if terrain.is_settled() {
                break;
            }
        }
    }

    #[test]
    fn resident_set_stays_bounded_after_any_movement() {
        let settings = TerrainSettings {
            chunks_visible: 2,
            look_ahead_distance: 2,
            ..test_settings()
        };
        settings.validate().unwrap();
        let cap = (2 * settings.chunks_visible as usize + 1).pow(2);
        let mut terrain = StreamedTerrain::new(settings.clone());

        // Fly a dog-leg path, then stop and drain.
        for k in 0..40 {
            let observer = at_chunk_center(ChunkCoord::new(k, k / 3), &settings);
            terrain.step(&observer);
        }
        let rest = at_chunk_center(ChunkCoord::new(39, 13), &settings);
        settle(&mut terrain, &rest);
        assert!(
            terrain.store().len() <= cap,
            "resident {} exceeds cap {cap}",
            terrain.store().len()
        );
        assert_eq!(terrain.store().len(), cap);
    }

    #[test]
    fn leading_edge_outranks_trailing_edge_past_load_threshold() {
        let settings = test_settings();
        let current = ChunkCoord::new(0, 0);
        let heading = Vec2::X;
        let progress = Vec2::new(0.75, 0.5);
        let predicted = ChunkCoord::new(settings.look_ahead_distance, 0);

        let ahead = load_priority(&settings, ChunkCoord::new(6, 0), current, predicted, heading, progress);
        let behind = load_priority(&settings, ChunkCoord::new(-6, 0), current, predicted, heading, progress);
        assert!(
            ahead > behind,
            "leading edge {ahead} should outrank trailing edge {behind}"
        );
    }

    #[test]
    fn no_directional_bonus_below_load_threshold() {
        let settings = test_settings();
        let current = ChunkCoord::new(0, 0);
        let heading = Vec2::X;
        let progress = Vec2::new(0.3, 0.5);
        // Keep both probes outside the cone so only distance and direction
        // can differ.
        let predicted = ChunkCoord::new(settings.look_ahead_distance, 0);
        let ahead = load_priority(&settings, ChunkCoord::new(-5, 5), current, predicted, heading, progress);
        let behind = load_priority(&settings, ChunkCoord::new(5, 5), current, predicted, heading, progress);
        assert_eq!(ahead, behind);
    }

    #[test]
    fn cone_chunks_outrank_everything_else_in_the_window() {
        let settings = test_settings();
        let current = ChunkCoord::new(0, 0);
        let heading = Vec2::X;
        let progress = Vec2::new(0.5, 0.5);
        let predicted = ChunkCoord::new(settings.look_ahead_distance, 0);

        let worst_cone = load_priority(
            &settings,
            ChunkCoord::new(settings.look_ahead_distance + CONE_RADIUS, 0),
            current,
            predicted,
            heading,
            progress,
        );
        // Closest possible non-cone candidate, perpendicular to travel.
        let best_other = load_priority(&settings, ChunkCoord::new(0, 1), current, predicted, heading, progress);
        assert!(worst_cone > best_other);
    }

    #[test]
    fn predicted_chunk_is_materialized_first() {
        let settings = test_settings();
        let mut terrain = StreamedTerrain::new(settings.clone());
        let observer = at_chunk_center(ChunkCoord::new(0, 0), &settings);
        let out = terrain.step(&observer);
        assert_eq!(
            out.loaded.first().copied(),
            Some(ChunkCoord::new(settings.look_ahead_distance, 0))
        );
    }

    #[test]
    fn stale_queued_loads_are_dropped_without_side_effects() {
        let settings = test_settings();
        let mut terrain = StreamedTerrain::new(settings.clone());
        let origin = at_chunk_center(ChunkCoord::new(0, 0), &settings);
        terrain.step(&origin);
        assert!(!terrain.load_queue.is_empty());

        let far = at_chunk_center(ChunkCoord::new(500, -500), &settings);
        terrain.step(&far);
        let current = ChunkCoord::new(500, -500);
        for item in &terrain.load_queue {
            assert!(current.chebyshev(item.coord) <= settings.chunks_visible);
        }
    }

    #[test]
    fn removals_are_dequeued_when_the_coordinate_comes_back_in_range() {
        let settings = TerrainSettings {
            chunks_visible: 2,
            look_ahead_distance: 1,
            ..test_settings()
        };
        settings.validate().unwrap();
        let mut terrain = StreamedTerrain::new(settings.clone());
        let home = at_chunk_center(ChunkCoord::new(0, 0), &settings);
        settle(&mut terrain, &home);

        // Step out just far enough to queue evictions, then come straight
        // back before the queue drains fully.
        let away = at_chunk_center(ChunkCoord::new(4, 0), &settings);
        terrain.step(&away);
        assert!(!terrain.removal_queue.is_empty());
        terrain.step(&home);
        // Everything that re-entered the want-set was de-queued; whatever is
        // still pending removal really is out of range.
        let home_coord = ChunkCoord::new(0, 0);
        for coord in &terrain.removal_queue {
            assert!(home_coord.chebyshev(*coord) > settings.chunks_visible);
        }

        // Nothing may be queued for load while resident.
        for item in &terrain.load_queue {
            assert!(!terrain.store().contains(item.coord));
        }
    }

    #[test]
    fn loaded_chunks_are_fully_decorated_when_reported() {
        let settings = test_settings();
        let mut terrain = StreamedTerrain::new(settings.clone());
        let observer = at_chunk_center(ChunkCoord::new(0, 0), &settings);
        let out = terrain.step(&observer);
        assert!(!out.loaded.is_empty());
        for coord in &out.loaded {
            let chunk = terrain.store().get(*coord).expect("reported chunk missing");
            assert_eq!(
                chunk.heights.samples().len(),
                settings.chunk_resolution * settings.chunk_resolution
            );
        }
    }
}
