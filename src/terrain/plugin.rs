// src/terrain/plugin.rs
//! Bevy wiring for the streaming core. The scheduler is the only writer of
//! the chunk store; the systems here mirror its per-frame output into the
//! scene as fire-and-forget entity spawns and despawns.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::config::TerrainSettings;
use crate::setup::MainCamera;

use super::chunk::{ChunkCoord, VegetationInstance};
use super::mesh::build_chunk_mesh;
use super::scheduler::{ObserverSample, StreamedTerrain};
use super::water::{spawn_water_visual, water_material};

/// Marker for terrain chunk surface entities.
#[derive(Component)]
pub struct TerrainChunk;

/// Fired after a chunk is fully materialized and resident in the store.
#[derive(Event, Clone, Copy)]
pub struct ChunkLoaded(pub ChunkCoord);

/// Fired after a chunk has been evicted from the store.
#[derive(Event, Clone, Copy)]
pub struct ChunkUnloaded(pub ChunkCoord);

/// The one streaming context for the app's terrain.
#[derive(Resource)]
pub struct TerrainStreamer(pub StreamedTerrain);

/// Shared render handles so chunk spawning never touches the asset server.
#[derive(Resource)]
pub struct TerrainAssets {
    pub terrain_material: Handle<StandardMaterial>,
    pub water_material: Handle<StandardMaterial>,
    pub tree_mesh: Handle<Mesh>,
    pub tree_material: Handle<StandardMaterial>,
}

/// Entities spawned for one resident chunk; despawned together on eviction.
pub struct ChunkVisual {
    pub terrain: Entity,
    pub water: Option<Entity>,
    pub vegetation: Vec<Entity>,
}

/// Tracks which chunk coords currently have visuals in the scene.
#[derive(Resource, Default)]
pub struct ChunkVisuals {
    pub map: HashMap<ChunkCoord, ChunkVisual>,
}

pub struct TerrainPlugin {
    pub settings: TerrainSettings,
}

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.settings.clone())
            .insert_resource(TerrainStreamer(StreamedTerrain::new(self.settings.clone())))
            .init_resource::<ChunkVisuals>()
            .add_event::<ChunkLoaded>()
            .add_event::<ChunkUnloaded>()
            .add_systems(Startup, preload_terrain_assets)
            // 1. run the scheduler step
            .add_systems(Update, stream_chunks)
            // 2. mirror freshly loaded chunks into the scene
            .add_systems(Update, spawn_chunk_visuals.after(stream_chunks))
            // 3. then tear down evicted ones
            .add_systems(Update, despawn_chunk_visuals.after(spawn_chunk_visuals));
    }
}

/// (Startup) Create the shared materials and the vegetation mesh once.
fn preload_terrain_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let terrain_material = materials.add(StandardMaterial {
        base_color: Color::linear_rgb(0.42, 0.52, 0.33),
        perceptual_roughness: 1.0,
        ..default()
    });
    let tree_material = materials.add(StandardMaterial {
        base_color: Color::linear_rgb(0.13, 0.33, 0.12),
        perceptual_roughness: 0.9,
        ..default()
    });
    let tree_mesh = meshes.add(Mesh::from(bevy::math::primitives::Cone {
        radius: 2.5,
        height: 8.0,
    }));

    commands.insert_resource(TerrainAssets {
        terrain_material,
        water_material: materials.add(water_material()),
        tree_mesh,
        tree_material,
    });
}

/// Sample the observer pose once and run one scheduler step.
fn stream_chunks(
    mut streamer: ResMut<TerrainStreamer>,
    cam_q: Query<&Transform, With<MainCamera>>,
    mut loaded: EventWriter<ChunkLoaded>,
    mut unloaded: EventWriter<ChunkUnloaded>,
) {
    let Ok(cam_tf) = cam_q.single() else { return };
    let observer = ObserverSample {
        position: cam_tf.translation,
        heading: *cam_tf.forward(),
    };
    let out = streamer.0.step(&observer);
    for coord in out.loaded {
        loaded.write(ChunkLoaded(coord));
    }
    for coord in out.unloaded {
        unloaded.write(ChunkUnloaded(coord));
    }
}

/// Spawn surface, water, and vegetation entities for chunks the scheduler
/// materialized this frame.
fn spawn_chunk_visuals(
    mut commands: Commands,
    mut evr: EventReader<ChunkLoaded>,
    streamer: Res<TerrainStreamer>,
    assets: Res<TerrainAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut visuals: ResMut<ChunkVisuals>,
) {
    for ev in evr.read() {
        let coord = ev.0;
        let Some(chunk) = streamer.0.store().get(coord) else {
            continue;
        };

        let mesh_h = meshes.add(build_chunk_mesh(chunk, streamer.0.field(), streamer.0.settings()));
        let terrain = commands
            .spawn((
                TerrainChunk,
                Mesh3d(mesh_h),
                MeshMaterial3d(assets.terrain_material.clone()),
                Transform::default(),
                Name::new(format!("Chunk ({}, {})", coord.x, coord.z)),
            ))
            .id();

        let water = chunk
            .water
            .as_ref()
            .map(|w| spawn_water_visual(&mut commands, &mut meshes, &assets, w));

        let vegetation = chunk
            .vegetation
            .iter()
            .map(|v| spawn_vegetation_visual(&mut commands, &assets, v))
            .collect();

        visuals.map.insert(coord, ChunkVisual { terrain, water, vegetation });
    }
}

fn spawn_vegetation_visual(
    commands: &mut Commands,
    assets: &TerrainAssets,
    instance: &VegetationInstance,
) -> Entity {
    commands
        .spawn((
            Mesh3d(assets.tree_mesh.clone()),
            MeshMaterial3d(assets.tree_material.clone()),
            Transform {
                translation: instance.position,
                rotation: Quat::from_rotation_y(instance.yaw),
                scale: Vec3::splat(instance.scale),
            },
        ))
        .id()
}

/// Tear down every entity belonging to chunks evicted this frame.
fn despawn_chunk_visuals(
    mut commands: Commands,
    mut evr: EventReader<ChunkUnloaded>,
    mut visuals: ResMut<ChunkVisuals>,
) {
    for ev in evr.read() {
        if let Some(visual) = visuals.map.remove(&ev.0) {
            commands.entity(visual.terrain).despawn();
            if let Some(water) = visual.water {
                commands.entity(water).despawn();
            }
            for e in visual.vegetation {
                commands.entity(e).despawn();
            }
        }
    }
}
