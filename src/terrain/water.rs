// src/terrain/water.rs
//! Water-body visuals: a thin, semi-transparent slab per lake, spawned and
//! despawned together with the chunk that owns the lake.

use bevy::math::primitives::Cuboid;
use bevy::prelude::*;

use super::chunk::WaterBody;
use super::plugin::TerrainAssets;

/// Spawn the slab for one water body; returns the entity so the chunk visual
/// registry can despawn it with its owner.
pub fn spawn_water_visual(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    assets: &TerrainAssets,
    water: &WaterBody,
) -> Entity {
    let extent = water.half_extent * 2.0;
    let mesh_h = meshes.add(Mesh::from(Cuboid::new(extent, 0.05, extent)));

    commands
        .spawn((
            Mesh3d(mesh_h),
            MeshMaterial3d(assets.water_material.clone()),
            Transform::from_translation(Vec3::new(
                water.center.x,
                water.surface_level,
                water.center.y,
            )),
            Name::new("Water"),
        ))
        .id()
}

/// Semi-transparent, double-sided water material, shared by every lake.
pub fn water_material() -> StandardMaterial {
    StandardMaterial {
        base_color: Color::linear_rgba(0.0, 0.35, 0.55, 0.6),
        alpha_mode: AlphaMode::Blend,
        double_sided: true,
        perceptual_roughness: 0.15,
        reflectance: 0.6,
        ..Default::default()
    }
}
