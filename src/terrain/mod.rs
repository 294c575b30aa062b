mod chunk;
mod decorate;
mod mesh;
mod plugin;
mod scheduler;
mod store;
mod water;

pub use plugin::{TerrainPlugin, TerrainStreamer};
