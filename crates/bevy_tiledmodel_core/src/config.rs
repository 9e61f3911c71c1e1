//! Engine configuration.

use bevy::prelude::*;

use crate::animation::AnimationMode;

/// Settings threaded into every [`TileMap`](crate::map::TileMap) at construction.
///
/// When the plugin is installed this is also a resource; maps spawned from systems
/// usually clone it from there.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TileMapConfig {
    /// Z distance between consecutive sibling layers. Layer z = index * delta.
    pub layer_z_delta: f32,
    /// Chunk size used for infinite tile layers created by the map.
    pub chunk_size: UVec2,
    pub animation_mode: AnimationMode,
    /// Global animation speed multiplier; negative plays backwards.
    pub animation_speed: f32,
    /// Number of ticked tile definitions at which the animation clock shards its work
    /// across the compute task pool. `0` keeps ticking on the calling thread.
    pub parallel_animation_threshold: usize,
}

impl Default for TileMapConfig {
    fn default() -> Self {
        Self {
            layer_z_delta: 50.0,
            chunk_size: UVec2::splat(16),
            animation_mode: AnimationMode::Dynamic,
            animation_speed: 1.0,
            parallel_animation_threshold: 0,
        }
    }
}
