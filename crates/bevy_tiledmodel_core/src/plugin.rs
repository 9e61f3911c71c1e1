//! Plugin for `bevy_tiledmodel_core`.

use bevy::prelude::*;

use crate::config::TileMapConfig;
use crate::systems::advance_tile_maps;

/// Registers the engine with a Bevy app.
///
/// Inserts [`TileMapConfig`] as a resource and advances every [`TileMap`](crate::map::TileMap)
/// component once per frame, forwarding its changes as
/// [`TileMapChanged`](crate::events::TileMapChanged) events.
///
/// # Example
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_tiledmodel_core::{TiledModelCorePlugin, TileMapConfig};
///
/// App::new()
///     .add_plugins(MinimalPlugins)
///     .add_plugins(TiledModelCorePlugin::new(TileMapConfig {
///         layer_z_delta: 10.0,
///         ..default()
///     }));
/// ```
#[derive(Default)]
pub struct TiledModelCorePlugin {
    config: TileMapConfig,
}

impl TiledModelCorePlugin {
    /// Create a new plugin with custom configuration.
    pub fn new(config: TileMapConfig) -> Self {
        Self { config }
    }
}

impl Plugin for TiledModelCorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone());
        app.add_systems(Update, advance_tile_maps);
    }
}
