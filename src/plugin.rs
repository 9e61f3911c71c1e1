//! Unified plugin for bevy_tiledmodel.

use bevy::prelude::*;

use bevy_tiledmodel_core::{TileMapConfig, TiledModelCorePlugin};

#[cfg(feature = "tmx")]
use bevy_tiledmodel_assets::TiledModelAssetsPlugin;

/// Adds the engine and, with the `tmx` feature, the `.tmx` asset loader.
///
/// Both share the same [`TileMapConfig`].
///
/// # Example
///
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_tiledmodel::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(TiledModelPlugin::default().with_core(TileMapConfig {
///         layer_z_delta: 10.0,
///         ..default()
///     }))
///     .run();
/// ```
#[derive(Default)]
pub struct TiledModelPlugin {
    /// Core configuration
    pub core: TileMapConfig,
}

impl TiledModelPlugin {
    /// Create with custom core configuration
    pub fn with_core(mut self, config: TileMapConfig) -> Self {
        self.core = config;
        self
    }
}

impl Plugin for TiledModelPlugin {
    fn build(&self, app: &mut App) {
        #[cfg(feature = "tmx")]
        app.add_plugins(TiledModelAssetsPlugin {
            config: self.core.clone(),
        });

        app.add_plugins(TiledModelCorePlugin::new(self.core.clone()));

        info!("TiledModelPlugin initialized");
    }
}
