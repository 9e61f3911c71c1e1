use bevy::prelude::*;
use bevy_tiledmodel_core::config::TileMapConfig;

use crate::loader::{TileMapAsset, TileMapAssetLoader};

/// Registers [`TileMapAsset`] and its `.tmx` loader.
///
/// # Example
/// ```no_run
/// use bevy::prelude::*;
/// use bevy_tiledmodel_assets::TiledModelAssetsPlugin;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(TiledModelAssetsPlugin::default())
///     .run();
/// ```
///
/// Loaded maps are plain assets. Spawning a `TileMap` component from them (usually a
/// clone of `asset.map`) is up to the app.
#[derive(Default)]
pub struct TiledModelAssetsPlugin {
    /// Configuration given to every map the loader builds
    pub config: TileMapConfig,
}

impl Plugin for TiledModelAssetsPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<TileMapAsset>()
            .register_asset_loader(TileMapAssetLoader {
                config: self.config.clone(),
            });
    }
}
