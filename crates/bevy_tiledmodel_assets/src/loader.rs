use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    prelude::*,
    tasks::ConditionalSendFuture,
};
use bevy_tiledmodel_core::config::TileMapConfig;
use bevy_tiledmodel_core::map::TileMap;

use crate::error::ImportError;
use crate::import::load_tmx_map;

/// A map imported from a `.tmx` file.
#[derive(TypePath, Asset, Debug)]
pub struct TileMapAsset {
    pub map: TileMap,
}

/// Asset loader for Tiled maps (.tmx files)
///
/// Tilesets and templates referenced by the map are resolved by the `tiled` crate
/// while parsing; images are left to the consumer.
#[derive(Default)]
pub struct TileMapAssetLoader {
    pub config: TileMapConfig,
}

impl AssetLoader for TileMapAssetLoader {
    type Asset = TileMapAsset;
    type Settings = ();
    type Error = ImportError;

    fn load(
        &self,
        _reader: &mut dyn Reader,
        _settings: &Self::Settings,
        load_context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        let config = self.config.clone();
        // tiled reads the file (and its dependencies) from disk itself. Bevy loads
        // assets from the "assets" directory by default.
        let full_path = std::path::Path::new("assets").join(load_context.asset_path().path());
        async move {
            let map = load_tmx_map(&full_path, config)?;
            Ok(TileMapAsset { map })
        }
    }

    fn extensions(&self) -> &[&str] {
        &["tmx"]
    }
}
