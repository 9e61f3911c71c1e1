//! # `bevy_tiledmodel_assets`
//!
//! TMX import for `bevy_tiledmodel`. Maps are parsed by the [`tiled`] crate and
//! converted into [`bevy_tiledmodel_core::records::MapRecord`]s, so TMX and JSON maps
//! go through the same validation.
//!
//! ```rust,no_run
//! use bevy_tiledmodel_assets::load_tmx_map;
//! use bevy_tiledmodel_core::TileMapConfig;
//!
//! let map = load_tmx_map("assets/maps/village.tmx", TileMapConfig::default()).unwrap();
//! println!("{} layers", map.layers().len());
//! ```

pub mod error;
pub mod import;
pub mod loader;
pub mod plugin;

pub use error::ImportError;
pub use import::{load_tmx_map, map_record, MapHeader};
pub use plugin::TiledModelAssetsPlugin;

pub mod prelude {
    //! Common imports for `bevy_tiledmodel_assets` users.

    pub use crate::error::ImportError;
    pub use crate::import::{load_tmx_map, map_record};
    pub use crate::loader::{TileMapAsset, TileMapAssetLoader};
    pub use crate::plugin::TiledModelAssetsPlugin;
}
