//! # bevy_tiledmodel
//!
//! Tiled map geometry and layer composition for Bevy.
//!
//! This is a meta-crate combining the `bevy_tiledmodel_*` sub-crates behind one
//! prelude and one plugin.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_tiledmodel::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(TiledModelPlugin::default())
//!         .add_systems(Startup, spawn_map)
//!         .add_observer(on_map_changed)
//!         .run();
//! }
//!
//! fn spawn_map(mut commands: Commands, config: Res<TileMapConfig>) {
//!     let map = load_tmx_map("assets/maps/village.tmx", config.clone()).unwrap();
//!     info!("{} animated tiles", map.animated_tile_count());
//!     commands.spawn(map);
//! }
//!
//! fn on_map_changed(trigger: On<TileMapChanged>) {
//!     debug!("{:?}", trigger.event().change);
//! }
//! ```
//!
//! ## Features
//!
//! - **default**: `tmx`
//! - **tmx**: TMX import and the `.tmx` asset loader, through the `tiled` crate
//!
//! ## Crates
//!
//! - [`core`]: the engine. Projections, GID resolution, layer trees, chunks, tile
//!   animation and the JSON record boundary
//! - [`assets`]: TMX import (feature `tmx`)

pub mod plugin;

// Re-export sub-crates for advanced usage
pub use bevy_tiledmodel_core as core;

#[cfg(feature = "tmx")]
pub use bevy_tiledmodel_assets as assets;

/// Unified prelude for bevy_tiledmodel
pub mod prelude {
    pub use crate::core::prelude::*;

    #[cfg(feature = "tmx")]
    pub use crate::assets::prelude::*;

    // Unified plugin
    pub use crate::plugin::TiledModelPlugin;
}
