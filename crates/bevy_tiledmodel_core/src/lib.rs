//! # `bevy_tiledmodel_core`
//!
//! Map geometry and composition engine for `bevy_tiledmodel`. Turns parsed Tiled map
//! records into a queryable world model: tile, object, image and group layers addressable
//! by tile coordinate or pixel position, plus animated-tile playback.
//!
//! **This crate does NOT parse markup or render anything** - parsing lives in
//! `bevy_tiledmodel_assets` (or any producer of [`records::MapRecord`]), and renderers
//! consume the model through queries and the change channel.
//!
//! ## What this crate provides
//!
//! 1. **Projections**: tile coordinate <-> pixel conversion for orthogonal, isometric,
//!    staggered and hexagonal maps
//! 2. **GID resolution**: [`tile_id::TileRef`] decoding and a range-indexed
//!    [`tileset::TileSetRegistry`]
//! 3. **Layer tree**: nested layers with z-ordering, default propagation and filtered queries
//! 4. **Chunks**: sparse storage for infinite tile layers
//! 5. **Animation clock**: per-definition animation state, independent of placed tile count
//! 6. **Events**: [`events::MapChange`] notifications, forwarded as Bevy observer events by
//!    [`TiledModelCorePlugin`]
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_tiledmodel_core::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(TiledModelCorePlugin::default())
//!         .add_systems(Startup, spawn_map)
//!         .run();
//! }
//!
//! fn spawn_map(mut commands: Commands, config: Res<TileMapConfig>) {
//!     let json = std::fs::read_to_string("assets/maps/level1.json").unwrap();
//!     let map = TileMap::from_json_str(&json, config.clone()).unwrap();
//!     commands.spawn(map);
//! }
//! ```

pub mod animation;
pub mod chunk;
pub mod config;
pub mod error;
pub mod events;
pub mod layers;
pub mod map;
pub mod plugin;
pub mod projection;
pub mod records;
pub mod systems;
pub mod tile_id;
pub mod tileset;

/// Custom properties attached to maps, layers, tiles and objects.
///
/// Values are kept as strings; typed interpretation is left to the consumer.
pub type Properties = bevy::platform::collections::HashMap<String, String>;

pub mod prelude {
    //! Common imports for `bevy_tiledmodel_core` users.

    pub use crate::Properties;
    pub use crate::animation::{AnimationClock, AnimationFrame, AnimationMode, TileAnimation};
    pub use crate::chunk::{Chunk, ChunkStore};
    pub use crate::config::TileMapConfig;
    pub use crate::error::{InvariantError, MapConfigError, TileMapError};
    pub use crate::events::{MapChange, TileMapChanged};
    pub use crate::layers::{
        DrawOrder, ImageLayerData, LayerContent, LayerId, LayerKind, LayerNode, LayerQuery,
        LayerTree, ObjectLayerData, ObjectShape, Renderable, TileAddressable, TileLayerData,
        TileObject,
    };
    pub use crate::map::{MapAttributes, ResolvedTile, TileMap};
    pub use crate::plugin::TiledModelCorePlugin;
    pub use crate::projection::{
        MapGeometry, MapProjection, Orientation, Projection, RenderOrder, StaggerAxis,
        StaggerIndex,
    };
    pub use crate::records::MapRecord;
    pub use crate::tile_id::{DecodedTile, TileRef};
    pub use crate::tileset::{TileDefinition, TileSet, TileSetRegistry};
}

pub use config::TileMapConfig;
pub use plugin::TiledModelCorePlugin;
