//! Error types.
//!
//! Three kinds of failure are kept apart:
//!
//! - [`MapConfigError`]: the map description itself is invalid (unknown orientation,
//!   zero tile size, overlapping tileset ranges). Fatal for construction.
//! - [`InvariantError`]: a caller asked for something that breaks the model's invariants
//!   (removing a layer that is not there, allocating a chunk twice). A programming error.
//! - Lookup misses are not errors at all; queries return `None` or an empty collection.

use bevy::math::{IVec2, UVec2};
use thiserror::Error;

use crate::layers::LayerId;

/// Invalid map, tileset or layer attributes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapConfigError {
    #[error("unknown map orientation '{0}'")]
    InvalidOrientation(String),

    #[error("unknown stagger axis '{0}'")]
    InvalidStaggerAxis(String),

    #[error("unknown stagger index '{0}'")]
    InvalidStaggerIndex(String),

    #[error("unknown render order '{0}'")]
    InvalidRenderOrder(String),

    #[error("tile size must be positive, got {width}x{height}")]
    InvalidTileSize { width: i64, height: i64 },

    #[error("map size must not be negative, got {width}x{height}")]
    InvalidMapSize { width: i64, height: i64 },

    #[error("hex side length must not be negative, got {0}")]
    InvalidHexSideLength(i64),

    #[error("chunk size must be positive, got {0}")]
    InvalidChunkSize(UVec2),

    #[error("tileset '{name}' starts at gid 0; gids start at 1")]
    InvalidFirstGid { name: String },

    #[error("tileset '{name}' ends at gid {last_gid}, beyond the encodable gid range")]
    GidRangeOverflow { name: String, last_gid: u64 },

    #[error(
        "tileset '{name}' ({first_gid}..={last_gid}) overlaps tileset '{existing}' \
         ({existing_first}..={existing_last})"
    )]
    OverlappingTilesets {
        name: String,
        first_gid: u32,
        last_gid: u32,
        existing: String,
        existing_first: u32,
        existing_last: u32,
    },

    #[error("tileset '{0}' references an external source and must be resolved before import")]
    ExternalTileset(String),

    #[error("tile layer '{layer}' holds {found} tiles, expected {expected}")]
    InvalidLayerSize {
        layer: String,
        expected: usize,
        found: usize,
    },

    #[error("tile layer '{0}' has neither dense data nor chunks")]
    MissingTileData(String),

    #[error("invalid colour '{0}', expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),
}

/// A request that would break the model's invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantError {
    #[error("layer {0} is not in the layer tree")]
    LayerNotFound(LayerId),

    #[error("layer {0} is not a group and cannot hold child layers")]
    NotAGroup(LayerId),

    #[error("layer {0} is not a tile layer")]
    NotATileLayer(LayerId),

    #[error("layer {0} is not an object layer")]
    NotAnObjectLayer(LayerId),

    #[error("object id {0} is already used in this map")]
    DuplicateObjectId(u32),

    #[error("no free object id is left in this map")]
    ObjectIdsExhausted,

    #[error("a chunk is already allocated at {0}")]
    ChunkAlreadyAllocated(IVec2),

    #[error("chunk origin {origin} is not aligned to the {size} chunk grid")]
    MisalignedChunk { origin: IVec2, size: UVec2 },

    #[error("chunk data holds {found} tiles, expected {expected}")]
    ChunkSizeMismatch { expected: usize, found: usize },

    #[error("no tileset starts at gid {0}")]
    TilesetNotFound(u32),

    #[error("gid {0} does not belong to any registered tileset")]
    UnknownGid(u32),
}

/// Any failure while building or mutating a [`crate::map::TileMap`].
#[derive(Debug, Error)]
pub enum TileMapError {
    #[error(transparent)]
    Config(#[from] MapConfigError),

    #[error(transparent)]
    Invariant(#[from] InvariantError),

    #[error("failed to parse map record: {0}")]
    Parse(#[from] serde_json::Error),
}
