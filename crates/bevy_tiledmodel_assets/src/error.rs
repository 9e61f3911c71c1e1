use bevy_tiledmodel_core::error::TileMapError;
use thiserror::Error;

/// Failure while importing a TMX map.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to load TMX map: {0}")]
    Tiled(#[from] tiled::Error),

    /// Reading the root tag after `tiled` parsed the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file parsed, but the map it describes is invalid.
    #[error(transparent)]
    Map(#[from] TileMapError),
}
