//! Tile layer storage.
//!
//! Finite maps store a dense grid sized to the map; infinite maps store chunks.

use bevy::math::{IRect, IVec2, UVec2};

use crate::chunk::{cell_count, ChunkStore};
use crate::tile_id::TileRef;

/// Tiles of one tile layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TileLayerData {
    /// Row-major grid: index = y * width + x.
    Dense { size: UVec2, tiles: Vec<TileRef> },
    Chunked(ChunkStore),
}

impl TileLayerData {
    /// Empty dense grid.
    pub fn empty(size: UVec2) -> Self {
        Self::Dense {
            size,
            tiles: vec![TileRef::EMPTY; cell_count(size)],
        }
    }

    /// Dense grid from row-major data. Returns `None` when `tiles` is not `size.x * size.y` long.
    pub fn dense(size: UVec2, tiles: Vec<TileRef>) -> Option<Self> {
        (tiles.len() == cell_count(size)).then_some(Self::Dense { size, tiles })
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, Self::Chunked(_))
    }

    pub fn chunks(&self) -> Option<&ChunkStore> {
        match self {
            Self::Chunked(store) => Some(store),
            Self::Dense { .. } => None,
        }
    }

    pub fn chunks_mut(&mut self) -> Option<&mut ChunkStore> {
        match self {
            Self::Chunked(store) => Some(store),
            Self::Dense { .. } => None,
        }
    }

    /// Tile-space extent of the stored data; `max` is exclusive.
    pub fn tile_bounds(&self) -> Option<IRect> {
        match self {
            Self::Dense { size, .. } => {
                (size.x > 0 && size.y > 0).then(|| IRect::from_corners(IVec2::ZERO, size.as_ivec2()))
            }
            Self::Chunked(store) => store.tile_bounds(),
        }
    }

    fn dense_index(size: UVec2, coord: IVec2) -> Option<usize> {
        (coord.x >= 0 && coord.y >= 0 && (coord.x as u32) < size.x && (coord.y as u32) < size.y)
            .then(|| coord.y as usize * size.x as usize + coord.x as usize)
    }
}

/// Read and write access to tiles by coordinate.
pub trait TileAddressable {
    /// Tile at `coord`; [`TileRef::EMPTY`] when nothing is stored there.
    fn tile_at(&self, coord: IVec2) -> TileRef;

    /// Store a tile. Returns `false` if `coord` cannot hold a tile.
    fn set_tile(&mut self, coord: IVec2, tile: TileRef) -> bool;

    /// Every non-empty tile with its coordinate.
    fn occupied_tiles(&self) -> Vec<(IVec2, TileRef)>;
}

impl TileAddressable for TileLayerData {
    fn tile_at(&self, coord: IVec2) -> TileRef {
        match self {
            Self::Dense { size, tiles } => Self::dense_index(*size, coord)
                .and_then(|i| tiles.get(i).copied())
                .unwrap_or(TileRef::EMPTY),
            Self::Chunked(store) => store.tile_at(coord),
        }
    }

    fn set_tile(&mut self, coord: IVec2, tile: TileRef) -> bool {
        match self {
            Self::Dense { size, tiles } => {
                match Self::dense_index(*size, coord).and_then(|i| tiles.get_mut(i)) {
                    Some(slot) => {
                        *slot = tile;
                        true
                    }
                    None => false,
                }
            }
            Self::Chunked(store) => {
                store.set_tile(coord, tile);
                true
            }
        }
    }

    fn occupied_tiles(&self) -> Vec<(IVec2, TileRef)> {
        match self {
            Self::Dense { size, tiles } => {
                let width = size.x.max(1);
                tiles
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| !t.is_empty())
                    .map(|(i, t)| {
                        let i = i as u32;
                        (IVec2::new((i % width) as i32, (i / width) as i32), *t)
                    })
                    .collect()
            }
            Self::Chunked(store) => store.iter_tiles().collect(),
        }
    }
}
