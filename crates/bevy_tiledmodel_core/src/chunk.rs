//! Sparse tile storage for infinite maps.

use bevy::log::trace;
use bevy::math::{IRect, IVec2, UVec2};
use bevy::platform::collections::HashMap;

use crate::error::{InvariantError, MapConfigError};
use crate::projection::MAX_CELLS;
use crate::tile_id::TileRef;

/// Default chunk size, matching what Tiled writes for infinite maps.
pub const DEFAULT_CHUNK_SIZE: UVec2 = UVec2::splat(16);

/// Number of cells in a `size` grid, computed without overflowing `u32`.
pub fn cell_count(size: UVec2) -> usize {
    usize::try_from(u64::from(size.x) * u64::from(size.y)).unwrap_or(usize::MAX)
}

/// A fixed-size block of tiles anchored at a chunk-aligned tile coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    origin: IVec2,
    size: UVec2,
    tiles: Vec<TileRef>,
}

impl Chunk {
    fn empty(origin: IVec2, size: UVec2) -> Self {
        Self {
            origin,
            size,
            tiles: vec![TileRef::EMPTY; cell_count(size)],
        }
    }

    /// Tile coordinate of the chunk's top-left tile.
    pub fn origin(&self) -> IVec2 {
        self.origin
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    /// Row-major tile data.
    pub fn tiles(&self) -> &[TileRef] {
        &self.tiles
    }

    fn index(&self, coord: IVec2) -> Option<usize> {
        let local = coord.as_i64vec2() - self.origin.as_i64vec2();
        let size = self.size.as_i64vec2();
        (local.x >= 0 && local.y >= 0 && local.x < size.x && local.y < size.y)
            .then(|| (local.y * size.x + local.x) as usize)
    }

    pub fn get(&self, coord: IVec2) -> Option<TileRef> {
        self.index(coord).map(|i| self.tiles[i])
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.iter().all(|t| t.is_empty())
    }

    /// Non-empty tiles with their map coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, TileRef)> + '_ {
        let width = self.size.x as usize;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .map(move |(i, t)| {
                let local = IVec2::new((i % width) as i32, (i / width) as i32);
                (self.origin + local, *t)
            })
    }
}

/// Map from chunk index to chunk for one infinite tile layer.
///
/// Reads never allocate; a coordinate outside every chunk holds [`TileRef::EMPTY`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkStore {
    chunk_size: UVec2,
    chunks: HashMap<IVec2, Chunk>,
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunks: HashMap::default(),
        }
    }
}

impl ChunkStore {
    /// Each side must be positive and fit `i32`; the chunk must hold at most
    /// `u32::MAX` cells.
    pub fn new(chunk_size: UVec2) -> Result<Self, MapConfigError> {
        if chunk_size.x == 0
            || chunk_size.y == 0
            || chunk_size.max_element() > i32::MAX as u32
            || u64::from(chunk_size.x) * u64::from(chunk_size.y) > MAX_CELLS
        {
            return Err(MapConfigError::InvalidChunkSize(chunk_size));
        }
        Ok(Self {
            chunk_size,
            chunks: HashMap::default(),
        })
    }

    pub fn chunk_size(&self) -> UVec2 {
        self.chunk_size
    }

    /// Index of the chunk covering `coord`, flooring toward negative infinity.
    pub fn chunk_coord(&self, coord: IVec2) -> IVec2 {
        coord.div_euclid(self.chunk_size.as_ivec2())
    }

    /// Tile coordinate where the chunk covering `coord` starts.
    pub fn chunk_origin(&self, coord: IVec2) -> IVec2 {
        self.chunk_coord(coord) * self.chunk_size.as_ivec2()
    }

    pub fn tile_at(&self, coord: IVec2) -> TileRef {
        self.chunks
            .get(&self.chunk_coord(coord))
            .and_then(|chunk| chunk.get(coord))
            .unwrap_or(TileRef::EMPTY)
    }

    /// Write a tile, allocating its chunk on first write.
    ///
    /// Clearing a tile in an unallocated chunk is a no-op.
    pub fn set_tile(&mut self, coord: IVec2, tile: TileRef) {
        let key = self.chunk_coord(coord);
        if tile.is_empty() && !self.chunks.contains_key(&key) {
            return;
        }
        let origin = key * self.chunk_size.as_ivec2();
        let size = self.chunk_size;
        let chunk = self.chunks.entry(key).or_insert_with(|| {
            trace!("Allocating chunk {} at origin {}", key, origin);
            Chunk::empty(origin, size)
        });
        if let Some(index) = chunk.index(coord) {
            chunk.tiles[index] = tile;
        }
    }

    /// Chunk covering `coord`, if allocated.
    pub fn chunk_at(&self, coord: IVec2) -> Option<&Chunk> {
        self.chunks.get(&self.chunk_coord(coord))
    }

    /// Install a whole chunk of row-major tile data starting at `origin`.
    ///
    /// `origin` must be chunk-aligned and `tiles` must hold exactly one chunk's worth.
    pub fn insert_chunk(&mut self, origin: IVec2, tiles: Vec<TileRef>) -> Result<(), InvariantError> {
        let size = self.chunk_size;
        if origin != self.chunk_origin(origin) {
            return Err(InvariantError::MisalignedChunk { origin, size });
        }
        let expected = cell_count(size);
        if tiles.len() != expected {
            return Err(InvariantError::ChunkSizeMismatch {
                expected,
                found: tiles.len(),
            });
        }
        let key = self.chunk_coord(origin);
        if self.chunks.contains_key(&key) {
            return Err(InvariantError::ChunkAlreadyAllocated(origin));
        }
        self.chunks.insert(
            key,
            Chunk {
                origin,
                size,
                tiles,
            },
        );
        Ok(())
    }

    /// Drop the chunk covering `coord`.
    pub fn remove_chunk(&mut self, coord: IVec2) -> Option<Chunk> {
        self.chunks.remove(&self.chunk_coord(coord))
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// All non-empty tiles across all chunks (unordered).
    pub fn iter_tiles(&self) -> impl Iterator<Item = (IVec2, TileRef)> + '_ {
        self.chunks.values().flat_map(Chunk::iter)
    }

    /// Tile-space rectangle covering every allocated chunk, or `None` when empty.
    ///
    /// `max` is exclusive.
    pub fn tile_bounds(&self) -> Option<IRect> {
        let size = self.chunk_size.as_ivec2();
        self.chunks.values().fold(None, |bounds, chunk| {
            let rect = IRect::from_corners(chunk.origin, chunk.origin + size);
            Some(bounds.map_or(rect, |b: IRect| b.union(rect)))
        })
    }
}
