//! Encoded tile references.
//!
//! Tiled stores every placed tile as one 32-bit value: the top three bits are flip
//! flags and the low 29 bits are the global tile id (GID). A GID of 0 is an empty cell.
//! This bit layout is shared with every existing map file and must round-trip exactly.

use serde::{Deserialize, Serialize};

/// Tile is mirrored along the vertical axis.
pub const FLIPPED_HORIZONTALLY_FLAG: u32 = 0x8000_0000;
/// Tile is mirrored along the horizontal axis.
pub const FLIPPED_VERTICALLY_FLAG: u32 = 0x4000_0000;
/// Tile is mirrored along the anti-diagonal (x and y swapped).
pub const FLIPPED_DIAGONALLY_FLAG: u32 = 0x2000_0000;
/// All three flip bits.
pub const FLIP_FLAGS: u32 =
    FLIPPED_HORIZONTALLY_FLAG | FLIPPED_VERTICALLY_FLAG | FLIPPED_DIAGONALLY_FLAG;
/// Bits holding the global id.
pub const GID_MASK: u32 = !FLIP_FLAGS;

/// A raw encoded tile reference, exactly as stored in map data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileRef(pub u32);

impl TileRef {
    /// The "no tile" sentinel.
    pub const EMPTY: Self = Self(0);

    /// Encode a gid and flip flags. Bits of `gid` above [`GID_MASK`] are dropped.
    pub const fn new(gid: u32, flip_h: bool, flip_v: bool, flip_d: bool) -> Self {
        let mut raw = gid & GID_MASK;
        if flip_h {
            raw |= FLIPPED_HORIZONTALLY_FLAG;
        }
        if flip_v {
            raw |= FLIPPED_VERTICALLY_FLAG;
        }
        if flip_d {
            raw |= FLIPPED_DIAGONALLY_FLAG;
        }
        Self(raw)
    }

    /// Unflipped reference to `gid`.
    pub const fn from_gid(gid: u32) -> Self {
        Self(gid & GID_MASK)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The global id with flip flags masked off.
    #[inline]
    pub const fn gid(self) -> u32 {
        self.0 & GID_MASK
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.gid() == 0
    }

    #[inline]
    pub const fn flip_h(self) -> bool {
        self.0 & FLIPPED_HORIZONTALLY_FLAG != 0
    }

    #[inline]
    pub const fn flip_v(self) -> bool {
        self.0 & FLIPPED_VERTICALLY_FLAG != 0
    }

    #[inline]
    pub const fn flip_d(self) -> bool {
        self.0 & FLIPPED_DIAGONALLY_FLAG != 0
    }

    /// Same flip flags, different gid.
    pub const fn with_gid(self, gid: u32) -> Self {
        Self((self.0 & FLIP_FLAGS) | (gid & GID_MASK))
    }

    /// Split into gid and flags.
    pub const fn decode(self) -> DecodedTile {
        DecodedTile {
            gid: self.gid(),
            flip_h: self.flip_h(),
            flip_v: self.flip_v(),
            flip_d: self.flip_d(),
        }
    }
}

impl From<u32> for TileRef {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<TileRef> for u32 {
    fn from(tile: TileRef) -> Self {
        tile.0
    }
}

/// A [`TileRef`] split into its global id and flip flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DecodedTile {
    pub gid: u32,
    pub flip_h: bool,
    pub flip_v: bool,
    pub flip_d: bool,
}

impl DecodedTile {
    pub const fn encode(self) -> TileRef {
        TileRef::new(self.gid, self.flip_h, self.flip_v, self.flip_d)
    }
}
