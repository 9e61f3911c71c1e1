//! Tile coordinate <-> pixel projections.
//!
//! Every orientation is a pure value implementing [`Projection`]. Pixel space follows
//! Tiled's convention: origin at the top-left, x grows right, y grows down. Converting to
//! Bevy world space (y up) is the renderer's job.
//!
//! Reference points returned by [`Projection::to_pixel`]:
//!
//! | Orientation | Point |
//! |-------------|-------|
//! | Orthogonal | top-left corner of the tile |
//! | Isometric | top vertex of the diamond |
//! | Staggered / Hexagonal | centre of the tile |
//!
//! Staggered and hexagonal tiles overlap their neighbours' bounding boxes, so hit tests
//! measure against the tile outline rather than the box.

use std::str::FromStr;

use bevy::math::{IVec2, Rect, UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::MapConfigError;

/// Largest number of cells a dense grid (finite layer or chunk) may hold.
pub const MAX_CELLS: u64 = u32::MAX as u64;

/// Map orientation, as written in the `orientation` map attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Orthogonal,
    Isometric,
    Staggered,
    Hexagonal,
}

impl FromStr for Orientation {
    type Err = MapConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "orthogonal" => Ok(Self::Orthogonal),
            "isometric" => Ok(Self::Isometric),
            "staggered" => Ok(Self::Staggered),
            "hexagonal" => Ok(Self::Hexagonal),
            other => Err(MapConfigError::InvalidOrientation(other.to_string())),
        }
    }
}

/// Which axis is staggered on staggered and hexagonal maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerAxis {
    X,
    #[default]
    Y,
}

impl FromStr for StaggerAxis {
    type Err = MapConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            other => Err(MapConfigError::InvalidStaggerAxis(other.to_string())),
        }
    }
}

/// Whether even or odd rows/columns are shifted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaggerIndex {
    Even,
    #[default]
    Odd,
}

impl FromStr for StaggerIndex {
    type Err = MapConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "even" => Ok(Self::Even),
            "odd" => Ok(Self::Odd),
            other => Err(MapConfigError::InvalidStaggerIndex(other.to_string())),
        }
    }
}

/// Order in which tiles are drawn. Informational only; queries ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderOrder {
    #[default]
    RightDown,
    RightUp,
    LeftDown,
    LeftUp,
}

impl FromStr for RenderOrder {
    type Err = MapConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "right-down" => Ok(Self::RightDown),
            "right-up" => Ok(Self::RightUp),
            "left-down" => Ok(Self::LeftDown),
            "left-up" => Ok(Self::LeftUp),
            other => Err(MapConfigError::InvalidRenderOrder(other.to_string())),
        }
    }
}

/// Conversion between tile coordinates and pixel points for one orientation.
///
/// Implementations are pure: no state is mutated and out-of-map inputs are projected
/// like any other coordinate. `to_coordinate(to_pixel(c)) == c` and
/// `to_coordinate(tile_center(c)) == c` hold for every coordinate.
pub trait Projection {
    /// Reference point of the tile at `coord` (see the module docs).
    fn to_pixel(&self, coord: IVec2) -> Vec2;

    /// Tile containing `point`.
    fn to_coordinate(&self, point: Vec2) -> IVec2;

    /// Pixel size of a map of `map_size` tiles.
    fn pixel_size(&self, map_size: UVec2) -> Vec2;

    /// Visual centre of the tile at `coord`.
    fn tile_center(&self, coord: IVec2) -> Vec2;

    /// Bounding box the tile image is drawn into.
    fn tile_rect(&self, coord: IVec2) -> Rect;

    fn top_left(&self, coord: IVec2) -> IVec2;
    fn top_right(&self, coord: IVec2) -> IVec2;
    fn bottom_left(&self, coord: IVec2) -> IVec2;
    fn bottom_right(&self, coord: IVec2) -> IVec2;

    /// The four diagonal neighbours: top-left, top-right, bottom-left, bottom-right.
    fn neighbors(&self, coord: IVec2) -> [IVec2; 4] {
        [
            self.top_left(coord),
            self.top_right(coord),
            self.bottom_left(coord),
            self.bottom_right(coord),
        ]
    }
}

/// Rectangular grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthogonalProjection {
    pub tile_size: Vec2,
}

impl Projection for OrthogonalProjection {
    fn to_pixel(&self, coord: IVec2) -> Vec2 {
        coord.as_vec2() * self.tile_size
    }

    fn to_coordinate(&self, point: Vec2) -> IVec2 {
        (point / self.tile_size).floor().as_ivec2()
    }

    fn pixel_size(&self, map_size: UVec2) -> Vec2 {
        map_size.as_vec2() * self.tile_size
    }

    fn tile_center(&self, coord: IVec2) -> Vec2 {
        self.to_pixel(coord) + self.tile_size / 2.0
    }

    fn tile_rect(&self, coord: IVec2) -> Rect {
        let min = self.to_pixel(coord);
        Rect::from_corners(min, min + self.tile_size)
    }

    fn top_left(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(-1, -1)
    }

    fn top_right(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(1, -1)
    }

    fn bottom_left(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(-1, 1)
    }

    fn bottom_right(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(1, 1)
    }
}

/// Diamond grid. Tile (0, 0) has its top vertex at the origin; x runs down-right and y
/// runs down-left on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsometricProjection {
    pub tile_size: Vec2,
}

impl IsometricProjection {
    fn half(&self) -> Vec2 {
        self.tile_size / 2.0
    }
}

impl Projection for IsometricProjection {
    fn to_pixel(&self, coord: IVec2) -> Vec2 {
        let half = self.half();
        Vec2::new(
            (coord.x - coord.y) as f32 * half.x,
            (coord.x + coord.y) as f32 * half.y,
        )
    }

    fn to_coordinate(&self, point: Vec2) -> IVec2 {
        let half = self.half();
        // Tile sizes are validated positive, but a zero half would divide by zero.
        if half.x <= 0.0 || half.y <= 0.0 {
            return IVec2::ZERO;
        }
        let across = point.x / half.x;
        let down = point.y / half.y;
        IVec2::new(
            ((down + across) / 2.0).floor() as i32,
            ((down - across) / 2.0).floor() as i32,
        )
    }

    fn pixel_size(&self, map_size: UVec2) -> Vec2 {
        (map_size.x + map_size.y) as f32 * self.half()
    }

    fn tile_center(&self, coord: IVec2) -> Vec2 {
        self.to_pixel(coord) + Vec2::new(0.0, self.half().y)
    }

    fn tile_rect(&self, coord: IVec2) -> Rect {
        let top = self.to_pixel(coord);
        let min = top - Vec2::new(self.half().x, 0.0);
        Rect::from_corners(min, min + self.tile_size)
    }

    fn top_left(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(-1, 0)
    }

    fn top_right(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(0, -1)
    }

    fn bottom_left(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(0, 1)
    }

    fn bottom_right(&self, coord: IVec2) -> IVec2 {
        coord + IVec2::new(1, 0)
    }
}

/// Staggered grid of hexagons, or of diamonds when `side_length` is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexagonalProjection {
    pub tile_size: Vec2,
    /// Length of the flat hexagon side; 0 for staggered (diamond) maps.
    pub side_length: f32,
    pub stagger_axis: StaggerAxis,
    pub stagger_index: StaggerIndex,
}

/// Derived grid steps, recomputed on demand since they are a handful of float ops.
struct HexSteps {
    side: Vec2,
    side_offset: Vec2,
    column_width: f32,
    row_height: f32,
}

impl HexagonalProjection {
    fn steps(&self) -> HexSteps {
        let side = match self.stagger_axis {
            StaggerAxis::X => Vec2::new(self.side_length, 0.0),
            StaggerAxis::Y => Vec2::new(0.0, self.side_length),
        };
        let side_offset = (self.tile_size - side) / 2.0;
        HexSteps {
            side,
            side_offset,
            column_width: side_offset.x + side.x,
            row_height: side_offset.y + side.y,
        }
    }

    fn stagger_even(&self) -> bool {
        self.stagger_index == StaggerIndex::Even
    }

    /// Whether the row or column at `index` along the stagger axis is shifted.
    fn is_staggered(&self, index: i32) -> bool {
        ((index & 1) != 0) ^ self.stagger_even()
    }

    fn staggered(&self, coord: IVec2) -> bool {
        match self.stagger_axis {
            StaggerAxis::X => self.is_staggered(coord.x),
            StaggerAxis::Y => self.is_staggered(coord.y),
        }
    }

    /// Distance from a tile centre in units of the tile's own outline: below 1 inside
    /// the hexagon (or diamond), exactly 1 on its edge.
    fn tile_distance(&self, d: Vec2) -> f32 {
        let u = (d.x / (self.tile_size.x / 2.0)).abs();
        let v = (d.y / (self.tile_size.y / 2.0)).abs();
        match self.stagger_axis {
            StaggerAxis::X => v.max(u + (1.0 - self.side_length / self.tile_size.x) * v),
            StaggerAxis::Y => u.max(v + (1.0 - self.side_length / self.tile_size.y) * u),
        }
    }

    /// Top-left corner of the tile's bounding box.
    fn box_origin(&self, coord: IVec2) -> Vec2 {
        let s = self.steps();
        match self.stagger_axis {
            StaggerAxis::X => {
                let mut y = coord.y as f32 * (self.tile_size.y + s.side.y);
                if self.is_staggered(coord.x) {
                    y += s.row_height;
                }
                Vec2::new(coord.x as f32 * s.column_width, y)
            }
            StaggerAxis::Y => {
                let mut x = coord.x as f32 * (self.tile_size.x + s.side.x);
                if self.is_staggered(coord.y) {
                    x += s.column_width;
                }
                Vec2::new(x, coord.y as f32 * s.row_height)
            }
        }
    }
}

impl Projection for HexagonalProjection {
    fn to_pixel(&self, coord: IVec2) -> Vec2 {
        self.box_origin(coord) + self.tile_size / 2.0
    }

    fn to_coordinate(&self, point: Vec2) -> IVec2 {
        let s = self.steps();
        let mut p = point;
        match self.stagger_axis {
            StaggerAxis::X => {
                p.x -= if self.stagger_even() {
                    self.tile_size.x
                } else {
                    s.side_offset.x
                };
            }
            StaggerAxis::Y => {
                p.y -= if self.stagger_even() {
                    self.tile_size.y
                } else {
                    s.side_offset.y
                };
            }
        }

        // Grid-aligned tile pair containing the point, then whichever of the four
        // candidate tiles contains it.
        let step = self.tile_size + s.side;
        let mut reference = (p / step).floor().as_ivec2();
        let rel = p - reference.as_vec2() * step;
        match self.stagger_axis {
            StaggerAxis::X => {
                reference.x = reference.x * 2 + i32::from(self.stagger_even());
            }
            StaggerAxis::Y => {
                reference.y = reference.y * 2 + i32::from(self.stagger_even());
            }
        }

        let (centers, offsets) = match self.stagger_axis {
            StaggerAxis::X => {
                let left = s.side.x / 2.0;
                let center_x = left + s.column_width;
                let center_y = self.tile_size.y / 2.0;
                (
                    [
                        Vec2::new(left, center_y),
                        Vec2::new(center_x, center_y - s.row_height),
                        Vec2::new(center_x, center_y + s.row_height),
                        Vec2::new(center_x + s.column_width, center_y),
                    ],
                    [
                        IVec2::new(0, 0),
                        IVec2::new(1, -1),
                        IVec2::new(1, 0),
                        IVec2::new(2, 0),
                    ],
                )
            }
            StaggerAxis::Y => {
                let top = s.side.y / 2.0;
                let center_x = self.tile_size.x / 2.0;
                let center_y = top + s.row_height;
                (
                    [
                        Vec2::new(center_x, top),
                        Vec2::new(center_x - s.column_width, center_y),
                        Vec2::new(center_x + s.column_width, center_y),
                        Vec2::new(center_x, center_y + s.row_height),
                    ],
                    [
                        IVec2::new(0, 0),
                        IVec2::new(-1, 1),
                        IVec2::new(0, 1),
                        IVec2::new(0, 2),
                    ],
                )
            }
        };

        let mut nearest = 0;
        let mut min_distance = f32::MAX;
        for (i, center) in centers.iter().enumerate() {
            let distance = self.tile_distance(rel - *center);
            if distance < min_distance {
                min_distance = distance;
                nearest = i;
            }
        }
        reference + offsets[nearest]
    }

    fn pixel_size(&self, map_size: UVec2) -> Vec2 {
        let s = self.steps();
        let size = map_size.as_vec2();
        match self.stagger_axis {
            StaggerAxis::X => {
                let mut height = size.y * (self.tile_size.y + s.side.y);
                if map_size.x > 1 {
                    height += s.row_height;
                }
                Vec2::new(size.x * s.column_width + s.side_offset.x, height)
            }
            StaggerAxis::Y => {
                let mut width = size.x * (self.tile_size.x + s.side.x);
                if map_size.y > 1 {
                    width += s.column_width;
                }
                Vec2::new(width, size.y * s.row_height + s.side_offset.y)
            }
        }
    }

    fn tile_center(&self, coord: IVec2) -> Vec2 {
        self.to_pixel(coord)
    }

    fn tile_rect(&self, coord: IVec2) -> Rect {
        let min = self.box_origin(coord);
        Rect::from_corners(min, min + self.tile_size)
    }

    fn top_left(&self, coord: IVec2) -> IVec2 {
        let IVec2 { x, y } = coord;
        match (self.stagger_axis, self.staggered(coord)) {
            (StaggerAxis::X, true) => IVec2::new(x - 1, y),
            (StaggerAxis::X, false) => IVec2::new(x - 1, y - 1),
            (StaggerAxis::Y, true) => IVec2::new(x, y - 1),
            (StaggerAxis::Y, false) => IVec2::new(x - 1, y - 1),
        }
    }

    fn top_right(&self, coord: IVec2) -> IVec2 {
        let IVec2 { x, y } = coord;
        match (self.stagger_axis, self.staggered(coord)) {
            (StaggerAxis::X, true) => IVec2::new(x + 1, y),
            (StaggerAxis::X, false) => IVec2::new(x + 1, y - 1),
            (StaggerAxis::Y, true) => IVec2::new(x + 1, y - 1),
            (StaggerAxis::Y, false) => IVec2::new(x, y - 1),
        }
    }

    fn bottom_left(&self, coord: IVec2) -> IVec2 {
        let IVec2 { x, y } = coord;
        match (self.stagger_axis, self.staggered(coord)) {
            (StaggerAxis::X, true) => IVec2::new(x - 1, y + 1),
            (StaggerAxis::X, false) => IVec2::new(x - 1, y),
            (StaggerAxis::Y, true) => IVec2::new(x, y + 1),
            (StaggerAxis::Y, false) => IVec2::new(x - 1, y + 1),
        }
    }

    fn bottom_right(&self, coord: IVec2) -> IVec2 {
        let IVec2 { x, y } = coord;
        match (self.stagger_axis, self.staggered(coord)) {
            (StaggerAxis::X, true) => IVec2::new(x + 1, y + 1),
            (StaggerAxis::X, false) => IVec2::new(x + 1, y),
            (StaggerAxis::Y, true) => IVec2::new(x + 1, y + 1),
            (StaggerAxis::Y, false) => IVec2::new(x, y + 1),
        }
    }
}

/// Projection selected by a map's orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapProjection {
    Orthogonal(OrthogonalProjection),
    Isometric(IsometricProjection),
    /// Used for both staggered (side length 0) and hexagonal maps.
    Hexagonal(HexagonalProjection),
}

macro_rules! dispatch {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            MapProjection::Orthogonal($p) => $body,
            MapProjection::Isometric($p) => $body,
            MapProjection::Hexagonal($p) => $body,
        }
    };
}

impl Projection for MapProjection {
    fn to_pixel(&self, coord: IVec2) -> Vec2 {
        dispatch!(self, p => p.to_pixel(coord))
    }

    fn to_coordinate(&self, point: Vec2) -> IVec2 {
        dispatch!(self, p => p.to_coordinate(point))
    }

    fn pixel_size(&self, map_size: UVec2) -> Vec2 {
        dispatch!(self, p => p.pixel_size(map_size))
    }

    fn tile_center(&self, coord: IVec2) -> Vec2 {
        dispatch!(self, p => p.tile_center(coord))
    }

    fn tile_rect(&self, coord: IVec2) -> Rect {
        dispatch!(self, p => p.tile_rect(coord))
    }

    fn top_left(&self, coord: IVec2) -> IVec2 {
        dispatch!(self, p => p.top_left(coord))
    }

    fn top_right(&self, coord: IVec2) -> IVec2 {
        dispatch!(self, p => p.top_right(coord))
    }

    fn bottom_left(&self, coord: IVec2) -> IVec2 {
        dispatch!(self, p => p.bottom_left(coord))
    }

    fn bottom_right(&self, coord: IVec2) -> IVec2 {
        dispatch!(self, p => p.bottom_right(coord))
    }
}

/// Validated geometry of a map: orientation parameters plus the matching projection.
///
/// Map size and tile size are fixed at construction; the pixel size is computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct MapGeometry {
    orientation: Orientation,
    map_size: UVec2,
    tile_size: UVec2,
    hex_side_length: u32,
    stagger_axis: StaggerAxis,
    stagger_index: StaggerIndex,
    infinite: bool,
    projection: MapProjection,
    pixel_size: Vec2,
}

impl MapGeometry {
    /// Validate raw map attributes and build the projection.
    ///
    /// Rejects non-positive tile sizes, negative map sizes and negative hex side lengths.
    /// Finite maps are limited to `u32::MAX` cells so a dense layer stays addressable.
    pub fn new(
        orientation: Orientation,
        map_size: IVec2,
        tile_size: IVec2,
        hex_side_length: i32,
        stagger_axis: StaggerAxis,
        stagger_index: StaggerIndex,
        infinite: bool,
    ) -> Result<Self, MapConfigError> {
        if tile_size.x <= 0 || tile_size.y <= 0 {
            return Err(MapConfigError::InvalidTileSize {
                width: tile_size.x.into(),
                height: tile_size.y.into(),
            });
        }
        if map_size.x < 0 || map_size.y < 0 {
            return Err(MapConfigError::InvalidMapSize {
                width: map_size.x.into(),
                height: map_size.y.into(),
            });
        }
        if !infinite && u64::from(map_size.x as u32) * u64::from(map_size.y as u32) > MAX_CELLS {
            return Err(MapConfigError::InvalidMapSize {
                width: map_size.x.into(),
                height: map_size.y.into(),
            });
        }
        if hex_side_length < 0 {
            return Err(MapConfigError::InvalidHexSideLength(hex_side_length.into()));
        }

        let tile = tile_size.as_vec2();
        // Only hexagonal maps use the side length; staggered maps are side-less hexagons.
        let hex_side_length = match orientation {
            Orientation::Hexagonal => hex_side_length as u32,
            _ => 0,
        };
        let projection = match orientation {
            Orientation::Orthogonal => {
                MapProjection::Orthogonal(OrthogonalProjection { tile_size: tile })
            }
            Orientation::Isometric => {
                MapProjection::Isometric(IsometricProjection { tile_size: tile })
            }
            Orientation::Staggered | Orientation::Hexagonal => {
                MapProjection::Hexagonal(HexagonalProjection {
                    tile_size: tile,
                    side_length: hex_side_length as f32,
                    stagger_axis,
                    stagger_index,
                })
            }
        };
        let map_size = map_size.as_uvec2();

        Ok(Self {
            orientation,
            map_size,
            tile_size: tile_size.as_uvec2(),
            hex_side_length,
            stagger_axis,
            stagger_index,
            infinite,
            pixel_size: projection.pixel_size(map_size),
            projection,
        })
    }

    /// Orthogonal geometry, the common case.
    pub fn orthogonal(map_size: UVec2, tile_size: UVec2) -> Result<Self, MapConfigError> {
        Self::new(
            Orientation::Orthogonal,
            map_size.as_ivec2(),
            tile_size.as_ivec2(),
            0,
            StaggerAxis::default(),
            StaggerIndex::default(),
            false,
        )
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn map_size(&self) -> UVec2 {
        self.map_size
    }

    pub fn tile_size(&self) -> UVec2 {
        self.tile_size
    }

    pub fn hex_side_length(&self) -> u32 {
        self.hex_side_length
    }

    pub fn stagger_axis(&self) -> StaggerAxis {
        self.stagger_axis
    }

    pub fn stagger_index(&self) -> StaggerIndex {
        self.stagger_index
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn projection(&self) -> &MapProjection {
        &self.projection
    }

    /// Pixel size of the whole map. Meaningless for infinite maps, whose extent is
    /// defined by their chunks.
    pub fn pixel_size(&self) -> Vec2 {
        self.pixel_size
    }

    /// Whether `coord` lies on the map. Always true for infinite maps.
    pub fn is_valid(&self, coord: IVec2) -> bool {
        self.infinite
            || (coord.x >= 0
                && coord.y >= 0
                && (coord.x as u32) < self.map_size.x
                && (coord.y as u32) < self.map_size.y)
    }

    pub fn to_pixel(&self, coord: IVec2) -> Vec2 {
        self.projection.to_pixel(coord)
    }

    pub fn to_coordinate(&self, point: Vec2) -> IVec2 {
        self.projection.to_coordinate(point)
    }

    pub fn tile_center(&self, coord: IVec2) -> Vec2 {
        self.projection.tile_center(coord)
    }

    pub fn tile_rect(&self, coord: IVec2) -> Rect {
        self.projection.tile_rect(coord)
    }

    pub fn neighbors(&self, coord: IVec2) -> [IVec2; 4] {
        self.projection.neighbors(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    const AXES: [StaggerAxis; 2] = [StaggerAxis::X, StaggerAxis::Y];
    const INDICES: [StaggerIndex; 2] = [StaggerIndex::Even, StaggerIndex::Odd];

    fn geometry(
        orientation: Orientation,
        map: (i32, i32),
        tile: (i32, i32),
        side: i32,
        axis: StaggerAxis,
        index: StaggerIndex,
    ) -> MapGeometry {
        MapGeometry::new(
            orientation,
            IVec2::new(map.0, map.1),
            IVec2::new(tile.0, tile.1),
            side,
            axis,
            index,
            false,
        )
        .unwrap()
    }

    fn assert_round_trips(geometry: &MapGeometry) {
        let size = geometry.map_size().as_ivec2();
        for y in 0..size.y {
            for x in 0..size.x {
                let coord = IVec2::new(x, y);
                assert_eq!(
                    geometry.to_coordinate(geometry.to_pixel(coord)),
                    coord,
                    "to_pixel round trip failed for {coord} on {geometry:?}"
                );
                assert_eq!(
                    geometry.to_coordinate(geometry.tile_center(coord)),
                    coord,
                    "tile_center round trip failed for {coord} on {geometry:?}"
                );
            }
        }
    }

    #[test]
    fn test_orthogonal_scenario() {
        let map = MapGeometry::orthogonal(UVec2::new(4, 3), UVec2::splat(16)).unwrap();
        assert_eq!(map.to_pixel(IVec2::new(0, 0)), Vec2::new(0.0, 0.0));
        assert_eq!(map.to_pixel(IVec2::new(3, 2)), Vec2::new(48.0, 32.0));
        assert_eq!(map.to_coordinate(Vec2::new(48.0, 32.0)), IVec2::new(3, 2));
        assert_eq!(map.pixel_size(), Vec2::new(64.0, 48.0));
        assert_eq!(map.tile_center(IVec2::new(1, 1)), Vec2::new(24.0, 24.0));
    }

    #[test]
    fn test_orthogonal_negative_points_floor() {
        let map = MapGeometry::orthogonal(UVec2::new(4, 3), UVec2::splat(16)).unwrap();
        assert_eq!(map.to_coordinate(Vec2::new(-1.0, -17.0)), IVec2::new(-1, -2));
    }

    #[test]
    fn test_isometric_projection() {
        let map = geometry(
            Orientation::Isometric,
            (4, 3),
            (64, 32),
            0,
            StaggerAxis::Y,
            StaggerIndex::Odd,
        );
        assert_eq!(map.to_pixel(IVec2::new(1, 0)), Vec2::new(32.0, 16.0));
        assert_eq!(map.to_pixel(IVec2::new(0, 1)), Vec2::new(-32.0, 16.0));
        assert_eq!(map.pixel_size(), Vec2::new(224.0, 112.0));
        // Just inside the right corner of tile (0, 0).
        assert_eq!(map.to_coordinate(Vec2::new(31.0, 16.0)), IVec2::new(0, 0));
        assert_eq!(map.to_coordinate(Vec2::new(33.0, 17.0)), IVec2::new(1, 0));
        assert_round_trips(&map);
    }

    #[test]
    fn test_isometric_neighbors_touch_edges() {
        let map = geometry(
            Orientation::Isometric,
            (4, 4),
            (64, 32),
            0,
            StaggerAxis::Y,
            StaggerIndex::Odd,
        );
        let coord = IVec2::new(2, 2);
        let center = map.tile_center(coord);
        let [tl, tr, bl, br] = map.neighbors(coord);
        assert!(map.tile_center(tl).x < center.x && map.tile_center(tl).y < center.y);
        assert!(map.tile_center(tr).x > center.x && map.tile_center(tr).y < center.y);
        assert!(map.tile_center(bl).x < center.x && map.tile_center(bl).y > center.y);
        assert!(map.tile_center(br).x > center.x && map.tile_center(br).y > center.y);
    }

    #[test]
    fn test_staggered_round_trips_every_axis_and_index() {
        for axis in AXES {
            for index in INDICES {
                assert_round_trips(&geometry(
                    Orientation::Staggered,
                    (6, 5),
                    (64, 32),
                    0,
                    axis,
                    index,
                ));
            }
        }
    }

    #[test]
    fn test_hexagonal_round_trips_every_axis_and_index() {
        for axis in AXES {
            for index in INDICES {
                assert_round_trips(&geometry(
                    Orientation::Hexagonal,
                    (6, 5),
                    (32, 32),
                    16,
                    axis,
                    index,
                ));
                assert_round_trips(&geometry(
                    Orientation::Hexagonal,
                    (5, 4),
                    (28, 24),
                    10,
                    axis,
                    index,
                ));
            }
        }
    }

    #[test]
    fn test_hexagonal_stagger_y_odd_positions() {
        let map = geometry(
            Orientation::Hexagonal,
            (3, 3),
            (32, 32),
            16,
            StaggerAxis::Y,
            StaggerIndex::Odd,
        );
        // Row height 24, column width 16, odd rows shifted right by a column.
        assert_eq!(map.tile_rect(IVec2::new(0, 1)).min, Vec2::new(16.0, 24.0));
        assert_eq!(map.to_pixel(IVec2::new(1, 0)), Vec2::new(48.0, 16.0));
        assert_eq!(map.pixel_size(), Vec2::new(112.0, 80.0));
    }

    /// Every point well inside a tile's outline must resolve to that tile. The inner
    /// diamond `|a| + |b| < 1` lies inside both diamond and hexagon tiles.
    fn assert_interior_points_resolve(geometry: &MapGeometry) {
        let half = geometry.tile_size().as_vec2() / 2.0;
        let size = geometry.map_size().as_ivec2();
        for y in 0..size.y {
            for x in 0..size.x {
                let coord = IVec2::new(x, y);
                let center = geometry.tile_center(coord);
                for a in -4..=4 {
                    for b in -4..=4 {
                        let (a, b) = (a as f32 * 0.2, b as f32 * 0.2);
                        if a.abs() + b.abs() > 0.9 {
                            continue;
                        }
                        let point = center + Vec2::new(a, b) * half;
                        assert_eq!(
                            geometry.to_coordinate(point),
                            coord,
                            "{point} should hit {coord} on {geometry:?}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_staggered_point_near_diamond_corner() {
        let map = geometry(
            Orientation::Staggered,
            (6, 6),
            (64, 32),
            0,
            StaggerAxis::Y,
            StaggerIndex::Odd,
        );
        // Inside (0, 0), but closer to the centre of (0, 1) than to its own.
        assert_eq!(map.to_coordinate(Vec2::new(56.0, 19.0)), IVec2::new(0, 0));
        assert_eq!(map.to_coordinate(Vec2::new(56.0, 29.0)), IVec2::new(0, 1));
    }

    #[test]
    fn test_interior_points_resolve_to_their_tile() {
        for axis in AXES {
            for index in INDICES {
                assert_interior_points_resolve(&geometry(
                    Orientation::Staggered,
                    (6, 6),
                    (64, 32),
                    0,
                    axis,
                    index,
                ));
                assert_interior_points_resolve(&geometry(
                    Orientation::Hexagonal,
                    (5, 5),
                    (56, 48),
                    24,
                    axis,
                    index,
                ));
            }
        }
    }

    #[test]
    fn test_hexagonal_stagger_x_pixel_size() {
        let map = geometry(
            Orientation::Hexagonal,
            (3, 2),
            (32, 32),
            16,
            StaggerAxis::X,
            StaggerIndex::Odd,
        );
        // Column width 24, row height 16, side offset 8.
        assert_eq!(map.pixel_size(), Vec2::new(80.0, 80.0));
    }

    #[test]
    fn test_hex_parity_self_consistency() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        for orientation in [Orientation::Hexagonal, Orientation::Staggered] {
            for axis in AXES {
                for index in INDICES {
                    let map = geometry(orientation, (64, 64), (32, 32), 16, axis, index);
                    for _ in 0..100 {
                        let coord = IVec2::new(rng.gen_range(-200..200), rng.gen_range(-200..200));
                        let p = map.projection();
                        assert_eq!(p.bottom_right(p.top_left(coord)), coord);
                        assert_eq!(p.top_left(p.bottom_right(coord)), coord);
                        assert_eq!(p.bottom_left(p.top_right(coord)), coord);
                        assert_eq!(p.top_right(p.bottom_left(coord)), coord);
                    }
                }
            }
        }
    }

    #[test]
    fn test_hex_neighbors_are_adjacent_on_screen() {
        for axis in AXES {
            for index in INDICES {
                let map = geometry(Orientation::Hexagonal, (8, 8), (32, 32), 16, axis, index);
                for coord in [IVec2::new(3, 3), IVec2::new(4, 4), IVec2::new(3, 4)] {
                    let center = map.tile_center(coord);
                    for neighbor in map.neighbors(coord) {
                        let distance = map.tile_center(neighbor).distance(center);
                        assert!(distance < 40.0, "{neighbor} too far from {coord}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_invalid_attributes_are_rejected() {
        let err = MapGeometry::new(
            Orientation::Orthogonal,
            IVec2::new(4, 4),
            IVec2::new(0, 16),
            0,
            StaggerAxis::Y,
            StaggerIndex::Odd,
            false,
        )
        .unwrap_err();
        assert_eq!(
            err,
            MapConfigError::InvalidTileSize {
                width: 0,
                height: 16
            }
        );

        let err = MapGeometry::new(
            Orientation::Orthogonal,
            IVec2::new(-1, 4),
            IVec2::new(16, 16),
            0,
            StaggerAxis::Y,
            StaggerIndex::Odd,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, MapConfigError::InvalidMapSize { .. }));

        assert_eq!(
            "hexagon".parse::<Orientation>(),
            Err(MapConfigError::InvalidOrientation("hexagon".to_string()))
        );
    }

    #[test]
    fn test_is_valid_bounds() {
        let map = MapGeometry::orthogonal(UVec2::new(4, 3), UVec2::splat(16)).unwrap();
        assert!(map.is_valid(IVec2::new(3, 2)));
        assert!(!map.is_valid(IVec2::new(4, 0)));
        assert!(!map.is_valid(IVec2::new(0, -1)));

        let infinite = MapGeometry::new(
            Orientation::Orthogonal,
            IVec2::ZERO,
            IVec2::splat(16),
            0,
            StaggerAxis::Y,
            StaggerIndex::Odd,
            true,
        )
        .unwrap();
        assert!(infinite.is_valid(IVec2::new(-1000, 5000)));
    }
}
