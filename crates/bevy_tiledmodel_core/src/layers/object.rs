//! Object layers and their objects.

use bevy::color::Color;
use bevy::math::{Rect, Vec2};

use crate::Properties;
use crate::tile_id::TileRef;

/// Shape of a [`TileObject`]. Coordinates are local to the object's position.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    Point,
    Rectangle { width: f32, height: f32 },
    Ellipse { width: f32, height: f32 },
    Polygon { vertices: Vec<Vec2> },
    Polyline { vertices: Vec<Vec2> },
    Text { text: String, width: f32, height: f32 },
    /// A placed tile. Tiled anchors tile objects at their bottom-left corner.
    Tile { tile: TileRef, width: f32, height: f32 },
}

impl ObjectShape {
    /// Bounding box in object-local space, before rotation.
    fn local_bounds(&self) -> Rect {
        match self {
            Self::Point => Rect::from_corners(Vec2::ZERO, Vec2::ZERO),
            Self::Rectangle { width, height }
            | Self::Ellipse { width, height }
            | Self::Text { width, height, .. } => {
                Rect::from_corners(Vec2::ZERO, Vec2::new(*width, *height))
            }
            Self::Tile { width, height, .. } => {
                Rect::from_corners(Vec2::new(0.0, -height), Vec2::new(*width, 0.0))
            }
            Self::Polygon { vertices } | Self::Polyline { vertices } => {
                let Some(first) = vertices.first() else {
                    return Rect::from_corners(Vec2::ZERO, Vec2::ZERO);
                };
                vertices
                    .iter()
                    .fold(Rect::from_corners(*first, *first), |rect, v| {
                        rect.union_point(*v)
                    })
            }
        }
    }
}

/// An object placed on an object layer (or attached to a tile as a collision shape).
#[derive(Debug, Clone, PartialEq)]
pub struct TileObject {
    /// Map-wide unique id. `0` asks the map to allocate one on insertion.
    pub id: u32,
    pub name: String,
    /// Class/type tag set in the editor.
    pub user_type: String,
    /// Pixel position of the object's origin.
    pub position: Vec2,
    /// Clockwise rotation around `position`, in degrees.
    pub rotation: f32,
    pub visible: bool,
    pub shape: ObjectShape,
    pub properties: Properties,
}

impl TileObject {
    pub fn new(id: u32, position: Vec2, shape: ObjectShape) -> Self {
        Self {
            id,
            name: String::new(),
            user_type: String::new(),
            position,
            rotation: 0.0,
            visible: true,
            shape,
            properties: Properties::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = user_type.into();
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    /// Referenced tile, for tile objects.
    pub fn tile(&self) -> Option<TileRef> {
        match self.shape {
            ObjectShape::Tile { tile, .. } => Some(tile),
            _ => None,
        }
    }

    /// Axis-aligned pixel bounds, rotation included.
    pub fn bounds(&self) -> Rect {
        let local = self.shape.local_bounds();
        if self.rotation == 0.0 {
            return Rect::from_corners(local.min + self.position, local.max + self.position);
        }
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let rotate = |p: Vec2| Vec2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
        let corners = [
            local.min,
            Vec2::new(local.max.x, local.min.y),
            local.max,
            Vec2::new(local.min.x, local.max.y),
        ]
        .map(|corner| rotate(corner) + self.position);
        corners[1..]
            .iter()
            .fold(Rect::from_corners(corners[0], corners[0]), |rect, p| {
                rect.union_point(*p)
            })
    }
}

/// How objects on a layer are ordered when drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DrawOrder {
    /// Sorted by y coordinate.
    #[default]
    TopDown,
    /// In insertion order.
    Index,
}

/// Content of an object layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectLayerData {
    pub objects: Vec<TileObject>,
    pub draw_order: DrawOrder,
    /// Editor display colour.
    pub color: Option<Color>,
}

impl ObjectLayerData {
    pub fn new(objects: Vec<TileObject>) -> Self {
        Self {
            objects,
            ..Default::default()
        }
    }

    pub fn object(&self, id: u32) -> Option<&TileObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: u32) -> Option<&mut TileObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn objects_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TileObject> {
        self.objects.iter().filter(move |o| o.name == name)
    }

    pub fn objects_of_type<'a>(
        &'a self,
        user_type: &'a str,
    ) -> impl Iterator<Item = &'a TileObject> {
        self.objects.iter().filter(move |o| o.user_type == user_type)
    }

    /// Objects in drawing order.
    pub fn sorted_for_drawing(&self) -> Vec<&TileObject> {
        let mut objects: Vec<_> = self.objects.iter().collect();
        if self.draw_order == DrawOrder::TopDown {
            objects.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
        }
        objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_bounds() {
        let object = TileObject::new(
            1,
            Vec2::new(10.0, 20.0),
            ObjectShape::Rectangle {
                width: 30.0,
                height: 10.0,
            },
        );
        let bounds = object.bounds();
        assert_eq!(bounds.min, Vec2::new(10.0, 20.0));
        assert_eq!(bounds.max, Vec2::new(40.0, 30.0));
    }

    #[test]
    fn test_rotated_bounds() {
        let object = TileObject::new(
            1,
            Vec2::ZERO,
            ObjectShape::Rectangle {
                width: 10.0,
                height: 4.0,
            },
        )
        .with_rotation(90.0);
        let bounds = object.bounds();
        assert!((bounds.min.x + 4.0).abs() < 1e-4);
        assert!(bounds.min.y.abs() < 1e-4);
        assert!(bounds.max.x.abs() < 1e-4);
        assert!((bounds.max.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_tile_object_anchored_bottom_left() {
        let object = TileObject::new(
            1,
            Vec2::new(0.0, 32.0),
            ObjectShape::Tile {
                tile: TileRef(5),
                width: 16.0,
                height: 16.0,
            },
        );
        assert_eq!(object.bounds().min, Vec2::new(0.0, 16.0));
        assert_eq!(object.tile(), Some(TileRef(5)));
    }

    #[test]
    fn test_polygon_bounds() {
        let object = TileObject::new(
            1,
            Vec2::new(100.0, 100.0),
            ObjectShape::Polygon {
                vertices: vec![Vec2::ZERO, Vec2::new(-5.0, 8.0), Vec2::new(12.0, 3.0)],
            },
        );
        let bounds = object.bounds();
        assert_eq!(bounds.min, Vec2::new(95.0, 100.0));
        assert_eq!(bounds.max, Vec2::new(112.0, 108.0));
    }

    #[test]
    fn test_queries_and_draw_order() {
        let layer = ObjectLayerData::new(vec![
            TileObject::new(1, Vec2::new(0.0, 50.0), ObjectShape::Point)
                .with_name("spawn")
                .with_user_type("marker"),
            TileObject::new(2, Vec2::new(0.0, 10.0), ObjectShape::Point).with_name("spawn"),
            TileObject::new(3, Vec2::new(0.0, 30.0), ObjectShape::Point).with_user_type("marker"),
        ]);
        assert_eq!(layer.objects_named("spawn").count(), 2);
        assert_eq!(layer.objects_of_type("marker").count(), 2);
        assert_eq!(layer.object(3).map(|o| o.id), Some(3));

        let ids: Vec<u32> = layer.sorted_for_drawing().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
