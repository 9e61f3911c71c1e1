//! Layer composition.
//!
//! A [`LayerNode`] is one entry of the layer tree: a tile, object, image or group layer.
//! Kind-specific data lives in [`LayerContent`]; capabilities shared by several kinds
//! are expressed by the [`Renderable`] and [`TileAddressable`] traits.

mod image;
mod object;
mod tile;
mod tree;

use std::fmt;

use bevy::color::Color;
use bevy::math::{IVec2, Rect, Vec2};

use crate::Properties;
use crate::projection::{MapGeometry, Projection};

pub use image::ImageLayerData;
pub use object::{DrawOrder, ObjectLayerData, ObjectShape, TileObject};
pub use tile::{TileAddressable, TileLayerData};
pub use tree::{LayerQuery, LayerTree};

/// Tree-wide unique layer id. Ids start at 1 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Tiles,
    Objects,
    Image,
    Group,
}

/// Kind-specific layer data.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    Tiles(TileLayerData),
    Objects(ObjectLayerData),
    Image(ImageLayerData),
    /// Children owned by the group. Removing the group removes them too.
    Group(Vec<LayerNode>),
}

impl LayerContent {
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Tiles(_) => LayerKind::Tiles,
            Self::Objects(_) => LayerKind::Objects,
            Self::Image(_) => LayerKind::Image,
            Self::Group(_) => LayerKind::Group,
        }
    }
}

/// A value a layer either sets itself or takes from its group.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Inheritable<T> {
    value: T,
    explicit: bool,
}

impl<T: Copy> Inheritable<T> {
    fn inherited(value: T) -> Self {
        Self {
            value,
            explicit: false,
        }
    }

    fn set(&mut self, value: T) {
        self.value = value;
        self.explicit = true;
    }

    fn inherit(&mut self, value: T) {
        if !self.explicit {
            self.value = value;
        }
    }
}

/// One layer in a [`LayerTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct LayerNode {
    pub(crate) id: LayerId,
    pub name: String,
    /// Class/type tag set in the editor.
    pub type_tag: Option<String>,
    pub visible: bool,
    pub properties: Properties,
    offset: Inheritable<Vec2>,
    parallax: Inheritable<Vec2>,
    tint: Inheritable<Color>,
    opacity: f32,
    pub(crate) index: u32,
    pub(crate) z_override: Option<f32>,
    pub(crate) z: f32,
    pub(crate) world_z: f32,
    pub(crate) parent: Option<LayerId>,
    pub(crate) content: LayerContent,
}

impl LayerNode {
    pub fn new(name: impl Into<String>, content: LayerContent) -> Self {
        Self {
            id: LayerId(0),
            name: name.into(),
            type_tag: None,
            visible: true,
            properties: Properties::default(),
            offset: Inheritable::inherited(Vec2::ZERO),
            parallax: Inheritable::inherited(Vec2::ONE),
            tint: Inheritable::inherited(Color::WHITE),
            opacity: 1.0,
            index: 0,
            z_override: None,
            z: 0.0,
            world_z: 0.0,
            parent: None,
            content,
        }
    }

    pub fn tiles(name: impl Into<String>, data: TileLayerData) -> Self {
        Self::new(name, LayerContent::Tiles(data))
    }

    pub fn objects(name: impl Into<String>, data: ObjectLayerData) -> Self {
        Self::new(name, LayerContent::Objects(data))
    }

    pub fn image(name: impl Into<String>, data: ImageLayerData) -> Self {
        Self::new(name, LayerContent::Image(data))
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, LayerContent::Group(Vec::new()))
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset.set(offset);
        self
    }

    pub fn with_parallax(mut self, parallax: Vec2) -> Self {
        self.parallax.set(parallax);
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint.set(tint);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_type_tag(mut self, type_tag: impl Into<String>) -> Self {
        self.type_tag = Some(type_tag.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Fixed z position, ignoring the index-derived one.
    pub fn with_z_position(mut self, z: f32) -> Self {
        self.z_override = Some(z);
        self
    }

    /// Append a child to a group under construction. Ignored for non-group layers.
    pub fn with_child(mut self, mut child: LayerNode) -> Self {
        if let LayerContent::Group(children) = &mut self.content {
            child.index = children.len() as u32;
            children.push(child);
        }
        self
    }

    /// Id assigned by the tree; `LayerId(0)` until inserted.
    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn kind(&self) -> LayerKind {
        self.content.kind()
    }

    pub fn content(&self) -> &LayerContent {
        &self.content
    }

    /// Sibling order; higher draws on top.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Stacking key among siblings: the pinned z, or `index * z_delta`.
    pub fn z(&self) -> f32 {
        self.z
    }

    /// Depth in the whole map's draw order. Content layers sit `z_delta` apart, back
    /// to front, so everything inside a group stays below the layers drawn after it.
    pub fn world_z(&self) -> f32 {
        self.world_z
    }

    pub fn z_override(&self) -> Option<f32> {
        self.z_override
    }

    /// Parent group, looked up through the owning tree.
    pub fn parent(&self) -> Option<LayerId> {
        self.parent
    }

    pub fn offset(&self) -> Vec2 {
        self.offset.value
    }

    pub fn parallax(&self) -> Vec2 {
        self.parallax.value
    }

    pub fn tint(&self) -> Color {
        self.tint.value
    }

    pub fn has_own_offset(&self) -> bool {
        self.offset.explicit
    }

    pub fn has_own_parallax(&self) -> bool {
        self.parallax.explicit
    }

    pub fn has_own_tint(&self) -> bool {
        self.tint.explicit
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Set opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    pub fn is_group(&self) -> bool {
        matches!(self.content, LayerContent::Group(_))
    }

    pub fn children(&self) -> &[LayerNode] {
        match &self.content {
            LayerContent::Group(children) => children,
            _ => &[],
        }
    }

    pub fn tile_data(&self) -> Option<&TileLayerData> {
        match &self.content {
            LayerContent::Tiles(data) => Some(data),
            _ => None,
        }
    }

    pub fn tile_data_mut(&mut self) -> Option<&mut TileLayerData> {
        match &mut self.content {
            LayerContent::Tiles(data) => Some(data),
            _ => None,
        }
    }

    pub fn object_data(&self) -> Option<&ObjectLayerData> {
        match &self.content {
            LayerContent::Objects(data) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn object_data_mut(&mut self) -> Option<&mut ObjectLayerData> {
        match &mut self.content {
            LayerContent::Objects(data) => Some(data),
            _ => None,
        }
    }

    pub fn image_data(&self) -> Option<&ImageLayerData> {
        match &self.content {
            LayerContent::Image(data) => Some(data),
            _ => None,
        }
    }

    /// Drawable view of the content; `None` for groups.
    pub fn as_renderable(&self) -> Option<&dyn Renderable> {
        match &self.content {
            LayerContent::Tiles(data) => Some(data as &dyn Renderable),
            LayerContent::Objects(data) => Some(data as &dyn Renderable),
            LayerContent::Image(data) => Some(data as &dyn Renderable),
            LayerContent::Group(_) => None,
        }
    }

    /// Tile access; `None` for anything but tile layers.
    pub fn as_tile_addressable(&self) -> Option<&dyn TileAddressable> {
        self.tile_data().map(|data| data as &dyn TileAddressable)
    }

    pub fn as_tile_addressable_mut(&mut self) -> Option<&mut dyn TileAddressable> {
        self.tile_data_mut()
            .map(|data| data as &mut dyn TileAddressable)
    }

    /// Pixel bounds of the drawn content, layer offset included.
    pub fn bounds(&self, geometry: &MapGeometry) -> Option<Rect> {
        let local = self.as_renderable()?.content_bounds(geometry)?;
        let offset = self.offset();
        Some(Rect::from_corners(local.min + offset, local.max + offset))
    }

    pub(crate) fn set_offset(&mut self, offset: Vec2) {
        self.offset.set(offset);
    }

    pub(crate) fn set_parallax(&mut self, parallax: Vec2) {
        self.parallax.set(parallax);
    }

    pub(crate) fn set_tint(&mut self, tint: Color) {
        self.tint.set(tint);
    }

    /// Take group defaults for every attribute this node leaves unset, recursively.
    pub(crate) fn inherit_from(&mut self, offset: Vec2, parallax: Vec2, tint: Color) {
        self.offset.inherit(offset);
        self.parallax.inherit(parallax);
        self.tint.inherit(tint);
        let (offset, parallax, tint) = (self.offset(), self.parallax(), self.tint());
        if let LayerContent::Group(children) = &mut self.content {
            for child in children {
                child.inherit_from(offset, parallax, tint);
            }
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<LayerNode>> {
        match &mut self.content {
            LayerContent::Group(children) => Some(children),
            _ => None,
        }
    }

    /// This node and all descendants, pre-order.
    pub fn descendants(&self) -> Vec<&LayerNode> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.descendants());
        }
        out
    }
}

/// Content that ends up on screen.
pub trait Renderable {
    /// Pixel bounds of the content in layer-local space, or `None` when unknown or empty.
    fn content_bounds(&self, geometry: &MapGeometry) -> Option<Rect>;
}

impl Renderable for TileLayerData {
    fn content_bounds(&self, geometry: &MapGeometry) -> Option<Rect> {
        let bounds = self.tile_bounds()?;
        let projection = geometry.projection();
        let last = bounds.max - IVec2::ONE;
        [
            bounds.min,
            IVec2::new(last.x, bounds.min.y),
            IVec2::new(bounds.min.x, last.y),
            last,
        ]
        .into_iter()
        .map(|corner| projection.tile_rect(corner))
        .reduce(|a, b| a.union(b))
    }
}

impl Renderable for ObjectLayerData {
    fn content_bounds(&self, _geometry: &MapGeometry) -> Option<Rect> {
        self.objects
            .iter()
            .filter(|o| o.visible)
            .map(TileObject::bounds)
            .reduce(|a, b| a.union(b))
    }
}

impl Renderable for ImageLayerData {
    fn content_bounds(&self, _geometry: &MapGeometry) -> Option<Rect> {
        self.size
            .map(|size| Rect::from_corners(Vec2::ZERO, size.as_vec2()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_id::TileRef;
    use bevy::math::UVec2;

    #[test]
    fn test_opacity_is_clamped() {
        let node = LayerNode::group("g").with_opacity(1.5);
        assert_eq!(node.opacity(), 1.0);
        let node = LayerNode::group("g").with_opacity(-0.2);
        assert_eq!(node.opacity(), 0.0);
    }

    #[test]
    fn test_capabilities_by_kind() {
        let tiles = LayerNode::tiles("t", TileLayerData::empty(UVec2::new(2, 2)));
        let group = LayerNode::group("g");
        let image = LayerNode::image("i", ImageLayerData::new("sky.png"));

        assert!(tiles.as_tile_addressable().is_some());
        assert!(tiles.as_renderable().is_some());
        assert!(group.as_renderable().is_none());
        assert!(group.as_tile_addressable().is_none());
        assert!(image.as_tile_addressable().is_none());
    }

    #[test]
    fn test_tile_layer_bounds_include_offset() {
        let geometry = MapGeometry::orthogonal(UVec2::new(4, 3), UVec2::splat(16)).unwrap();
        let mut data = TileLayerData::empty(UVec2::new(4, 3));
        data.set_tile(IVec2::new(1, 1), TileRef(1));
        let node = LayerNode::tiles("t", data).with_offset(Vec2::new(5.0, -5.0));
        let bounds = node.bounds(&geometry).unwrap();
        assert_eq!(bounds.min, Vec2::new(5.0, -5.0));
        assert_eq!(bounds.max, Vec2::new(69.0, 43.0));
    }

    #[test]
    fn test_with_child_orders_children() {
        let group = LayerNode::group("g")
            .with_child(LayerNode::group("a"))
            .with_child(LayerNode::group("b"));
        let indices: Vec<u32> = group.children().iter().map(LayerNode::index).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}
