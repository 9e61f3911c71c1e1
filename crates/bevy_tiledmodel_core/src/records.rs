//! Input records, shaped after Tiled's JSON map format.
//!
//! These are the parser boundary: anything that can produce a [`MapRecord`] (the JSON
//! deserializer here, the TMX adapter in `bevy_tiledmodel_assets`, hand-written test
//! data) can build a [`TileMap`]. Tile data must be a plain array of encoded tile ids;
//! base64/compressed layer data is the parser's job.

use bevy::color::Color;
use bevy::log::{debug, warn};
use bevy::math::{IVec2, UVec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::Properties;
use crate::animation::AnimationFrame;
use crate::chunk::{cell_count, ChunkStore};
use crate::config::TileMapConfig;
use crate::error::{MapConfigError, TileMapError};
use crate::layers::{
    DrawOrder, ImageLayerData, LayerNode, ObjectLayerData, ObjectShape, TileLayerData, TileObject,
};
use crate::map::{MapAttributes, TileMap};
use crate::projection::{Orientation, RenderOrder, StaggerAxis, StaggerIndex};
use crate::tile_id::TileRef;
use crate::tileset::{TileDefinition, TileSet};

fn default_orientation() -> String {
    "orthogonal".to_string()
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// A whole map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
    #[serde(default)]
    pub tilewidth: i64,
    #[serde(default)]
    pub tileheight: i64,
    #[serde(default = "default_orientation")]
    pub orientation: String,
    #[serde(default)]
    pub infinite: bool,
    #[serde(default)]
    pub renderorder: Option<String>,
    #[serde(default)]
    pub hexsidelength: Option<i64>,
    #[serde(default)]
    pub staggeraxis: Option<String>,
    #[serde(default)]
    pub staggerindex: Option<String>,
    #[serde(default)]
    pub backgroundcolor: Option<String>,
    #[serde(default)]
    pub nextobjectid: Option<u32>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
    #[serde(default)]
    pub tilesets: Vec<TilesetRecord>,
}

impl Default for MapRecord {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            tilewidth: 0,
            tileheight: 0,
            orientation: default_orientation(),
            infinite: false,
            renderorder: None,
            hexsidelength: None,
            staggeraxis: None,
            staggerindex: None,
            backgroundcolor: None,
            nextobjectid: None,
            properties: Vec::new(),
            layers: Vec::new(),
            tilesets: Vec::new(),
        }
    }
}

/// A custom property. Values of any JSON type are kept as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl PropertyRecord {
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            kind: "string".to_string(),
            value: value.into(),
        }
    }

    fn value_string(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

pub fn properties_from_records(records: &[PropertyRecord]) -> Properties {
    records
        .iter()
        .map(|p| (p.name.clone(), p.value_string()))
        .collect()
}

/// Attributes shared by every layer kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCommon {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub offsetx: f32,
    #[serde(default)]
    pub offsety: f32,
    #[serde(default = "one")]
    pub parallaxx: f32,
    #[serde(default = "one")]
    pub parallaxy: f32,
    #[serde(default = "one")]
    pub opacity: f32,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub tintcolor: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

impl Default for LayerCommon {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            class: None,
            offsetx: 0.0,
            offsety: 0.0,
            parallaxx: 1.0,
            parallaxy: 1.0,
            opacity: 1.0,
            visible: true,
            tintcolor: None,
            properties: Vec::new(),
        }
    }
}

impl LayerCommon {
    /// Copy shared attributes onto `node`. Values left at their defaults stay unset so
    /// the node can inherit them from its group.
    fn apply(&self, mut node: LayerNode) -> Result<LayerNode, MapConfigError> {
        let offset = Vec2::new(self.offsetx, self.offsety);
        if offset != Vec2::ZERO {
            node = node.with_offset(offset);
        }
        let parallax = Vec2::new(self.parallaxx, self.parallaxy);
        if parallax != Vec2::ONE {
            node = node.with_parallax(parallax);
        }
        if let Some(tint) = self.tintcolor.as_deref() {
            node = node.with_tint(parse_color(tint)?);
        }
        if let Some(class) = self.class.as_ref().filter(|c| !c.is_empty()) {
            node = node.with_type_tag(class.clone());
        }
        Ok(node
            .with_opacity(self.opacity)
            .with_visible(self.visible)
            .with_properties(properties_from_records(&self.properties)))
    }
}

/// One layer, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LayerRecord {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayerRecord),
    #[serde(rename = "objectgroup")]
    Objects(ObjectGroupRecord),
    #[serde(rename = "imagelayer")]
    Image(ImageLayerRecord),
    #[serde(rename = "group")]
    Group(GroupRecord),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileLayerRecord {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub data: Option<Vec<u32>>,
    #[serde(default)]
    pub chunks: Option<Vec<ChunkRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectGroupRecord {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub draworder: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageLayerRecord {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub imagewidth: Option<u32>,
    #[serde(default)]
    pub imageheight: Option<u32>,
    #[serde(default)]
    pub repeatx: bool,
    #[serde(default)]
    pub repeaty: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
    #[serde(flatten)]
    pub common: LayerCommon,
    #[serde(default)]
    pub layers: Vec<LayerRecord>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", alias = "class", default)]
    pub user_type: String,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "yes")]
    pub visible: bool,
    #[serde(default)]
    pub gid: Option<u32>,
    #[serde(default)]
    pub point: bool,
    #[serde(default)]
    pub ellipse: bool,
    #[serde(default)]
    pub polygon: Option<Vec<PointRecord>>,
    #[serde(default)]
    pub polyline: Option<Vec<PointRecord>>,
    #[serde(default)]
    pub text: Option<TextRecord>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

impl Default for ObjectRecord {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            user_type: String::new(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            rotation: 0.0,
            visible: true,
            gid: None,
            point: false,
            ellipse: false,
            polygon: None,
            polyline: None,
            text: None,
            properties: Vec::new(),
        }
    }
}

impl ObjectRecord {
    pub fn to_object(&self) -> TileObject {
        let vertices = |points: &[PointRecord]| points.iter().map(|p| Vec2::new(p.x, p.y)).collect();
        let shape = if let Some(gid) = self.gid {
            ObjectShape::Tile {
                tile: TileRef(gid),
                width: self.width,
                height: self.height,
            }
        } else if self.point {
            ObjectShape::Point
        } else if self.ellipse {
            ObjectShape::Ellipse {
                width: self.width,
                height: self.height,
            }
        } else if let Some(points) = &self.polygon {
            ObjectShape::Polygon {
                vertices: vertices(points),
            }
        } else if let Some(points) = &self.polyline {
            ObjectShape::Polyline {
                vertices: vertices(points),
            }
        } else if let Some(text) = &self.text {
            ObjectShape::Text {
                text: text.text.clone(),
                width: self.width,
                height: self.height,
            }
        } else {
            ObjectShape::Rectangle {
                width: self.width,
                height: self.height,
            }
        };

        TileObject {
            id: self.id,
            name: self.name.clone(),
            user_type: self.user_type.clone(),
            position: Vec2::new(self.x, self.y),
            rotation: self.rotation,
            visible: self.visible,
            shape,
            properties: properties_from_records(&self.properties),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TileOffsetRecord {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub tileid: u32,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileRecord {
    pub id: u32,
    #[serde(rename = "type", alias = "class", default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub probability: Option<f32>,
    #[serde(default)]
    pub animation: Vec<FrameRecord>,
    #[serde(default)]
    pub objectgroup: Option<CollisionRecord>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TilesetRecord {
    pub firstgid: u32,
    /// Set for tilesets kept in a separate file; such records carry no tile data.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tilecount: Option<u32>,
    #[serde(default)]
    pub tilewidth: u32,
    #[serde(default)]
    pub tileheight: u32,
    #[serde(default)]
    pub columns: u32,
    #[serde(default)]
    pub spacing: u32,
    #[serde(default)]
    pub margin: u32,
    #[serde(default)]
    pub tileoffset: Option<TileOffsetRecord>,
    #[serde(default)]
    pub properties: Vec<PropertyRecord>,
    #[serde(default)]
    pub tiles: Vec<TileRecord>,
}

impl TilesetRecord {
    pub fn to_tileset(&self) -> Result<TileSet, MapConfigError> {
        let tile_count = match (self.tilecount, &self.source) {
            (Some(count), _) => count,
            (None, Some(source)) => return Err(MapConfigError::ExternalTileset(source.clone())),
            (None, None) => 0,
        };
        let mut tileset = TileSet::new(
            self.name.clone(),
            self.firstgid,
            tile_count,
            UVec2::new(self.tilewidth, self.tileheight),
        )
        .with_columns(self.columns)
        .with_spacing(self.spacing, self.margin)
        .with_properties(properties_from_records(&self.properties));
        if let Some(offset) = self.tileoffset {
            tileset.tile_offset = IVec2::new(offset.x, offset.y);
        }

        for tile in &self.tiles {
            if tile.id >= tile_count {
                warn!(
                    "Tileset '{}' declares tile {} beyond its {} tiles, skipping",
                    self.name, tile.id, tile_count
                );
                continue;
            }
            let frames = tile
                .animation
                .iter()
                .map(|f| AnimationFrame::new(f.tileid, f.duration))
                .collect();
            let mut definition = TileDefinition::new(tile.id)
                .with_animation(frames)
                .with_properties(properties_from_records(&tile.properties))
                .with_collision(
                    tile.objectgroup
                        .iter()
                        .flat_map(|group| group.objects.iter().map(ObjectRecord::to_object))
                        .collect(),
                );
            if let Some(user_type) = tile.user_type.as_ref().filter(|t| !t.is_empty()) {
                definition = definition.with_user_type(user_type.clone());
            }
            if let Some(probability) = tile.probability {
                definition.probability = probability;
            }
            tileset = tileset.with_tile(definition);
        }
        Ok(tileset)
    }
}

/// Parse `#RRGGBB` or `#AARRGGBB`.
pub fn parse_color(value: &str) -> Result<Color, MapConfigError> {
    let invalid = || MapConfigError::InvalidColor(value.to_string());
    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.is_ascii() {
        return Err(invalid());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(Color::srgb_u8(byte(0)?, byte(2)?, byte(4)?)),
        8 => Ok(Color::srgba_u8(byte(2)?, byte(4)?, byte(6)?, byte(0)?)),
        _ => Err(invalid()),
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl LayerRecord {
    pub fn common(&self) -> &LayerCommon {
        match self {
            Self::Tiles(layer) => &layer.common,
            Self::Objects(layer) => &layer.common,
            Self::Image(layer) => &layer.common,
            Self::Group(layer) => &layer.common,
        }
    }

    /// Build the layer node (with children, for groups) for `map`.
    pub fn to_node(&self, map: &TileMap) -> Result<LayerNode, TileMapError> {
        let common = self.common();
        let node = match self {
            Self::Tiles(layer) => LayerNode::tiles(&common.name, tile_data(layer, map)?),
            Self::Objects(layer) => {
                let mut data = ObjectLayerData::new(
                    layer.objects.iter().map(ObjectRecord::to_object).collect(),
                );
                if layer.draworder.as_deref() == Some("index") {
                    data.draw_order = DrawOrder::Index;
                }
                data.color = layer.color.as_deref().map(parse_color).transpose()?;
                LayerNode::objects(&common.name, data)
            }
            Self::Image(layer) => {
                let mut data = ImageLayerData::new(&layer.image);
                if let (Some(w), Some(h)) = (layer.imagewidth, layer.imageheight) {
                    data = data.with_size(UVec2::new(w, h));
                }
                data.repeat_x = layer.repeatx;
                data.repeat_y = layer.repeaty;
                LayerNode::image(&common.name, data)
            }
            Self::Group(group) => {
                let mut node = LayerNode::group(&common.name);
                for child in &group.layers {
                    node = node.with_child(child.to_node(map)?);
                }
                node
            }
        };
        Ok(common.apply(node)?)
    }
}

fn tile_data(layer: &TileLayerRecord, map: &TileMap) -> Result<TileLayerData, TileMapError> {
    let name = &layer.common.name;
    if map.is_infinite() {
        let Some(chunks) = &layer.chunks else {
            return Err(MapConfigError::MissingTileData(name.clone()).into());
        };
        let mut store = ChunkStore::new(map.config().chunk_size)?;
        for chunk in chunks {
            load_chunk(&mut store, chunk, name)?;
        }
        debug!(
            "Loaded {} chunk records for layer '{}' into {} chunks",
            chunks.len(),
            name,
            store.chunk_count()
        );
        return Ok(TileLayerData::Chunked(store));
    }

    let Some(data) = &layer.data else {
        return Err(MapConfigError::MissingTileData(name.clone()).into());
    };
    let size = map.map_size();
    let expected = cell_count(size);
    let tiles = data.iter().copied().map(TileRef).collect();
    TileLayerData::dense(size, tiles).ok_or_else(|| {
        MapConfigError::InvalidLayerSize {
            layer: name.clone(),
            expected,
            found: data.len(),
        }
        .into()
    })
}

/// Copy one chunk record into the store. Records matching the store's chunk grid are
/// installed whole, and a second record for the same chunk is an error; anything else
/// is written tile by tile.
fn load_chunk(store: &mut ChunkStore, chunk: &ChunkRecord, layer: &str) -> Result<(), TileMapError> {
    let expected = cell_count(UVec2::new(chunk.width, chunk.height));
    if chunk.data.len() != expected {
        return Err(MapConfigError::InvalidLayerSize {
            layer: layer.to_string(),
            expected,
            found: chunk.data.len(),
        }
        .into());
    }
    let origin = IVec2::new(chunk.x, chunk.y);
    let tiles = chunk.data.iter().copied().map(TileRef);
    let fits_grid = UVec2::new(chunk.width, chunk.height) == store.chunk_size()
        && store.chunk_origin(origin) == origin;
    if fits_grid {
        store.insert_chunk(origin, tiles.collect())?;
        return Ok(());
    }
    let width = chunk.width.max(1) as usize;
    for (i, tile) in tiles.enumerate().filter(|(_, t)| !t.is_empty()) {
        let local = IVec2::new((i % width) as i32, (i / width) as i32);
        store.set_tile(origin.saturating_add(local), tile);
    }
    Ok(())
}

impl MapRecord {
    /// Map-level attributes, without validating geometry.
    pub fn attributes(&self) -> Result<MapAttributes, MapConfigError> {
        Ok(MapAttributes {
            orientation: self.orientation.parse::<Orientation>()?,
            width: clamp_i32(self.width),
            height: clamp_i32(self.height),
            tile_width: clamp_i32(self.tilewidth),
            tile_height: clamp_i32(self.tileheight),
            hex_side_length: self.hexsidelength.map_or(0, clamp_i32),
            stagger_axis: self
                .staggeraxis
                .as_deref()
                .map(str::parse::<StaggerAxis>)
                .transpose()?
                .unwrap_or_default(),
            stagger_index: self
                .staggerindex
                .as_deref()
                .map(str::parse::<StaggerIndex>)
                .transpose()?
                .unwrap_or_default(),
            infinite: self.infinite,
            render_order: self
                .renderorder
                .as_deref()
                .map(str::parse::<RenderOrder>)
                .transpose()?
                .unwrap_or_default(),
            background_color: self.backgroundcolor.as_deref().map(parse_color).transpose()?,
            next_object_id: self.nextobjectid.unwrap_or(1),
            properties: properties_from_records(&self.properties),
        })
    }

    /// Build the full map: attributes, then tilesets, then layers in order.
    ///
    /// The change queue of the returned map is empty; the initial contents are not
    /// reported as changes.
    pub fn into_tile_map(self, config: TileMapConfig) -> Result<TileMap, TileMapError> {
        let mut map = TileMap::new(self.attributes()?, config)?;
        for record in &self.tilesets {
            map.add_tileset(record.to_tileset()?)?;
        }
        for record in &self.layers {
            let node = record.to_node(&map)?;
            map.add_layer(node, None)?;
        }
        map.drain_changes();
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{LayerKind, LayerQuery};
    use crate::error::InvariantError;

    const FINITE_MAP: &str = r##"{
        "width": 4, "height": 3, "tilewidth": 16, "tileheight": 16,
        "orientation": "orthogonal", "renderorder": "right-down",
        "backgroundcolor": "#80ff0000", "nextobjectid": 4,
        "properties": [
            {"name": "music", "type": "file", "value": "theme.ogg"},
            {"name": "gravity", "type": "float", "value": 9.5},
            {"name": "indoors", "type": "bool", "value": false}
        ],
        "tilesets": [
            {"firstgid": 1, "name": "terrain", "tilecount": 10, "tilewidth": 16,
             "tileheight": 16, "columns": 5, "tiles": [
                {"id": 2, "type": "water", "animation": [
                    {"tileid": 2, "duration": 100}, {"tileid": 3, "duration": 150}
                ]},
                {"id": 4, "objectgroup": {"objects": [
                    {"id": 1, "x": 0, "y": 0, "width": 16, "height": 8}
                ]}}
            ]},
            {"firstgid": 11, "name": "props", "tilecount": 5, "tilewidth": 16, "tileheight": 16}
        ],
        "layers": [
            {"type": "tilelayer", "id": 1, "name": "ground", "width": 4, "height": 3,
             "data": [1,1,1,1, 2,3,2,2, 11,0,0,2147483659]},
            {"type": "group", "id": 2, "name": "world", "offsetx": 8, "offsety": 4, "layers": [
                {"type": "tilelayer", "id": 3, "name": "decor", "width": 4, "height": 3,
                 "class": "decoration", "data": [0,0,0,0, 0,0,0,0, 0,0,0,12]},
                {"type": "objectgroup", "id": 4, "name": "spawns", "draworder": "index",
                 "objects": [
                    {"id": 1, "name": "player", "type": "spawn", "x": 16, "y": 16, "point": true},
                    {"id": 2, "name": "door", "x": 32, "y": 0, "width": 16, "height": 32},
                    {"id": 3, "gid": 12, "x": 0, "y": 48, "width": 16, "height": 16}
                 ]}
            ]},
            {"type": "imagelayer", "id": 5, "name": "sky", "image": "sky.png",
             "imagewidth": 64, "imageheight": 48, "repeatx": true, "visible": false,
             "opacity": 0.5}
        ]
    }"##;

    #[test]
    fn test_builds_finite_map() {
        let map = TileMap::from_json_str(FINITE_MAP, TileMapConfig::default()).unwrap();
        assert_eq!(map.map_size(), UVec2::new(4, 3));
        assert_eq!(map.tilesets().len(), 2);
        assert_eq!(map.animated_tile_count(), 1);
        assert_eq!(map.properties.get("gravity").map(String::as_str), Some("9.5"));
        assert_eq!(map.properties.get("indoors").map(String::as_str), Some("false"));
        assert_eq!(map.properties.get("music").map(String::as_str), Some("theme.ogg"));
        assert!(map.background_color().is_some());
        assert!(map.pending_changes().is_empty());

        let all: Vec<&str> = map.layers().layers().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(all, vec!["ground", "world", "decor", "spawns", "sky"]);

        // Top-right of the decor layer covers the flipped prop on the ground layer.
        let top = map.first_tile_at(IVec2::new(3, 2)).unwrap();
        assert_eq!(top.gid(), 12);
        let all: Vec<u32> = map.tiles_at(IVec2::new(3, 2)).iter().map(|t| t.gid()).collect();
        assert_eq!(all, vec![12, 11]);
        let ground = map.layer_named("ground").unwrap().id();
        assert!(map.tile_at(ground, IVec2::new(3, 2)).unwrap().tile.flip_h);

        let decor = map.layer_named("decor").unwrap();
        assert_eq!(decor.offset(), Vec2::new(8.0, 4.0));
        assert!(!decor.has_own_offset());
        assert_eq!(map.find_layers(LayerQuery::TypeTag("decoration")).len(), 1);
        assert_eq!(map.layers().path(decor.id()).as_deref(), Some("world/decor"));

        let sky = map.layer_named("sky").unwrap();
        assert!(!sky.visible);
        assert_eq!(sky.opacity(), 0.5);
        assert_eq!(sky.kind(), LayerKind::Image);
        assert!(sky.image_data().unwrap().repeat_x);
    }

    #[test]
    fn test_builds_objects_and_tile_definitions() {
        let map = TileMap::from_json_str(FINITE_MAP, TileMapConfig::default()).unwrap();
        let player = map.object_with_id(1).unwrap();
        assert_eq!(player.shape, ObjectShape::Point);
        assert_eq!(player.user_type, "spawn");
        assert_eq!(map.objects_of_type("spawn").len(), 1);
        assert_eq!(map.object_with_id(3).unwrap().tile(), Some(TileRef(12)));
        assert_eq!(map.next_object_id(), 4);

        let water = map.get_tile_data(3).unwrap();
        assert_eq!(water.user_type.as_deref(), Some("water"));
        assert_eq!(water.animation.as_ref().unwrap().frames().len(), 2);
        assert_eq!(map.get_tile_data(5).unwrap().collision.len(), 1);

        let spawns = map.layer_named("spawns").unwrap();
        assert_eq!(spawns.object_data().unwrap().draw_order, DrawOrder::Index);
    }

    #[test]
    fn test_builds_infinite_map_from_chunks() {
        let mut full_chunk = vec![0u32; 256];
        full_chunk[0] = 3;
        let json = serde_json::json!({
            "width": 0, "height": 0, "tilewidth": 32, "tileheight": 32,
            "orientation": "orthogonal", "infinite": true,
            "tilesets": [{"firstgid": 1, "name": "t", "tilecount": 4, "tilewidth": 32, "tileheight": 32}],
            "layers": [{"type": "tilelayer", "name": "ground", "chunks": [
                {"x": -16, "y": 0, "width": 16, "height": 16, "data": full_chunk},
                {"x": 4, "y": 4, "width": 2, "height": 1, "data": [1, 2]}
            ]}]
        });
        let map = TileMap::from_json_str(&json.to_string(), TileMapConfig::default()).unwrap();
        let ground = map.layer_named("ground").unwrap();
        let store = ground.tile_data().unwrap().chunks().unwrap();

        assert_eq!(store.chunk_count(), 2);
        assert_eq!(map.raw_tile_at(ground.id(), IVec2::new(-16, 0)), TileRef(3));
        assert_eq!(map.raw_tile_at(ground.id(), IVec2::new(5, 4)), TileRef(2));
        assert_eq!(map.raw_tile_at(ground.id(), IVec2::new(1000, 1000)), TileRef::EMPTY);
        assert!(map.is_valid(IVec2::new(-1_000_000, 7)));
    }

    #[test]
    fn test_duplicate_chunk_records_fail() {
        let json = serde_json::json!({
            "width": 0, "height": 0, "tilewidth": 32, "tileheight": 32,
            "orientation": "orthogonal", "infinite": true,
            "layers": [{"type": "tilelayer", "name": "ground", "chunks": [
                {"x": 16, "y": -16, "width": 16, "height": 16, "data": vec![1u32; 256]},
                {"x": 16, "y": -16, "width": 16, "height": 16, "data": vec![2u32; 256]}
            ]}]
        });
        let err = TileMap::from_json_str(&json.to_string(), TileMapConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            TileMapError::Invariant(InvariantError::ChunkAlreadyAllocated(origin))
                if origin == IVec2::new(16, -16)
        ));
    }

    #[test]
    fn test_oversized_finite_map_fails() {
        let json = r#"{"width": 70000, "height": 70000, "tilewidth": 16, "tileheight": 16,
            "layers": []}"#;
        assert!(matches!(
            TileMap::from_json_str(json, TileMapConfig::default()).unwrap_err(),
            TileMapError::Config(MapConfigError::InvalidMapSize {
                width: 70000,
                height: 70000
            })
        ));

        // Infinite maps keep no dense grid, so their nominal size is not limited.
        let json = r#"{"width": 70000, "height": 70000, "tilewidth": 16, "tileheight": 16,
            "infinite": true, "layers": []}"#;
        assert!(TileMap::from_json_str(json, TileMapConfig::default()).is_ok());
    }

    #[test]
    fn test_infinite_layer_without_chunks_fails() {
        let json = r#"{"width": 0, "height": 0, "tilewidth": 16, "tileheight": 16, "infinite": true,
            "layers": [{"type": "tilelayer", "name": "ground", "data": []}]}"#;
        assert!(matches!(
            TileMap::from_json_str(json, TileMapConfig::default()).unwrap_err(),
            TileMapError::Config(MapConfigError::MissingTileData(_))
        ));
    }

    #[test]
    fn test_overlapping_tilesets_fail() {
        let json = r#"{
            "width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "tilesets": [
                {"firstgid": 1, "name": "a", "tilecount": 10},
                {"firstgid": 5, "name": "b", "tilecount": 10}
            ]
        }"#;
        let err = TileMap::from_json_str(json, TileMapConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            TileMapError::Config(MapConfigError::OverlappingTilesets { .. })
        ));
    }

    #[test]
    fn test_configuration_errors() {
        let wrong_length = r#"{
            "width": 2, "height": 2, "tilewidth": 16, "tileheight": 16,
            "layers": [{"type": "tilelayer", "name": "ground", "data": [1, 2, 3]}]
        }"#;
        assert!(matches!(
            TileMap::from_json_str(wrong_length, TileMapConfig::default()).unwrap_err(),
            TileMapError::Config(MapConfigError::InvalidLayerSize {
                expected: 4,
                found: 3,
                ..
            })
        ));

        let bad_orientation = r#"{"width": 2, "height": 2, "tilewidth": 16, "tileheight": 16,
            "orientation": "diagonal"}"#;
        assert!(matches!(
            TileMap::from_json_str(bad_orientation, TileMapConfig::default()).unwrap_err(),
            TileMapError::Config(MapConfigError::InvalidOrientation(_))
        ));

        let negative = r#"{"width": -2, "height": 2, "tilewidth": 16, "tileheight": 16}"#;
        assert!(matches!(
            TileMap::from_json_str(negative, TileMapConfig::default()).unwrap_err(),
            TileMapError::Config(MapConfigError::InvalidMapSize { .. })
        ));

        let external = r#"{"width": 1, "height": 1, "tilewidth": 16, "tileheight": 16,
            "tilesets": [{"firstgid": 1, "source": "terrain.tsj"}]}"#;
        assert!(matches!(
            TileMap::from_json_str(external, TileMapConfig::default()).unwrap_err(),
            TileMapError::Config(MapConfigError::ExternalTileset(_))
        ));

        assert!(matches!(
            TileMap::from_json_str("{ not json", TileMapConfig::default()).unwrap_err(),
            TileMapError::Parse(_)
        ));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000").unwrap(), Color::srgb_u8(255, 0, 0));
        assert_eq!(
            parse_color("#8000ff00").unwrap(),
            Color::srgba_u8(0, 255, 0, 128)
        );
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("#gg0000").is_err());
    }
}
