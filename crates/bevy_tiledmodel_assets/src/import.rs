//! Conversion from a parsed [`tiled::Map`] into [`MapRecord`]s.
//!
//! The `tiled` crate resolves external tilesets and templates and decodes layer data
//! (CSV, base64, compression). What is left here is mapping its types onto the
//! engine's records. `tiled` does not expose first GIDs, so they are recomputed
//! cumulatively in tileset order, matching the `tileset_index` it reports on tiles.

use std::path::Path;

use bevy::log::{debug, info, warn};
use bevy::math::UVec2;
use bevy_tiledmodel_core::chunk::cell_count;
use bevy_tiledmodel_core::config::TileMapConfig;
use bevy_tiledmodel_core::map::TileMap;
use bevy_tiledmodel_core::records::{
    ChunkRecord, CollisionRecord, FrameRecord, GroupRecord, ImageLayerRecord, LayerCommon,
    LayerRecord, MapRecord, ObjectGroupRecord, ObjectRecord, PointRecord, PropertyRecord,
    TextRecord, TileLayerRecord, TileOffsetRecord, TileRecord, TilesetRecord,
};
use bevy_tiledmodel_core::tile_id::TileRef;

use crate::error::ImportError;

/// Load a TMX file, with every tileset and template it references, and build the map.
pub fn load_tmx_map(
    path: impl AsRef<Path>,
    config: TileMapConfig,
) -> Result<TileMap, ImportError> {
    let path = path.as_ref();
    let mut loader = tiled::Loader::new();
    let map = loader.load_tmx_map(path)?;
    info!(
        "Importing TMX map {} ({} tilesets)",
        path.display(),
        map.tilesets().len()
    );
    let mut record = map_record(&map);
    // `tiled` drops these two attributes, so they are read from the root tag.
    let header = MapHeader::parse(&std::fs::read_to_string(path)?);
    record.renderorder = header.render_order;
    record.nextobjectid = header.next_object_id;
    Ok(TileMap::from_record(record, config)?)
}

/// Attributes of the `<map>` root tag that `tiled::Map` does not carry.
#[derive(Debug, Default, PartialEq)]
pub struct MapHeader {
    pub render_order: Option<String>,
    pub next_object_id: Option<u32>,
}

impl MapHeader {
    pub fn parse(tmx: &str) -> Self {
        let Some(start) = tmx.find("<map") else {
            return Self::default();
        };
        let tag = &tmx[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        let next_object_id = attribute(tag, "nextobjectid").and_then(|value| {
            value.parse().ok().or_else(|| {
                warn!("Ignoring malformed nextobjectid {:?}", value);
                None
            })
        });
        Self {
            render_order: attribute(tag, "renderorder").map(str::to_owned),
            next_object_id,
        }
    }
}

fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {name}=");
    let rest = &tag[tag.find(&needle)? + needle.len()..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    Some(&rest[..rest.find(quote)?])
}

/// First GID of each tileset, indexed like `map.tilesets()`.
pub fn first_gids(map: &tiled::Map) -> Vec<u32> {
    let mut next = 1u32;
    map.tilesets()
        .iter()
        .map(|tileset| {
            let first = next;
            next = next.saturating_add(tileset.tilecount);
            first
        })
        .collect()
}

/// Records for `map`, ready for [`TileMap::from_record`].
///
/// `renderorder` and `nextobjectid` are left unset; see [`MapHeader`].
pub fn map_record(map: &tiled::Map) -> MapRecord {
    let first_gids = first_gids(map);
    let hex_side_length: Option<i32> = map.hex_side_length.into();

    MapRecord {
        width: map.width.into(),
        height: map.height.into(),
        tilewidth: map.tile_width.into(),
        tileheight: map.tile_height.into(),
        orientation: variant_name(&map.orientation),
        infinite: map.infinite(),
        renderorder: None,
        hexsidelength: hex_side_length.map(i64::from),
        staggeraxis: Some(variant_name(&map.stagger_axis)),
        staggerindex: Some(variant_name(&map.stagger_index)),
        backgroundcolor: map.background_color.map(color_string),
        nextobjectid: None,
        properties: property_records(&map.properties),
        layers: map
            .layers()
            .map(|layer| layer_record(&layer, &first_gids))
            .collect(),
        tilesets: map
            .tilesets()
            .iter()
            .zip(&first_gids)
            .map(|(tileset, first_gid)| tileset_record(tileset, *first_gid, &first_gids))
            .collect(),
    }
}

/// `tiled`'s enum variants spelled the way map files spell them.
fn variant_name(value: &impl std::fmt::Debug) -> String {
    format!("{value:?}").to_lowercase()
}

fn color_string(color: tiled::Color) -> String {
    format!(
        "#{:02x}{:02x}{:02x}{:02x}",
        color.alpha, color.red, color.green, color.blue
    )
}

fn encode(first_gids: &[u32], tileset_index: usize, id: u32, flips: [bool; 3]) -> u32 {
    match first_gids.get(tileset_index) {
        Some(first_gid) => TileRef::new(first_gid + id, flips[0], flips[1], flips[2]).raw(),
        None => {
            warn!("Tile references unknown tileset index {}", tileset_index);
            0
        }
    }
}

fn property_records(properties: &tiled::Properties) -> Vec<PropertyRecord> {
    let mut records: Vec<PropertyRecord> = properties
        .iter()
        .map(|(name, value)| {
            let (kind, value) = match value {
                tiled::PropertyValue::BoolValue(v) => ("bool", serde_json::Value::Bool(*v)),
                tiled::PropertyValue::FloatValue(v) => ("float", serde_json::Value::String(v.to_string())),
                tiled::PropertyValue::IntValue(v) => ("int", serde_json::Value::from(*v)),
                tiled::PropertyValue::ColorValue(c) => ("color", serde_json::Value::String(color_string(*c))),
                tiled::PropertyValue::StringValue(v) => ("string", serde_json::Value::String(v.clone())),
                tiled::PropertyValue::FileValue(v) => ("file", serde_json::Value::String(v.clone())),
                tiled::PropertyValue::ObjectValue(v) => ("object", serde_json::Value::from(*v)),
                tiled::PropertyValue::ClassValue { property_type, .. } => {
                    ("class", serde_json::Value::String(property_type.clone()))
                }
            };
            PropertyRecord {
                name: name.clone(),
                kind: kind.to_string(),
                value,
            }
        })
        .collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}

fn layer_record(layer: &tiled::Layer, first_gids: &[u32]) -> LayerRecord {
    let common = LayerCommon {
        id: layer.id(),
        name: layer.name.clone(),
        class: layer.user_type.clone(),
        offsetx: layer.offset_x,
        offsety: layer.offset_y,
        parallaxx: layer.parallax_x,
        parallaxy: layer.parallax_y,
        opacity: layer.opacity,
        visible: layer.visible,
        tintcolor: layer.tint_color.map(color_string),
        properties: property_records(&layer.properties),
    };

    match layer.layer_type() {
        tiled::LayerType::Tiles(tiles) => LayerRecord::Tiles(tile_layer_record(common, &tiles, first_gids)),
        tiled::LayerType::Objects(objects) => LayerRecord::Objects(ObjectGroupRecord {
            common,
            draworder: None,
            color: None,
            objects: objects
                .objects()
                .map(|object| object_record(&object, first_gids))
                .collect(),
        }),
        tiled::LayerType::Image(image_layer) => {
            let image = image_layer.image.as_ref();
            LayerRecord::Image(ImageLayerRecord {
                common,
                image: image
                    .map(|image| image.source.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                imagewidth: image.and_then(|image| u32::try_from(image.width).ok()),
                imageheight: image.and_then(|image| u32::try_from(image.height).ok()),
                repeatx: false,
                repeaty: false,
            })
        }
        tiled::LayerType::Group(group) => LayerRecord::Group(GroupRecord {
            common,
            layers: group
                .layers()
                .map(|child| layer_record(&child, first_gids))
                .collect(),
        }),
    }
}

fn tile_layer_record(
    common: LayerCommon,
    tiles: &tiled::TileLayer,
    first_gids: &[u32],
) -> TileLayerRecord {
    match tiles {
        tiled::TileLayer::Finite(finite) => {
            let (width, height) = (finite.width(), finite.height());
            let mut data = Vec::with_capacity(cell_count(UVec2::new(width, height)));
            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    data.push(finite.get_tile(x, y).map_or(0, |tile| {
                        encode(
                            first_gids,
                            tile.tileset_index(),
                            tile.id(),
                            [tile.flip_h, tile.flip_v, tile.flip_d],
                        )
                    }));
                }
            }
            TileLayerRecord {
                common,
                width,
                height,
                data: Some(data),
                chunks: None,
            }
        }
        tiled::TileLayer::Infinite(infinite) => {
            // Chunk dimensions are constants in the tiled crate
            let (width, height) = (tiled::ChunkData::WIDTH, tiled::ChunkData::HEIGHT);
            let chunks: Vec<ChunkRecord> = infinite
                .chunks()
                .map(|((chunk_x, chunk_y), chunk)| {
                    let mut data = Vec::with_capacity(cell_count(UVec2::new(width, height)));
                    for y in 0..height as i32 {
                        for x in 0..width as i32 {
                            data.push(chunk.get_tile(x, y).map_or(0, |tile| {
                                encode(
                                    first_gids,
                                    tile.tileset_index(),
                                    tile.id(),
                                    [tile.flip_h, tile.flip_v, tile.flip_d],
                                )
                            }));
                        }
                    }
                    ChunkRecord {
                        x: chunk_x * width as i32,
                        y: chunk_y * height as i32,
                        width,
                        height,
                        data,
                    }
                })
                .collect();
            debug!("Layer '{}' has {} chunks", common.name, chunks.len());
            TileLayerRecord {
                common,
                width: 0,
                height: 0,
                data: None,
                chunks: Some(chunks),
            }
        }
    }
}

fn point_records(points: &[(f32, f32)]) -> Vec<PointRecord> {
    points.iter().map(|&(x, y)| PointRecord { x, y }).collect()
}

fn object_record(object: &tiled::ObjectData, first_gids: &[u32]) -> ObjectRecord {
    let mut record = ObjectRecord {
        id: object.id(),
        name: object.name.clone(),
        user_type: object.user_type.clone(),
        x: object.x,
        y: object.y,
        rotation: object.rotation,
        visible: object.visible,
        properties: property_records(&object.properties),
        ..Default::default()
    };

    match &object.shape {
        tiled::ObjectShape::Rect { width, height } => {
            record.width = *width;
            record.height = *height;
        }
        tiled::ObjectShape::Ellipse { width, height } => {
            record.width = *width;
            record.height = *height;
            record.ellipse = true;
        }
        tiled::ObjectShape::Polygon { points } => record.polygon = Some(point_records(points)),
        tiled::ObjectShape::Polyline { points } => record.polyline = Some(point_records(points)),
        tiled::ObjectShape::Point(..) => record.point = true,
        tiled::ObjectShape::Text {
            text,
            width,
            height,
            ..
        } => {
            record.width = *width;
            record.height = *height;
            record.text = Some(TextRecord { text: text.clone() });
        }
    }

    if let Some(tile) = object.tile_data() {
        match tile.tileset_location() {
            tiled::TilesetLocation::Map(index) => {
                record.gid = Some(encode(
                    first_gids,
                    *index,
                    tile.id(),
                    [tile.flip_h, tile.flip_v, tile.flip_d],
                ));
            }
            tiled::TilesetLocation::Template(_) => warn!(
                "Object {} uses a tile from a template-only tileset, importing it as a rectangle",
                record.id
            ),
        }
    }
    record
}

fn tileset_record(tileset: &tiled::Tileset, first_gid: u32, first_gids: &[u32]) -> TilesetRecord {
    let mut tiles: Vec<TileRecord> = tileset
        .tiles()
        .map(|(id, tile)| TileRecord {
            id,
            user_type: tile.user_type.clone(),
            probability: Some(tile.probability),
            animation: tile
                .animation
                .iter()
                .flatten()
                .map(|frame| FrameRecord {
                    tileid: frame.tile_id,
                    duration: frame.duration,
                })
                .collect(),
            objectgroup: tile.collision.as_ref().map(|collision| CollisionRecord {
                objects: collision
                    .object_data()
                    .iter()
                    .map(|object| object_record(object, first_gids))
                    .collect(),
            }),
            properties: property_records(&tile.properties),
        })
        .collect();
    tiles.sort_by_key(|tile| tile.id);

    TilesetRecord {
        firstgid: first_gid,
        source: None,
        name: tileset.name.clone(),
        tilecount: Some(tileset.tilecount),
        tilewidth: tileset.tile_width,
        tileheight: tileset.tile_height,
        columns: tileset.columns,
        spacing: tileset.spacing,
        margin: tileset.margin,
        tileoffset: Some(TileOffsetRecord {
            x: tileset.offset_x,
            y: tileset.offset_y,
        }),
        properties: property_records(&tileset.properties),
        tiles,
    }
}
