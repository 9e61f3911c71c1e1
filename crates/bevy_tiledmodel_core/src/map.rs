//! The map aggregate.

use std::borrow::Cow;

use bevy::log::{debug, info};
use bevy::math::{IRect, IVec2, Rect, UVec2, Vec2};
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::Properties;
use crate::animation::AnimationClock;
use crate::chunk::ChunkStore;
use crate::config::TileMapConfig;
use crate::error::{InvariantError, MapConfigError, TileMapError};
use crate::events::MapChange;
use crate::layers::{
    LayerId, LayerKind, LayerNode, LayerQuery, LayerTree, ObjectLayerData, TileAddressable,
    TileLayerData, TileObject,
};
use crate::projection::{MapGeometry, Orientation, RenderOrder, StaggerAxis, StaggerIndex};
use crate::records::MapRecord;
use crate::tile_id::{DecodedTile, TileRef};
use crate::tileset::{TileDefinition, TileSet, TileSetRegistry};

/// Map-level attributes, validated by [`TileMap::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct MapAttributes {
    pub orientation: Orientation,
    /// Map width in tiles
    pub width: i32,
    /// Map height in tiles
    pub height: i32,
    pub tile_width: i32,
    pub tile_height: i32,
    /// Only used by hexagonal maps.
    pub hex_side_length: i32,
    pub stagger_axis: StaggerAxis,
    pub stagger_index: StaggerIndex,
    pub infinite: bool,
    pub render_order: RenderOrder,
    pub background_color: Option<Color>,
    /// Next id handed to objects added without one.
    pub next_object_id: u32,
    pub properties: Properties,
}

impl Default for MapAttributes {
    fn default() -> Self {
        Self {
            orientation: Orientation::Orthogonal,
            width: 0,
            height: 0,
            tile_width: 16,
            tile_height: 16,
            hex_side_length: 0,
            stagger_axis: StaggerAxis::default(),
            stagger_index: StaggerIndex::default(),
            infinite: false,
            render_order: RenderOrder::default(),
            background_color: None,
            next_object_id: 1,
            properties: Properties::default(),
        }
    }
}

impl MapAttributes {
    pub fn new(orientation: Orientation, size: IVec2, tile_size: IVec2) -> Self {
        Self {
            orientation,
            width: size.x,
            height: size.y,
            tile_width: tile_size.x,
            tile_height: tile_size.y,
            ..Default::default()
        }
    }
}

/// A tile found by a map query, with its tileset and definition resolved.
#[derive(Debug, Clone)]
pub struct ResolvedTile<'a> {
    pub layer: LayerId,
    pub coord: IVec2,
    pub tile: DecodedTile,
    pub tileset: &'a TileSet,
    pub definition: Cow<'a, TileDefinition>,
}

impl ResolvedTile<'_> {
    #[inline]
    pub fn gid(&self) -> u32 {
        self.tile.gid
    }

    /// Local id to draw, following the definition's current animation frame.
    pub fn displayed_tile_id(&self) -> u32 {
        self.definition.displayed_tile_id()
    }
}

/// A Tiled map: geometry, tilesets, layers and animation state.
///
/// All mutation goes through `&mut self`, so a map is changed from one place at a
/// time while any number of readers may query it.
#[derive(Component, Debug, Clone)]
pub struct TileMap {
    geometry: MapGeometry,
    render_order: RenderOrder,
    background_color: Option<Color>,
    pub properties: Properties,
    tilesets: TileSetRegistry,
    layers: LayerTree,
    clock: AnimationClock,
    config: TileMapConfig,
    object_ids: HashSet<u32>,
    next_object_id: u32,
    changes: Vec<MapChange>,
}

impl TileMap {
    /// Validate `attributes` and build an empty map.
    pub fn new(attributes: MapAttributes, config: TileMapConfig) -> Result<Self, TileMapError> {
        let geometry = MapGeometry::new(
            attributes.orientation,
            IVec2::new(attributes.width, attributes.height),
            IVec2::new(attributes.tile_width, attributes.tile_height),
            attributes.hex_side_length,
            attributes.stagger_axis,
            attributes.stagger_index,
            attributes.infinite,
        )?;
        ChunkStore::new(config.chunk_size)?;

        info!(
            "Created {:?} map {}x{} (tiles {}x{}{})",
            geometry.orientation(),
            geometry.map_size().x,
            geometry.map_size().y,
            geometry.tile_size().x,
            geometry.tile_size().y,
            if geometry.is_infinite() { ", infinite" } else { "" }
        );

        Ok(Self {
            geometry,
            render_order: attributes.render_order,
            background_color: attributes.background_color,
            properties: attributes.properties,
            tilesets: TileSetRegistry::default(),
            layers: LayerTree::new(config.layer_z_delta),
            clock: AnimationClock::new(
                config.animation_mode,
                config.animation_speed,
                config.parallel_animation_threshold,
            ),
            config,
            object_ids: HashSet::default(),
            next_object_id: attributes.next_object_id.max(1),
            changes: Vec::new(),
        })
    }

    /// Build a complete map from a parsed record.
    pub fn from_record(record: MapRecord, config: TileMapConfig) -> Result<Self, TileMapError> {
        record.into_tile_map(config)
    }

    /// Parse Tiled JSON and build the map.
    pub fn from_json_str(json: &str, config: TileMapConfig) -> Result<Self, TileMapError> {
        let record: MapRecord = serde_json::from_str(json)?;
        Self::from_record(record, config)
    }

    // ===== GEOMETRY =====

    pub fn geometry(&self) -> &MapGeometry {
        &self.geometry
    }

    pub fn orientation(&self) -> Orientation {
        self.geometry.orientation()
    }

    pub fn map_size(&self) -> UVec2 {
        self.geometry.map_size()
    }

    pub fn tile_size(&self) -> UVec2 {
        self.geometry.tile_size()
    }

    pub fn is_infinite(&self) -> bool {
        self.geometry.is_infinite()
    }

    pub fn render_order(&self) -> RenderOrder {
        self.render_order
    }

    pub fn background_color(&self) -> Option<Color> {
        self.background_color
    }

    pub fn pixel_size(&self) -> Vec2 {
        self.geometry.pixel_size()
    }

    pub fn config(&self) -> &TileMapConfig {
        &self.config
    }

    /// Pixel reference point of a tile (see [`crate::projection`]).
    pub fn point_for_coordinate(&self, coord: IVec2) -> Vec2 {
        self.geometry.to_pixel(coord)
    }

    pub fn coordinate_for_point(&self, point: Vec2) -> IVec2 {
        self.geometry.to_coordinate(point)
    }

    pub fn tile_center(&self, coord: IVec2) -> Vec2 {
        self.geometry.tile_center(coord)
    }

    pub fn is_valid(&self, coord: IVec2) -> bool {
        self.geometry.is_valid(coord)
    }

    pub fn neighbors(&self, coord: IVec2) -> [IVec2; 4] {
        self.geometry.neighbors(coord)
    }

    // ===== TILESETS =====

    pub fn tilesets(&self) -> &TileSetRegistry {
        &self.tilesets
    }

    pub fn add_tileset(&mut self, tileset: TileSet) -> Result<(), MapConfigError> {
        let (first_gid, name) = (tileset.first_gid(), tileset.name.clone());
        self.tilesets.register(tileset)?;
        info!("Added tileset '{}' at gid {}", name, first_gid);
        self.changes
            .push(MapChange::TilesetAdded { first_gid, name });
        Ok(())
    }

    pub fn remove_tileset(&mut self, first_gid: u32) -> Result<TileSet, InvariantError> {
        let tileset = self
            .tilesets
            .remove(first_gid)
            .ok_or(InvariantError::TilesetNotFound(first_gid))?;
        info!("Removed tileset '{}' at gid {}", tileset.name, first_gid);
        self.changes.push(MapChange::TilesetRemoved {
            first_gid,
            name: tileset.name.clone(),
        });
        Ok(tileset)
    }

    /// Swap in a new definition for `gid`; it is reported as refreshed on the next
    /// tick in full animation mode.
    pub fn replace_tile(
        &mut self,
        gid: u32,
        definition: TileDefinition,
    ) -> Result<(), InvariantError> {
        self.tilesets.replace_tile(gid, definition)
    }

    /// Definition behind `gid`, if any tileset owns it.
    pub fn get_tile_data(&self, gid: u32) -> Option<Cow<'_, TileDefinition>> {
        self.tilesets.resolve(gid).map(|(_, def)| def)
    }

    pub fn animated_tile_count(&self) -> usize {
        self.tilesets.animated_count()
    }

    // ===== LAYERS =====

    pub fn layers(&self) -> &LayerTree {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerNode> {
        self.layers.get(id)
    }

    /// Mutable access for visibility, opacity, names and properties. Offsets, parallax,
    /// tint and ordering go through [`TileMap::layers_mut`] so defaults propagate.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut LayerNode> {
        self.layers.get_mut(id)
    }

    pub fn layers_mut(&mut self) -> &mut LayerTree {
        &mut self.layers
    }

    /// Empty tile layer shaped for this map: dense for finite maps, chunked otherwise.
    pub fn new_tile_layer(&self, name: impl Into<String>) -> LayerNode {
        let data = if self.is_infinite() {
            TileLayerData::Chunked(ChunkStore::new(self.config.chunk_size).unwrap_or_default())
        } else {
            TileLayerData::empty(self.map_size())
        };
        LayerNode::tiles(name, data)
    }

    /// Insert a layer (and its prebuilt children).
    ///
    /// Object ids must be unique across the whole map; objects with id 0 get fresh ids.
    pub fn add_layer(
        &mut self,
        mut node: LayerNode,
        parent: Option<LayerId>,
    ) -> Result<LayerId, TileMapError> {
        let mut used = HashSet::<u32>::default();
        let mut duplicate = None;
        for_each_object_layer(&mut node, &mut |data| {
            for object in data.objects.iter().filter(|o| o.id != 0) {
                let clash = self.object_ids.contains(&object.id) || !used.insert(object.id);
                if clash && duplicate.is_none() {
                    duplicate = Some(object.id);
                }
            }
        });
        if let Some(id) = duplicate {
            return Err(InvariantError::DuplicateObjectId(id).into());
        }

        let mut next = self.next_object_id;
        let mut exhausted = false;
        for_each_object_layer(&mut node, &mut |data| {
            for object in data.objects.iter_mut().filter(|o| o.id == 0) {
                match free_object_id(&self.object_ids, &used, next) {
                    Some(id) => {
                        object.id = id;
                        used.insert(id);
                        next = id;
                    }
                    None => exhausted = true,
                }
            }
        });
        if exhausted {
            return Err(InvariantError::ObjectIdsExhausted.into());
        }

        let id = self.layers.insert(node, parent)?;

        if let Some(highest) = used.iter().copied().max() {
            self.next_object_id = self.next_object_id.max(highest.saturating_add(1));
        }
        self.object_ids.extend(used);

        let added: Vec<(LayerId, LayerKind)> = self
            .layers
            .get(id)
            .map(|node| node.descendants().iter().map(|n| (n.id(), n.kind())).collect())
            .unwrap_or_default();
        self.changes.extend(
            added
                .into_iter()
                .map(|(id, kind)| MapChange::LayerAdded { id, kind }),
        );
        Ok(id)
    }

    /// Remove a layer and its subtree, releasing their object ids.
    pub fn remove_layer(&mut self, id: LayerId) -> Result<LayerNode, InvariantError> {
        let node = self.layers.remove(id)?;
        for removed in node.descendants() {
            if let Some(data) = removed.object_data() {
                for object in &data.objects {
                    self.object_ids.remove(&object.id);
                }
            }
            self.changes.push(MapChange::LayerRemoved {
                id: removed.id(),
                kind: removed.kind(),
            });
        }
        Ok(node)
    }

    pub fn find_layers(&self, query: LayerQuery<'_>) -> Vec<&LayerNode> {
        self.layers.find(query)
    }

    /// First layer with `name`; duplicates resolve to the first in draw order.
    pub fn layer_named(&self, name: &str) -> Option<&LayerNode> {
        self.layers.first(LayerQuery::Name(name))
    }

    pub fn tile_layers(&self) -> Vec<&LayerNode> {
        self.layers.find(LayerQuery::Kind(LayerKind::Tiles))
    }

    pub fn object_layers(&self) -> Vec<&LayerNode> {
        self.layers.find(LayerQuery::Kind(LayerKind::Objects))
    }

    pub fn image_layers(&self) -> Vec<&LayerNode> {
        self.layers.find(LayerQuery::Kind(LayerKind::Image))
    }

    pub fn group_layers(&self) -> Vec<&LayerNode> {
        self.layers.find(LayerQuery::Kind(LayerKind::Group))
    }

    /// Pixel bounds of a layer's content, offset included.
    pub fn layer_bounds(&self, id: LayerId) -> Option<Rect> {
        self.layers.get(id)?.bounds(&self.geometry)
    }

    /// Tile-space extent of every chunked tile layer.
    pub fn chunk_bounds(&self) -> Option<IRect> {
        self.tile_layers()
            .into_iter()
            .filter_map(|node| node.tile_data()?.chunks()?.tile_bounds())
            .reduce(|a, b| a.union(b))
    }

    // ===== TILES =====

    /// Raw tile reference stored at `coord`; [`TileRef::EMPTY`] for misses.
    pub fn raw_tile_at(&self, layer: LayerId, coord: IVec2) -> TileRef {
        self.layers
            .get(layer)
            .and_then(LayerNode::as_tile_addressable)
            .map_or(TileRef::EMPTY, |data| data.tile_at(coord))
    }

    /// Resolved tile at `coord` on one layer.
    pub fn tile_at(&self, layer: LayerId, coord: IVec2) -> Option<ResolvedTile<'_>> {
        let node = self.layers.get(layer)?;
        self.resolve_on(node, coord)
    }

    fn resolve_on<'a>(&'a self, node: &LayerNode, coord: IVec2) -> Option<ResolvedTile<'a>> {
        if !self.is_valid(coord) {
            return None;
        }
        let tile = node.as_tile_addressable()?.tile_at(coord);
        if tile.is_empty() {
            return None;
        }
        let decoded = tile.decode();
        let (tileset, definition) = self.tilesets.resolve(decoded.gid)?;
        Some(ResolvedTile {
            layer: node.id(),
            coord,
            tile: decoded,
            tileset,
            definition,
        })
    }

    /// Every visible tile at `coord`, front to back.
    pub fn tiles_at(&self, coord: IVec2) -> Vec<ResolvedTile<'_>> {
        self.layers
            .tile_layers_front_to_back()
            .into_iter()
            .filter_map(|node| self.resolve_on(node, coord))
            .collect()
    }

    /// Topmost visible tile at `coord`.
    pub fn first_tile_at(&self, coord: IVec2) -> Option<ResolvedTile<'_>> {
        self.layers
            .tile_layers_front_to_back()
            .into_iter()
            .find_map(|node| self.resolve_on(node, coord))
    }

    /// Write a tile. Returns `Ok(false)` when `coord` is outside a finite map.
    pub fn set_tile(
        &mut self,
        layer: LayerId,
        coord: IVec2,
        tile: TileRef,
    ) -> Result<bool, InvariantError> {
        let in_bounds = self.is_valid(coord);
        let node = self
            .layers
            .get_mut(layer)
            .ok_or(InvariantError::LayerNotFound(layer))?;
        let data = node
            .as_tile_addressable_mut()
            .ok_or(InvariantError::NotATileLayer(layer))?;
        if !in_bounds {
            debug!("Ignoring tile write outside the map at {}", coord);
            return Ok(false);
        }
        Ok(data.set_tile(coord, tile))
    }

    // ===== OBJECTS =====

    fn all_objects(&self) -> impl Iterator<Item = &TileObject> {
        self.layers
            .flatten()
            .into_iter()
            .filter_map(LayerNode::object_data)
            .flat_map(|data| data.objects.iter())
    }

    pub fn object_with_id(&self, id: u32) -> Option<&TileObject> {
        if !self.object_ids.contains(&id) {
            return None;
        }
        self.all_objects().find(|o| o.id == id)
    }

    pub fn objects_named(&self, name: &str) -> Vec<&TileObject> {
        self.all_objects().filter(|o| o.name == name).collect()
    }

    pub fn objects_of_type(&self, user_type: &str) -> Vec<&TileObject> {
        self.all_objects()
            .filter(|o| o.user_type == user_type)
            .collect()
    }

    /// Add an object to an object layer, allocating an id when it has none.
    pub fn add_object(
        &mut self,
        layer: LayerId,
        mut object: TileObject,
    ) -> Result<u32, InvariantError> {
        if object.id != 0 && self.object_ids.contains(&object.id) {
            return Err(InvariantError::DuplicateObjectId(object.id));
        }
        if self.layers.get(layer).is_none() {
            return Err(InvariantError::LayerNotFound(layer));
        }
        if object.id == 0 {
            object.id = free_object_id(&self.object_ids, &HashSet::default(), self.next_object_id)
                .ok_or(InvariantError::ObjectIdsExhausted)?;
        }
        let id = object.id;
        let data = self
            .layers
            .get_mut(layer)
            .and_then(LayerNode::object_data_mut)
            .ok_or(InvariantError::NotAnObjectLayer(layer))?;
        data.objects.push(object);
        self.object_ids.insert(id);
        self.next_object_id = self.next_object_id.max(id.saturating_add(1));
        Ok(id)
    }

    pub fn next_object_id(&self) -> u32 {
        self.next_object_id
    }

    // ===== ANIMATION & CHANGES =====

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    /// Pause, speed and mode controls.
    pub fn clock_mut(&mut self) -> &mut AnimationClock {
        &mut self.clock
    }

    /// Advance tile animations by `delta_seconds`, queueing frame changes.
    pub fn update(&mut self, delta_seconds: f32) {
        let changes = self.clock.tick(delta_seconds, &mut self.tilesets);
        self.changes.extend(changes);
    }

    pub fn pending_changes(&self) -> &[MapChange] {
        &self.changes
    }

    /// Take every queued change, oldest first.
    pub fn drain_changes(&mut self) -> Vec<MapChange> {
        std::mem::take(&mut self.changes)
    }
}

/// Lowest id from `start` up that neither set holds. `None` once the ids run out.
fn free_object_id(ids: &HashSet<u32>, taken: &HashSet<u32>, start: u32) -> Option<u32> {
    let mut id = start.max(1);
    while ids.contains(&id) || taken.contains(&id) {
        id = id.checked_add(1)?;
    }
    Some(id)
}

fn for_each_object_layer<F: FnMut(&mut ObjectLayerData)>(node: &mut LayerNode, f: &mut F) {
    if let Some(data) = node.object_data_mut() {
        f(data);
    }
    if let Some(children) = node.children_mut() {
        for child in children {
            for_each_object_layer(child, f);
        }
    }
}
