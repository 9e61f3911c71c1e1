//! Tilesets, tile definitions and global-id resolution.

use std::borrow::Cow;
use std::collections::BTreeMap;

use bevy::log::debug;
use bevy::math::{IVec2, Rect, UVec2, Vec2};

use crate::Properties;
use crate::animation::{AnimationFrame, TileAnimation};
use crate::error::{InvariantError, MapConfigError};
use crate::layers::TileObject;
use crate::tile_id::{DecodedTile, GID_MASK, TileRef};

/// Per-tile data declared by a tileset.
#[derive(Debug, Clone, PartialEq)]
pub struct TileDefinition {
    /// Local tile id (0-based, NOT a GID).
    pub id: u32,
    /// Class/type tag set in the editor.
    pub user_type: Option<String>,
    /// Terrain/random-fill weight.
    pub probability: f32,
    /// Animation sequence and playback state, if the tile is animated.
    pub animation: Option<TileAnimation>,
    /// Collision shapes, positioned relative to the tile's top-left corner.
    pub collision: Vec<TileObject>,
    pub properties: Properties,
    needs_refresh: bool,
}

impl TileDefinition {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            user_type: None,
            probability: 1.0,
            animation: None,
            collision: Vec::new(),
            properties: Properties::default(),
            needs_refresh: false,
        }
    }

    /// Attach an animation. An empty frame list leaves the tile static.
    pub fn with_animation(mut self, frames: Vec<AnimationFrame>) -> Self {
        self.animation = TileAnimation::new(frames);
        self
    }

    pub fn with_user_type(mut self, user_type: impl Into<String>) -> Self {
        self.user_type = Some(user_type.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_collision(mut self, collision: Vec<TileObject>) -> Self {
        self.collision = collision;
        self
    }

    #[inline]
    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }

    /// Local id of the tile currently displayed: the active frame for animated tiles,
    /// the tile itself otherwise.
    pub fn displayed_tile_id(&self) -> u32 {
        self.animation
            .as_ref()
            .map_or(self.id, TileAnimation::current_tile_id)
    }

    /// Whether a refresh is pending since the definition was replaced.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    pub(crate) fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.needs_refresh)
    }
}

/// A named collection of tile definitions registered under a first GID.
///
/// Only tiles with declared data are stored; every other id in `0..tile_count` is a
/// plain [`TileDefinition`] built on lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    pub name: String,
    first_gid: u32,
    tile_count: u32,
    /// Tile size in pixels (width, height).
    pub tile_size: UVec2,
    /// Atlas columns; 0 for image collection tilesets.
    pub columns: u32,
    /// Spacing between tiles in the atlas (pixels).
    pub spacing: u32,
    /// Margin around the tiles in the atlas (pixels).
    pub margin: u32,
    /// Drawing offset applied to every tile of this set.
    pub tile_offset: IVec2,
    pub properties: Properties,
    tiles: BTreeMap<u32, TileDefinition>,
    animated: BTreeMap<u32, TileDefinition>,
}

impl TileSet {
    /// Create a tileset of `tile_count` plain tiles.
    pub fn new(name: impl Into<String>, first_gid: u32, tile_count: u32, tile_size: UVec2) -> Self {
        Self {
            name: name.into(),
            first_gid,
            tile_count,
            tile_size,
            columns: 0,
            spacing: 0,
            margin: 0,
            tile_offset: IVec2::ZERO,
            properties: Properties::default(),
            tiles: BTreeMap::new(),
            animated: BTreeMap::new(),
        }
    }

    /// Replace the definition for `definition.id`. Ids outside the set are ignored.
    pub fn with_tile(mut self, definition: TileDefinition) -> Self {
        self.set_tile(definition);
        self
    }

    pub fn with_columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_spacing(mut self, spacing: u32, margin: u32) -> Self {
        self.spacing = spacing;
        self.margin = margin;
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub(crate) fn set_tile(&mut self, definition: TileDefinition) -> bool {
        let id = definition.id;
        if id >= self.tile_count {
            debug!(
                "Tileset '{}' has {} tiles, ignoring definition for local id {}",
                self.name, self.tile_count, id
            );
            return false;
        }
        self.tiles.remove(&id);
        self.animated.remove(&id);
        if definition.is_animated() {
            self.animated.insert(id, definition);
        } else {
            self.tiles.insert(id, definition);
        }
        true
    }

    #[inline]
    pub fn first_gid(&self) -> u32 {
        self.first_gid
    }

    #[inline]
    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    /// `first_gid + tile_count - 1`. For an empty set this is `first_gid - 1`.
    #[inline]
    pub fn last_gid(&self) -> u32 {
        self.first_gid
            .saturating_add(self.tile_count)
            .saturating_sub(1)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tile_count == 0
    }

    #[inline]
    pub fn contains(&self, gid: u32) -> bool {
        !self.is_empty() && gid >= self.first_gid && gid <= self.last_gid()
    }

    /// Convert a GID to this set's local id.
    pub fn local_id(&self, gid: u32) -> Option<u32> {
        self.contains(gid).then(|| gid - self.first_gid)
    }

    /// Definition of `local_id`; a plain one when the set declares nothing for it.
    pub fn tile(&self, local_id: u32) -> Option<Cow<'_, TileDefinition>> {
        if local_id >= self.tile_count {
            return None;
        }
        let declared = self
            .tiles
            .get(&local_id)
            .or_else(|| self.animated.get(&local_id));
        Some(declared.map_or_else(|| Cow::Owned(TileDefinition::new(local_id)), Cow::Borrowed))
    }

    /// Definitions the set declares data for, static ones first.
    pub fn tiles(&self) -> impl Iterator<Item = &TileDefinition> {
        self.tiles.values().chain(self.animated.values())
    }

    pub fn animated_tiles(&self) -> impl Iterator<Item = &TileDefinition> {
        self.animated.values()
    }

    /// Source rectangle of a tile inside the tileset atlas.
    ///
    /// Returns `None` for image collection tilesets (`columns == 0`) or ids outside the set.
    pub fn atlas_rect(&self, local_id: u32) -> Option<Rect> {
        if self.columns == 0 || local_id >= self.tile_count {
            return None;
        }
        let column = local_id % self.columns;
        let row = local_id / self.columns;
        let min = Vec2::new(
            (self.margin + column * (self.tile_size.x + self.spacing)) as f32,
            (self.margin + row * (self.tile_size.y + self.spacing)) as f32,
        );
        Some(Rect::from_corners(min, min + self.tile_size.as_vec2()))
    }

    /// Highest GID this set claims, treating an empty set as occupying its first GID.
    fn reserved_last_gid(&self) -> u32 {
        self.last_gid().max(self.first_gid)
    }
}

/// Owns a map's tilesets and resolves global ids to `(tileset, definition)`.
///
/// Sets are indexed by first GID, so resolution is a single ordered-range lookup.
#[derive(Debug, Clone, Default)]
pub struct TileSetRegistry {
    sets: BTreeMap<u32, TileSet>,
}

impl TileSetRegistry {
    /// Split an encoded tile reference into gid and flip flags.
    pub fn decode(encoded: TileRef) -> DecodedTile {
        encoded.decode()
    }

    /// Register a tileset.
    ///
    /// Fails if its GID range overlaps a registered set; ownership of a GID is never
    /// decided by registration order.
    pub fn register(&mut self, tileset: TileSet) -> Result<(), MapConfigError> {
        if tileset.first_gid == 0 {
            return Err(MapConfigError::InvalidFirstGid {
                name: tileset.name.clone(),
            });
        }
        let last = u64::from(tileset.first_gid) + u64::from(tileset.tile_count);
        if last.saturating_sub(1) > u64::from(GID_MASK) {
            return Err(MapConfigError::GidRangeOverflow {
                name: tileset.name.clone(),
                last_gid: last - 1,
            });
        }

        let first = tileset.first_gid;
        let reserved_last = tileset.reserved_last_gid();
        let clash = self
            .sets
            .range(..=reserved_last)
            .next_back()
            .map(|(_, existing)| existing)
            .filter(|existing| existing.reserved_last_gid() >= first);
        if let Some(existing) = clash {
            return Err(MapConfigError::OverlappingTilesets {
                name: tileset.name.clone(),
                first_gid: first,
                last_gid: tileset.last_gid(),
                existing: existing.name.clone(),
                existing_first: existing.first_gid,
                existing_last: existing.last_gid(),
            });
        }

        debug!(
            "Registered tileset '{}' for gids {}..={}",
            tileset.name,
            first,
            tileset.last_gid()
        );
        self.sets.insert(first, tileset);
        Ok(())
    }

    /// Remove the tileset starting at `first_gid`.
    pub fn remove(&mut self, first_gid: u32) -> Option<TileSet> {
        self.sets.remove(&first_gid)
    }

    /// Resolve a global id to its tileset and tile definition.
    ///
    /// GID 0 and GIDs outside every registered range resolve to `None`.
    pub fn resolve(&self, gid: u32) -> Option<(&TileSet, Cow<'_, TileDefinition>)> {
        if gid == 0 {
            return None;
        }
        let resolved = self
            .sets
            .range(..=gid)
            .next_back()
            .map(|(_, set)| set)
            .and_then(|set| Some((set, set.tile(set.local_id(gid)?)?)));
        if resolved.is_none() {
            debug!("Gid {} does not resolve to any registered tileset", gid);
        }
        resolved
    }

    /// Tileset owning `gid`, if any.
    pub fn tileset_for(&self, gid: u32) -> Option<&TileSet> {
        self.resolve(gid).map(|(set, _)| set)
    }

    pub fn get(&self, first_gid: u32) -> Option<&TileSet> {
        self.sets.get(&first_gid)
    }

    /// First tileset with the given name.
    pub fn tileset_named(&self, name: &str) -> Option<&TileSet> {
        self.sets.values().find(|set| set.name == name)
    }

    /// Replace the definition behind `gid` and flag it for refresh.
    ///
    /// Animation playback of the replaced definition restarts from the first frame.
    pub fn replace_tile(
        &mut self,
        gid: u32,
        mut definition: TileDefinition,
    ) -> Result<(), InvariantError> {
        let set = self
            .sets
            .range_mut(..=gid)
            .next_back()
            .map(|(_, set)| set)
            .filter(|set| set.contains(gid))
            .ok_or(InvariantError::UnknownGid(gid))?;
        definition.id = gid - set.first_gid;
        definition.needs_refresh = true;
        if let Some(animation) = definition.animation.as_mut() {
            animation.reset();
        }
        set.set_tile(definition);
        Ok(())
    }

    /// Tilesets in ascending first-GID order.
    pub fn iter(&self) -> impl Iterator<Item = &TileSet> {
        self.sets.values()
    }

    /// Every declared definition with its GID.
    pub(crate) fn definitions_mut(&mut self) -> impl Iterator<Item = (u32, &mut TileDefinition)> {
        self.sets.values_mut().flat_map(|set| {
            let first = set.first_gid;
            set.tiles
                .values_mut()
                .chain(set.animated.values_mut())
                .map(move |def| (first + def.id, def))
        })
    }

    /// Animated definitions with their GIDs, in ascending GID order.
    pub(crate) fn animated_definitions_mut(
        &mut self,
    ) -> impl Iterator<Item = (u32, &mut TileDefinition)> {
        self.sets.values_mut().flat_map(|set| {
            let first = set.first_gid;
            set.animated
                .values_mut()
                .map(move |def| (first + def.id, def))
        })
    }

    /// Number of animated definitions across all tilesets.
    pub fn animated_count(&self) -> usize {
        self.sets.values().map(|set| set.animated.len()).sum()
    }

    /// First GID after the highest registered range.
    pub fn next_first_gid(&self) -> u32 {
        self.sets
            .values()
            .next_back()
            .map_or(1, |set| set.reserved_last_gid() + 1)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tileset(name: &str, first_gid: u32, tile_count: u32) -> TileSet {
        TileSet::new(name, first_gid, tile_count, UVec2::splat(16))
    }

    fn two_sets() -> TileSetRegistry {
        let mut registry = TileSetRegistry::default();
        registry.register(tileset("terrain", 1, 10)).unwrap();
        registry.register(tileset("props", 11, 5)).unwrap();
        registry
    }

    #[test]
    fn test_resolve_boundaries() {
        let registry = two_sets();

        let (set, def) = registry.resolve(1).unwrap();
        assert_eq!((set.name.as_str(), def.id), ("terrain", 0));
        let (set, def) = registry.resolve(10).unwrap();
        assert_eq!((set.name.as_str(), def.id), ("terrain", 9));
        let (set, def) = registry.resolve(11).unwrap();
        assert_eq!((set.name.as_str(), def.id), ("props", 0));
        let (set, _) = registry.resolve(15).unwrap();
        assert_eq!(set.name, "props");
        assert!(registry.resolve(16).is_none());
    }

    #[test]
    fn test_resolve_zero_is_no_tile() {
        assert!(two_sets().resolve(0).is_none());
    }

    #[test]
    fn test_resolve_gap_between_sets() {
        let mut registry = TileSetRegistry::default();
        registry.register(tileset("a", 1, 4)).unwrap();
        registry.register(tileset("b", 20, 4)).unwrap();
        assert!(registry.resolve(10).is_none());
        assert_eq!(registry.resolve(20).unwrap().0.name, "b");
    }

    #[test]
    fn test_overlapping_ranges_are_rejected() {
        let mut registry = two_sets();
        let err = registry.register(tileset("clash", 8, 2)).unwrap_err();
        assert!(matches!(
            err,
            MapConfigError::OverlappingTilesets { ref existing, .. } if existing == "terrain"
        ));

        // A set whose range swallows an existing one is rejected too.
        let err = registry.register(tileset("wide", 12, 100)).unwrap_err();
        assert!(matches!(err, MapConfigError::OverlappingTilesets { .. }));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_first_gid_of_empty_set_is_rejected() {
        let mut registry = two_sets();
        assert!(registry.register(tileset("empty", 11, 0)).is_err());
        registry.register(tileset("empty", 16, 0)).unwrap();
        assert!(registry.resolve(16).is_none());
        assert_eq!(registry.next_first_gid(), 17);
    }

    #[test]
    fn test_first_gid_zero_is_rejected() {
        let mut registry = TileSetRegistry::default();
        assert_eq!(
            registry.register(tileset("zero", 0, 4)),
            Err(MapConfigError::InvalidFirstGid {
                name: "zero".to_string()
            })
        );
    }

    #[test]
    fn test_range_beyond_gid_mask_is_rejected() {
        let mut registry = TileSetRegistry::default();
        let err = registry.register(tileset("huge", GID_MASK, 2)).unwrap_err();
        assert!(matches!(err, MapConfigError::GidRangeOverflow { .. }));
    }

    #[test]
    fn test_remove_frees_range() {
        let mut registry = two_sets();
        let removed = registry.remove(11).unwrap();
        assert_eq!(removed.name, "props");
        assert!(registry.resolve(11).is_none());
        registry.register(tileset("props2", 11, 5)).unwrap();
    }

    #[test]
    fn test_atlas_rect_accounts_for_margin_and_spacing() {
        let set = tileset("atlas", 1, 8).with_columns(4).with_spacing(2, 1);
        let rect = set.atlas_rect(5).unwrap();
        assert_eq!(rect.min, Vec2::new(19.0, 19.0));
        assert_eq!(rect.max, Vec2::new(35.0, 35.0));
        assert!(set.atlas_rect(8).is_none());
    }

    #[test]
    fn test_huge_tileset_stores_only_declared_tiles() {
        let set = tileset("huge", 1, GID_MASK).with_tile(
            TileDefinition::new(7).with_animation(vec![AnimationFrame::new(7, 100)]),
        );
        assert_eq!(set.tiles().count(), 1);
        assert_eq!(set.tile(GID_MASK - 1).unwrap().id, GID_MASK - 1);
        assert!(set.tile(GID_MASK).is_none());
        assert!(set.tile(7).unwrap().is_animated());

        // The range end saturates instead of wrapping.
        assert_eq!(tileset("edge", u32::MAX, 2).last_gid(), u32::MAX - 1);
    }

    #[test]
    fn test_animated_index_follows_replacements() {
        let mut registry = two_sets();
        let frames = vec![AnimationFrame::new(0, 100)];
        registry
            .replace_tile(3, TileDefinition::new(0).with_animation(frames.clone()))
            .unwrap();
        registry
            .replace_tile(12, TileDefinition::new(0).with_animation(frames))
            .unwrap();
        let gids: Vec<u32> = registry.animated_definitions_mut().map(|(gid, _)| gid).collect();
        assert_eq!(gids, vec![3, 12]);

        registry.replace_tile(3, TileDefinition::new(0)).unwrap();
        let gids: Vec<u32> = registry.animated_definitions_mut().map(|(gid, _)| gid).collect();
        assert_eq!(gids, vec![12]);
        assert_eq!(registry.animated_count(), 1);
        assert_eq!(registry.definitions_mut().count(), 2);
    }

    #[test]
    fn test_replace_tile_marks_refresh() {
        let mut registry = two_sets();
        registry
            .replace_tile(12, TileDefinition::new(99).with_user_type("crate"))
            .unwrap();
        let (_, def) = registry.resolve(12).unwrap();
        assert_eq!(def.id, 1);
        assert!(def.needs_refresh());
        assert_eq!(
            registry.replace_tile(99, TileDefinition::new(0)),
            Err(InvariantError::UnknownGid(99))
        );
    }
}
