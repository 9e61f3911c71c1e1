//! The layer tree.

use std::cmp::Ordering;

use bevy::color::Color;
use bevy::log::debug;
use bevy::math::Vec2;
use bevy::platform::collections::HashMap;

use super::{LayerId, LayerKind, LayerNode};
use crate::error::InvariantError;

/// Filter for [`LayerTree::find`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerQuery<'a> {
    Name(&'a str),
    Id(LayerId),
    TypeTag(&'a str),
    /// Slash-joined path of group names, matched on whole segments. `"world"` matches
    /// the `world` layer and everything below it; `"world/"` only what is below it.
    PathPrefix(&'a str),
    Kind(LayerKind),
}

/// Where a layer lives: its group and its position in that group's child vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    parent: Option<LayerId>,
    position: usize,
}

/// Owns every layer of a map.
///
/// Groups own their children directly. A side table maps each id to its parent and
/// vector position, so lookups walk one slot per ancestor and removal is a swap.
/// Sibling order lives in [`LayerNode::index`], never in vector order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTree {
    roots: Vec<LayerNode>,
    slots: HashMap<LayerId, Slot>,
    next_id: u32,
    z_delta: f32,
}

impl Default for LayerTree {
    fn default() -> Self {
        Self::new(50.0)
    }
}

impl LayerTree {
    /// Empty tree placing consecutive layers `z_delta` apart.
    pub fn new(z_delta: f32) -> Self {
        Self {
            roots: Vec::new(),
            slots: HashMap::default(),
            next_id: 1,
            z_delta,
        }
    }

    pub fn z_delta(&self) -> f32 {
        self.z_delta
    }

    /// Number of layers, groups included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Group holding `id`; `None` for top-level layers and unknown ids.
    pub fn parent_of(&self, id: LayerId) -> Option<LayerId> {
        self.slots.get(&id).and_then(|slot| slot.parent)
    }

    /// Slots from the top-level ancestor down to `id`.
    fn chain(&self, id: LayerId) -> Option<Vec<(LayerId, usize)>> {
        let slot = self.slots.get(&id)?;
        let mut chain = vec![(id, slot.position)];
        let mut current = slot.parent;
        while let Some(parent) = current {
            let slot = self.slots.get(&parent)?;
            chain.push((parent, slot.position));
            current = slot.parent;
        }
        chain.reverse();
        Some(chain)
    }

    pub fn get(&self, id: LayerId) -> Option<&LayerNode> {
        let chain = self.chain(id)?;
        let mut siblings: &[LayerNode] = &self.roots;
        let mut found = None;
        for (link, position) in chain {
            let node = siblings.get(position).filter(|n| n.id == link)?;
            siblings = node.children();
            found = Some(node);
        }
        found
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut LayerNode> {
        let chain = self.chain(id)?;
        let ((last, last_position), ancestors) = chain.split_last()?;
        let mut siblings = &mut self.roots;
        for (ancestor, position) in ancestors {
            let node = siblings.get_mut(*position).filter(|n| n.id == *ancestor)?;
            siblings = node.children_mut()?;
        }
        siblings.get_mut(*last_position).filter(|n| n.id == *last)
    }

    fn siblings(&self, parent: Option<LayerId>) -> Result<&[LayerNode], InvariantError> {
        match parent {
            None => Ok(&self.roots),
            Some(id) => {
                let group = self.get(id).ok_or(InvariantError::LayerNotFound(id))?;
                if group.is_group() {
                    Ok(group.children())
                } else {
                    Err(InvariantError::NotAGroup(id))
                }
            }
        }
    }

    fn siblings_mut(
        &mut self,
        parent: Option<LayerId>,
    ) -> Result<&mut Vec<LayerNode>, InvariantError> {
        match parent {
            None => Ok(&mut self.roots),
            Some(id) => self
                .get_mut(id)
                .ok_or(InvariantError::LayerNotFound(id))?
                .children_mut()
                .ok_or(InvariantError::NotAGroup(id)),
        }
    }

    /// Insert `node` (with any prebuilt children) at the top of `parent`, or of the tree.
    ///
    /// The node is indexed one above its highest sibling. Attributes it leaves unset are
    /// copied from the parent group.
    pub fn insert(
        &mut self,
        mut node: LayerNode,
        parent: Option<LayerId>,
    ) -> Result<LayerId, InvariantError> {
        let siblings = self.siblings(parent)?;
        let index = siblings.iter().map(|n| n.index + 1).max().unwrap_or(0);
        let position = siblings.len();
        let (offset, parallax, tint) = match parent.and_then(|id| self.get(id)) {
            Some(group) => (group.offset(), group.parallax(), group.tint()),
            None => (Vec2::ZERO, Vec2::ONE, Color::WHITE),
        };

        node.index = index;
        self.assign_ids(&mut node, parent, position);
        node.inherit_from(offset, parallax, tint);
        update_z(&mut node, self.z_delta);

        let id = node.id;
        debug!(
            "Inserted {:?} layer '{}' as {} (index {}, z {})",
            node.kind(),
            node.name,
            id,
            index,
            node.z
        );
        self.siblings_mut(parent)?.push(node);
        self.restack();
        Ok(id)
    }

    fn assign_ids(&mut self, node: &mut LayerNode, parent: Option<LayerId>, position: usize) {
        node.id = LayerId(self.next_id);
        self.next_id += 1;
        node.parent = parent;
        self.slots.insert(node.id, Slot { parent, position });
        let id = node.id;
        if let Some(children) = node.children_mut() {
            for (position, child) in children.iter_mut().enumerate() {
                self.assign_ids(child, Some(id), position);
            }
        }
    }

    /// Remove a layer and, for groups, its whole subtree.
    ///
    /// Remaining layers keep their indices and depths; see [`reindex`](Self::reindex).
    pub fn remove(&mut self, id: LayerId) -> Result<LayerNode, InvariantError> {
        let slot = *self.slots.get(&id).ok_or(InvariantError::LayerNotFound(id))?;
        let siblings = self.siblings_mut(slot.parent)?;
        if siblings.get(slot.position).is_none_or(|n| n.id != id) {
            return Err(InvariantError::LayerNotFound(id));
        }
        let node = siblings.swap_remove(slot.position);
        let moved = siblings.get(slot.position).map(LayerNode::id);
        if let Some(moved) = moved {
            if let Some(moved_slot) = self.slots.get_mut(&moved) {
                moved_slot.position = slot.position;
            }
        }
        for removed in node.descendants() {
            self.slots.remove(&removed.id);
        }
        debug!("Removed layer '{}' ({})", node.name, id);
        Ok(node)
    }

    /// Every layer, groups included, depth-first with siblings in index order.
    pub fn layers(&self) -> Vec<&LayerNode> {
        let mut out = Vec::with_capacity(self.len());
        collect(&self.roots, &mut out, false, by_index);
        out
    }

    /// Content layers (no groups), depth-first with siblings in index order.
    pub fn flatten(&self) -> Vec<&LayerNode> {
        self.layers().into_iter().filter(|n| !n.is_group()).collect()
    }

    /// Like [`flatten`](Self::flatten), skipping hidden layers and everything inside
    /// hidden groups.
    pub fn flatten_visible(&self) -> Vec<&LayerNode> {
        let mut out = Vec::new();
        collect(&self.roots, &mut out, true, by_index);
        out.retain(|n| !n.is_group());
        out
    }

    /// Content layers back to front. Same as [`flatten`](Self::flatten) unless a z
    /// override moves a layer among its siblings.
    pub fn draw_order(&self) -> Vec<&LayerNode> {
        let mut out = Vec::with_capacity(self.len());
        collect(&self.roots, &mut out, false, by_stacking);
        out.retain(|n| !n.is_group());
        out
    }

    /// Visible tile layers front to back: the reverse of their draw order.
    pub fn tile_layers_front_to_back(&self) -> Vec<&LayerNode> {
        let mut out = Vec::new();
        collect(&self.roots, &mut out, true, by_stacking);
        out.retain(|n| n.kind() == LayerKind::Tiles);
        out.reverse();
        out
    }

    /// All layers matching `query`, in [`layers`](Self::layers) order.
    pub fn find(&self, query: LayerQuery<'_>) -> Vec<&LayerNode> {
        self.layers()
            .into_iter()
            .filter(|node| match query {
                LayerQuery::Name(name) => node.name == name,
                LayerQuery::Id(id) => node.id == id,
                LayerQuery::TypeTag(tag) => node.type_tag.as_deref() == Some(tag),
                LayerQuery::Kind(kind) => node.kind() == kind,
                LayerQuery::PathPrefix(prefix) => self
                    .path(node.id)
                    .is_some_and(|path| path_has_prefix(&path, prefix)),
            })
            .collect()
    }

    /// First match of `query`. Duplicate names resolve to the first layer in order.
    pub fn first(&self, query: LayerQuery<'_>) -> Option<&LayerNode> {
        if let LayerQuery::Id(id) = query {
            return self.get(id);
        }
        self.find(query).into_iter().next()
    }

    /// Names from the top-level ancestor down to `id`, joined with `/`.
    pub fn path(&self, id: LayerId) -> Option<String> {
        let chain = self.chain(id)?;
        let mut siblings: &[LayerNode] = &self.roots;
        let mut names = Vec::with_capacity(chain.len());
        for (link, position) in chain {
            let node = siblings.get(position).filter(|n| n.id == link)?;
            names.push(node.name.as_str());
            siblings = node.children();
        }
        Some(names.join("/"))
    }

    /// Move a layer to `index` among its siblings. Other siblings keep their indices.
    pub fn set_index(&mut self, id: LayerId, index: u32) -> Result<(), InvariantError> {
        let z_delta = self.z_delta;
        let node = self.get_mut(id).ok_or(InvariantError::LayerNotFound(id))?;
        node.index = index;
        update_z(node, z_delta);
        self.restack();
        Ok(())
    }

    /// Renumber the children of `parent` (or the top level) to `0..n`, keeping their order.
    pub fn reindex(&mut self, parent: Option<LayerId>) -> Result<(), InvariantError> {
        let z_delta = self.z_delta;
        let siblings = self.siblings_mut(parent)?;
        let mut order: Vec<usize> = (0..siblings.len()).collect();
        order.sort_by_key(|&i| siblings[i].index);
        for (index, i) in order.into_iter().enumerate() {
            siblings[i].index = index as u32;
            update_z(&mut siblings[i], z_delta);
        }
        self.restack();
        Ok(())
    }

    /// Pin a layer's z (relative to its siblings), or return it to index-derived z
    /// with `None`.
    pub fn set_z_position(&mut self, id: LayerId, z: Option<f32>) -> Result<(), InvariantError> {
        let z_delta = self.z_delta;
        let node = self.get_mut(id).ok_or(InvariantError::LayerNotFound(id))?;
        node.z_override = z;
        update_z(node, z_delta);
        self.restack();
        Ok(())
    }

    /// Set a layer's own offset. Descendants still inheriting pick up the new value.
    pub fn set_offset(&mut self, id: LayerId, offset: Vec2) -> Result<(), InvariantError> {
        let node = self.get_mut(id).ok_or(InvariantError::LayerNotFound(id))?;
        node.set_offset(offset);
        propagate(node);
        Ok(())
    }

    pub fn set_parallax(&mut self, id: LayerId, parallax: Vec2) -> Result<(), InvariantError> {
        let node = self.get_mut(id).ok_or(InvariantError::LayerNotFound(id))?;
        node.set_parallax(parallax);
        propagate(node);
        Ok(())
    }

    pub fn set_tint(&mut self, id: LayerId, tint: Color) -> Result<(), InvariantError> {
        let node = self.get_mut(id).ok_or(InvariantError::LayerNotFound(id))?;
        node.set_tint(tint);
        propagate(node);
        Ok(())
    }

    /// Whether `id` and every group above it are visible.
    pub fn is_visible(&self, id: LayerId) -> bool {
        self.chain(id).is_some_and(|chain| {
            chain
                .into_iter()
                .all(|(link, _)| self.get(link).is_some_and(|n| n.visible))
        })
    }

    /// Recompute every layer's depth from the draw order.
    fn restack(&mut self) {
        let mut counter = 0u32;
        restack(&mut self.roots, &mut counter, self.z_delta);
    }
}

fn by_index(a: &LayerNode, b: &LayerNode) -> Ordering {
    a.index.cmp(&b.index)
}

/// Lower z draws first; equal z falls back to index.
fn by_stacking(a: &LayerNode, b: &LayerNode) -> Ordering {
    a.z.total_cmp(&b.z).then(a.index.cmp(&b.index))
}

fn collect<'a>(
    nodes: &'a [LayerNode],
    out: &mut Vec<&'a LayerNode>,
    visible_only: bool,
    order: fn(&LayerNode, &LayerNode) -> Ordering,
) {
    let mut sorted: Vec<&LayerNode> = nodes.iter().collect();
    sorted.sort_by(|a, b| order(a, b));
    for node in sorted {
        if visible_only && !node.visible {
            continue;
        }
        out.push(node);
        collect(node.children(), out, visible_only, order);
    }
}

/// Content layers get consecutive depths in draw order; a group takes the depth of
/// whatever it draws first.
fn restack(nodes: &mut [LayerNode], counter: &mut u32, z_delta: f32) {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| by_stacking(&nodes[a], &nodes[b]));
    for i in order {
        let node = &mut nodes[i];
        node.world_z = *counter as f32 * z_delta;
        match node.children_mut() {
            Some(children) => restack(children, counter, z_delta),
            None => *counter += 1,
        }
    }
}

/// Local z of `node` and of any prebuilt children.
fn update_z(node: &mut LayerNode, z_delta: f32) {
    node.z = node
        .z_override
        .unwrap_or(node.index as f32 * z_delta);
    if let Some(children) = node.children_mut() {
        for child in children {
            update_z(child, z_delta);
        }
    }
}

fn path_has_prefix(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn propagate(node: &mut LayerNode) {
    let (offset, parallax, tint) = (node.offset(), node.parallax(), node.tint());
    if let Some(children) = node.children_mut() {
        for child in children {
            child.inherit_from(offset, parallax, tint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{ImageLayerData, ObjectLayerData, TileLayerData};
    use bevy::math::UVec2;

    fn tiles(name: &str) -> LayerNode {
        LayerNode::tiles(name, TileLayerData::empty(UVec2::new(2, 2)))
    }

    #[test]
    fn test_insert_assigns_ids_indices_and_z() {
        let mut tree = LayerTree::default();
        let a = tree.insert(tiles("a"), None).unwrap();
        let b = tree.insert(tiles("b"), None).unwrap();
        let c = tree.insert(tiles("c"), None).unwrap();
        assert_eq!((a, b, c), (LayerId(1), LayerId(2), LayerId(3)));

        let z: Vec<f32> = tree.flatten().iter().map(|n| n.world_z()).collect();
        assert_eq!(z, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_child_z_composes_with_group() {
        let mut tree = LayerTree::new(10.0);
        tree.insert(tiles("ground"), None).unwrap();
        let group = tree.insert(LayerNode::group("world"), None).unwrap();
        tree.insert(tiles("first"), Some(group)).unwrap();
        let second = tree.insert(tiles("second"), Some(group)).unwrap();

        let node = tree.get(second).unwrap();
        assert_eq!(node.z(), 10.0);
        assert_eq!(node.world_z(), 20.0);
        assert_eq!(node.parent(), Some(group));
        assert_eq!(tree.parent_of(second), Some(group));
    }

    #[test]
    fn test_insert_into_invalid_parent() {
        let mut tree = LayerTree::default();
        let leaf = tree.insert(tiles("leaf"), None).unwrap();
        assert_eq!(
            tree.insert(tiles("x"), Some(leaf)),
            Err(InvariantError::NotAGroup(leaf))
        );
        assert_eq!(
            tree.insert(tiles("x"), Some(LayerId(99))),
            Err(InvariantError::LayerNotFound(LayerId(99)))
        );
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_removing_group_removes_subtree_and_ids_are_not_reused() {
        let mut tree = LayerTree::default();
        let group = tree
            .insert(
                LayerNode::group("g")
                    .with_child(tiles("a"))
                    .with_child(LayerNode::group("inner").with_child(tiles("b"))),
                None,
            )
            .unwrap();
        assert_eq!(tree.len(), 4);

        let removed = tree.remove(group).unwrap();
        assert_eq!(removed.descendants().len(), 4);
        assert!(tree.is_empty());
        assert_eq!(
            tree.remove(group).unwrap_err(),
            InvariantError::LayerNotFound(group)
        );

        let next = tree.insert(tiles("c"), None).unwrap();
        assert_eq!(next, LayerId(5));
    }

    #[test]
    fn test_flatten_excludes_groups_layers_include_them() {
        let mut tree = LayerTree::default();
        let group = tree.insert(LayerNode::group("g"), None).unwrap();
        tree.insert(tiles("a"), Some(group)).unwrap();
        tree.insert(LayerNode::objects("o", ObjectLayerData::default()), None)
            .unwrap();
        tree.insert(LayerNode::image("i", ImageLayerData::new("bg.png")), Some(group))
            .unwrap();

        let flat: Vec<&str> = tree.flatten().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(flat, vec!["a", "i", "o"]);
        let all: Vec<&str> = tree.layers().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(all, vec!["g", "a", "i", "o"]);
        assert_eq!(tree.find(LayerQuery::Kind(LayerKind::Group)).len(), 1);
    }

    #[test]
    fn test_hidden_group_hides_children() {
        let mut tree = LayerTree::default();
        let group = tree
            .insert(LayerNode::group("g").with_visible(false), None)
            .unwrap();
        let child = tree.insert(tiles("a"), Some(group)).unwrap();
        tree.insert(tiles("b"), None).unwrap();

        let visible: Vec<&str> = tree
            .flatten_visible()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(visible, vec!["b"]);
        assert!(!tree.is_visible(child));
    }

    #[test]
    fn test_find_queries() {
        let mut tree = LayerTree::default();
        let world = tree.insert(LayerNode::group("world"), None).unwrap();
        let first = tree
            .insert(tiles("terrain").with_type_tag("solid"), Some(world))
            .unwrap();
        tree.insert(tiles("terrain"), None).unwrap();

        assert_eq!(tree.first(LayerQuery::Name("terrain")).unwrap().id(), first);
        assert_eq!(tree.find(LayerQuery::Name("terrain")).len(), 2);
        assert_eq!(tree.find(LayerQuery::TypeTag("solid")).len(), 1);
        assert_eq!(tree.path(first).as_deref(), Some("world/terrain"));
        assert_eq!(tree.find(LayerQuery::PathPrefix("world/")).len(), 1);
        assert_eq!(tree.find(LayerQuery::PathPrefix("world")).len(), 2);
        assert_eq!(tree.first(LayerQuery::Id(first)).unwrap().name, "terrain");
        assert!(tree.first(LayerQuery::Name("missing")).is_none());
    }

    #[test]
    fn test_group_default_propagation() {
        let mut tree = LayerTree::default();
        let group = tree
            .insert(LayerNode::group("g").with_offset(Vec2::new(10.0, 5.0)), None)
            .unwrap();
        let unset = tree.insert(tiles("unset"), Some(group)).unwrap();
        let explicit = tree
            .insert(tiles("explicit").with_offset(Vec2::new(1.0, 1.0)), Some(group))
            .unwrap();

        assert_eq!(tree.get(unset).unwrap().offset(), Vec2::new(10.0, 5.0));
        assert_eq!(tree.get(explicit).unwrap().offset(), Vec2::new(1.0, 1.0));

        tree.set_offset(group, Vec2::new(-3.0, 0.0)).unwrap();
        assert_eq!(tree.get(unset).unwrap().offset(), Vec2::new(-3.0, 0.0));
        assert_eq!(tree.get(explicit).unwrap().offset(), Vec2::new(1.0, 1.0));

        let tint = Color::srgb(1.0, 0.0, 0.0);
        tree.set_tint(group, tint).unwrap();
        assert_eq!(tree.get(unset).unwrap().tint(), tint);
        assert!(!tree.get(unset).unwrap().has_own_tint());
    }

    #[test]
    fn test_set_index_and_reindex() {
        let mut tree = LayerTree::default();
        let a = tree.insert(tiles("a"), None).unwrap();
        let b = tree.insert(tiles("b"), None).unwrap();
        tree.insert(tiles("c"), None).unwrap();

        tree.set_index(a, 7).unwrap();
        let order: Vec<&str> = tree.flatten().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(tree.get(a).unwrap().z(), 350.0);
        assert_eq!(tree.get(a).unwrap().world_z(), 100.0);

        tree.remove(b).unwrap();
        tree.reindex(None).unwrap();
        let indices: Vec<u32> = tree.flatten().iter().map(|n| n.index()).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(tree.get(a).unwrap().world_z(), 50.0);
    }

    #[test]
    fn test_z_override() {
        let mut tree = LayerTree::default();
        let a = tree.insert(tiles("a"), None).unwrap();
        let b = tree.insert(tiles("b"), None).unwrap();
        tree.set_z_position(a, Some(500.0)).unwrap();

        let front: Vec<LayerId> = tree.tile_layers_front_to_back().iter().map(|n| n.id()).collect();
        assert_eq!(front, vec![a, b]);

        tree.set_z_position(a, None).unwrap();
        let front: Vec<LayerId> = tree.tile_layers_front_to_back().iter().map(|n| n.id()).collect();
        assert_eq!(front, vec![b, a]);
    }

    #[test]
    fn test_group_children_stay_below_later_layers() {
        let mut tree = LayerTree::default();
        let group = tree.insert(LayerNode::group("g"), None).unwrap();
        for name in ["c1", "c2", "c3"] {
            tree.insert(tiles(name), Some(group)).unwrap();
        }
        let top = tree.insert(tiles("top"), None).unwrap();

        let depths: Vec<(&str, f32)> = tree
            .draw_order()
            .iter()
            .map(|n| (n.name.as_str(), n.world_z()))
            .collect();
        assert_eq!(
            depths,
            vec![("c1", 0.0), ("c2", 50.0), ("c3", 100.0), ("top", 150.0)]
        );
        assert_eq!(tree.tile_layers_front_to_back()[0].id(), top);

        // A pinned z reorders a layer among its siblings only.
        let c1 = tree.find(LayerQuery::Name("c1"))[0].id();
        tree.set_z_position(c1, Some(1000.0)).unwrap();
        let front: Vec<&str> = tree
            .tile_layers_front_to_back()
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(front, vec!["top", "c1", "c3", "c2"]);
    }

    #[test]
    fn test_remove_keeps_lookups_valid() {
        let mut tree = LayerTree::default();
        let group = tree.insert(LayerNode::group("g"), None).unwrap();
        let ids: Vec<LayerId> = (0..5)
            .map(|i| tree.insert(tiles(&format!("l{i}")), Some(group)).unwrap())
            .collect();

        tree.remove(ids[0]).unwrap();
        tree.remove(ids[2]).unwrap();
        for &id in [ids[1], ids[3], ids[4]].iter() {
            assert_eq!(tree.get(id).unwrap().id(), id);
            assert_eq!(tree.path(id).unwrap(), format!("g/{}", tree.get(id).unwrap().name));
        }
        let names: Vec<&str> = tree.flatten().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["l1", "l3", "l4"]);

        tree.remove(ids[4]).unwrap();
        tree.get_mut(ids[3]).unwrap().visible = false;
        assert!(!tree.is_visible(ids[3]));
        assert!(tree.get(ids[4]).is_none());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_path_prefix_matches_whole_segments() {
        let mut tree = LayerTree::default();
        let world = tree.insert(LayerNode::group("world"), None).unwrap();
        tree.insert(tiles("ground"), Some(world)).unwrap();
        let map = tree.insert(LayerNode::group("worldmap"), None).unwrap();
        tree.insert(tiles("ground"), Some(map)).unwrap();

        let paths = |prefix| -> Vec<String> {
            tree.find(LayerQuery::PathPrefix(prefix))
                .iter()
                .filter_map(|n| tree.path(n.id()))
                .collect()
        };
        assert_eq!(paths("world"), vec!["world", "world/ground"]);
        assert_eq!(paths("world/"), vec!["world/ground"]);
        assert_eq!(paths("world/gr"), Vec::<String>::new());
        assert_eq!(paths("").len(), 4);
    }
}
