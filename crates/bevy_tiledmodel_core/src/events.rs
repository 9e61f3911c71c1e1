//! Change notifications.
//!
//! A [`TileMap`](crate::map::TileMap) queues a [`MapChange`] whenever something a renderer
//! may have drawn goes stale. Consumers drain the queue and rebuild only the affected
//! draw state. With the plugin installed, drained changes are re-emitted as
//! [`TileMapChanged`] observer events.
//!
//! # Example
//!
//! ```ignore
//! fn on_map_changed(trigger: On<TileMapChanged>) {
//!     if let MapChange::TileFrameChanged { gid, tile_id, .. } = trigger.event().change {
//!         // swap the texture of every sprite showing `gid` to `tile_id`
//!     }
//! }
//! ```

use bevy::prelude::*;

use crate::layers::{LayerId, LayerKind};

/// Something in a map changed.
#[derive(Debug, Clone, PartialEq)]
pub enum MapChange {
    /// An animated tile definition switched frames.
    TileFrameChanged {
        /// GID of the animated definition.
        gid: u32,
        /// Index of the new frame in the animation's frame list.
        frame: usize,
        /// Local tile id (within the same tileset) now displayed.
        tile_id: u32,
    },
    /// A replaced tile definition should be redrawn from scratch.
    TileRefreshed { gid: u32 },
    LayerAdded { id: LayerId, kind: LayerKind },
    /// A layer left the tree. For groups, one change is queued per removed node.
    LayerRemoved { id: LayerId, kind: LayerKind },
    TilesetAdded { first_gid: u32, name: String },
    TilesetRemoved { first_gid: u32, name: String },
}

/// Fired (as an observer event) for every change drained from a `TileMap` component.
#[derive(Event, Debug, Clone)]
pub struct TileMapChanged {
    /// The entity holding the `TileMap` component
    pub entity: Entity,
    pub change: MapChange,
}
