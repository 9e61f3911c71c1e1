//! Systems driving [`TileMap`] components.

use bevy::prelude::*;

use crate::events::TileMapChanged;
use crate::map::TileMap;

/// Advance every map's animations by the frame delta and re-emit queued changes as
/// [`TileMapChanged`] observer events.
///
/// Changes queued by direct mutation (adding layers, replacing tiles) are forwarded
/// the same way, on the next run.
pub fn advance_tile_maps(
    time: Res<Time>,
    mut maps: Query<(Entity, &mut TileMap)>,
    mut commands: Commands,
) {
    let delta = time.delta_secs();
    for (entity, mut map) in &mut maps {
        if delta > 0.0 {
            map.update(delta);
        }
        if map.pending_changes().is_empty() {
            continue;
        }
        let changes = map.drain_changes();
        trace!("Forwarding {} changes from map {:?}", changes.len(), entity);
        for change in changes {
            commands.trigger(TileMapChanged { entity, change });
        }
    }
}
