//! Animated tile playback.
//!
//! Animation state lives on the [`TileDefinition`](crate::tileset::TileDefinition), not on
//! placed tiles: a thousand cells showing the same animated tile cost one state update per
//! tick. Renderers learn about frame switches through [`MapChange::TileFrameChanged`] and
//! swap textures on the instances they own.

use bevy::log::debug;
use bevy::tasks::{ComputeTaskPool, ParallelSliceMut, TaskPool};
use serde::{Deserialize, Serialize};

use crate::events::MapChange;
use crate::tileset::{TileDefinition, TileSetRegistry};

/// A single frame in a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Local tile id (within the owning tileset) to display for this frame.
    pub tile_id: u32,
    /// How long to display this frame (milliseconds).
    pub duration_ms: u32,
}

impl AnimationFrame {
    pub const fn new(tile_id: u32, duration_ms: u32) -> Self {
        Self {
            tile_id,
            duration_ms,
        }
    }
}

/// Playback position of one animated tile definition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnimationState {
    /// Index into the frame list (`0..frames.len()`), in declaration order.
    pub current_frame: usize,
    /// Position within the cycle, in `[0, total_duration_ms)`.
    pub elapsed_ms: f64,
}

/// Frame sequence plus playback state for an animated tile definition.
#[derive(Debug, Clone, PartialEq)]
pub struct TileAnimation {
    frames: Vec<AnimationFrame>,
    total_ms: u64,
    state: AnimationState,
}

impl TileAnimation {
    /// Create an animation from frame data. Returns `None` for an empty frame list.
    pub fn new(frames: Vec<AnimationFrame>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        let total_ms = frames.iter().map(|f| u64::from(f.duration_ms)).sum();
        Some(Self {
            frames,
            total_ms,
            state: AnimationState::default(),
        })
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    /// Length of one full cycle. Zero-length cycles never advance.
    pub fn total_duration_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn current_frame(&self) -> usize {
        self.state.current_frame
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.state.elapsed_ms
    }

    /// Local tile id of the frame currently showing.
    pub fn current_tile_id(&self) -> u32 {
        self.frames[self.state.current_frame].tile_id
    }

    /// Rewind to the first frame.
    pub fn reset(&mut self) {
        self.state = AnimationState::default();
    }

    /// Advance playback by `delta_ms` and reselect the frame.
    ///
    /// With `reversed` the frame list is walked back to front. Returns `true` when the
    /// displayed frame changed.
    pub fn advance(&mut self, delta_ms: f64, reversed: bool) -> bool {
        if self.total_ms == 0 || !delta_ms.is_finite() {
            return false;
        }
        let total = self.total_ms as f64;
        let mut elapsed = (self.state.elapsed_ms + delta_ms.abs()) % total;
        if !(0.0..total).contains(&elapsed) {
            elapsed = 0.0;
        }
        self.state.elapsed_ms = elapsed;

        let frame = self.frame_at(elapsed, reversed);
        let changed = frame != self.state.current_frame;
        self.state.current_frame = frame;
        changed
    }

    /// First frame whose cumulative duration exceeds `elapsed_ms`.
    fn frame_at(&self, elapsed_ms: f64, reversed: bool) -> usize {
        let mut cumulative = 0.0;
        let mut pick = |index: usize| {
            cumulative += f64::from(self.frames[index].duration_ms);
            cumulative > elapsed_ms
        };
        let found = if reversed {
            (0..self.frames.len()).rev().find(|&i| pick(i))
        } else {
            (0..self.frames.len()).find(|&i| pick(i))
        };
        found.unwrap_or(if reversed { 0 } else { self.frames.len() - 1 })
    }
}

/// Which tile definitions the clock visits on each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationMode {
    /// Only animated definitions are advanced.
    #[default]
    Dynamic,
    /// Animated definitions are advanced and static definitions flagged for refresh
    /// (hot-reloaded textures) are reported as [`MapChange::TileRefreshed`].
    Full,
}

/// Drives every animated tile definition of a map.
///
/// Work is batched by definition. When the number of visited definitions reaches
/// `parallel_threshold` the batch is sharded across Bevy's [`ComputeTaskPool`]; all shards
/// join before [`AnimationClock::tick`] returns, so a tick is never observed half-applied.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    pub mode: AnimationMode,
    /// Global speed multiplier. Negative values play every animation backwards.
    pub speed: f32,
    /// While set, ticks are ignored.
    pub paused: bool,
    /// Definition count at which ticking goes parallel. `0` disables parallel ticking.
    pub parallel_threshold: usize,
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self {
            mode: AnimationMode::Dynamic,
            speed: 1.0,
            paused: false,
            parallel_threshold: 0,
        }
    }
}

impl AnimationClock {
    pub fn new(mode: AnimationMode, speed: f32, parallel_threshold: usize) -> Self {
        Self {
            mode,
            speed,
            paused: false,
            parallel_threshold,
        }
    }

    /// Advance all definitions in `registry` by `delta_seconds`.
    ///
    /// Returns one change per definition whose displayed frame switched (and, in
    /// [`AnimationMode::Full`], per refreshed static definition). Never fails: zero-length
    /// cycles are skipped.
    pub fn tick(&self, delta_seconds: f32, registry: &mut TileSetRegistry) -> Vec<MapChange> {
        if self.paused {
            return Vec::new();
        }
        let delta_ms = f64::from(delta_seconds.max(0.0)) * 1000.0 * f64::from(self.speed.abs());
        let reversed = self.speed < 0.0;
        let mode = self.mode;

        let mut batch: Vec<(u32, &mut TileDefinition)> = match mode {
            AnimationMode::Dynamic => registry.animated_definitions_mut().collect(),
            AnimationMode::Full => registry.definitions_mut().collect(),
        };

        if self.parallel_threshold > 0 && batch.len() >= self.parallel_threshold {
            let pool = ComputeTaskPool::get_or_init(TaskPool::default);
            let shard = batch.len().div_ceil(pool.thread_num().max(1));
            debug!(
                "Ticking {} tile definitions in shards of {}",
                batch.len(),
                shard
            );
            batch
                .par_chunk_map_mut(pool, shard, |_, shard| {
                    shard
                        .iter_mut()
                        .filter_map(|(gid, def)| step_definition(*gid, def, delta_ms, reversed, mode))
                        .collect::<Vec<_>>()
                })
                .into_iter()
                .flatten()
                .collect()
        } else {
            batch
                .iter_mut()
                .filter_map(|(gid, def)| step_definition(*gid, def, delta_ms, reversed, mode))
                .collect()
        }
    }
}

fn step_definition(
    gid: u32,
    definition: &mut TileDefinition,
    delta_ms: f64,
    reversed: bool,
    mode: AnimationMode,
) -> Option<MapChange> {
    let frame_changed = match definition.animation.as_mut() {
        Some(animation) => delta_ms > 0.0 && animation.advance(delta_ms, reversed),
        None => false,
    };
    // A refresh redraws the tile entirely, current frame included.
    if mode == AnimationMode::Full && definition.take_refresh() {
        return Some(MapChange::TileRefreshed { gid });
    }
    let animation = definition.animation.as_ref().filter(|_| frame_changed)?;
    Some(MapChange::TileFrameChanged {
        gid,
        frame: animation.current_frame(),
        tile_id: animation.current_tile_id(),
    })
}
