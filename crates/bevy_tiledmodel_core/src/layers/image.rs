//! Image layers.

use bevy::math::UVec2;

/// Content of an image layer: a single image drawn at the layer offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageLayerData {
    /// Image path as written in the map, relative to the map file.
    pub source: String,
    /// Declared image size in pixels, when the map records it.
    pub size: Option<UVec2>,
    pub repeat_x: bool,
    pub repeat_y: bool,
}

impl ImageLayerData {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: UVec2) -> Self {
        self.size = Some(size);
        self
    }
}
