//! Board geometry

use serde::{Deserialize, Serialize};

use crate::settings::GameConfig;

/// Board size and the tile grid it implies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub width: f32,
    pub height: f32,
    pub tile_width: f32,
    pub tile_height: f32,
    pub tile_gap: f32,
}

impl BoardLayout {
    pub fn new(width: f32, height: f32, config: &GameConfig) -> Self {
        Self {
            width,
            height,
            tile_width: config.tile_width,
            tile_height: config.tile_height,
            tile_gap: config.tile_gap,
        }
    }

    /// Number of tile columns that fit across the board
    pub fn column_count(&self) -> u32 {
        let pitch = self.tile_width + self.tile_gap;
        if !(pitch > 0.0) || !(self.width > 0.0) {
            return 0;
        }
        (self.width / pitch).floor() as u32
    }

    /// Left edge of a column in pixels
    pub fn column_x(&self, slot: u32) -> f32 {
        slot as f32 * (self.tile_width + self.tile_gap) + self.tile_gap / 2.0
    }

    /// Vertical offset of a freshly spawned tile (fully above the board)
    pub fn spawn_offset(&self) -> f64 {
        -(self.tile_height as f64)
    }

    /// Offset past which a falling tile counts as missed
    pub fn miss_boundary(&self) -> f64 {
        self.height as f64
    }
}
