//! Falling tiles and the registry that owns them

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::layout::BoardLayout;
use crate::platform::Presentation;

/// Stable tile identifier, never reused within one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// Lifecycle of a tile. `Hit` and `Missed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileStatus {
    Falling,
    Hit,
    Missed,
}

impl TileStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TileStatus::Falling)
    }
}

/// A falling target bound to one letter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub letter: char,
    /// Column index, fixed at spawn
    pub slot: u32,
    /// Left edge in pixels, fixed at spawn
    pub x: f32,
    /// Distance fallen from the spawn origin; negative while above the board
    pub vertical_offset: f64,
    pub status: TileStatus,
}

impl Tile {
    pub fn is_falling(&self) -> bool {
        self.status == TileStatus::Falling
    }

    /// Top-left corner on the board
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.vertical_offset as f32)
    }
}

/// Result of one `TileRegistry::advance` call
#[derive(Debug, Clone, Default)]
pub struct AdvanceOutcome {
    /// Tiles that crossed the bottom boundary during this call, in spawn order
    pub misses: Vec<Tile>,
}

/// Ordered collection of live tiles (oldest first)
#[derive(Debug, Clone)]
pub struct TileRegistry {
    tiles: Vec<Tile>,
    next_id: u32,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self {
            tiles: Vec::new(),
            next_id: 1,
        }
    }

    fn next_tile_id(&mut self) -> TileId {
        let id = TileId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Spawn a tile with a random letter in a random column.
    ///
    /// The column is drawn from `[0, columns - 1)`, so the rightmost column
    /// never receives a tile. With fewer than two columns the tile lands in
    /// column 0.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        letters: &[char],
        layout: &BoardLayout,
        view: &mut impl Presentation,
    ) -> &Tile {
        let letter = if letters.is_empty() {
            log::warn!("Spawn with an empty alphabet, falling back to 'A'");
            'A'
        } else {
            letters[rng.random_range(0..letters.len())]
        };

        let max_slot = layout.column_count().saturating_sub(1);
        let slot = if max_slot == 0 {
            0
        } else {
            rng.random_range(0..max_slot)
        };

        self.push(letter, slot, layout, view)
    }

    /// Append a tile with a chosen letter and column
    pub fn push(
        &mut self,
        letter: char,
        slot: u32,
        layout: &BoardLayout,
        view: &mut impl Presentation,
    ) -> &Tile {
        let tile = Tile {
            id: self.next_tile_id(),
            letter: letter.to_ascii_uppercase(),
            slot,
            x: layout.column_x(slot),
            vertical_offset: layout.spawn_offset(),
            status: TileStatus::Falling,
        };
        log::debug!("Spawned tile {:?} '{}' in column {}", tile.id, tile.letter, slot);

        view.render_new_tile(&tile);
        self.tiles.push(tile);
        &self.tiles[self.tiles.len() - 1]
    }

    /// Move every falling tile down and report the ones that left the board.
    ///
    /// `fall_speed` is in pixels per reference frame; the step is scaled by
    /// `elapsed_ms / reference_frame_ms`. Negative elapsed time is treated
    /// as zero so tiles never move up.
    pub fn advance(
        &mut self,
        elapsed_ms: f64,
        fall_speed: f64,
        reference_frame_ms: f64,
        boundary: f64,
        view: &mut impl Presentation,
    ) -> AdvanceOutcome {
        let step = fall_speed * (elapsed_ms.max(0.0) / reference_frame_ms);
        let mut outcome = AdvanceOutcome::default();

        for tile in self.tiles.iter_mut().filter(|t| t.is_falling()) {
            if step > 0.0 {
                tile.vertical_offset += step;
            }
            view.update_tile_position(tile);

            if tile.vertical_offset > boundary {
                tile.status = TileStatus::Missed;
                log::debug!("Tile {:?} '{}' missed", tile.id, tile.letter);
                outcome.misses.push(tile.clone());
            }
        }

        outcome
    }

    /// Strike the oldest falling tile showing `letter` (case-insensitive)
    pub fn resolve_hit(&mut self, letter: char) -> Option<&Tile> {
        let letter = letter.to_ascii_uppercase();
        let tile = self
            .tiles
            .iter_mut()
            .find(|t| t.is_falling() && t.letter == letter)?;
        tile.status = TileStatus::Hit;
        log::debug!("Tile {:?} '{}' hit", tile.id, tile.letter);
        Some(&*tile)
    }

    /// Remove a tile and its visual. Returns false if the tile is already gone.
    pub fn remove(&mut self, id: TileId, view: &mut impl Presentation) -> bool {
        match self.tiles.iter().position(|t| t.id == id) {
            Some(index) => {
                self.tiles.remove(index);
                view.remove_tile(id);
                true
            }
            None => false,
        }
    }

    /// Remove every tile and visual. Ids keep counting up.
    pub fn clear(&mut self, view: &mut impl Presentation) {
        self.tiles.clear();
        view.clear_all();
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::new()
    }
}
