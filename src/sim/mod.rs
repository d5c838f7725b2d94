//! Game simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches the
//! browser; time, visuals and controls arrive through `platform` traits:
//! - Seeded RNG only
//! - Registry order is spawn order
//! - Elapsed time is supplied by the clock, never read directly

pub mod difficulty;
pub mod game;
pub mod layout;
pub mod state;
pub mod tile;

pub use difficulty::{Difficulty, DifficultyRamp, effective_fall_speed, effective_spawn_interval_ms};
pub use game::Game;
pub use layout::BoardLayout;
pub use state::{GameOverSummary, Phase, Session, Stats, level_for_score};
pub use tile::{AdvanceOutcome, Tile, TileId, TileRegistry, TileStatus};
