//! Tile Strike - a keyboard reflex game
//!
//! Lettered tiles fall down the board; press the matching key before they
//! cross the bottom edge. Every miss costs a life, every hundred points
//! raises the level and the pace.
//!
//! Core modules:
//! - `sim`: Tile lifecycle, difficulty and the session state machine
//! - `platform`: Clock/presentation/control collaborators and headless fakes
//! - `settings`: Data-driven game tuning and the speed control guard

pub mod platform;
pub mod settings;
pub mod sim;

pub use settings::{GameConfig, SettingsError};
pub use sim::{Game, Phase};

/// Game configuration constants
pub mod consts {
    /// Duration of one frame at 60 fps; fall speed is expressed per reference frame
    pub const REFERENCE_FRAME_MS: f64 = 16.67;

    /// Tile geometry (pixels)
    pub const TILE_WIDTH: f32 = 80.0;
    pub const TILE_HEIGHT: f32 = 60.0;
    /// Horizontal gap between columns
    pub const TILE_GAP: f32 = 10.0;

    /// Session defaults
    pub const STARTING_LIVES: u8 = 3;
    pub const POINTS_PER_HIT: u64 = 10;
    pub const POINTS_PER_LEVEL: u64 = 100;

    /// Difficulty ramp
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 2000.0;
    pub const SPAWN_INTERVAL_STEP_MS: f64 = 100.0;
    pub const SPAWN_INTERVAL_FLOOR_MS: f64 = 500.0;
    pub const BASE_FALL_SPEED: f64 = 1.5;
    pub const FALL_SPEED_STEP: f64 = 0.3;
    pub const FALL_SPEED_CEILING: f64 = 6.0;

    /// Delay before a hit or missed tile leaves the board
    pub const REMOVAL_DELAY_MS: f64 = 300.0;

    /// Supported letters
    pub const ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
}
