//! Platform abstraction layer
//!
//! The simulation never touches the browser directly. It talks to three
//! collaborators:
//! - `Clock`: frame callbacks, the spawn interval and one-shot timers
//! - `Presentation`: tile visuals
//! - `ControlSurface`: buttons, stats display and the speed control
//!
//! The browser implementations live in the binary; `headless` provides
//! deterministic implementations for tests and the native demo.

pub mod headless;
pub mod input;

use serde::{Deserialize, Serialize};

use crate::sim::{GameOverSummary, Phase, Stats, Tile, TileId};

/// Identifies one clock subscription (frame request, interval or timeout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

/// A callback delivered by the clock
///
/// Every signal names the subscription that produced it so the receiver can
/// drop callbacks that were queued before the subscription was cancelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockSignal {
    /// A display refresh is due; `now_ms` is the refresh timestamp
    Frame { handle: TimerHandle, now_ms: f64 },
    /// The spawn interval elapsed
    Spawn { handle: TimerHandle },
    /// A deferred tile removal is due
    Removal { handle: TimerHandle, tile: TileId },
}

/// Time source and scheduler
pub trait Clock {
    /// Current timestamp in milliseconds
    fn now_ms(&self) -> f64;

    /// Ask for one `ClockSignal::Frame` before the next refresh. Not repeating.
    fn request_frame(&mut self) -> TimerHandle;

    /// Drop a pending frame request
    fn cancel_frame(&mut self, handle: TimerHandle);

    /// Deliver `ClockSignal::Spawn` every `period_ms` until stopped
    fn start_interval(&mut self, period_ms: f64) -> TimerHandle;

    /// Stop a repeating interval
    fn stop_interval(&mut self, handle: TimerHandle);

    /// Deliver one `ClockSignal::Removal` for `tile` after `delay_ms`
    fn schedule_removal(&mut self, tile: TileId, delay_ms: f64) -> TimerHandle;

    /// Cancel a pending removal
    fn cancel_removal(&mut self, handle: TimerHandle);
}

/// Tile visuals. Best effort: nothing here reports failure back to the game.
pub trait Presentation {
    fn render_new_tile(&mut self, tile: &Tile);
    fn update_tile_position(&mut self, tile: &Tile);
    /// Show the tile's terminal status (hit or missed)
    fn mark_tile(&mut self, tile: &Tile);
    fn remove_tile(&mut self, id: TileId);
    fn clear_all(&mut self);
}

/// Buttons, labels and the game-over modal
pub trait ControlSurface {
    fn show_stats(&mut self, stats: &Stats);
    fn show_phase(&mut self, phase: Phase);
    fn show_game_over(&mut self, summary: &GameOverSummary);
    fn hide_game_over(&mut self);
    /// Current value of the speed control
    fn speed_multiplier(&self) -> f64;
}
