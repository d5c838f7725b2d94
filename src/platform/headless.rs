//! Deterministic collaborators for tests and the native demo
//!
//! `ManualClock` only moves when told to. Drive a game with `run_until`,
//! which delivers every due signal in timestamp order.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rand::Rng;

use super::{Clock, ClockSignal, ControlSurface, Presentation, TimerHandle};
use crate::consts::REFERENCE_FRAME_MS;
use crate::sim::{Game, GameOverSummary, Phase, Stats, Tile, TileId, TileStatus};

#[derive(Debug, Clone, Copy)]
struct Interval {
    period_ms: f64,
    next_due_ms: f64,
}

#[derive(Debug)]
struct ManualClockState {
    now_ms: f64,
    frame_interval_ms: f64,
    next_handle: u64,
    frames: BTreeMap<TimerHandle, f64>,
    intervals: BTreeMap<TimerHandle, Interval>,
    removals: BTreeMap<TimerHandle, (f64, TileId)>,
}

impl ManualClockState {
    fn issue(&mut self) -> TimerHandle {
        self.next_handle += 1;
        TimerHandle(self.next_handle)
    }
}

/// Hand-cranked clock. Clones share the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Rc<RefCell<ManualClockState>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// Clock that refreshes every reference frame (60 fps)
    pub fn new() -> Self {
        Self::with_frame_interval(REFERENCE_FRAME_MS)
    }

    pub fn with_frame_interval(frame_interval_ms: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(ManualClockState {
                now_ms: 0.0,
                frame_interval_ms: frame_interval_ms.max(0.001),
                next_handle: 0,
                frames: BTreeMap::new(),
                intervals: BTreeMap::new(),
                removals: BTreeMap::new(),
            })),
        }
    }

    pub fn now(&self) -> f64 {
        self.state.borrow().now_ms
    }

    /// Move time forward without delivering anything
    pub fn advance_to(&self, ms: f64) {
        let mut state = self.state.borrow_mut();
        state.now_ms = state.now_ms.max(ms);
    }

    /// Pop the earliest signal due at or before `until_ms`, moving time to
    /// its due time. Ties go to the lowest handle.
    pub fn next_signal(&self, until_ms: f64) -> Option<ClockSignal> {
        let mut state = self.state.borrow_mut();

        let frames = state.frames.iter().map(|(h, due)| (*due, *h));
        let intervals = state.intervals.iter().map(|(h, i)| (i.next_due_ms, *h));
        let removals = state.removals.iter().map(|(h, (due, _))| (*due, *h));
        let (due, handle) = frames
            .chain(intervals)
            .chain(removals)
            .filter(|(due, _)| *due <= until_ms)
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))?;

        state.now_ms = state.now_ms.max(due);
        let now_ms = state.now_ms;

        if state.frames.remove(&handle).is_some() {
            return Some(ClockSignal::Frame { handle, now_ms });
        }
        if let Some(interval) = state.intervals.get_mut(&handle) {
            interval.next_due_ms += interval.period_ms;
            return Some(ClockSignal::Spawn { handle });
        }
        let (_, tile) = state.removals.remove(&handle)?;
        Some(ClockSignal::Removal { handle, tile })
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn active_intervals(&self) -> usize {
        self.state.borrow().intervals.len()
    }

    pub fn pending_removals(&self) -> usize {
        self.state.borrow().removals.len()
    }

    /// Period of a running interval
    pub fn interval_period(&self, handle: TimerHandle) -> Option<f64> {
        self.state.borrow().intervals.get(&handle).map(|i| i.period_ms)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now()
    }

    fn request_frame(&mut self) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.issue();
        let due = state.now_ms + state.frame_interval_ms;
        state.frames.insert(handle, due);
        handle
    }

    fn cancel_frame(&mut self, handle: TimerHandle) {
        self.state.borrow_mut().frames.remove(&handle);
    }

    fn start_interval(&mut self, period_ms: f64) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.issue();
        // Browsers clamp interval periods; never spin on a zero period
        let period_ms = if period_ms.is_finite() { period_ms.max(1.0) } else { f64::MAX };
        let next_due_ms = state.now_ms + period_ms;
        state.intervals.insert(handle, Interval { period_ms, next_due_ms });
        handle
    }

    fn stop_interval(&mut self, handle: TimerHandle) {
        self.state.borrow_mut().intervals.remove(&handle);
    }

    fn schedule_removal(&mut self, tile: TileId, delay_ms: f64) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        let handle = state.issue();
        let due = state.now_ms + delay_ms.max(0.0);
        state.removals.insert(handle, (due, tile));
        handle
    }

    fn cancel_removal(&mut self, handle: TimerHandle) {
        self.state.borrow_mut().removals.remove(&handle);
    }
}

/// Deliver every signal due up to `until_ms`, then leave the clock there
pub fn run_until<V, H, R>(game: &mut Game<ManualClock, V, H, R>, until_ms: f64)
where
    V: Presentation,
    H: ControlSurface,
    R: Rng,
{
    let clock = game.clock().clone();
    while let Some(signal) = clock.next_signal(until_ms) {
        game.handle_signal(signal);
    }
    clock.advance_to(until_ms);
}

/// Keeps a copy of every tile on screen
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    tiles: BTreeMap<TileId, Tile>,
    marks: Vec<(TileId, TileStatus)>,
    clears: usize,
}

impl RecordingPresentation {
    /// Tiles currently on screen
    pub fn tiles(&self) -> &BTreeMap<TileId, Tile> {
        &self.tiles
    }

    /// Every hit/miss mark in order
    pub fn marks(&self) -> &[(TileId, TileStatus)] {
        &self.marks
    }

    pub fn clear_count(&self) -> usize {
        self.clears
    }
}

impl Presentation for RecordingPresentation {
    fn render_new_tile(&mut self, tile: &Tile) {
        self.tiles.insert(tile.id, tile.clone());
    }

    fn update_tile_position(&mut self, tile: &Tile) {
        if let Some(shown) = self.tiles.get_mut(&tile.id) {
            shown.vertical_offset = tile.vertical_offset;
        }
    }

    fn mark_tile(&mut self, tile: &Tile) {
        self.marks.push((tile.id, tile.status));
        if let Some(shown) = self.tiles.get_mut(&tile.id) {
            shown.status = tile.status;
        }
    }

    fn remove_tile(&mut self, id: TileId) {
        self.tiles.remove(&id);
    }

    fn clear_all(&mut self) {
        self.tiles.clear();
        self.clears += 1;
    }
}

/// Control surface that remembers what it was told to show
#[derive(Debug, Clone)]
pub struct RecordingControls {
    /// Value the speed control reports
    pub speed_multiplier: f64,
    pub stats: Option<Stats>,
    pub phases: Vec<Phase>,
    pub game_over: Option<GameOverSummary>,
    pub game_over_visible: bool,
}

impl Default for RecordingControls {
    fn default() -> Self {
        Self::with_multiplier(1.0)
    }
}

impl RecordingControls {
    pub fn with_multiplier(speed_multiplier: f64) -> Self {
        Self {
            speed_multiplier,
            stats: None,
            phases: Vec::new(),
            game_over: None,
            game_over_visible: false,
        }
    }
}

impl ControlSurface for RecordingControls {
    fn show_stats(&mut self, stats: &Stats) {
        self.stats = Some(*stats);
    }

    fn show_phase(&mut self, phase: Phase) {
        if self.phases.last() != Some(&phase) {
            self.phases.push(phase);
        }
    }

    fn show_game_over(&mut self, summary: &GameOverSummary) {
        self.game_over = Some(*summary);
        self.game_over_visible = true;
    }

    fn hide_game_over(&mut self) {
        self.game_over_visible = false;
    }

    fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }
}
