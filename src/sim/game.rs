//! Session state machine
//!
//! `Game` owns the session, the tile registry and the three collaborators.
//! It reacts to four kinds of input:
//! - user actions (start, pause/resume, reset, speed change, resize)
//! - frame signals: advance tiles, count misses
//! - spawn signals: add a tile
//! - removal signals: drop a finished tile
//!
//! Every handler re-checks the phase and the subscription handle when it
//! runs, so callbacks queued before a pause or game over do nothing.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::difficulty::DifficultyRamp;
use super::layout::BoardLayout;
use super::state::{Phase, Session, Stats};
use super::tile::{TileId, TileRegistry};
use crate::platform::input::normalize_key;
use crate::platform::{Clock, ClockSignal, ControlSurface, Presentation, TimerHandle};
use crate::settings::{GameConfig, is_valid_multiplier};

/// One game session wired to its collaborators
pub struct Game<C, V, H, R = Pcg32> {
    config: GameConfig,
    letters: Vec<char>,
    ramp: DifficultyRamp,
    layout: BoardLayout,
    session: Session,
    tiles: TileRegistry,
    clock: C,
    view: V,
    controls: H,
    rng: R,
    /// Outstanding frame request
    frame: Option<TimerHandle>,
    /// Active spawn interval
    spawn: Option<TimerHandle>,
    /// Timestamp of the previous frame (re-stamped on start/resume)
    last_frame_ms: f64,
    /// Scheduled removals by tile
    pending_removals: BTreeMap<TileId, TimerHandle>,
}

impl<C, V, H> Game<C, V, H, Pcg32>
where
    C: Clock,
    V: Presentation,
    H: ControlSurface,
{
    /// Create a game with a seeded PCG random source
    pub fn with_seed(
        config: GameConfig,
        layout: BoardLayout,
        clock: C,
        view: V,
        controls: H,
        seed: u64,
    ) -> Self {
        Self::new(config, layout, clock, view, controls, Pcg32::seed_from_u64(seed))
    }
}

impl<C, V, H, R> Game<C, V, H, R>
where
    C: Clock,
    V: Presentation,
    H: ControlSurface,
    R: Rng,
{
    pub fn new(
        config: GameConfig,
        layout: BoardLayout,
        clock: C,
        view: V,
        controls: H,
        rng: R,
    ) -> Self {
        let mut letters = config.letters();
        if letters.is_empty() {
            log::warn!("Config alphabet has no letters, using A-Z");
            letters = crate::consts::ALPHABET.chars().collect();
        }

        let multiplier = Self::read_multiplier(&controls, config.speed_multiplier);
        let session = Session::new(&config, multiplier);

        let mut game = Self {
            ramp: DifficultyRamp::from_config(&config),
            letters,
            layout,
            session,
            tiles: TileRegistry::new(),
            clock,
            view,
            controls,
            rng,
            frame: None,
            spawn: None,
            last_frame_ms: 0.0,
            pending_removals: BTreeMap::new(),
            config,
        };
        game.publish();
        game
    }

    fn read_multiplier(controls: &H, fallback: f64) -> f64 {
        let value = controls.speed_multiplier();
        if is_valid_multiplier(value) {
            value
        } else {
            log::warn!("Ignoring speed control value {}, using {}", value, fallback);
            fallback
        }
    }

    // === User actions ===

    /// Begin play from Stopped or GameOver. Score and lives carry over; only
    /// `reset` restores them.
    pub fn start(&mut self) {
        if !self.session.phase.can_start() {
            log::debug!("Start ignored in phase {:?}", self.session.phase);
            return;
        }

        self.clear_board();
        self.session.phase = Phase::Playing;
        self.subscribe();
        self.publish();
        log::info!(
            "Game started (spawn every {:.0} ms, fall speed {:.2})",
            self.session.spawn_interval_ms(),
            self.session.fall_speed()
        );
    }

    pub fn pause(&mut self) {
        if self.session.phase != Phase::Playing {
            return;
        }
        self.session.phase = Phase::Paused;
        self.unsubscribe();
        self.publish();
        log::info!("Game paused");
    }

    pub fn resume(&mut self) {
        if self.session.phase != Phase::Paused {
            return;
        }
        self.session.phase = Phase::Playing;
        self.subscribe();
        self.publish();
        log::info!("Game resumed");
    }

    /// Single pause/resume control
    pub fn toggle_pause(&mut self) {
        match self.session.phase {
            Phase::Playing => self.pause(),
            Phase::Paused => self.resume(),
            _ => {}
        }
    }

    /// Back to Stopped with a fresh session. Valid from any phase.
    pub fn reset(&mut self) {
        self.unsubscribe();
        self.clear_board();

        let multiplier = Self::read_multiplier(&self.controls, self.session.speed_multiplier);
        self.session = Session::new(&self.config, multiplier);

        self.controls.hide_game_over();
        self.publish();
        log::info!("Game reset");
    }

    /// Apply a new speed multiplier. Non-positive or non-finite values are ignored.
    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        if !is_valid_multiplier(multiplier) {
            log::warn!("Rejected speed multiplier {}", multiplier);
            return;
        }
        self.session.speed_multiplier = multiplier;
        self.replace_spawn_subscription();
        self.controls.show_stats(&self.session.stats());
        log::debug!("Speed multiplier set to {:.2}", multiplier);
    }

    /// Board size changed; affects columns for new tiles and the miss boundary
    pub fn resize(&mut self, width: f32, height: f32) {
        self.layout.width = width;
        self.layout.height = height;
        log::debug!(
            "Board resized to {}x{} ({} columns)",
            width,
            height,
            self.layout.column_count()
        );
    }

    /// Key press from the player. Returns true if it struck a tile.
    pub fn handle_key(&mut self, key: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(letter) = normalize_key(key) else {
            return false;
        };
        let Some(tile) = self.tiles.resolve_hit(letter) else {
            return false;
        };

        let id = tile.id;
        self.view.mark_tile(tile);
        self.schedule_removal(id);

        let levels = self
            .session
            .add_points(self.config.points_per_hit, self.config.points_per_level);
        if levels > 0 {
            // One step per scoring hit, however many levels it crossed
            self.session.difficulty = self.ramp.on_level_up(self.session.difficulty);
            self.replace_spawn_subscription();
            log::info!(
                "Level {} (spawn every {:.0} ms, fall speed {:.2})",
                self.session.level,
                self.session.spawn_interval_ms(),
                self.session.fall_speed()
            );
        }
        self.controls.show_stats(&self.session.stats());
        true
    }

    // === Clock callbacks ===

    /// Dispatch a clock callback
    pub fn handle_signal(&mut self, signal: ClockSignal) {
        match signal {
            ClockSignal::Frame { handle, now_ms } => self.on_frame(handle, now_ms),
            ClockSignal::Spawn { handle } => self.on_spawn(handle),
            ClockSignal::Removal { handle, tile } => self.on_removal(handle, tile),
        }
    }

    fn on_frame(&mut self, handle: TimerHandle, now_ms: f64) {
        if self.session.phase != Phase::Playing || self.frame != Some(handle) {
            log::trace!("Dropping stale frame {:?}", handle);
            return;
        }
        self.frame = None;

        let elapsed_ms = now_ms - self.last_frame_ms;
        self.last_frame_ms = now_ms;

        if self.session.lives == 0 {
            self.game_over();
            return;
        }

        let outcome = self.tiles.advance(
            elapsed_ms,
            self.session.fall_speed(),
            self.config.reference_frame_ms,
            self.layout.miss_boundary(),
            &mut self.view,
        );

        if !outcome.misses.is_empty() {
            for tile in &outcome.misses {
                self.view.mark_tile(tile);
                self.schedule_removal(tile.id);
                self.session.lose_life();
            }
            self.controls.show_stats(&self.session.stats());
        }

        if self.session.lives == 0 {
            self.game_over();
        } else {
            self.frame = Some(self.clock.request_frame());
        }
    }

    fn on_spawn(&mut self, handle: TimerHandle) {
        if self.session.phase != Phase::Playing || self.spawn != Some(handle) {
            log::trace!("Dropping stale spawn tick {:?}", handle);
            return;
        }
        self.tiles
            .spawn(&mut self.rng, &self.letters, &self.layout, &mut self.view);
    }

    fn on_removal(&mut self, handle: TimerHandle, tile: TileId) {
        if self.pending_removals.get(&tile) != Some(&handle) {
            log::debug!("Ignoring removal of {:?}, no longer scheduled", tile);
            return;
        }
        self.pending_removals.remove(&tile);
        if !self.tiles.remove(tile, &mut self.view) {
            log::warn!("Scheduled removal of {:?} found no tile", tile);
        }
    }

    // === Internals ===

    fn is_active(&self) -> bool {
        self.session.phase == Phase::Playing && self.session.lives > 0
    }

    fn subscribe(&mut self) {
        self.last_frame_ms = self.clock.now_ms();
        self.frame = Some(self.clock.request_frame());
        self.spawn = Some(self.clock.start_interval(self.session.spawn_interval_ms()));
    }

    fn unsubscribe(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.clock.cancel_frame(handle);
        }
        if let Some(handle) = self.spawn.take() {
            self.clock.stop_interval(handle);
        }
    }

    /// Swap the spawn interval for one with the current period. No-op when
    /// no interval is running.
    fn replace_spawn_subscription(&mut self) {
        if let Some(old) = self.spawn.take() {
            self.clock.stop_interval(old);
            self.spawn = Some(self.clock.start_interval(self.session.spawn_interval_ms()));
        }
    }

    fn schedule_removal(&mut self, tile: TileId) {
        let handle = self
            .clock
            .schedule_removal(tile, self.config.removal_delay_ms);
        self.pending_removals.insert(tile, handle);
    }

    /// Cancel pending removals and drop every tile
    fn clear_board(&mut self) {
        for (_, handle) in std::mem::take(&mut self.pending_removals) {
            self.clock.cancel_removal(handle);
        }
        self.tiles.clear(&mut self.view);
    }

    fn game_over(&mut self) {
        self.session.phase = Phase::GameOver;
        self.unsubscribe();
        self.publish();
        let summary = self.session.summary();
        self.controls.show_game_over(&summary);
        log::info!(
            "Game over: score {}, level {}",
            summary.score,
            summary.level
        );
    }

    /// Push phase and stats to the control surface
    fn publish(&mut self) {
        self.controls.show_phase(self.session.phase);
        self.controls.show_stats(&self.session.stats());
    }

    // === Accessors ===

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> Stats {
        self.session.stats()
    }

    pub fn tiles(&self) -> &TileRegistry {
        &self.tiles
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn controls(&self) -> &H {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut H {
        &mut self.controls
    }

    /// Handle of the running spawn interval, if any
    pub fn spawn_subscription(&self) -> Option<TimerHandle> {
        self.spawn
    }

    /// Handle of the outstanding frame request, if any
    pub fn frame_subscription(&self) -> Option<TimerHandle> {
        self.frame
    }

    pub fn pending_removal_count(&self) -> usize {
        self.pending_removals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::headless::{ManualClock, RecordingControls, RecordingPresentation, run_until};
    use crate::sim::{Difficulty, GameOverSummary, TileStatus};
    use proptest::prelude::*;

    type TestGame = Game<ManualClock, RecordingPresentation, RecordingControls>;

    fn game_with(config: GameConfig, seed: u64) -> TestGame {
        let layout = BoardLayout::new(450.0, 500.0, &config);
        Game::with_seed(
            config,
            layout,
            ManualClock::new(),
            RecordingPresentation::default(),
            RecordingControls::default(),
            seed,
        )
    }

    fn new_game() -> TestGame {
        game_with(GameConfig::default(), 42)
    }

    fn push_tile(game: &mut TestGame, letter: char) -> TileId {
        game.tiles.push(letter, 0, &game.layout, &mut game.view).id
    }

    #[test]
    fn test_start_subscribes_both_signals() {
        let mut game = new_game();
        assert_eq!(game.phase(), Phase::Stopped);
        assert_eq!(game.clock().active_intervals(), 0);

        game.start();
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.clock().pending_frames(), 1);
        assert_eq!(game.clock().active_intervals(), 1);
        let spawn = game.spawn_subscription().unwrap();
        assert_eq!(game.clock().interval_period(spawn), Some(2000.0));
        assert_eq!(game.controls().phases, vec![Phase::Stopped, Phase::Playing]);

        // Start while playing changes nothing
        game.start();
        assert_eq!(game.spawn_subscription(), Some(spawn));
    }

    #[test]
    fn test_spawn_interval_adds_tiles() {
        let mut game = new_game();
        game.start();

        run_until(&mut game, 1999.0);
        assert!(game.tiles().is_empty());
        run_until(&mut game, 2001.0);
        assert_eq!(game.tiles().len(), 1);
        run_until(&mut game, 6001.0);
        assert_eq!(game.tiles().len(), 3);

        for tile in game.tiles().iter() {
            assert!(tile.slot < 4);
            assert!(tile.letter.is_ascii_uppercase());
            assert!(tile.is_falling());
        }
    }

    #[test]
    fn test_hit_scores_and_removes_after_delay() {
        let mut game = new_game();
        game.start();
        run_until(&mut game, 2001.0);

        let tile = game.tiles().iter().next().unwrap().clone();
        let key = tile.letter.to_ascii_lowercase().to_string();
        assert!(game.handle_key(&key));
        assert_eq!(game.stats().score, 10);
        assert_eq!(game.tiles().get(tile.id).unwrap().status, TileStatus::Hit);
        assert_eq!(game.view().marks(), &[(tile.id, TileStatus::Hit)]);
        assert_eq!(game.pending_removal_count(), 1);

        // Still on the board during the presentation delay
        run_until(&mut game, 2200.0);
        assert!(game.tiles().get(tile.id).is_some());
        run_until(&mut game, 2302.0);
        assert!(game.tiles().get(tile.id).is_none());
        assert!(game.view().tiles().is_empty());
        assert_eq!(game.pending_removal_count(), 0);
        assert_eq!(game.controls().stats.unwrap().score, 10);
    }

    #[test]
    fn test_unmatched_keys_are_ignored() {
        let mut game = new_game();
        game.start();
        push_tile(&mut game, 'A');

        assert!(!game.handle_key("b"));
        assert!(!game.handle_key("Shift"));
        assert!(!game.handle_key(""));
        assert_eq!(game.stats().score, 0);
        assert_eq!(game.pending_removal_count(), 0);
    }

    #[test]
    fn test_keys_need_playing_phase() {
        let mut game = new_game();
        push_tile(&mut game, 'A');
        assert!(!game.handle_key("a"));

        game.start();
        push_tile(&mut game, 'A');
        game.pause();
        assert!(!game.handle_key("a"));
        assert_eq!(game.stats().score, 0);

        game.resume();
        assert!(game.handle_key("a"));
        assert_eq!(game.stats().score, 10);
    }

    #[test]
    fn test_frames_move_tiles() {
        let mut game = new_game();
        game.start();
        let id = push_tile(&mut game, 'A');

        run_until(&mut game, 17.0);
        let offset = game.tiles().get(id).unwrap().vertical_offset;
        assert!((offset - -58.5).abs() < 1e-6, "offset {offset}");
        assert_eq!(game.view().tiles()[&id].vertical_offset, offset);
    }

    #[test]
    fn test_level_up_adjusts_difficulty_once() {
        let mut game = new_game();
        game.start();
        game.session.score = 95;
        let old_spawn = game.spawn_subscription().unwrap();
        push_tile(&mut game, 'A');

        assert!(game.handle_key("A"));
        assert_eq!(game.stats().score, 105);
        assert_eq!(game.stats().level, 2);

        let expected = DifficultyRamp::default().on_level_up(Difficulty::initial(game.config()));
        assert_eq!(game.session().difficulty, expected);

        let new_spawn = game.spawn_subscription().unwrap();
        assert_ne!(new_spawn, old_spawn);
        assert_eq!(game.clock().active_intervals(), 1);
        assert_eq!(game.clock().interval_period(new_spawn), Some(1900.0));
    }

    #[test]
    fn test_multi_level_hit_ramps_once() {
        let config = GameConfig {
            points_per_hit: 250,
            ..GameConfig::default()
        };
        let mut game = game_with(config, 42);
        game.start();
        push_tile(&mut game, 'A');

        assert!(game.handle_key("a"));
        assert_eq!(game.stats().level, 3);
        let expected = DifficultyRamp::default().on_level_up(Difficulty::initial(game.config()));
        assert_eq!(game.session().difficulty, expected);
        let spawn = game.spawn_subscription().unwrap();
        assert_eq!(game.clock().interval_period(spawn), Some(1900.0));
    }

    #[test]
    fn test_miss_costs_a_life() {
        let mut game = new_game();
        game.resize(450.0, 10.0);
        game.start();
        let id = push_tile(&mut game, 'A');

        // 70px at 1.5px per frame: crosses after 47 frames
        run_until(&mut game, 1000.0);
        assert_eq!(game.tiles().get(id).unwrap().status, TileStatus::Missed);
        assert_eq!(game.stats().lives, 2);
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.view().marks(), &[(id, TileStatus::Missed)]);

        run_until(&mut game, 1400.0);
        assert!(game.tiles().get(id).is_none());
    }

    #[test]
    fn test_last_life_ends_game_and_silences_clock() {
        let mut game = new_game();
        game.resize(450.0, 10.0);
        game.start();
        game.session.lives = 1;
        game.session.score = 40;
        let stale_spawn = game.spawn_subscription().unwrap();
        push_tile(&mut game, 'A');

        run_until(&mut game, 1000.0);
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.stats().lives, 0);
        assert_eq!(game.frame_subscription(), None);
        assert_eq!(game.spawn_subscription(), None);
        assert_eq!(game.clock().pending_frames(), 0);
        assert_eq!(game.clock().active_intervals(), 0);
        assert_eq!(
            game.controls().game_over,
            Some(GameOverSummary { score: 40, level: 1 })
        );
        assert!(game.controls().game_over_visible);

        // A spawn tick queued before the game ended does nothing
        game.handle_signal(ClockSignal::Spawn { handle: stale_spawn });
        run_until(&mut game, 10_000.0);
        assert!(game.tiles().is_empty());
        assert!(!game.handle_key("a"));
    }

    #[test]
    fn test_simultaneous_misses_stop_at_zero_lives() {
        let mut game = new_game();
        game.resize(450.0, 10.0);
        game.start();
        game.session.lives = 1;
        let first = push_tile(&mut game, 'A');
        let second = push_tile(&mut game, 'B');

        run_until(&mut game, 1000.0);
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.stats().lives, 0);
        assert_eq!(game.tiles().get(first).unwrap().status, TileStatus::Missed);
        assert_eq!(game.tiles().get(second).unwrap().status, TileStatus::Missed);
        assert_eq!(game.pending_removal_count(), 2);
    }

    #[test]
    fn test_pause_drops_queued_frames() {
        let mut game = new_game();
        game.start();
        let id = push_tile(&mut game, 'A');
        let queued = game.frame_subscription().unwrap();

        game.pause();
        assert_eq!(game.phase(), Phase::Paused);
        assert_eq!(game.clock().pending_frames(), 0);
        assert_eq!(game.clock().active_intervals(), 0);

        game.handle_signal(ClockSignal::Frame { handle: queued, now_ms: 500.0 });
        assert_eq!(game.tiles().get(id).unwrap().vertical_offset, -60.0);
    }

    #[test]
    fn test_resume_restamps_frame_time() {
        let mut game = new_game();
        game.start();
        let id = push_tile(&mut game, 'A');

        run_until(&mut game, 100.0);
        game.toggle_pause();
        let paused_at = game.tiles().get(id).unwrap().vertical_offset;

        run_until(&mut game, 5000.0);
        assert_eq!(game.tiles().get(id).unwrap().vertical_offset, paused_at);

        game.toggle_pause();
        assert_eq!(game.phase(), Phase::Playing);
        run_until(&mut game, 5017.0);
        let offset = game.tiles().get(id).unwrap().vertical_offset;
        assert!((offset - (paused_at + 1.5)).abs() < 1e-6, "offset {offset}");
    }

    #[test]
    fn test_speed_change_replaces_spawn_interval() {
        let mut game = new_game();

        // Not playing: nothing to replace
        game.set_speed_multiplier(2.0);
        assert_eq!(game.spawn_subscription(), None);

        game.start();
        let spawn = game.spawn_subscription().unwrap();
        assert_eq!(game.clock().interval_period(spawn), Some(1000.0));

        game.set_speed_multiplier(0.5);
        let replaced = game.spawn_subscription().unwrap();
        assert_ne!(replaced, spawn);
        assert_eq!(game.clock().interval_period(replaced), Some(4000.0));
        assert_eq!(game.clock().active_intervals(), 1);
        assert_eq!(game.session().fall_speed(), 0.75);

        game.set_speed_multiplier(0.0);
        game.set_speed_multiplier(f64::NAN);
        assert_eq!(game.session().speed_multiplier, 0.5);
        assert_eq!(game.spawn_subscription(), Some(replaced));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut game = new_game();
        game.resize(450.0, 10.0);
        game.start();
        game.session.lives = 1;
        game.session.score = 120;
        game.session.level = 2;
        game.session.difficulty.base_spawn_interval_ms = 1200.0;
        push_tile(&mut game, 'A');
        // Crosses the 10 px board at ~784 ms, removal due ~1084 ms
        run_until(&mut game, 1000.0);
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.pending_removal_count(), 1);
        assert_eq!(game.clock().pending_removals(), 1);
        assert_eq!(game.view().clear_count(), 1);

        game.controls_mut().speed_multiplier = 1.5;
        game.reset();

        let session = game.session();
        assert_eq!(session.phase, Phase::Stopped);
        assert_eq!((session.score, session.lives, session.level), (0, 3, 1));
        assert_eq!(session.difficulty, Difficulty::initial(game.config()));
        assert_eq!(session.speed_multiplier, 1.5);
        assert!(game.tiles().is_empty());
        assert!(game.view().tiles().is_empty());
        assert_eq!(game.view().clear_count(), 2);
        assert_eq!(game.pending_removal_count(), 0);
        assert_eq!(game.clock().pending_removals(), 0);
        assert!(!game.controls().game_over_visible);

        // The cancelled removal never fires
        run_until(&mut game, 2000.0);
        assert_eq!(game.view().clear_count(), 2);
        assert_eq!(game.controls().phases.last(), Some(&Phase::Stopped));
    }

    #[test]
    fn test_late_removal_after_clear_is_noop() {
        let mut game = new_game();
        game.start();
        let id = push_tile(&mut game, 'A');
        assert!(game.handle_key("a"));

        game.reset();
        game.reset();
        game.handle_signal(ClockSignal::Removal { handle: TimerHandle(9_999), tile: id });
        assert!(game.tiles().is_empty());

        // A new tile is never taken by an old removal
        game.start();
        let fresh = push_tile(&mut game, 'B');
        assert_ne!(fresh, id);
        game.handle_signal(ClockSignal::Removal { handle: TimerHandle(9_999), tile: fresh });
        assert!(game.tiles().get(fresh).is_some());
    }

    #[test]
    fn test_start_after_game_over_keeps_score() {
        let mut game = new_game();
        game.resize(450.0, 10.0);
        game.start();
        game.session.lives = 1;
        game.session.score = 70;
        push_tile(&mut game, 'A');
        run_until(&mut game, 1000.0);
        assert_eq!(game.phase(), Phase::GameOver);

        let clears = game.view().clear_count();
        game.start();
        assert_eq!(game.phase(), Phase::Playing);
        assert!(game.tiles().is_empty());
        assert_eq!(game.view().clear_count(), clears + 1);
        assert_eq!(game.stats().score, 70);

        // No lives left: the first frame ends the game again
        run_until(&mut game, 1100.0);
        assert_eq!(game.phase(), Phase::GameOver);
        assert_eq!(game.clock().active_intervals(), 0);
    }

    #[test]
    fn test_same_seed_same_tiles() {
        let mut a = game_with(GameConfig::default(), 7);
        let mut b = game_with(GameConfig::default(), 7);
        a.start();
        b.start();
        run_until(&mut a, 7000.0);
        run_until(&mut b, 7000.0);

        let tiles = |g: &TestGame| g.tiles().iter().map(|t| (t.letter, t.slot)).collect::<Vec<_>>();
        assert_eq!(tiles(&a).len(), 3);
        assert_eq!(tiles(&a), tiles(&b));
    }

    #[derive(Debug, Clone)]
    enum Action {
        Key(u8),
        Wait(u16),
    }

    fn action() -> impl Strategy<Value = Action> {
        prop_oneof![
            (0u8..4).prop_map(Action::Key),
            (1u16..800).prop_map(Action::Wait),
        ]
    }

    proptest! {
        #[test]
        fn prop_score_and_lives_accounting(actions in prop::collection::vec(action(), 1..120)) {
            let config = GameConfig {
                alphabet: "ABCD".to_string(),
                ..GameConfig::default()
            };
            let mut game = game_with(config, 3);
            game.resize(450.0, 120.0);
            game.start();

            let mut hits = 0u64;
            let mut now = 0.0;
            for action in actions {
                match action {
                    Action::Key(k) => {
                        if game.handle_key(&((b'a' + k) as char).to_string()) {
                            hits += 1;
                        }
                    }
                    Action::Wait(ms) => {
                        now += ms as f64;
                        run_until(&mut game, now);
                    }
                }
                let misses = game
                    .view()
                    .marks()
                    .iter()
                    .filter(|(_, s)| *s == TileStatus::Missed)
                    .count() as u8;
                let stats = game.stats();
                prop_assert_eq!(stats.score, hits * 10);
                prop_assert_eq!(stats.lives, 3u8.saturating_sub(misses));
                prop_assert_eq!(stats.level, (stats.score / 100) as u32 + 1);
                prop_assert!(game.session().difficulty.base_fall_speed <= 6.0);
                prop_assert!(game.session().difficulty.base_spawn_interval_ms >= 500.0);
                if stats.lives == 0 {
                    prop_assert_eq!(game.phase(), Phase::GameOver);
                }
            }
        }
    }
}
