//! Session state
//!
//! Score, lives, level and pacing for one game. Owned by `Game`.

use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;
use crate::settings::GameConfig;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// Fresh or reset session, waiting for start
    #[default]
    Stopped,
    /// Tiles spawn and fall
    Playing,
    /// Clock subscriptions released until resume
    Paused,
    /// Lives ran out
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Stopped => "stopped",
            Phase::Playing => "playing",
            Phase::Paused => "paused",
            Phase::GameOver => "gameOver",
        }
    }

    /// Whether the start action is accepted
    pub fn can_start(&self) -> bool {
        matches!(self, Phase::Stopped | Phase::GameOver)
    }
}

/// Level reached with `score` points (starts at 1)
pub fn level_for_score(score: u64, points_per_level: u64) -> u32 {
    (score / points_per_level.max(1)) as u32 + 1
}

/// Values shown on the stats display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub phase: Phase,
    pub score: u64,
    pub lives: u8,
    pub level: u32,
    pub speed_multiplier: f64,
}

/// Final result shown when the game ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverSummary {
    pub score: u64,
    pub level: u32,
}

/// Mutable state of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub phase: Phase,
    pub score: u64,
    pub lives: u8,
    pub level: u32,
    pub difficulty: Difficulty,
    pub speed_multiplier: f64,
}

impl Session {
    pub fn new(config: &GameConfig, speed_multiplier: f64) -> Self {
        Self {
            phase: Phase::Stopped,
            score: 0,
            lives: config.starting_lives,
            level: 1,
            difficulty: Difficulty::initial(config),
            speed_multiplier,
        }
    }

    /// Add points and return how many levels were gained
    pub fn add_points(&mut self, points: u64, points_per_level: u64) -> u32 {
        self.score += points;
        let level = level_for_score(self.score, points_per_level);
        let gained = level.saturating_sub(self.level);
        self.level = self.level.max(level);
        gained
    }

    /// Take one life (never below zero) and return the lives left
    pub fn lose_life(&mut self) -> u8 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }

    pub fn spawn_interval_ms(&self) -> f64 {
        self.difficulty.spawn_interval_ms(self.speed_multiplier)
    }

    pub fn fall_speed(&self) -> f64 {
        self.difficulty.fall_speed(self.speed_multiplier)
    }

    pub fn stats(&self) -> Stats {
        Stats {
            phase: self.phase,
            score: self.score,
            lives: self.lives,
            level: self.level,
            speed_multiplier: self.speed_multiplier,
        }
    }

    pub fn summary(&self) -> GameOverSummary {
        GameOverSummary {
            score: self.score,
            level: self.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new(&GameConfig::default(), 1.0);
        assert_eq!(session.phase, Phase::Stopped);
        assert_eq!(session.score, 0);
        assert_eq!(session.lives, 3);
        assert_eq!(session.level, 1);
        assert_eq!(session.spawn_interval_ms(), 2000.0);
        assert_eq!(session.fall_speed(), 1.5);
    }

    #[test]
    fn test_level_boundary() {
        let mut session = Session::new(&GameConfig::default(), 1.0);
        session.score = 90;
        assert_eq!(session.add_points(10, 100), 1);
        assert_eq!(session.level, 2);
        assert_eq!(session.add_points(10, 100), 0);
        assert_eq!(session.level, 2);
    }

    #[test]
    fn test_lives_saturate_at_zero() {
        let mut session = Session::new(&GameConfig::default(), 1.0);
        assert_eq!(session.lose_life(), 2);
        assert_eq!(session.lose_life(), 1);
        assert_eq!(session.lose_life(), 0);
        assert_eq!(session.lose_life(), 0);
    }

    proptest! {
        #[test]
        fn prop_level_tracks_score(hits in 0usize..500) {
            let mut session = Session::new(&GameConfig::default(), 1.0);
            for _ in 0..hits {
                let before = session.level;
                session.add_points(10, 100);
                prop_assert_eq!(session.level, (session.score / 100) as u32 + 1);
                prop_assert!(session.level >= before);
            }
            prop_assert_eq!(session.score, hits as u64 * 10);
        }
    }
}
