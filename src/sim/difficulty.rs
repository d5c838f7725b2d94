//! Difficulty ramp
//!
//! The base spawn interval shrinks and the base fall speed grows on every
//! level-up, each clamped to a hard limit. The speed multiplier scales both:
//! it divides the interval and multiplies the speed.

use serde::{Deserialize, Serialize};

use crate::settings::GameConfig;

/// Base pacing before the speed multiplier is applied
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub base_spawn_interval_ms: f64,
    pub base_fall_speed: f64,
}

impl Difficulty {
    /// Starting difficulty for a fresh session
    pub fn initial(config: &GameConfig) -> Self {
        Self {
            base_spawn_interval_ms: config.base_spawn_interval_ms,
            base_fall_speed: config.base_fall_speed,
        }
    }

    pub fn spawn_interval_ms(&self, multiplier: f64) -> f64 {
        effective_spawn_interval_ms(self.base_spawn_interval_ms, multiplier)
    }

    pub fn fall_speed(&self, multiplier: f64) -> f64 {
        effective_fall_speed(self.base_fall_speed, multiplier)
    }
}

/// Per-level adjustments and their limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRamp {
    pub fall_speed_step: f64,
    pub fall_speed_ceiling: f64,
    pub spawn_interval_step_ms: f64,
    pub spawn_interval_floor_ms: f64,
}

impl DifficultyRamp {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            fall_speed_step: config.fall_speed_step,
            fall_speed_ceiling: config.fall_speed_ceiling,
            spawn_interval_step_ms: config.spawn_interval_step_ms,
            spawn_interval_floor_ms: config.spawn_interval_floor_ms,
        }
    }

    /// Difficulty after one level-up
    pub fn on_level_up(&self, current: Difficulty) -> Difficulty {
        Difficulty {
            base_fall_speed: (current.base_fall_speed + self.fall_speed_step)
                .min(self.fall_speed_ceiling),
            base_spawn_interval_ms: (current.base_spawn_interval_ms - self.spawn_interval_step_ms)
                .max(self.spawn_interval_floor_ms),
        }
    }
}

impl Default for DifficultyRamp {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

pub fn effective_spawn_interval_ms(base: f64, multiplier: f64) -> f64 {
    base / multiplier
}

pub fn effective_fall_speed(base: f64, multiplier: f64) -> f64 {
    base * multiplier
}
