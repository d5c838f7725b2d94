//! Game tuning and the speed control
//!
//! Every tunable lives in `GameConfig`, which can be loaded from a partial
//! JSON document (missing keys fall back to defaults).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Lowest and highest values the speed control offers
pub const MIN_SPEED_MULTIPLIER: f64 = 0.5;
pub const MAX_SPEED_MULTIPLIER: f64 = 3.0;

/// Errors raised while loading configuration or reading the speed control
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse game config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config field `{field}`: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
    #[error("invalid speed multiplier `{0}`")]
    InvalidMultiplier(String),
}

/// Game tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Letters tiles are drawn from
    pub alphabet: String,

    // === Geometry (pixels) ===
    pub tile_width: f32,
    pub tile_height: f32,
    pub tile_gap: f32,

    // === Session ===
    pub starting_lives: u8,
    pub points_per_hit: u64,
    pub points_per_level: u64,

    // === Difficulty ===
    pub base_spawn_interval_ms: f64,
    pub spawn_interval_step_ms: f64,
    pub spawn_interval_floor_ms: f64,
    pub base_fall_speed: f64,
    pub fall_speed_step: f64,
    pub fall_speed_ceiling: f64,

    // === Timing ===
    pub reference_frame_ms: f64,
    pub removal_delay_ms: f64,

    /// Initial value of the speed control
    pub speed_multiplier: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            alphabet: ALPHABET.to_string(),

            tile_width: TILE_WIDTH,
            tile_height: TILE_HEIGHT,
            tile_gap: TILE_GAP,

            starting_lives: STARTING_LIVES,
            points_per_hit: POINTS_PER_HIT,
            points_per_level: POINTS_PER_LEVEL,

            base_spawn_interval_ms: BASE_SPAWN_INTERVAL_MS,
            spawn_interval_step_ms: SPAWN_INTERVAL_STEP_MS,
            spawn_interval_floor_ms: SPAWN_INTERVAL_FLOOR_MS,
            base_fall_speed: BASE_FALL_SPEED,
            fall_speed_step: FALL_SPEED_STEP,
            fall_speed_ceiling: FALL_SPEED_CEILING,

            reference_frame_ms: REFERENCE_FRAME_MS,
            removal_delay_ms: REMOVAL_DELAY_MS,

            speed_multiplier: 1.0,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(field: &'static str, reason: &'static str) -> SettingsError {
            SettingsError::InvalidField { field, reason }
        }

        if self.letters().is_empty() {
            return Err(invalid("alphabet", "must contain at least one letter"));
        }
        if !(self.tile_width > 0.0) || !(self.tile_height > 0.0) {
            return Err(invalid("tile_width/tile_height", "must be positive"));
        }
        if !(self.tile_gap >= 0.0) {
            return Err(invalid("tile_gap", "must not be negative"));
        }
        if self.starting_lives == 0 {
            return Err(invalid("starting_lives", "must be at least 1"));
        }
        if self.points_per_level == 0 {
            return Err(invalid("points_per_level", "must be at least 1"));
        }
        if !(self.spawn_interval_floor_ms > 0.0)
            || self.base_spawn_interval_ms < self.spawn_interval_floor_ms
        {
            return Err(invalid(
                "base_spawn_interval_ms",
                "must be at or above a positive floor",
            ));
        }
        if !(self.base_fall_speed > 0.0) || self.base_fall_speed > self.fall_speed_ceiling {
            return Err(invalid(
                "base_fall_speed",
                "must be positive and at or below the ceiling",
            ));
        }
        if !(self.reference_frame_ms > 0.0) {
            return Err(invalid("reference_frame_ms", "must be positive"));
        }
        if !(self.removal_delay_ms >= 0.0) {
            return Err(invalid("removal_delay_ms", "must not be negative"));
        }
        if !is_valid_multiplier(self.speed_multiplier) {
            return Err(invalid("speed_multiplier", "must be positive and finite"));
        }
        Ok(())
    }

    /// Uppercase ASCII letters of the alphabet, in order, without duplicates
    pub fn letters(&self) -> Vec<char> {
        let mut letters: Vec<char> = Vec::new();
        for c in self.alphabet.chars().filter(char::is_ascii_alphabetic) {
            let c = c.to_ascii_uppercase();
            if !letters.contains(&c) {
                letters.push(c);
            }
        }
        letters
    }
}

/// True for multipliers the simulation can apply
pub fn is_valid_multiplier(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Parse the raw value of the speed control, clamped to the control's range
pub fn parse_speed_multiplier(raw: &str) -> Result<f64, SettingsError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if is_valid_multiplier(value) => {
            Ok(value.clamp(MIN_SPEED_MULTIPLIER, MAX_SPEED_MULTIPLIER))
        }
        _ => Err(SettingsError::InvalidMultiplier(raw.to_string())),
    }
}

/// Display label for a multiplier, e.g. `1.5x`
pub fn format_multiplier(value: f64) -> String {
    format!("{:.1}x", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.letters().len(), 26);
        assert_eq!(config.starting_lives, 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json(r#"{ "alphabet": "asdf", "removal_delay_ms": 150 }"#)
            .expect("config should parse");
        assert_eq!(config.letters(), vec!['A', 'S', 'D', 'F']);
        assert_eq!(config.removal_delay_ms, 150.0);
        assert_eq!(config.base_spawn_interval_ms, BASE_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_json_roundtrip_preserves_values() {
        let config = GameConfig {
            tile_width: 64.0,
            ..GameConfig::default()
        };
        let json = config.to_json().unwrap();
        assert_eq!(GameConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(matches!(
            GameConfig::from_json(r#"{ "alphabet": "123" }"#),
            Err(SettingsError::InvalidField { field: "alphabet", .. })
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{ "starting_lives": 0 }"#),
            Err(SettingsError::InvalidField { .. })
        ));
        assert!(matches!(
            GameConfig::from_json(r#"{ "base_spawn_interval_ms": 100 }"#),
            Err(SettingsError::InvalidField { .. })
        ));
        assert!(matches!(
            GameConfig::from_json("not json"),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_parse_speed_multiplier() {
        assert_eq!(parse_speed_multiplier("1.5").unwrap(), 1.5);
        assert_eq!(parse_speed_multiplier(" 2 ").unwrap(), 2.0);
        assert_eq!(parse_speed_multiplier("10").unwrap(), MAX_SPEED_MULTIPLIER);
        assert_eq!(parse_speed_multiplier("0.1").unwrap(), MIN_SPEED_MULTIPLIER);
        for bad in ["", "abc", "0", "-1", "NaN", "inf"] {
            assert!(parse_speed_multiplier(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_format_multiplier() {
        assert_eq!(format_multiplier(1.0), "1.0x");
        assert_eq!(format_multiplier(2.26), "2.3x");
        assert_eq!(format_multiplier(0.5), "0.5x");
    }
}
