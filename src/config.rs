use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{strategy::DEFAULT_DIFFICULTY, types::AiMode};

pub const DIFFICULTY_STEP: f64 = 0.1;
pub const DETECTION_STEP: f64 = 0.5;
pub const MIN_DETECTION_SECS: f64 = 1.0;
pub const MAX_DETECTION_SECS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("ai_difficulty must be within [0, 1], got {0}")]
    Difficulty(f64),
    #[error("detection_duration must be within [{MIN_DETECTION_SECS}, {MAX_DETECTION_SECS}] seconds, got {0}")]
    DetectionDuration(f64),
    #[error("result_display must be a non-negative number of seconds, got {0}")]
    ResultDisplay(f64),
    #[error("gesture_confidence_threshold must be at least 1")]
    Threshold,
    #[error("max_rounds must be at least 1")]
    MaxRounds,
}

/// Tunables for a play session. Missing keys in a JSON file fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub ai_mode: AiMode,
    pub ai_difficulty: f64,
    /// Seconds.
    pub detection_duration: f64,
    /// Labels of one kind a detection window needs before it confirms.
    pub gesture_confidence_threshold: usize,
    pub max_rounds: u32,
    /// Countdown length in seconds before each round.
    pub countdown: u32,
    /// Seconds a resolved round stays on screen.
    pub result_display: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ai_mode: AiMode::Random,
            ai_difficulty: DEFAULT_DIFFICULTY,
            detection_duration: 3.0,
            gesture_confidence_threshold: 3,
            max_rounds: crate::game::DEFAULT_MAX_ROUNDS,
            countdown: 3,
            result_display: 3.0,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.ai_difficulty) {
            return Err(ConfigError::Difficulty(self.ai_difficulty));
        }
        if !(MIN_DETECTION_SECS..=MAX_DETECTION_SECS).contains(&self.detection_duration) {
            return Err(ConfigError::DetectionDuration(self.detection_duration));
        }
        if !(self.result_display >= 0.0 && self.result_display.is_finite()) {
            return Err(ConfigError::ResultDisplay(self.result_display));
        }
        if self.gesture_confidence_threshold == 0 {
            return Err(ConfigError::Threshold);
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::MaxRounds);
        }
        Ok(())
    }

    pub fn detection_window(&self) -> Duration {
        Duration::from_secs_f64(self.detection_duration)
    }

    pub fn result_window(&self) -> Duration {
        Duration::from_secs_f64(self.result_display)
    }

    pub fn raise_difficulty(&mut self) {
        self.ai_difficulty = step(self.ai_difficulty, DIFFICULTY_STEP, 0.0, 1.0);
    }

    pub fn lower_difficulty(&mut self) {
        self.ai_difficulty = step(self.ai_difficulty, -DIFFICULTY_STEP, 0.0, 1.0);
    }

    pub fn lengthen_detection(&mut self) {
        self.detection_duration = step(
            self.detection_duration,
            DETECTION_STEP,
            MIN_DETECTION_SECS,
            MAX_DETECTION_SECS,
        );
    }

    pub fn shorten_detection(&mut self) {
        self.detection_duration = step(
            self.detection_duration,
            -DETECTION_STEP,
            MIN_DETECTION_SECS,
            MAX_DETECTION_SECS,
        );
    }
}

/// Rounded to one decimal so repeated steps land on the grid.
fn step(value: f64, delta: f64, min: f64, max: f64) -> f64 {
    ((value + delta) * 10.0).round().clamp(min * 10.0, max * 10.0) / 10.0
}
