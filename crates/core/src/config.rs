//! Annotator configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::Color;
use crate::error::{Error, Result};

/// Which players' moves get annotated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sides {
    White,
    Black,
    #[default]
    Both,
}

impl Sides {
    pub fn includes(self, color: Color) -> bool {
        match self {
            Sides::White => color == Color::White,
            Sides::Black => color == Color::Black,
            Sides::Both => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Path to the UCI engine binary
    pub engine_path: String,

    /// Search time per position
    pub seconds_per_move: f64,

    /// Players whose mistakes are annotated
    pub sides: Sides,

    /// Minimum centipawn loss worth a comment
    pub threshold_cp: i32,

    /// Extra time the engine gets to answer before a query is dropped
    pub response_grace_ms: u64,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            engine_path: "stockfish".to_string(),
            seconds_per_move: 1.0,
            sides: Sides::Both,
            threshold_cp: 50,
            response_grace_ms: 2000,
        }
    }
}

impl AnnotatorConfig {
    /// Loads a JSON config file; missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.seconds_per_move.is_finite() && self.seconds_per_move > 0.0) {
            return Err(Error::Config(format!(
                "seconds_per_move must be positive, got {}",
                self.seconds_per_move
            )));
        }
        if self.threshold_cp < 0 {
            return Err(Error::Config(format!(
                "threshold_cp must not be negative, got {}",
                self.threshold_cp
            )));
        }
        if self.engine_path.trim().is_empty() {
            return Err(Error::Config("engine_path is empty".to_string()));
        }
        Ok(())
    }

    pub fn move_time(&self) -> Duration {
        Duration::from_secs_f64(self.seconds_per_move)
    }

    pub fn response_grace(&self) -> Duration {
        Duration::from_millis(self.response_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnnotatorConfig::default();
        assert_eq!(config.engine_path, "stockfish");
        assert_eq!(config.threshold_cp, 50);
        assert_eq!(config.sides, Sides::Both);
        assert_eq!(config.move_time(), Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AnnotatorConfig =
            serde_json::from_str(r#"{"sides": "black", "threshold_cp": 120}"#).unwrap();
        assert_eq!(config.sides, Sides::Black);
        assert_eq!(config.threshold_cp, 120);
        assert_eq!(config.engine_path, "stockfish");
        assert_eq!(config.response_grace_ms, 2000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = AnnotatorConfig {
            seconds_per_move: 0.0,
            ..AnnotatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = AnnotatorConfig {
            threshold_cp: -1,
            ..AnnotatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_sides_includes() {
        assert!(Sides::Both.includes(Color::Black));
        assert!(Sides::White.includes(Color::White));
        assert!(!Sides::White.includes(Color::Black));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("pgn-annotator-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"engine_path": "/usr/games/stockfish", "seconds_per_move": 0.5}"#).unwrap();
        let config = AnnotatorConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.engine_path, "/usr/games/stockfish");
        assert_eq!(config.move_time(), Duration::from_millis(500));
    }
}
