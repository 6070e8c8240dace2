//! Error types for race setup and the game driver

use thiserror::Error;

/// Errors raised while configuring or driving a race.
///
/// Ticking never fails; these only come out of construction, configuration
/// loading and driver phase changes.
#[derive(Error, Debug)]
pub enum RaceError {
    #[error("Horse count must be at least 1, got {0}")]
    InvalidHorseCount(usize),

    #[error("Got {got} names for {lanes} lanes")]
    TooManyNames { lanes: usize, got: usize },

    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Expected phase {expected}, but the game is in {actual}")]
    InvalidPhase {
        expected: &'static str,
        actual: &'static str,
    },
}
