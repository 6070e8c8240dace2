//! Horse - Individual horse state
//!
//! Each horse has a lane, a bettor, and the kinematic fields the engine
//! mutates every tick (position, speed, mode). Finish data is written once.

use serde::{Deserialize, Serialize};

/// Lane colours, cycled when there are more than six lanes
pub const LANE_COLORS: [&str; 6] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f1c40f", "#9b59b6", "#e67e22",
];

/// Transient performance state biasing a horse's acceleration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorseMode {
    #[default]
    Normal,
    Boost,
    Fatigue,
}

/// Complete state for a single horse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    /// Lane-based id, 1..=N
    pub id: u32,
    /// Display colour for the lane
    pub color: String,
    /// Bettor who picked this horse
    pub bettor_name: String,
    /// Distance along the track, in percent of track length
    pub position: f64,
    /// Current speed, clamped to the tuning's speed range while racing
    pub speed: f64,
    pub mode: HorseMode,
    /// Milliseconds until the next mode re-roll
    pub mode_remaining: f64,
    pub finished: bool,
    /// 1-based finishing place
    pub finish_rank: Option<u32>,
    /// Seconds since the race started
    pub finish_time: Option<f64>,
    /// Standing index from the previous ranking snapshot
    pub previous_rank: usize,
}

impl Horse {
    /// Create a horse for the given 0-based lane
    pub fn new(lane: usize, bettor_name: String) -> Self {
        Self {
            id: lane as u32 + 1,
            color: LANE_COLORS[lane % LANE_COLORS.len()].to_string(),
            bettor_name,
            position: 0.0,
            speed: 0.0,
            mode: HorseMode::Normal,
            mode_remaining: 0.0,
            finished: false,
            finish_rank: None,
            finish_time: None,
            previous_rank: lane,
        }
    }

    /// Placeholder bettor name for an empty lane
    pub fn placeholder_name(lane: usize) -> String {
        format!("Player {}", lane + 1)
    }

    /// Reset to the starting gate, keeping id, colour and bettor
    pub fn reset(&mut self, lane: usize, start_speed: f64) {
        self.position = 0.0;
        self.speed = start_speed;
        self.mode = HorseMode::Normal;
        self.mode_remaining = 0.0;
        self.finished = false;
        self.finish_rank = None;
        self.finish_time = None;
        self.previous_rank = lane;
    }
}

/// Compact horse state for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseSnapshot {
    pub id: u32,
    pub position: f64,
    pub speed: f64,
    pub mode: HorseMode,
    pub finished: bool,
}

impl From<&Horse> for HorseSnapshot {
    fn from(horse: &Horse) -> Self {
        Self {
            id: horse.id,
            position: horse.position,
            speed: horse.speed,
            mode: horse.mode,
            finished: horse.finished,
        }
    }
}
