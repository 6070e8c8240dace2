//! Race - Race configuration and state
//!
//! Holds the lanes, the race status and the two timestamps the engine
//! needs. No simulation logic lives here.

use serde::{Deserialize, Serialize};

use crate::error::RaceError;
use crate::game_server::horse::{Horse, HorseSnapshot};

/// Simulation constants
///
/// Times are in milliseconds, distances in percent of track length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub min_speed: f64,
    pub max_speed: f64,
    /// Width of the uniform base acceleration draw
    pub accel_variance: f64,
    pub distance_scale: f64,
    /// Position at which a horse finishes
    pub winning_distance: f64,
    /// Frame length that one unit of speed is normalised to
    pub reference_tick_ms: f64,

    /// Re-roll draws below this enter `Boost`
    pub boost_chance: f64,
    /// Re-roll draws in `[boost_chance, fatigue_threshold)` enter `Fatigue`
    pub fatigue_threshold: f64,
    pub boost_duration_ms: (f64, f64),
    pub fatigue_duration_ms: (f64, f64),
    pub normal_duration_ms: (f64, f64),
    pub boost_accel: f64,
    pub fatigue_accel: f64,

    /// Gap to the leader beyond which stragglers get help
    pub gap_threshold: f64,
    pub catch_up_bonus: f64,
    pub leader_nervousness_chance: f64,
    pub leader_nervousness_penalty: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            min_speed: 0.1,
            max_speed: 0.6,
            accel_variance: 0.02,
            distance_scale: 0.35,
            winning_distance: 92.0,
            reference_tick_ms: 16.0,
            boost_chance: 0.05,
            fatigue_threshold: 0.15,
            boost_duration_ms: (2000.0, 5000.0),
            fatigue_duration_ms: (2000.0, 4000.0),
            normal_duration_ms: (1000.0, 3000.0),
            boost_accel: 0.015,
            fatigue_accel: -0.008,
            gap_threshold: 25.0,
            catch_up_bonus: 0.005,
            leader_nervousness_chance: 0.05,
            leader_nervousness_penalty: -0.01,
        }
    }
}

impl Tuning {
    fn validate(&self) -> Result<(), RaceError> {
        let invalid = |msg: String| Err(RaceError::InvalidTuning(msg));

        if !(self.min_speed >= 0.0 && self.min_speed <= self.max_speed && self.max_speed > 0.0) {
            return invalid(format!(
                "speed range [{}, {}] is empty, negative or stalled",
                self.min_speed, self.max_speed
            ));
        }
        for (name, value) in [
            ("winning_distance", self.winning_distance),
            ("distance_scale", self.distance_scale),
            ("reference_tick_ms", self.reference_tick_ms),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        if !(self.accel_variance >= 0.0) {
            return invalid(format!("accel_variance must be >= 0, got {}", self.accel_variance));
        }
        for (name, p) in [
            ("boost_chance", self.boost_chance),
            ("leader_nervousness_chance", self.leader_nervousness_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be within [0, 1], got {p}"));
            }
        }
        if !(self.boost_chance <= self.fatigue_threshold && self.fatigue_threshold <= 1.0) {
            return invalid(format!(
                "fatigue_threshold must be within [boost_chance, 1], got {}",
                self.fatigue_threshold
            ));
        }
        for (name, (low, high)) in [
            ("boost_duration_ms", self.boost_duration_ms),
            ("fatigue_duration_ms", self.fatigue_duration_ms),
            ("normal_duration_ms", self.normal_duration_ms),
        ] {
            // A zero-length mode would re-roll every tick forever
            if !(low > 0.0 && low <= high) {
                return invalid(format!("{name} range [{low}, {high}) is invalid"));
            }
        }
        Ok(())
    }
}

/// Head start handed to a few random horses when the gates open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartBurst {
    /// How many horses get the burst (0 disables it)
    pub horses: usize,
    pub duration_ms: f64,
    pub speed: f64,
}

impl Default for StartBurst {
    fn default() -> Self {
        Self {
            horses: 3,
            duration_ms: 200.0,
            speed: 0.2,
        }
    }
}

/// Race configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Number of lanes
    pub horse_count: usize,
    /// Seed for deterministic replay; entropy when absent
    pub seed: Option<u64>,
    pub tuning: Tuning,
    pub start_burst: StartBurst,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            horse_count: 6,
            seed: None,
            tuning: Tuning::default(),
            start_burst: StartBurst::default(),
        }
    }
}

impl RaceConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, RaceError> {
        let config: RaceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RaceError> {
        if self.horse_count == 0 {
            return Err(RaceError::InvalidHorseCount(self.horse_count));
        }
        self.tuning.validate()?;
        let burst = &self.start_burst;
        let speeds = self.tuning.min_speed..=self.tuning.max_speed;
        if burst.horses > 0 && !(burst.duration_ms >= 0.0 && speeds.contains(&burst.speed)) {
            return Err(RaceError::InvalidTuning(format!(
                "start burst needs duration >= 0 and speed within [{}, {}], got {}ms at {}",
                self.tuning.min_speed, self.tuning.max_speed, burst.duration_ms, burst.speed
            )));
        }
        Ok(())
    }
}

/// Race status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaceStatus {
    Setup,
    Racing,
    Finished,
}

/// Complete race state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    /// Horses in lane order
    pub horses: Vec<Horse>,
    pub status: RaceStatus,
    /// Timestamp (ms) at which racing began
    pub started_at: f64,
    /// Timestamp (ms) of the last processed tick
    pub last_tick_at: f64,
}

impl RaceState {
    /// Create a race in `Setup` with one horse per lane.
    ///
    /// Names are trimmed and blank or missing lanes get a placeholder.
    pub fn new(horse_count: usize, names: &[String]) -> Result<Self, RaceError> {
        if horse_count == 0 {
            return Err(RaceError::InvalidHorseCount(horse_count));
        }
        if names.len() > horse_count {
            return Err(RaceError::TooManyNames {
                lanes: horse_count,
                got: names.len(),
            });
        }

        let horses = (0..horse_count)
            .map(|lane| {
                let name = names
                    .get(lane)
                    .map(|n| n.trim())
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| Horse::placeholder_name(lane));
                Horse::new(lane, name)
            })
            .collect();

        Ok(Self {
            horses,
            status: RaceStatus::Setup,
            started_at: 0.0,
            last_tick_at: 0.0,
        })
    }

    /// Put every horse back at the gate and return to `Setup`; names survive
    pub fn reset(&mut self, start_speed: f64) {
        for (lane, horse) in self.horses.iter_mut().enumerate() {
            horse.reset(lane, start_speed);
        }
        self.status = RaceStatus::Setup;
        self.started_at = 0.0;
        self.last_tick_at = 0.0;
    }

    pub fn finished_count(&self) -> usize {
        self.horses.iter().filter(|h| h.finished).count()
    }

    pub fn active_count(&self) -> usize {
        self.horses.len() - self.finished_count()
    }

    /// Lane index of the furthest unfinished horse; earlier lanes win ties
    pub fn leader(&self) -> Option<usize> {
        self.horses
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.finished)
            .fold(None, |best: Option<(usize, f64)>, (lane, h)| match best {
                Some((_, pos)) if pos >= h.position => best,
                _ => Some((lane, h.position)),
            })
            .map(|(lane, _)| lane)
    }

    /// Get horse by id
    pub fn get_horse(&self, id: u32) -> Option<&Horse> {
        self.horses.iter().find(|h| h.id == id)
    }

    /// Compact per-lane view for rendering
    pub fn horse_snapshots(&self) -> Vec<HorseSnapshot> {
        self.horses.iter().map(HorseSnapshot::from).collect()
    }
}
