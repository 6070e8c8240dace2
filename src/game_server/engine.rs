//! Engine - Per-tick race simulation
//!
//! Advances a `RaceState` by the wall-clock time elapsed since the previous
//! tick: mode re-roll, stochastic acceleration, rubber-banding, speed clamp,
//! position integration and finish detection, in lane order.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::game_server::horse::HorseMode;
use crate::game_server::race::{RaceConfig, RaceState, RaceStatus, StartBurst, Tuning};
use crate::game_server::rng::RaceRng;

/// Advisory events for renderers and sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaceEvent {
    /// Horse got the head start when the gates opened
    StartingBurst { horse_id: u32 },
    /// Horse re-rolled into `Boost` or `Fatigue`
    ModeEntered { horse_id: u32, mode: HorseMode },
    HorseFinished { horse_id: u32, rank: u32, time: f64 },
    RaceFinished,
}

/// What a tick call did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// State advanced and horses are still running
    Advanced,
    /// The last horse crossed the line on this tick
    RaceFinished,
    /// Race was not in `Racing`; nothing changed
    NotRacing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    pub outcome: TickOutcome,
    pub events: Vec<RaceEvent>,
}

impl TickResult {
    fn not_racing() -> Self {
        Self {
            outcome: TickOutcome::NotRacing,
            events: Vec::new(),
        }
    }

    pub fn race_finished(&self) -> bool {
        self.outcome == TickOutcome::RaceFinished
    }
}

/// Race simulation driven by externally supplied timestamps
pub struct SimulationEngine<R: RaceRng> {
    tuning: Tuning,
    start_burst: StartBurst,
    rng: R,
}

impl<R: RaceRng> SimulationEngine<R> {
    pub fn new(config: &RaceConfig, rng: R) -> Self {
        Self {
            tuning: config.tuning.clone(),
            start_burst: config.start_burst.clone(),
            rng,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Open the gates at `now`.
    ///
    /// Resets every horse, moves the race to `Racing` and hands the starting
    /// burst to randomly chosen lanes. Returns `None` unless the race is in
    /// `Setup`.
    pub fn start(&mut self, state: &mut RaceState, now: f64) -> Option<Vec<RaceEvent>> {
        if state.status != RaceStatus::Setup {
            return None;
        }

        state.reset(self.tuning.min_speed);
        state.status = RaceStatus::Racing;
        state.started_at = now;
        state.last_tick_at = now;

        let mut events = Vec::new();
        let mut lanes: Vec<usize> = (0..state.horses.len()).collect();
        let picks = self.start_burst.horses.min(lanes.len());
        // Partial Fisher-Yates: the first `picks` slots end up a uniform sample
        for i in 0..picks {
            let j = i + ((self.rng.next_unit() * (lanes.len() - i) as f64) as usize)
                .min(lanes.len() - i - 1);
            lanes.swap(i, j);

            let horse = &mut state.horses[lanes[i]];
            horse.mode = HorseMode::Boost;
            horse.mode_remaining = self.start_burst.duration_ms;
            horse.speed = self.start_burst.speed;
            events.push(RaceEvent::StartingBurst { horse_id: horse.id });
        }

        info!(
            "Race started with {} horses ({} starting bursts)",
            state.horses.len(),
            picks
        );
        Some(events)
    }

    /// Advance the race to `now` (milliseconds).
    ///
    /// A no-op returning `TickOutcome::NotRacing` unless the race is
    /// `Racing`. Time running backwards is treated as no elapsed time, and a
    /// non-finite `now` is skipped.
    pub fn tick(&mut self, state: &mut RaceState, now: f64) -> TickResult {
        if state.status != RaceStatus::Racing {
            return TickResult::not_racing();
        }

        if !now.is_finite() {
            warn!("Ignoring non-finite tick timestamp {now}");
            return TickResult {
                outcome: TickOutcome::Advanced,
                events: Vec::new(),
            };
        }
        let mut delta = now - state.last_tick_at;
        if delta < 0.0 {
            warn!("Clock went backwards by {:.3}ms, clamping delta to 0", -delta);
            delta = 0.0;
        }
        state.last_tick_at = now;

        let tuning = &self.tuning;
        let rng = &mut self.rng;
        let mut events = Vec::new();

        // Leader is fixed at the start of the tick; its position is read live
        let leader = state.leader();
        let contenders = state.active_count();
        let mut finished_count = state.horses.len() - contenders;

        for lane in 0..state.horses.len() {
            if state.horses[lane].finished {
                continue;
            }
            let leader_position = leader.map(|l| state.horses[l].position);
            let horse = &mut state.horses[lane];

            horse.mode_remaining -= delta;
            if horse.mode_remaining <= 0.0 {
                let (mode, range) = roll_mode(tuning, rng.next_unit());
                horse.mode = mode;
                horse.mode_remaining = rng.uniform(range.0, range.1);
                if mode != HorseMode::Normal {
                    debug!("Horse {} entered {:?}", horse.id, mode);
                    events.push(RaceEvent::ModeEntered {
                        horse_id: horse.id,
                        mode,
                    });
                }
            }

            let half = tuning.accel_variance / 2.0;
            let mut accel = rng.uniform(-half, half);
            accel += match horse.mode {
                HorseMode::Boost => tuning.boost_accel,
                HorseMode::Fatigue => tuning.fatigue_accel,
                HorseMode::Normal => 0.0,
            };

            match (leader, leader_position) {
                (Some(l), _) if l == lane => {
                    if contenders > 1 && rng.next_unit() < tuning.leader_nervousness_chance {
                        accel += tuning.leader_nervousness_penalty;
                    }
                }
                (Some(_), Some(lead)) if lead - horse.position > tuning.gap_threshold => {
                    accel += tuning.catch_up_bonus;
                }
                _ => {}
            }

            horse.speed = (horse.speed + accel).clamp(tuning.min_speed, tuning.max_speed);
            horse.position +=
                horse.speed * (delta / tuning.reference_tick_ms) * tuning.distance_scale;

            if horse.position >= tuning.winning_distance {
                finished_count += 1;
                let rank = finished_count as u32;
                let time = (now - state.started_at) / 1000.0;
                horse.finished = true;
                horse.finish_rank = Some(rank);
                horse.finish_time = Some(time);
                debug!("Horse {} finished #{} in {:.2}s", horse.id, rank, time);
                events.push(RaceEvent::HorseFinished {
                    horse_id: horse.id,
                    rank,
                    time,
                });
            }
        }

        if finished_count == state.horses.len() {
            state.status = RaceStatus::Finished;
            info!("Race finished");
            events.push(RaceEvent::RaceFinished);
            return TickResult {
                outcome: TickOutcome::RaceFinished,
                events,
            };
        }

        TickResult {
            outcome: TickOutcome::Advanced,
            events,
        }
    }
}

/// Map a unit draw to the next mode and its duration range
fn roll_mode(tuning: &Tuning, r: f64) -> (HorseMode, (f64, f64)) {
    if r < tuning.boost_chance {
        (HorseMode::Boost, tuning.boost_duration_ms)
    } else if r < tuning.fatigue_threshold {
        (HorseMode::Fatigue, tuning.fatigue_duration_ms)
    } else {
        (HorseMode::Normal, tuning.normal_duration_ms)
    }
}
