//! Ranking - Live standings and final results
//!
//! Finished horses sort first by finishing place, the rest by distance
//! covered. Ties fall back to lane order.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game_server::horse::{Horse, HorseMode};
use crate::game_server::race::RaceState;

/// Direction of a horse's move since the previous snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankTrend {
    Up,
    Down,
    Same,
}

/// One line of the standings board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub horse_id: u32,
    pub bettor_name: String,
    pub color: String,
    /// 0-based place in this snapshot
    pub standing: usize,
    pub position: f64,
    pub mode: HorseMode,
    pub finished: bool,
    pub finish_rank: Option<u32>,
    pub finish_time: Option<f64>,
    /// Places gained (positive) or lost (negative) since the previous snapshot
    pub rank_change: i64,
}

impl RankEntry {
    pub fn trend(&self) -> RankTrend {
        match self.rank_change.cmp(&0) {
            Ordering::Greater => RankTrend::Up,
            Ordering::Less => RankTrend::Down,
            Ordering::Equal => RankTrend::Same,
        }
    }
}

/// Final placing of a horse that crossed the line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub horse_id: u32,
    pub bettor_name: String,
    pub color: String,
    pub finish_rank: u32,
    /// Seconds since the start
    pub finish_time: f64,
}

impl RaceResult {
    pub fn formatted_time(&self) -> String {
        format!("{:.2}s", self.finish_time)
    }
}

impl fmt::Display for RaceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} horse {} ({}) {}",
            self.finish_rank,
            self.horse_id,
            self.bettor_name,
            self.formatted_time()
        )
    }
}

pub struct RankingComputer;

impl RankingComputer {
    /// Compute the standings and record them as the new baseline.
    ///
    /// Each horse's `previous_rank` is overwritten, so calling this twice in
    /// a row reports no movement the second time.
    pub fn snapshot(state: &mut RaceState) -> Vec<RankEntry> {
        let mut order: Vec<usize> = (0..state.horses.len()).collect();
        // Stable sort keeps lane order for equal keys
        order.sort_by(|&a, &b| Self::compare(&state.horses[a], &state.horses[b]));

        order
            .into_iter()
            .enumerate()
            .map(|(standing, lane)| {
                let horse = &mut state.horses[lane];
                let rank_change = horse.previous_rank as i64 - standing as i64;
                horse.previous_rank = standing;
                RankEntry {
                    horse_id: horse.id,
                    bettor_name: horse.bettor_name.clone(),
                    color: horse.color.clone(),
                    standing,
                    position: horse.position,
                    mode: horse.mode,
                    finished: horse.finished,
                    finish_rank: horse.finish_rank,
                    finish_time: horse.finish_time,
                    rank_change,
                }
            })
            .collect()
    }

    /// Finished horses ordered by finishing place
    pub fn results(state: &RaceState) -> Vec<RaceResult> {
        let mut results: Vec<RaceResult> = state
            .horses
            .iter()
            .filter_map(|h| match (h.finish_rank, h.finish_time) {
                (Some(finish_rank), Some(finish_time)) if h.finished => Some(RaceResult {
                    horse_id: h.id,
                    bettor_name: h.bettor_name.clone(),
                    color: h.color.clone(),
                    finish_rank,
                    finish_time,
                }),
                _ => None,
            })
            .collect();
        results.sort_by_key(|r| r.finish_rank);
        results
    }

    fn compare(a: &Horse, b: &Horse) -> Ordering {
        match (a.finished, b.finished) {
            (true, true) => a.finish_rank.cmp(&b.finish_rank),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => b.position.total_cmp(&a.position),
        }
    }
}
