//! RNG - The single source of randomness for a race
//!
//! Every random draw made by the engine and the driver goes through one
//! injected `RaceRng`, so a seeded generator replays a race exactly.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform random capability used by the simulation
pub trait RaceRng {
    /// Next value drawn uniformly from `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Value drawn uniformly from `[low, high)`
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_unit() * (high - low)
    }
}

impl RaceRng for ChaCha8Rng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl RaceRng for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

impl RaceRng for ThreadRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Build the race generator: seeded when a seed is given, entropy otherwise
pub fn from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Replays a fixed list of draws; falls back to 0.5 once exhausted.
#[cfg(test)]
pub(crate) struct ScriptedRng {
    draws: std::collections::VecDeque<f64>,
}

#[cfg(test)]
impl ScriptedRng {
    pub(crate) fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RaceRng for ScriptedRng {
    fn next_unit(&mut self) -> f64 {
        self.draws.pop_front().unwrap_or(0.5)
    }
}
