//! Countdown - Timed cue sequence shown before the gates open

use serde::{Deserialize, Serialize};

/// A cue for the renderer to display or play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownCue {
    Count(u32),
    Go,
}

/// Counts down from `from`, shows `Go`, then completes one step later.
///
/// Driven by the same timestamps as the engine. Cue `i` becomes due at
/// `started_at + i * step_ms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    started_at: f64,
    step_ms: f64,
    cues: Vec<CountdownCue>,
    emitted: usize,
}

impl Countdown {
    pub fn new(started_at: f64, step_ms: f64, from: u32) -> Self {
        let mut cues: Vec<CountdownCue> = (1..=from).rev().map(CountdownCue::Count).collect();
        cues.push(CountdownCue::Go);
        Self {
            started_at,
            step_ms,
            cues,
            emitted: 0,
        }
    }

    /// Cues that became due since the previous poll, in order
    pub fn poll(&mut self, now: f64) -> Vec<CountdownCue> {
        let elapsed = (now - self.started_at).max(0.0);
        let due = if self.step_ms > 0.0 {
            ((elapsed / self.step_ms).floor() as usize)
                .saturating_add(1)
                .min(self.cues.len())
        } else {
            self.cues.len()
        };
        let fresh = self.cues[self.emitted.min(due)..due].to_vec();
        self.emitted = self.emitted.max(due);
        fresh
    }

    /// Whether the step after `Go` has elapsed
    pub fn is_complete(&self, now: f64) -> bool {
        now - self.started_at >= self.step_ms * self.cues.len() as f64
    }

    /// Timestamp at which the race should start
    pub fn ends_at(&self) -> f64 {
        self.started_at + self.step_ms * self.cues.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cues_follow_the_clock() {
        let mut countdown = Countdown::new(1000.0, 1000.0, 3);
        assert_eq!(countdown.poll(1000.0), vec![CountdownCue::Count(3)]);
        assert!(countdown.poll(1500.0).is_empty());
        assert_eq!(countdown.poll(2000.0), vec![CountdownCue::Count(2)]);
        assert_eq!(
            countdown.poll(4100.0),
            vec![CountdownCue::Count(1), CountdownCue::Go]
        );
        assert!(countdown.poll(9000.0).is_empty());
    }

    #[test]
    fn test_completes_one_step_after_go() {
        let countdown = Countdown::new(0.0, 1000.0, 3);
        assert!(!countdown.is_complete(3999.0));
        assert!(countdown.is_complete(4000.0));
        assert_eq!(countdown.ends_at(), 4000.0);
    }

    #[test]
    fn test_zero_step_fires_everything() {
        let mut countdown = Countdown::new(0.0, 0.0, 2);
        assert_eq!(
            countdown.poll(0.0),
            vec![CountdownCue::Count(2), CountdownCue::Count(1), CountdownCue::Go]
        );
        assert!(countdown.is_complete(0.0));
    }

    #[test]
    fn test_tiny_step_does_not_overflow() {
        let mut countdown = Countdown::new(0.0, 1.0e-300, 3);
        assert_eq!(countdown.poll(1.0e10).len(), 4);
        assert!(countdown.is_complete(1.0e10));
    }
}
