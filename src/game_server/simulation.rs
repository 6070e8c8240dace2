//! Simulation - Game driver
//!
//! Owns one race and walks it through setup, countdown, racing and results.
//! The caller feeds it a timestamp per rendered frame and draws whatever
//! comes back.

use std::collections::VecDeque;
use std::time::Instant;

use log::info;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::RaceError;
use crate::game_server::countdown::{Countdown, CountdownCue};
use crate::game_server::engine::{RaceEvent, SimulationEngine, TickResult};
use crate::game_server::horse::HorseSnapshot;
use crate::game_server::race::{RaceConfig, RaceState};
use crate::game_server::ranking::{RaceResult, RankEntry, RankingComputer};
use crate::game_server::rng::{self, RaceRng};

/// Driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Time between countdown cues (ms)
    pub countdown_step_ms: f64,
    /// Number shown first in the countdown
    pub countdown_from: u32,
    /// Live standings are refreshed every this many racing frames
    pub ranking_interval_frames: u64,
    /// Frames averaged for tick timing stats
    pub stats_window: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            countdown_step_ms: 1000.0,
            countdown_from: 3,
            ranking_interval_frames: 10,
            stats_window: 60,
        }
    }
}

/// Game phase as seen by the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Setup,
    Countdown,
    Racing,
    Results,
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::Setup => "Setup",
            GamePhase::Countdown => "Countdown",
            GamePhase::Racing => "Racing",
            GamePhase::Results => "Results",
        }
    }
}

/// Everything a renderer needs from one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameUpdate {
    pub phase: GamePhase,
    /// Countdown cues that became due this frame
    pub cues: Vec<CountdownCue>,
    /// Events from opening the gates, set on the frame racing begins
    pub start_events: Vec<RaceEvent>,
    pub tick: Option<TickResult>,
    /// Per-lane kinematics after this frame's tick
    pub lanes: Vec<HorseSnapshot>,
    /// Standings, when this frame refreshed them
    pub standings: Option<Vec<RankEntry>>,
}

impl FrameUpdate {
    fn idle(phase: GamePhase) -> Self {
        Self {
            phase,
            cues: Vec::new(),
            start_events: Vec::new(),
            tick: None,
            lanes: Vec::new(),
            standings: None,
        }
    }
}

/// Server statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStats {
    pub frames: u64,
    pub avg_tick_time_ms: f32,
    pub horse_count: usize,
    pub finished_count: usize,
    pub phase: GamePhase,
}

/// Main game driver
pub struct GameServer<R: RaceRng = ChaCha8Rng> {
    config: RaceConfig,
    server_config: ServerConfig,
    phase: GamePhase,
    race: RaceState,
    engine: SimulationEngine<R>,
    countdown: Option<Countdown>,
    /// Racing frames processed
    frames: u64,
    tick_times: VecDeque<f32>,
}

impl GameServer<ChaCha8Rng> {
    /// Create a game whose randomness follows `config.seed`
    pub fn new(config: RaceConfig, server_config: ServerConfig) -> Result<Self, RaceError> {
        let rng = rng::from_seed(config.seed);
        Self::with_rng(config, server_config, rng)
    }
}

impl<R: RaceRng> GameServer<R> {
    pub fn with_rng(
        config: RaceConfig,
        server_config: ServerConfig,
        rng: R,
    ) -> Result<Self, RaceError> {
        config.validate()?;
        let mut race = RaceState::new(config.horse_count, &[])?;
        race.reset(config.tuning.min_speed);
        let engine = SimulationEngine::new(&config, rng);
        let tick_times = VecDeque::with_capacity(server_config.stats_window);

        Ok(Self {
            config,
            server_config,
            phase: GamePhase::Setup,
            race,
            engine,
            countdown: None,
            frames: 0,
            tick_times,
        })
    }

    /// Assign bettor names to lanes; only allowed before the start
    pub fn set_names(&mut self, names: &[String]) -> Result<(), RaceError> {
        self.expect_phase(GamePhase::Setup)?;
        let mut race = RaceState::new(self.config.horse_count, names)?;
        race.reset(self.config.tuning.min_speed);
        self.race = race;
        Ok(())
    }

    /// Begin the countdown at `now`
    pub fn start(&mut self, now: f64) -> Result<(), RaceError> {
        self.expect_phase(GamePhase::Setup)?;
        self.countdown = Some(Countdown::new(
            now,
            self.server_config.countdown_step_ms,
            self.server_config.countdown_from,
        ));
        self.phase = GamePhase::Countdown;
        info!("Countdown started for {} horses", self.race.horses.len());
        Ok(())
    }

    /// Process one frame at timestamp `now` (ms)
    pub fn update(&mut self, now: f64) -> FrameUpdate {
        match self.phase {
            GamePhase::Setup | GamePhase::Results => FrameUpdate::idle(self.phase),
            GamePhase::Countdown => self.update_countdown(now),
            GamePhase::Racing => self.update_racing(now),
        }
    }

    fn update_countdown(&mut self, now: f64) -> FrameUpdate {
        let Some(countdown) = self.countdown.as_mut() else {
            return FrameUpdate::idle(self.phase);
        };
        let cues = countdown.poll(now);
        let mut update = FrameUpdate::idle(self.phase);
        update.cues = cues;

        if countdown.is_complete(now) {
            self.countdown = None;
            update.start_events = self
                .engine
                .start(&mut self.race, now)
                .unwrap_or_default();
            self.phase = GamePhase::Racing;
            update.phase = self.phase;
            update.standings = Some(RankingComputer::snapshot(&mut self.race));
        }
        update
    }

    fn update_racing(&mut self, now: f64) -> FrameUpdate {
        let tick_start = Instant::now();
        let tick = self.engine.tick(&mut self.race, now);
        self.record_tick_time(tick_start.elapsed().as_secs_f32() * 1000.0);
        self.frames += 1;

        let mut update = FrameUpdate::idle(self.phase);
        let interval = self.server_config.ranking_interval_frames.max(1);
        if tick.race_finished() {
            self.phase = GamePhase::Results;
            update.phase = self.phase;
            update.standings = Some(RankingComputer::snapshot(&mut self.race));
            info!("Results ready after {} frames", self.frames);
        } else if self.frames % interval == 0 {
            update.standings = Some(RankingComputer::snapshot(&mut self.race));
        }
        update.tick = Some(tick);
        update.lanes = self.race.horse_snapshots();
        update
    }

    fn record_tick_time(&mut self, ms: f32) {
        if self.server_config.stats_window == 0 {
            return;
        }
        if self.tick_times.len() == self.server_config.stats_window {
            self.tick_times.pop_front();
        }
        self.tick_times.push_back(ms);
    }

    fn expect_phase(&self, expected: GamePhase) -> Result<(), RaceError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RaceError::InvalidPhase {
                expected: expected.name(),
                actual: self.phase.name(),
            })
        }
    }

    /// Current standings; also moves the rank-change baseline
    pub fn standings(&mut self) -> Vec<RankEntry> {
        RankingComputer::snapshot(&mut self.race)
    }

    /// Finishers so far, by place
    pub fn results(&self) -> Vec<RaceResult> {
        RankingComputer::results(&self.race)
    }

    /// Get server statistics
    pub fn stats(&self) -> ServerStats {
        let avg_tick_time_ms = if self.tick_times.is_empty() {
            0.0
        } else {
            self.tick_times.iter().sum::<f32>() / self.tick_times.len() as f32
        };

        ServerStats {
            frames: self.frames,
            avg_tick_time_ms,
            horse_count: self.race.horses.len(),
            finished_count: self.race.finished_count(),
            phase: self.phase,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn race(&self) -> &RaceState {
        &self.race
    }

    /// Back to setup with a fresh race; bettor names are kept
    pub fn reset(&mut self) {
        self.race.reset(self.config.tuning.min_speed);
        self.phase = GamePhase::Setup;
        self.countdown = None;
        self.frames = 0;
        self.tick_times.clear();
        info!("Game reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_server::race::RaceStatus;

    fn server(seed: u64) -> GameServer {
        let config = RaceConfig {
            seed: Some(seed),
            ..RaceConfig::default()
        };
        GameServer::new(config, ServerConfig::default()).unwrap()
    }

    /// Drive frames every 16ms until results or the frame budget runs out
    fn run_to_results(server: &mut GameServer, mut now: f64) -> (f64, Vec<FrameUpdate>) {
        let mut updates = Vec::new();
        for _ in 0..200_000 {
            now += 16.0;
            let update = server.update(now);
            let done = update.phase == GamePhase::Results;
            updates.push(update);
            if done {
                break;
            }
        }
        (now, updates)
    }

    #[test]
    fn test_countdown_then_race() {
        let mut server = server(17);
        server.start(0.0).unwrap();
        assert_eq!(server.phase(), GamePhase::Countdown);

        let first = server.update(0.0);
        assert_eq!(first.cues, vec![CountdownCue::Count(3)]);
        assert_eq!(
            server.update(3000.0).cues,
            vec![CountdownCue::Count(2), CountdownCue::Count(1), CountdownCue::Go]
        );
        assert_eq!(server.race().status, RaceStatus::Setup);

        let open = server.update(4000.0);
        assert_eq!(open.phase, GamePhase::Racing);
        assert_eq!(open.start_events.len(), 3);
        assert_eq!(server.race().started_at, 4000.0);
        assert_eq!(server.race().status, RaceStatus::Racing);
    }

    #[test]
    fn test_full_game_reaches_results() {
        let mut server = server(99);
        server.start(0.0).unwrap();
        server.update(4000.0);

        let (_, updates) = run_to_results(&mut server, 4000.0);
        assert_eq!(server.phase(), GamePhase::Results);

        let last = updates.last().unwrap();
        let standings = last.standings.as_ref().unwrap();
        let ranks: Vec<_> = standings.iter().map(|e| e.finish_rank).collect();
        assert_eq!(ranks, (1..=6).map(Some).collect::<Vec<_>>());

        let results = server.results();
        assert_eq!(results.len(), 6);
        assert!(results.windows(2).all(|w| w[0].finish_rank < w[1].finish_rank));

        let stats = server.stats();
        assert_eq!(stats.finished_count, 6);
        assert_eq!(stats.frames, updates.len() as u64);
        assert_eq!(stats.phase, GamePhase::Results);
        assert!(last.lanes.iter().all(|lane| lane.finished && lane.position >= 92.0));
    }

    #[test]
    fn test_live_standings_are_sampled() {
        let mut server = server(5);
        server.start(0.0).unwrap();
        server.update(4000.0);

        let mut now = 4000.0;
        let mut refreshed = Vec::new();
        for frame in 1..=30 {
            now += 16.0;
            let update = server.update(now);
            if update.standings.is_some() {
                refreshed.push(frame);
            }
        }
        assert_eq!(refreshed, [10, 20, 30]);
    }

    #[test]
    fn test_phase_guards() {
        let mut server = server(1);
        server.start(0.0).unwrap();
        assert!(matches!(
            server.start(10.0),
            Err(RaceError::InvalidPhase { expected: "Setup", actual: "Countdown" })
        ));
        assert!(server.set_names(&["late".to_string()]).is_err());
        assert_eq!(FrameUpdate::idle(GamePhase::Setup).phase, GamePhase::Setup);
    }

    #[test]
    fn test_reset_keeps_names_and_replays() {
        let mut server = server(23);
        server
            .set_names(&["Ari".to_string(), "".to_string(), "Sol".to_string()])
            .unwrap();
        server.start(0.0).unwrap();
        server.update(4000.0);
        run_to_results(&mut server, 4000.0);

        server.reset();
        assert_eq!(server.phase(), GamePhase::Setup);
        assert_eq!(server.stats().frames, 0);
        let race = server.race();
        assert_eq!(race.status, RaceStatus::Setup);
        assert_eq!(race.horses[0].bettor_name, "Ari");
        assert_eq!(race.horses[1].bettor_name, "Player 2");
        assert_eq!(race.horses[2].bettor_name, "Sol");
        assert!(race.horses.iter().all(|h| !h.finished && h.position == 0.0));

        server.start(10_000.0).unwrap();
        server.update(14_000.0);
        run_to_results(&mut server, 14_000.0);
        assert_eq!(server.results().len(), 6);
    }

    #[test]
    fn test_seeded_games_replay_identically() {
        let play = |seed| {
            let mut server = server(seed);
            server.start(0.0).unwrap();
            server.update(4000.0);
            let (_, updates) = run_to_results(&mut server, 4000.0);
            updates
        };
        assert_eq!(play(314), play(314));
    }
}
