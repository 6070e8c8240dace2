//! Game Server Module
//!
//! Horse race simulation: lanes and race state, the per-tick engine,
//! standings, and a frame driver that ties them to a countdown.

pub mod countdown;
pub mod engine;
pub mod horse;
pub mod race;
pub mod ranking;
pub mod rng;
pub mod simulation;

pub use countdown::{Countdown, CountdownCue};
pub use engine::{RaceEvent, SimulationEngine, TickOutcome, TickResult};
pub use horse::{Horse, HorseMode, HorseSnapshot};
pub use race::{RaceConfig, RaceState, RaceStatus, StartBurst, Tuning};
pub use ranking::{RaceResult, RankEntry, RankTrend, RankingComputer};
pub use rng::RaceRng;
pub use simulation::{FrameUpdate, GamePhase, GameServer, ServerConfig, ServerStats};
