//! Horse Derby - race engine
//!
//! Bettors pick lanes, the gates open, and a randomized simulation runs the
//! horses to the line. Rendering and sound live outside this crate; they
//! feed timestamps in and draw the events and standings that come out.
//!
//! ```no_run
//! use derby_lib::{GameServer, RaceConfig, ServerConfig};
//!
//! let mut server = GameServer::new(RaceConfig::default(), ServerConfig::default())?;
//! server.set_names(&["Mina".to_string(), "Jun".to_string()])?;
//! server.start(0.0)?;
//! let _frame = server.update(16.0);
//! # Ok::<(), derby_lib::RaceError>(())
//! ```

pub mod error;
pub mod game_server;

pub use error::RaceError;
pub use game_server::{
    Countdown, CountdownCue, FrameUpdate, GamePhase, GameServer, Horse, HorseMode,
    HorseSnapshot, RaceConfig, RaceEvent, RaceResult, RaceRng, RaceState, RaceStatus,
    RankEntry, RankTrend, RankingComputer, ServerConfig, ServerStats, SimulationEngine,
    StartBurst, TickOutcome, TickResult, Tuning,
};
