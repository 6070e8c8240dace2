//! Horse Derby terminal runner
//!
//! Plays one race headlessly on a virtual frame clock and prints the
//! countdown, mode changes, standings and the final podium.

use std::path::PathBuf;

use clap::Parser;
use derby_lib::{
    CountdownCue, GamePhase, GameServer, RaceConfig, RaceError, RaceEvent, RankEntry, RankTrend,
    ServerConfig,
};
use log::{error, info};

#[derive(Parser, Debug)]
#[command(name = "derby", about = "Run a horse race in the terminal")]
struct Args {
    /// Bettor names, one per lane in order
    #[arg(short, long, value_delimiter = ',')]
    names: Vec<String>,

    /// Seed for a reproducible race
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of lanes (overrides the config file)
    #[arg(long)]
    horses: Option<usize>,

    /// JSON race configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Virtual frame length in milliseconds
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f64,

    /// Print standings every this many refreshes
    #[arg(long, default_value_t = 30)]
    report_every: u64,
}

fn load_config(args: &Args) -> Result<RaceConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => RaceConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => RaceConfig::default(),
    };
    if let Some(horses) = args.horses {
        config.horse_count = horses;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn trend_marker(entry: &RankEntry) -> &'static str {
    match entry.trend() {
        RankTrend::Up => "▲",
        RankTrend::Down => "▼",
        RankTrend::Same => "-",
    }
}

fn print_standings(elapsed_ms: f64, standings: &[RankEntry]) {
    let line: Vec<String> = standings
        .iter()
        .map(|e| format!("{}{}#{}", e.standing + 1, trend_marker(e), e.horse_id))
        .collect();
    println!("[{:>6.2}s] {}", elapsed_ms / 1000.0, line.join("  "));
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    if !(args.frame_ms > 0.0) {
        return Err(RaceError::InvalidTuning("frame length must be positive".to_string()).into());
    }

    let mut server = GameServer::new(config, ServerConfig::default())?;
    server.set_names(&args.names)?;
    for horse in &server.race().horses {
        println!("Lane {}: {}", horse.id, horse.bettor_name);
    }

    let mut now = 0.0;
    let mut refreshes = 0u64;
    server.start(now)?;

    loop {
        let update = server.update(now);

        for cue in &update.cues {
            match cue {
                CountdownCue::Count(n) => println!("{n}..."),
                CountdownCue::Go => println!("GO!"),
            }
        }
        let tick_events = update.tick.iter().flat_map(|t| &t.events);
        for event in update.start_events.iter().chain(tick_events) {
            match event {
                RaceEvent::StartingBurst { horse_id } => {
                    println!("  #{horse_id} jumps out of the gate")
                }
                RaceEvent::ModeEntered { horse_id, mode } => {
                    println!("  #{horse_id} -> {mode:?}")
                }
                RaceEvent::HorseFinished { horse_id, rank, time } => {
                    println!("  #{horse_id} crosses the line in place {rank} ({time:.2}s)")
                }
                RaceEvent::RaceFinished => println!("All horses are home"),
            }
        }
        if let Some(standings) = &update.standings {
            refreshes += 1;
            if refreshes % args.report_every.max(1) == 0 {
                print_standings(now - server.race().started_at, standings);
            }
        }

        if update.phase == GamePhase::Results {
            break;
        }
        now += args.frame_ms;
    }

    println!();
    for result in server.results() {
        println!("{result}");
    }
    let stats = server.stats();
    info!(
        "{} frames, average tick {:.4}ms",
        stats.frames, stats.avg_tick_time_ms
    );
    Ok(())
}

fn main() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    if let Err(e) = run(Args::parse()) {
        error!("{e}");
        std::process::exit(1);
    }
}
