//! Invariants of the race engine over arbitrary seeds and frame timings

use derby_lib::game_server::rng::from_seed;
use derby_lib::{RaceConfig, RaceState, RaceStatus, RankingComputer, SimulationEngine};
use proptest::prelude::*;

/// Frame gaps in ms; negative values model clock skew
fn frame_gaps() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![8 => 1.0f64..40.0, 1 => -20.0f64..0.0, 1 => 200.0f64..600.0],
        50..400,
    )
}

fn started(seed: u64, horses: usize) -> (SimulationEngine<rand_chacha::ChaCha8Rng>, RaceState) {
    let config = RaceConfig {
        horse_count: horses,
        seed: Some(seed),
        ..RaceConfig::default()
    };
    let mut engine = SimulationEngine::new(&config, from_seed(config.seed));
    let mut state = RaceState::new(horses, &[]).unwrap();
    engine.start(&mut state, 0.0).unwrap();
    (engine, state)
}

proptest! {
    #[test]
    fn positions_never_decrease_and_speed_stays_bounded(
        seed in any::<u64>(),
        horses in 1usize..9,
        gaps in frame_gaps(),
    ) {
        let (mut engine, mut state) = started(seed, horses);
        let (min, max) = (engine.tuning().min_speed, engine.tuning().max_speed);
        let mut now = 0.0;

        for gap in gaps {
            let before: Vec<f64> = state.horses.iter().map(|h| h.position).collect();
            now += gap;
            engine.tick(&mut state, now);
            for (horse, old) in state.horses.iter().zip(before) {
                prop_assert!(horse.position >= old);
                prop_assert!(horse.speed >= min && horse.speed <= max);
                if !horse.finished {
                    prop_assert!(horse.position < engine.tuning().winning_distance);
                }
            }
        }
    }

    #[test]
    fn finish_ranks_are_contiguous(
        seed in any::<u64>(),
        horses in 1usize..9,
        gaps in frame_gaps(),
    ) {
        let (mut engine, mut state) = started(seed, horses);
        let mut now = 0.0;

        for gap in gaps {
            now += gap;
            engine.tick(&mut state, now);

            let mut ranks: Vec<u32> = state.horses.iter().filter_map(|h| h.finish_rank).collect();
            ranks.sort_unstable();
            let expected: Vec<u32> = (1..=state.finished_count() as u32).collect();
            prop_assert_eq!(ranks, expected);
            prop_assert!(state.horses.iter().all(|h| h.finished == h.finish_time.is_some()));
        }
    }

    #[test]
    fn finished_horses_stay_put(seed in any::<u64>(), gaps in frame_gaps()) {
        let (mut engine, mut state) = started(seed, 6);
        let mut now = 0.0;
        let mut frozen: Vec<Option<derby_lib::Horse>> = vec![None; 6];

        for gap in gaps {
            now += gap;
            engine.tick(&mut state, now);
            for (lane, horse) in state.horses.iter().enumerate() {
                if let Some(snapshot) = &frozen[lane] {
                    prop_assert_eq!(snapshot, horse);
                } else if horse.finished {
                    frozen[lane] = Some(horse.clone());
                }
            }
        }
    }

    #[test]
    fn seeded_runs_produce_identical_standings(seed in any::<u64>(), gaps in frame_gaps()) {
        let run = |gaps: &[f64]| {
            let (mut engine, mut state) = started(seed, 6);
            let mut now = 0.0;
            let mut boards = Vec::new();
            for gap in gaps {
                now += gap;
                engine.tick(&mut state, now);
                boards.push(RankingComputer::snapshot(&mut state));
            }
            boards
        };
        prop_assert_eq!(run(&gaps), run(&gaps));
    }

    #[test]
    fn repeated_snapshot_reports_no_movement(seed in any::<u64>(), gaps in frame_gaps()) {
        let (mut engine, mut state) = started(seed, 6);
        let mut now = 0.0;
        for gap in gaps {
            now += gap;
            engine.tick(&mut state, now);
        }
        RankingComputer::snapshot(&mut state);
        let second = RankingComputer::snapshot(&mut state);
        prop_assert!(second.iter().all(|e| e.rank_change == 0));
    }
}

#[test]
fn fixed_cadence_race_completes_with_exact_finish_times() {
    let config = RaceConfig {
        seed: Some(6),
        start_burst: derby_lib::StartBurst {
            horses: 0,
            ..Default::default()
        },
        ..RaceConfig::default()
    };
    let mut engine = SimulationEngine::new(&config, from_seed(config.seed));
    let mut state = RaceState::new(6, &[]).unwrap();
    engine.start(&mut state, 500.0).unwrap();
    assert!(state.horses.iter().all(|h| h.speed == config.tuning.min_speed));

    let mut now = 500.0;
    let mut stamps = Vec::new();
    while state.status == RaceStatus::Racing {
        now += 16.0;
        let finished_before = state.finished_count();
        engine.tick(&mut state, now);
        if state.finished_count() > finished_before {
            stamps.push(now);
        }
        assert!(now < 1.0e7, "race did not finish");
    }

    let results = RankingComputer::results(&state);
    assert_eq!(results.iter().map(|r| r.finish_rank).collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6]);
    for result in &results {
        assert!(stamps.iter().any(|s| (s - 500.0) / 1000.0 == result.finish_time));
    }
    assert!(results.windows(2).all(|w| w[0].finish_time <= w[1].finish_time));

    let final_board = RankingComputer::snapshot(&mut state);
    assert_eq!(
        final_board.iter().map(|e| e.horse_id).collect::<Vec<_>>(),
        results.iter().map(|r| r.horse_id).collect::<Vec<_>>()
    );
}
