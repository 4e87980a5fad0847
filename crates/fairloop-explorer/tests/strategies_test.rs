//! Integration tests for the base strategies
//!
//! Exhaustive, reduced and random exploration of the bank program, and exact
//! reproduction of a recorded schedule.

mod common;

use common::{config, init_tracing, Bank, PingPong, LOST_UPDATE};
use fairloop_core::BugKind;
use fairloop_explorer::domain::{ReplayStrategy, StrategyKind, TraceRecord};
use fairloop_explorer::{ScheduleTrace, TestingEngine};

/// Interleavings of three units with two steps each: 6! / (2! 2! 2!)
const BANK_INTERLEAVINGS: usize = 90;

#[test]
fn test_dfs_explores_every_interleaving() {
    init_tracing();
    let mut engine = TestingEngine::new(config(StrategyKind::Dfs, 1_000), Bank::new).unwrap();
    let report = engine.run().unwrap();

    assert_eq!(report.explored_schedules_count, BANK_INTERLEAVINGS);
    assert!(report.bug_found);
    assert_eq!(report.bug_report, LOST_UPDATE);
    assert_eq!(report.min_explored_steps, Some(6));
    assert_eq!(report.max_explored_steps, 6);
    println!(
        "✓ DFS explored {} interleavings, {} lost updates",
        report.explored_schedules_count,
        report.bugs_of(BugKind::Safety)
    );
}

#[cfg(feature = "dpor")]
#[test]
fn test_dpor_finds_lost_update_with_fewer_schedules() {
    init_tracing();
    let mut engine = TestingEngine::new(config(StrategyKind::Dpor, 1_000), Bank::new).unwrap();
    let report = engine.run().unwrap();

    assert!(report.bug_found);
    assert_eq!(report.bug_report, LOST_UPDATE);
    assert!(report.explored_schedules_count < BANK_INTERLEAVINGS);
    println!(
        "✓ DPOR explored {} of {} interleavings",
        report.explored_schedules_count, BANK_INTERLEAVINGS
    );
}

#[test]
fn test_dfs_exhausts_correct_ping_pong() {
    init_tracing();
    let mut engine = TestingEngine::new(config(StrategyKind::Dfs, 1_000), || PingPong::new(3)).unwrap();
    let report = engine.run().unwrap();

    // Only one unit is ever enabled, so there is exactly one schedule
    assert_eq!(report.explored_schedules_count, 1);
    assert!(!report.bug_found);
    println!("✓ Ping-pong has a single schedule");
}

#[test]
fn test_random_is_deterministic_per_seed() {
    init_tracing();
    let run = || {
        let mut engine = TestingEngine::new(config(StrategyKind::Random, 50), Bank::new).unwrap();
        engine.run().unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.num_of_found_bugs, second.num_of_found_bugs);
    assert_eq!(first.bug_traces, second.bug_traces);
    assert!(first.bug_found);
    println!("✓ Same seed, same {} bugs", first.num_of_found_bugs);
}

#[test]
fn test_replay_reproduces_recorded_bug() {
    init_tracing();
    let mut engine = TestingEngine::new(config(StrategyKind::Random, 50), Bank::new).unwrap();
    let report = engine.run().unwrap();
    let bug = &report.bug_traces[0];

    let trace = ScheduleTrace::from_records(bug.steps.clone());
    let replay = ReplayStrategy::new(trace, bug.is_fair);
    let mut replay_engine =
        TestingEngine::with_strategy(config(StrategyKind::Replay, 3), Bank::new, Box::new(replay)).unwrap();
    let replayed = replay_engine.run().unwrap();

    assert_eq!(replayed.explored_schedules_count, 3);
    assert_eq!(replayed.num_of_found_bugs, 3);
    assert_eq!(replayed.bug_traces[0].steps, bug.steps);
    assert_eq!(replayed.bug_traces[0].narrative, bug.narrative);
    println!("✓ Replayed {}-step trace reproduces: {}", bug.steps.len(), replayed.bug_report);
}

#[test]
fn test_replay_detects_divergence() {
    init_tracing();
    let trace = ScheduleTrace::from_records(vec![
        TraceRecord::Schedule { unit: common::TELLER_A },
        TraceRecord::Boolean { value: true },
    ]);
    let replay = ReplayStrategy::new(trace, false);
    let mut engine =
        TestingEngine::with_strategy(config(StrategyKind::Replay, 1), Bank::new, Box::new(replay)).unwrap();

    let err = engine.run().unwrap_err();
    assert!(err.to_string().contains("not reproducible at step 1"));
    println!("✓ Divergence reported: {}", err);
}
