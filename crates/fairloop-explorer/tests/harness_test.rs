//! Integration tests for background execution and parallel workers

mod common;

use common::{config, init_tracing, Bank, Spinner, LOST_UPDATE};
use fairloop_explorer::domain::StrategyKind;
use fairloop_explorer::infrastructure::BackgroundRun;
use fairloop_explorer::{run_in_background, Configuration, MinimizingEngine, ParallelTestingEngine, TestingEngine};
use std::time::Duration;

#[tokio::test]
async fn test_background_testing_engine() {
    init_tracing();
    let engine = TestingEngine::new(config(StrategyKind::Dfs, 1_000), Bank::new).unwrap();
    let report = run_in_background(engine).await.unwrap();

    assert_eq!(report.explored_schedules_count, 90);
    assert_eq!(report.bug_report, LOST_UPDATE);
    println!("✓ Background DFS explored {} schedules", report.explored_schedules_count);
}

#[tokio::test]
async fn test_timeout_bounds_endless_exploration() {
    init_tracing();
    let config = Configuration {
        timeout: Some(Duration::from_millis(200)),
        max_fair_scheduling_steps: 50,
        ..config(StrategyKind::Random, 1)
    };
    let engine = TestingEngine::new(config, Spinner::forever).unwrap();
    let report = run_in_background(engine).await.unwrap();

    assert!(report.explored_schedules_count > 1);
    assert_eq!(report.max_explored_steps, 50);
    println!("✓ {} iterations before the timeout", report.explored_schedules_count);
}

#[tokio::test]
async fn test_cancelling_background_run() {
    init_tracing();
    let config = Configuration {
        timeout: Some(Duration::from_secs(600)),
        max_fair_scheduling_steps: 20,
        ..config(StrategyKind::Random, 1)
    };
    let run = BackgroundRun::spawn(TestingEngine::new(config, Spinner::forever).unwrap());
    tokio::time::sleep(Duration::from_millis(50)).await;
    run.cancel();

    let report = run.join().await.unwrap();
    assert!(report.explored_schedules_count >= 1);
    println!("✓ Cancelled after {} iterations", report.explored_schedules_count);
}

#[tokio::test]
async fn test_background_minimizer() {
    init_tracing();
    let mut engine = TestingEngine::new(config(StrategyKind::Random, 100), Bank::new).unwrap();
    let report = engine.run().unwrap();
    let bug = &report.bug_traces[0];

    let minimizer_config = Configuration {
        scheduling_iterations: 10_000,
        ..config(StrategyKind::Random, 1)
    };
    let minimizer = MinimizingEngine::new(
        minimizer_config,
        Bank::new,
        fairloop_explorer::ScheduleTrace::from_records(bug.steps.clone()),
        bug.is_fair,
    )
    .unwrap();
    let result = run_in_background(minimizer).await.unwrap();

    assert!(result.bounds_converged);
    println!("✓ {}", result);
}

#[test]
fn test_parallel_workers_share_the_budget() {
    init_tracing();
    let config = Configuration {
        parallel_workers: 4,
        ..config(StrategyKind::Random, 200)
    };
    let mut engine = ParallelTestingEngine::new(config, Bank::new).unwrap();
    let report = engine.run().unwrap();

    assert_eq!(report.explored_schedules_count, 200);
    assert!(report.bug_found);
    assert_eq!(report.bug_report, LOST_UPDATE);
    assert_eq!(report.min_explored_steps, Some(6));
    println!(
        "✓ 4 workers explored {} schedules, {} bugs",
        report.explored_schedules_count, report.num_of_found_bugs
    );
}
