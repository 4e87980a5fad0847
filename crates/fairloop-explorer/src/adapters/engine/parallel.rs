//! Parallel testing
//!
//! # Architecture
//!
//! ```text
//!             ParallelTestingEngine::run
//!                       │
//!      ┌────────────────┼────────────────┐
//!      ▼                ▼                ▼
//!  worker 0         worker 1         worker N-1     std::thread::scope
//!  seed + 0         seed + 1         seed + N-1
//!  TestingEngine    TestingEngine    TestingEngine
//!      │                │                │
//!      └──── Mutex<TestReport> ◄─────────┘          merged report
//!      └──── DashMap<worker, CoverageInfo>          per-worker coverage
//! ```
//!
//! Every worker owns its strategy and builds its own runtimes, so nothing
//! but the aggregate report and the coverage map is shared. Systematic
//! strategies (DFS, DPOR) explore the same tree in every worker; the
//! parallel engine pays off with the random strategy.

use super::hooks::CancellationToken;
use super::{Engine, RuntimeFactory, TestingEngine};
use crate::domain::config::Configuration;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::report::{CoverageInfo, TestReport};
use crate::domain::strategy::resolve_seed;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runs independent testing engines on worker threads and merges their reports
pub struct ParallelTestingEngine<F> {
    config: Configuration,
    factory: F,
    cancel: CancellationToken,
    worker_coverage: DashMap<usize, CoverageInfo>,
}

impl<F: RuntimeFactory> ParallelTestingEngine<F> {
    /// Engine running `config.parallel_workers` workers
    pub fn new(config: Configuration, factory: F) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            factory,
            cancel: CancellationToken::new(),
            worker_coverage: DashMap::new(),
        })
    }

    /// Token stopping every worker at its next iteration boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Coverage collected by `worker` in the last run
    pub fn coverage_of(&self, worker: usize) -> Option<CoverageInfo> {
        self.worker_coverage.get(&worker).map(|entry| entry.value().clone())
    }

    /// Configuration of `worker` out of `workers`
    ///
    /// Seeds are offset by the worker index and iterations are split as
    /// evenly as possible. A single iteration under a timeout stays a
    /// single, timeout-extended iteration per worker.
    fn worker_config(&self, base_seed: u64, worker: usize, workers: usize) -> Configuration {
        let iterations = self.config.scheduling_iterations;
        let share = if self.extends_with_timeout() {
            1
        } else {
            iterations / workers + usize::from(worker < iterations % workers)
        };

        Configuration {
            random_seed: Some(base_seed.wrapping_add(worker as u64)),
            scheduling_iterations: share,
            parallel_workers: 1,
            ..self.config.clone()
        }
    }

    fn extends_with_timeout(&self) -> bool {
        self.config.scheduling_iterations == 1 && self.config.timeout.is_some()
    }

    fn worker_count(&self) -> usize {
        if self.extends_with_timeout() {
            self.config.parallel_workers
        } else {
            self.config.parallel_workers.min(self.config.scheduling_iterations)
        }
    }

    /// Run every worker to completion and merge their reports
    pub fn run(&mut self) -> EngineResult<TestReport> {
        let workers = self.worker_count();
        let base_seed = resolve_seed(self.config.random_seed);
        info!(
            target: "fairloop::engine",
            "🚀 Parallel testing with {} workers ({} iterations, base seed {})",
            workers,
            self.config.scheduling_iterations,
            base_seed
        );

        self.worker_coverage.clear();
        let aggregate = Mutex::new(TestReport::new(format!(
            "parallel {} x {}",
            workers,
            self.config.strategy.name()
        )));
        let errors: Mutex<Vec<(usize, EngineError)>> = Mutex::new(Vec::new());

        thread::scope(|scope| {
            for worker in 0..workers {
                let config = self.worker_config(base_seed, worker, workers);
                let factory = &self.factory;
                let cancel = self.cancel.clone();
                let aggregate = &aggregate;
                let errors = &errors;
                let coverage = &self.worker_coverage;

                scope.spawn(move || {
                    debug!(
                        target: "fairloop::engine",
                        "Worker {} starting with seed {:?}",
                        worker,
                        config.random_seed
                    );
                    let result = TestingEngine::new(config, || factory.create())
                        .map(|engine| engine.with_cancellation(cancel))
                        .and_then(|mut engine| engine.run());

                    match result {
                        Ok(report) => {
                            coverage.insert(worker, report.coverage.clone());
                            aggregate.lock().merge(&report);
                        }
                        Err(err) => {
                            warn!(target: "fairloop::engine", "⚠️  Worker {} failed: {}", worker, err);
                            errors.lock().push((worker, err));
                        }
                    }
                });
            }
        });

        let mut errors = errors.into_inner();
        errors.sort_by_key(|(worker, _)| *worker);
        if let Some((_, err)) = errors.into_iter().next() {
            return Err(err);
        }

        let report = aggregate.into_inner();
        info!(
            target: "fairloop::engine",
            "Parallel run finished: {} iterations, {} bug(s)",
            report.explored_schedules_count,
            report.num_of_found_bugs
        );
        Ok(report)
    }
}

impl<F: RuntimeFactory> Engine for ParallelTestingEngine<F> {
    type Report = TestReport;

    fn run(&mut self) -> EngineResult<TestReport> {
        ParallelTestingEngine::run(self)
    }

    fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::StrategyKind;
    use fairloop_core::{ActorRuntime, ExecutionHalted, ExecutionHandle, MonitorId, SchedulableUnit, UnitId};

    /// One unit that walks a machine through a coin-selected state
    struct Toss {
        done: bool,
    }

    impl ActorRuntime for Toss {
        fn start(&mut self, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
            handle.on_enter_state(UnitId(1), "Init");
            Ok(())
        }

        fn enabled_units(&self) -> Vec<SchedulableUnit> {
            vec![SchedulableUnit::actor(UnitId(1)).enabled(!self.done)]
        }

        fn current_unit(&self) -> Option<SchedulableUnit> {
            None
        }

        fn execute(&mut self, unit: UnitId, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
            self.done = true;
            let heads = handle.next_boolean(2)?;
            handle.on_exit_state(unit, "Init");
            handle.on_enter_state(unit, if heads { "Heads" } else { "Tails" });
            Ok(())
        }

        fn hot_monitors(&self) -> Vec<MonitorId> {
            Vec::new()
        }
    }

    fn config(workers: usize, iterations: usize) -> Configuration {
        Configuration {
            strategy: StrategyKind::Random,
            scheduling_iterations: iterations,
            parallel_workers: workers,
            random_seed: Some(100),
            ..Configuration::default()
        }
    }

    #[test]
    fn test_iterations_are_split_across_workers() {
        let engine = ParallelTestingEngine::new(config(4, 10), || Toss { done: false }).unwrap();
        let shares: Vec<usize> = (0..4)
            .map(|w| engine.worker_config(100, w, 4).scheduling_iterations)
            .collect();
        assert_eq!(shares, vec![3, 3, 2, 2]);
        assert_eq!(engine.worker_config(100, 3, 4).random_seed, Some(103));
    }

    #[test]
    fn test_fewer_iterations_than_workers() {
        let engine = ParallelTestingEngine::new(config(8, 3), || Toss { done: false }).unwrap();
        assert_eq!(engine.worker_count(), 3);
    }

    #[test]
    fn test_reports_are_merged() {
        let mut engine = ParallelTestingEngine::new(config(4, 40), || Toss { done: false }).unwrap();
        let report = engine.run().unwrap();

        assert_eq!(report.explored_schedules_count, 40);
        assert_eq!(report.num_of_explored_fair_schedules, 40);
        assert!(!report.bug_found);
        assert!(report.strategy.starts_with("parallel 4 x random"));

        for worker in 0..4 {
            let coverage = engine.coverage_of(worker).unwrap();
            assert!(coverage.machine_states.values().any(|states| states.contains("Init")));
        }
        assert!(engine.coverage_of(4).is_none());
    }

    #[test]
    fn test_cancelled_workers_do_nothing() {
        let mut engine = ParallelTestingEngine::new(config(2, 10), || Toss { done: false }).unwrap();
        engine.cancellation_token().cancel();
        let report = engine.run().unwrap();
        assert_eq!(report.explored_schedules_count, 0);
    }
}
