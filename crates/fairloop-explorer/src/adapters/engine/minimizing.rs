//! Minimizing driver
//!
//! # Algorithm
//!
//! ```text
//! for each bound k chosen by the binary search:
//!     repeat up to max_random_walks trials:
//!         replay k recorded steps, then run the suffix strategy
//!         bug_found_every_time &= bug found
//!         stop the trials early once a trial misses the bug
//!     update_bounds(bug_found_every_time)
//! until the search interval is empty
//! ```
//!
//! The best bound is the shortest prefix after which every trial hit the
//! bug: the transition at that step makes the bug inevitable.

use super::hooks::{CancellationToken, TestHooks};
use super::{compose_strategy, execute_iteration, record_outcome, record_panic, Engine, RunBudget, RuntimeFactory};
use crate::domain::config::{Configuration, StrategyKind};
use crate::domain::error::EngineResult;
use crate::domain::minimize::CriticalTransitionStrategy;
use crate::domain::report::TestReport;
use crate::domain::strategy::SchedulingStrategy;
use crate::domain::trace::ScheduleTrace;
use crate::infrastructure::trace_store::TraceFile;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a minimization run
#[derive(Debug, Clone, Serialize)]
pub struct MinimizationReport {
    /// Every trial, folded like a testing run
    pub report: TestReport,
    /// Whether the binary search finished
    pub bounds_converged: bool,
    /// Shortest prefix that reproduced the bug at every trial
    pub best_bound: Option<usize>,
    /// Prefix length the search stopped at
    pub search_steps: usize,
    /// Bounds evaluated
    pub rounds: usize,
}

impl fmt::Display for MinimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "BoundsConverged:{}, bestBound={:?}, rounds={}",
            self.bounds_converged, self.best_bound, self.rounds
        )?;
        write!(f, "{}", self.report)
    }
}

/// Binary-searches the shortest prefix of a buggy trace that still forces the bug
pub struct MinimizingEngine<F> {
    config: Configuration,
    factory: F,
    strategy: CriticalTransitionStrategy,
    hooks: TestHooks,
    cancel: CancellationToken,
}

impl<F: RuntimeFactory> MinimizingEngine<F> {
    /// Minimize `trace`, recorded by a strategy of fairness `trace_is_fair`
    ///
    /// The suffix strategy is the one selected by `config`. With
    /// `StrategyKind::Replay` there is no suffix: the full trace is replayed
    /// for one round of trials and the best bound, if any, is its length.
    pub fn new(config: Configuration, factory: F, trace: ScheduleTrace, trace_is_fair: bool) -> EngineResult<Self> {
        config.validate()?;
        let suffix = match config.strategy {
            StrategyKind::Replay => None,
            _ => Some(compose_strategy(&config)?),
        };
        let strategy = CriticalTransitionStrategy::new(trace, trace_is_fair, suffix, &config);

        Ok(Self {
            config,
            factory,
            strategy,
            hooks: TestHooks::default(),
            cancel: CancellationToken::new(),
        })
    }

    /// Minimize a persisted trace
    pub fn from_trace_file(config: Configuration, factory: F, file: &TraceFile) -> EngineResult<Self> {
        Self::new(config, factory, file.to_trace(), file.is_fair)
    }

    /// Install hooks
    #[must_use]
    pub fn with_hooks(mut self, hooks: TestHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Search only prefixes in `[left, right)`
    #[must_use]
    pub fn with_bounds(mut self, left: usize, right: usize) -> Self {
        self.strategy.set_bounds(left, right);
        self
    }

    /// Token stopping the search at the next trial boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Strategy driving the search
    pub fn strategy(&self) -> &CriticalTransitionStrategy {
        &self.strategy
    }

    /// Run trials until the bounds converge, the budget is spent or the run
    /// is cancelled
    pub fn run(&mut self) -> EngineResult<MinimizationReport> {
        let description = self.strategy.description();
        info!(
            target: "fairloop::engine",
            "🔎 Minimizing a {}-step trace with {}",
            self.strategy.trace().len(),
            description
        );

        self.strategy.reset();
        let mut report = TestReport::new(description);
        let budget = RunBudget::new(&self.config);
        let mut completed = 0;
        let mut rounds = 0;
        let mut converged = false;
        let mut bug_found_every_time = true;

        let result = loop {
            if let Some(reason) = budget.stop_reason(completed, &self.cancel) {
                info!(target: "fairloop::engine", "Stopping minimization after {} trials: {}", completed, reason);
                break Ok(());
            }

            let outcome = execute_iteration(
                &self.factory,
                &mut self.strategy,
                &mut self.hooks,
                self.config.enable_debugging,
            );
            completed += 1;

            let found = match outcome {
                Ok(outcome) => match record_outcome(&mut report, outcome, self.config.attach_bug_trace) {
                    Ok(found) => found,
                    Err(err) => break Err(err),
                },
                Err(panic) => {
                    warn!(target: "fairloop::engine", "⚠️  Trial {} panicked: {}", completed, panic);
                    record_panic(&mut report, panic, self.strategy.is_fair());
                    true
                }
            };
            bug_found_every_time &= found;

            let needs_more_walks = self.strategy.prepare_for_next_iteration() && bug_found_every_time;
            if !needs_more_walks {
                rounds += 1;
                if !self.strategy.update_bounds(bug_found_every_time) {
                    converged = true;
                    break Ok(());
                }
                bug_found_every_time = true;
            }
        };

        self.hooks.teardown();
        result?;

        let best_bound = self.strategy.get_last_found_bug_steps();
        info!(
            target: "fairloop::engine",
            "BoundsConverged:{}, bestBound={:?}",
            converged,
            best_bound
        );

        Ok(MinimizationReport {
            report,
            bounds_converged: converged,
            best_bound,
            search_steps: self.strategy.current_search_steps(),
            rounds,
        })
    }
}

impl<F: RuntimeFactory> Engine for MinimizingEngine<F> {
    type Report = MinimizationReport;

    fn run(&mut self) -> EngineResult<MinimizationReport> {
        MinimizingEngine::run(self)
    }

    fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn timeout(&self) -> Option<Duration> {
        self.config.timeout
    }
}
