//! Engines
//!
//! # Overview
//!
//! Engines repeat iterations of the program under test and fold their
//! outcomes into a [`TestReport`].
//!
//! | Engine                   | Strategy                         | Output               |
//! |--------------------------|----------------------------------|----------------------|
//! | [`TestingEngine`]        | base, optionally cycle detection | `TestReport`         |
//! | [`MinimizingEngine`]     | critical transition over a trace | `MinimizationReport` |
//! | [`ParallelTestingEngine`]| one testing engine per worker    | merged `TestReport`  |
//!
//! # Iteration
//!
//! ```text
//! setup hook
//!   → fresh runtime from the factory
//!   → ControlledScheduler::run (panics caught)
//! iteration teardown hook
//!   → record outcome
//!   → strategy.prepare_for_next_iteration()
//! ```
//!
//! Cancellation and the wall-clock timeout are checked between iterations
//! only, so a report never contains a half-finished iteration.

pub mod hooks;
pub mod minimizing;
pub mod parallel;
pub mod testing;

pub use hooks::{CancellationToken, Hook, TestHooks};
pub use minimizing::{MinimizationReport, MinimizingEngine};
pub use parallel::ParallelTestingEngine;
pub use testing::TestingEngine;

use super::scheduler::{ControlledScheduler, IterationOutcome};
use crate::domain::config::Configuration;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::liveness::CycleDetectionStrategy;
use crate::domain::report::{BugTrace, TestReport};
use crate::domain::strategy::{build_base_strategy, SchedulingStrategy};
use fairloop_core::ActorRuntime;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Builds a fresh runtime for every iteration
///
/// Any `Fn() -> R` closure is a factory.
pub trait RuntimeFactory: Send + Sync {
    /// Runtime type produced
    type Runtime: ActorRuntime;

    /// New runtime in its initial state
    fn create(&self) -> Self::Runtime;
}

impl<F, R> RuntimeFactory for F
where
    F: Fn() -> R + Send + Sync,
    R: ActorRuntime,
{
    type Runtime = R;

    #[inline]
    fn create(&self) -> R {
        self()
    }
}

/// Common surface of the engines, used by the background harness
pub trait Engine: Send {
    /// Result of a run
    type Report: Send + 'static;

    /// Run to completion, cancellation or timeout
    fn run(&mut self) -> EngineResult<Self::Report>;

    /// Token that stops the run at the next iteration boundary
    fn cancellation_token(&self) -> CancellationToken;

    /// Configured wall-clock budget
    fn timeout(&self) -> Option<Duration>;
}

/// Base strategy of `config`, wrapped in cycle detection when enabled
pub fn compose_strategy(config: &Configuration) -> EngineResult<Box<dyn SchedulingStrategy>> {
    let base = build_base_strategy(config)?;
    if config.enable_cycle_detection {
        Ok(Box::new(CycleDetectionStrategy::new(base, config)))
    } else {
        Ok(base)
    }
}

/// Iteration budget of one run
pub(crate) struct RunBudget {
    started: Instant,
    max_iterations: usize,
    unbounded: bool,
    timeout: Option<Duration>,
}

impl RunBudget {
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            started: Instant::now(),
            max_iterations: config.scheduling_iterations,
            unbounded: config.scheduling_iterations == 1 && config.timeout.is_some(),
            timeout: config.timeout,
        }
    }

    /// Reason to stop before the next iteration, if any
    pub(crate) fn stop_reason(&self, completed: usize, cancel: &CancellationToken) -> Option<&'static str> {
        if cancel.is_cancelled() {
            Some("cancelled")
        } else if self.timeout.is_some_and(|limit| self.started.elapsed() >= limit) {
            Some("timeout")
        } else if !self.unbounded && completed >= self.max_iterations {
            Some("iteration budget exhausted")
        } else {
            None
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Run one iteration between the hooks, catching panics of the program
pub(crate) fn execute_iteration<F: RuntimeFactory>(
    factory: &F,
    strategy: &mut dyn SchedulingStrategy,
    hooks: &mut TestHooks,
    debugging: bool,
) -> Result<IterationOutcome, String> {
    hooks.setup();
    let result = catch_unwind(AssertUnwindSafe(|| {
        let mut runtime = factory.create();
        ControlledScheduler::new(strategy)
            .with_debugging(debugging)
            .run(&mut runtime)
    }));
    hooks.iteration_teardown();
    result.map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "program under test panicked".to_string()
    }
}

/// Fold an iteration into `report`; returns whether it found a bug
///
/// A replay divergence is fatal and returned as an error.
pub(crate) fn record_outcome(
    report: &mut TestReport,
    outcome: IterationOutcome,
    attach_trace: bool,
) -> EngineResult<bool> {
    if let Some((step, reason)) = outcome.divergence {
        return Err(EngineError::NonReproducibleTrace { step, reason });
    }

    report.record_schedule(outcome.steps, outcome.is_fair);
    report.coverage.merge(&outcome.coverage);

    let Some(bug) = outcome.bug else {
        return Ok(false);
    };
    report.record_bug(BugTrace {
        kind: bug.kind,
        message: bug.message,
        is_fair: outcome.is_fair,
        steps: if attach_trace {
            outcome.trace.to_records()
        } else {
            Vec::new()
        },
        narrative: outcome.narrative,
    });
    Ok(true)
}

/// Record a panic of the program under test
pub(crate) fn record_panic(report: &mut TestReport, message: String, is_fair: bool) {
    report.record_schedule(0, is_fair);
    report.record_internal_error(message.clone());
    report.record_bug(BugTrace {
        kind: fairloop_core::BugKind::Internal,
        message,
        is_fair,
        steps: Vec::new(),
        narrative: Vec::new(),
    });
}
