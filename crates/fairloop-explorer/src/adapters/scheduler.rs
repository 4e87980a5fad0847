//! Controlled Scheduler
//!
//! # Overview
//!
//! The scheduler drives one iteration of the program under test. It owns the
//! per-iteration [`ScheduleTrace`] and [`StateCache`], implements
//! [`ExecutionHandle`] for the runtime, and asks the active strategy for
//! every choice.
//!
//! ```text
//! ┌──────────────┐  enabled_units   ┌────────────────────┐
//! │ ActorRuntime │ ───────────────▶ │ ControlledScheduler│
//! │              │ ◀─── execute ─── │  trace, cache      │
//! │              │ ── next_* ─────▶ │  ──▶ strategy      │
//! └──────────────┘                  └────────────────────┘
//! ```
//!
//! # Termination
//!
//! An iteration ends when no unit is enabled, when the strategy reached its
//! step bound, or when the scheduler halted the run (bug found, fatal replay
//! divergence). Once halted, every handle call returns `ExecutionHalted`.

use crate::domain::report::CoverageInfo;
use crate::domain::state_cache::StateCache;
use crate::domain::strategy::{ExplorationContext, SchedulingStrategy};
use crate::domain::trace::ScheduleTrace;
use fairloop_core::{
    ActorRuntime, BugKind, ExecutionHalted, ExecutionHandle, LivenessViolation, MonitorId, MonitorStatus,
    SchedulableUnit, SchedulingError, UnitId,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Why an iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// No unit was enabled
    Quiescent,
    /// The strategy reached its step bound or ran out of choices
    StepBound,
    /// The scheduler stopped the run
    Halted,
}

/// A bug detected during one iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugRecord {
    /// Classification
    pub kind: BugKind,
    /// Description
    pub message: String,
}

/// Everything one iteration produced
#[derive(Debug, Clone)]
pub struct IterationOutcome {
    /// First bug detected, if any
    pub bug: Option<BugRecord>,
    /// Choices made
    pub trace: ScheduleTrace,
    /// Steps counted by the strategy
    pub steps: usize,
    /// Fairness of the strategy when the iteration ended
    pub is_fair: bool,
    /// States visited
    pub coverage: CoverageInfo,
    /// Human-readable log of the iteration
    pub narrative: Vec<String>,
    /// Why the iteration ended
    pub termination: Termination,
    /// Step and reason of a replay divergence, if one stopped the run
    pub divergence: Option<(usize, String)>,
}

/// Scheduler for one iteration
pub struct ControlledScheduler<'s> {
    strategy: &'s mut dyn SchedulingStrategy,
    trace: ScheduleTrace,
    cache: StateCache,
    last_enabled: Vec<SchedulableUnit>,
    halted: bool,
    bug: Option<BugRecord>,
    narrative: Vec<String>,
    machine_coverage: BTreeMap<UnitId, BTreeSet<String>>,
    coverage: CoverageInfo,
    divergence: Option<(usize, String)>,
    debugging: bool,
}

impl<'s> ControlledScheduler<'s> {
    /// Scheduler driven by `strategy`
    pub fn new(strategy: &'s mut dyn SchedulingStrategy) -> Self {
        Self {
            strategy,
            trace: ScheduleTrace::new(),
            cache: StateCache::new(),
            last_enabled: Vec::new(),
            halted: false,
            bug: None,
            narrative: Vec::new(),
            machine_coverage: BTreeMap::new(),
            coverage: CoverageInfo::default(),
            divergence: None,
            debugging: false,
        }
    }

    /// Log every choice at debug level
    #[must_use]
    pub fn with_debugging(mut self, enable: bool) -> Self {
        self.debugging = enable;
        self
    }

    /// Choices recorded so far
    pub fn trace(&self) -> &ScheduleTrace {
        &self.trace
    }

    /// Whether the run was stopped
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run `runtime` to termination
    pub fn run<R: ActorRuntime + ?Sized>(mut self, runtime: &mut R) -> IterationOutcome {
        let termination = match runtime.start(&mut self) {
            Err(ExecutionHalted) => Termination::Halted,
            Ok(()) if self.halted => Termination::Halted,
            Ok(()) => self.drive(runtime),
        };
        self.finish(runtime, termination)
    }

    fn drive<R: ActorRuntime + ?Sized>(&mut self, runtime: &mut R) -> Termination {
        loop {
            if self.halted {
                return Termination::Halted;
            }

            let units = runtime.enabled_units();
            if !units.iter().any(|u| u.is_enabled) {
                return Termination::Quiescent;
            }
            if self.strategy.has_reached_max_steps() {
                debug!(
                    target: "fairloop::engine",
                    "Step bound reached after {} steps",
                    self.strategy.scheduled_steps()
                );
                return Termination::StepBound;
            }

            let current = runtime.current_unit();
            self.last_enabled = units;
            let choice = {
                let mut ctx = ExplorationContext {
                    trace: &self.trace,
                    cache: &mut self.cache,
                    units: &self.last_enabled,
                };
                self.strategy.next_unit(&mut ctx, &self.last_enabled, current.as_ref())
            };

            let unit = match choice {
                Ok(unit) => unit,
                Err(SchedulingError::NoEnabledChoice) => return Termination::Quiescent,
                Err(SchedulingError::Exhausted) => return Termination::StepBound,
                Err(err) => {
                    self.fail(err);
                    return Termination::Halted;
                }
            };

            let index = self.trace.add_scheduling_choice(unit);
            let line = format!("<ScheduleLog> Schedule '{}'", runtime.describe_unit(unit));
            if self.debugging {
                debug!(target: "fairloop::engine", "[{}] {}", index, line);
            }
            self.narrative.push(line);

            if runtime.execute(unit, &mut *self).is_err() {
                return Termination::Halted;
            }
        }
    }

    fn finish<R: ActorRuntime + ?Sized>(mut self, runtime: &R, termination: Termination) -> IterationOutcome {
        let is_fair = self.strategy.is_fair();
        if self.bug.is_none() && termination == Termination::Quiescent && is_fair {
            let hot = runtime.hot_monitors();
            if !hot.is_empty() {
                let violation = LivenessViolation::hot_at_termination(hot);
                let message = format!(
                    "{} detected liveness bug in hot state at the end of program execution",
                    violation
                        .monitors
                        .iter()
                        .map(|m| format!("'{}'", m))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                self.record_bug(BugKind::HotAtTermination, message);
            }
        }

        let mut coverage = std::mem::take(&mut self.coverage);
        for (unit, states) in &self.machine_coverage {
            let label = runtime.describe_unit(*unit);
            for state in states {
                coverage.record_machine_state(&label, state);
            }
        }

        IterationOutcome {
            bug: self.bug,
            steps: self.strategy.scheduled_steps(),
            is_fair,
            trace: self.trace,
            coverage,
            narrative: self.narrative,
            termination,
            divergence: self.divergence,
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Bugs
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn record_bug(&mut self, kind: BugKind, message: String) {
        self.halted = true;
        if self.bug.is_some() {
            return;
        }
        info!(target: "fairloop::engine", "🐛 {} at step {}: {}", kind.message(), self.trace.len(), message);
        self.narrative.push(format!("<ErrorLog> {}", message));
        self.bug = Some(BugRecord { kind, message });
    }

    /// Stop the run after a strategy error
    fn fail(&mut self, err: SchedulingError) {
        match err {
            SchedulingError::NoEnabledChoice | SchedulingError::Exhausted => self.halted = true,
            SchedulingError::NotReproducible { step, ref reason } => {
                self.divergence = Some((step, reason.clone()));
                self.record_bug(BugKind::NonReproducible, err.to_string());
            }
            SchedulingError::Liveness(violation) => self.record_bug(BugKind::Liveness, violation.to_string()),
        }
    }

    #[inline]
    fn ensure_running(&self) -> Result<(), ExecutionHalted> {
        if self.halted {
            Err(ExecutionHalted)
        } else {
            Ok(())
        }
    }

    fn choose<T>(
        &mut self,
        pick: impl FnOnce(&mut dyn SchedulingStrategy, &mut ExplorationContext<'_>) -> Result<T, SchedulingError>,
    ) -> Result<T, ExecutionHalted> {
        self.ensure_running()?;
        // The runtime is executing, so the enabled set stays the scheduling-point snapshot
        let result = {
            let mut ctx = ExplorationContext {
                trace: &self.trace,
                cache: &mut self.cache,
                units: &self.last_enabled,
            };
            pick(&mut *self.strategy, &mut ctx)
        };
        result.map_err(|err| {
            self.fail(err);
            ExecutionHalted
        })
    }
}

impl ExecutionHandle for ControlledScheduler<'_> {
    fn next_boolean(&mut self, max_value: u64) -> Result<bool, ExecutionHalted> {
        let value = self.choose(|strategy, ctx| strategy.next_boolean(ctx, max_value))?;
        self.trace.add_boolean_choice(value);
        Ok(value)
    }

    fn next_fair_boolean(&mut self, choice_id: &str) -> Result<bool, ExecutionHalted> {
        let value = self.choose(|strategy, ctx| strategy.next_boolean(ctx, 2))?;
        self.trace.add_fair_boolean_choice(value, choice_id);
        Ok(value)
    }

    fn next_integer(&mut self, max_value: u64) -> Result<u64, ExecutionHalted> {
        let value = self.choose(|strategy, ctx| strategy.next_integer(ctx, max_value))?;
        self.trace.add_integer_choice(value);
        Ok(value)
    }

    fn assert(&mut self, condition: bool, message: &str) -> Result<(), ExecutionHalted> {
        self.ensure_running()?;
        if !condition {
            self.record_bug(BugKind::Safety, message.to_owned());
            return Err(ExecutionHalted);
        }
        Ok(())
    }

    fn on_enter_state(&mut self, unit: UnitId, state: &str) {
        self.cache.enter_state(unit, state);
        self.machine_coverage.entry(unit).or_default().insert(state.to_owned());
        self.narrative.push(format!("<StateLog> {} enters state '{}'", unit, state));
    }

    fn on_exit_state(&mut self, unit: UnitId, state: &str) {
        self.cache.exit_state(unit, state);
        self.narrative.push(format!("<StateLog> {} exits state '{}'", unit, state));
    }

    fn on_monitor_enter_state(&mut self, monitor: &MonitorId, state: &str, status: MonitorStatus) {
        self.cache.monitor_enter_state(monitor, state, status);
        self.coverage.record_monitor_state(monitor.as_str(), state);
        self.narrative
            .push(format!("<MonitorLog> {} enters {} state '{}'", monitor, status, state));
    }

    fn on_monitor_status_changed(&mut self, monitor: &MonitorId, status: MonitorStatus) {
        self.cache.monitor_status_changed(monitor, status);
    }

    fn on_local_state_changed(&mut self, unit: UnitId, hash: u64) {
        self.cache.set_local_hash(unit, hash);
    }

    fn log(&mut self, line: &str) {
        self.narrative.push(line.to_owned());
    }
}
