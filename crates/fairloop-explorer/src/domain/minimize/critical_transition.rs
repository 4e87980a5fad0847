//! Critical-transition search over a buggy trace

use super::bounds::SearchBounds;
use crate::domain::config::Configuration;
use crate::domain::strategy::{enabled, ExplorationContext, SchedulingStrategy};
use crate::domain::trace::{ScheduleStep, ScheduleStepType, ScheduleTrace};
use fairloop_core::{SchedulableUnit, SchedulingError, UnitId};
use tracing::{debug, info, warn};

/// Replays a prefix of a recorded buggy trace, then lets a suffix strategy run
///
/// Each iteration replays exactly [`current_search_steps`] recorded choices.
/// Afterwards every request goes to the suffix strategy. A divergence inside
/// the prefix hands control to the suffix early; without a suffix the whole
/// trace is replayed and any divergence is returned to the caller.
///
/// [`current_search_steps`]: CriticalTransitionStrategy::current_search_steps
pub struct CriticalTransitionStrategy {
    trace: ScheduleTrace,
    trace_is_fair: bool,
    suffix: Option<Box<dyn SchedulingStrategy>>,
    bounds: SearchBounds,
    steps: usize,
    random_walks: usize,
    max_random_walks: usize,
    max_schedulable_steps: usize,
    replaying: bool,
}

impl CriticalTransitionStrategy {
    /// Search over `trace`, recorded by a strategy of fairness `trace_is_fair`
    pub fn new(
        trace: ScheduleTrace,
        trace_is_fair: bool,
        suffix: Option<Box<dyn SchedulingStrategy>>,
        config: &Configuration,
    ) -> Self {
        let len = trace.len();
        let max_fair = config.max_fair_scheduling_steps;
        let max_schedulable_steps = if max_fair > len { max_fair + len } else { 5 * len };

        Self {
            bounds: SearchBounds::new(len),
            trace,
            trace_is_fair,
            suffix,
            steps: 0,
            random_walks: 0,
            max_random_walks: config.max_random_walks.max(1),
            max_schedulable_steps,
            replaying: true,
        }
    }

    /// Recorded trace
    pub fn trace(&self) -> &ScheduleTrace {
        &self.trace
    }

    /// Search cursor
    pub fn bounds(&self) -> &SearchBounds {
        &self.bounds
    }

    /// Restrict the search to prefixes in `[left, right)`
    pub fn set_bounds(&mut self, left: usize, right: usize) {
        self.bounds.set(left, right.min(self.trace.len()));
    }

    /// Prefix length replayed in the current iteration
    pub fn current_search_steps(&self) -> usize {
        if self.suffix.is_some() {
            self.bounds.current()
        } else {
            self.trace.len()
        }
    }

    /// Last prefix length for which the bug was confirmed
    pub fn get_last_found_bug_steps(&self) -> Option<usize> {
        self.bounds.last_found()
    }

    /// Trials completed at the current bound
    pub fn random_walks(&self) -> usize {
        self.random_walks
    }

    /// Trials per bound
    pub fn max_random_walks(&self) -> usize {
        self.max_random_walks
    }

    /// Whether a suffix strategy takes over after the prefix
    pub fn has_suffix(&self) -> bool {
        self.suffix.is_some()
    }

    /// Record whether the bug reproduced at every trial of the current bound
    ///
    /// Returns `false` once the search converged. Without a suffix every
    /// trial replays the whole trace, so the search closes after one round
    /// at the full trace length.
    pub fn update_bounds(&mut self, bug_found: bool) -> bool {
        if self.suffix.is_none() {
            self.random_walks = 0;
            self.bounds.close_at(self.trace.len(), bug_found);
            info!(
                target: "fairloop::minimize",
                "📉 Full {}-step trace {}, nothing to bisect without a suffix",
                self.trace.len(),
                if bug_found { "reproduced" } else { "did not reproduce" }
            );
            return false;
        }

        let tried = self.bounds.current();
        let more = self.bounds.update(bug_found);
        self.random_walks = 0;
        info!(
            target: "fairloop::minimize",
            "📉 Prefix {} {}, bounds now [{}, {}) next {}",
            tried,
            if bug_found { "reproduced" } else { "did not reproduce" },
            self.bounds.left(),
            self.bounds.right(),
            self.bounds.current()
        );
        more
    }

    fn in_prefix(&self) -> bool {
        self.replaying && (self.suffix.is_none() || self.steps < self.bounds.current())
    }

    fn recorded_step(&self) -> Result<&ScheduleStep, SchedulingError> {
        self.trace
            .get(self.steps)
            .ok_or_else(|| SchedulingError::not_reproducible(self.steps, "execution is longer than trace"))
    }

    fn replay_unit(&self, choices: &[SchedulableUnit]) -> Result<UnitId, SchedulingError> {
        let step = self.recorded_step()?;
        let unit = step.scheduled_unit().ok_or_else(|| {
            SchedulingError::not_reproducible(self.steps, "next step is not a scheduling choice")
        })?;
        if !enabled(choices).any(|u| u.id == unit) {
            return Err(SchedulingError::not_reproducible(
                self.steps,
                format!("cannot detect enabled unit '{}'", unit),
            ));
        }
        Ok(unit)
    }

    fn replay_boolean(&self) -> Result<bool, SchedulingError> {
        let step = self.recorded_step()?;
        match step.boolean_choice() {
            Some(value) if !step.is_scheduling() => Ok(value),
            _ => Err(SchedulingError::not_reproducible(
                self.steps,
                "next step is not a nondeterministic boolean choice",
            )),
        }
    }

    fn replay_integer(&self) -> Result<u64, SchedulingError> {
        let step = self.recorded_step()?;
        match step.integer_choice() {
            Some(value) if step.step_type() == ScheduleStepType::NondeterministicChoice => Ok(value),
            _ => Err(SchedulingError::not_reproducible(
                self.steps,
                "next step is not a nondeterministic integer choice",
            )),
        }
    }

    /// Accept a replayed choice, or hand off to the suffix on divergence
    fn settle<T>(&mut self, replayed: Result<T, SchedulingError>) -> Result<Option<T>, SchedulingError> {
        match replayed {
            Ok(value) => {
                self.steps += 1;
                Ok(Some(value))
            }
            Err(err) if self.suffix.is_some() => {
                warn!(target: "fairloop::minimize", "⚠️  Prefix diverged, handing off to suffix: {}", err);
                self.replaying = false;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn suffix_mut(&mut self) -> Result<&mut Box<dyn SchedulingStrategy>, SchedulingError> {
        let steps = self.steps;
        self.suffix
            .as_mut()
            .ok_or_else(|| SchedulingError::not_reproducible(steps, "execution is longer than trace"))
    }
}

impl SchedulingStrategy for CriticalTransitionStrategy {
    fn next_unit(
        &mut self,
        ctx: &mut ExplorationContext<'_>,
        choices: &[SchedulableUnit],
        current: Option<&SchedulableUnit>,
    ) -> Result<UnitId, SchedulingError> {
        if self.in_prefix() {
            if enabled(choices).next().is_none() {
                return Err(SchedulingError::NoEnabledChoice);
            }
            let replayed = self.replay_unit(choices);
            if let Some(unit) = self.settle(replayed)? {
                return Ok(unit);
            }
        }
        self.suffix_mut()?.next_unit(ctx, choices, current)
    }

    fn next_boolean(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<bool, SchedulingError> {
        if self.in_prefix() {
            let replayed = self.replay_boolean();
            if let Some(value) = self.settle(replayed)? {
                return Ok(value);
            }
        }
        self.suffix_mut()?.next_boolean(ctx, max_value)
    }

    fn next_integer(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<u64, SchedulingError> {
        if self.in_prefix() {
            let replayed = self.replay_integer();
            if let Some(value) = self.settle(replayed)? {
                return Ok(value);
            }
        }
        self.suffix_mut()?.next_integer(ctx, max_value)
    }

    fn prepare_for_next_iteration(&mut self) -> bool {
        self.steps = 0;
        self.random_walks += 1;
        self.replaying = true;
        let suffix_continues = self
            .suffix
            .as_mut()
            .map_or(true, |suffix| suffix.prepare_for_next_iteration());
        debug!(
            target: "fairloop::minimize",
            "Walk {}/{} at prefix {}",
            self.random_walks,
            self.max_random_walks,
            self.current_search_steps()
        );
        suffix_continues && self.random_walks < self.max_random_walks
    }

    fn reset(&mut self) {
        self.steps = 0;
        self.replaying = true;
        if let Some(suffix) = self.suffix.as_mut() {
            suffix.reset();
        }
    }

    fn scheduled_steps(&self) -> usize {
        self.steps + self.suffix.as_ref().map_or(0, |s| s.scheduled_steps())
    }

    fn has_reached_max_steps(&self) -> bool {
        self.scheduled_steps() > self.max_schedulable_steps
    }

    fn is_fair(&self) -> bool {
        self.suffix.as_ref().map_or(self.trace_is_fair, |s| s.is_fair())
    }

    fn description(&self) -> String {
        let suffix = self
            .suffix
            .as_ref()
            .map_or_else(|| "none".to_string(), |s| s.description());
        format!("Critical transition finding with suffix strategy ({})", suffix)
    }
}
