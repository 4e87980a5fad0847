//! Verbatim replay of a recorded trace

use super::{enabled, ExplorationContext, SchedulingStrategy};
use crate::domain::trace::{ScheduleStep, ScheduleStepType, ScheduleTrace};
use fairloop_core::{SchedulableUnit, SchedulingError, UnitId};
use tracing::debug;

/// Replays every choice of a recorded trace, in order
///
/// Any mismatch between the live request and the recorded step is reported
/// as `SchedulingError::NotReproducible`. The run stops as bounded once every
/// recorded step was consumed.
pub struct ReplayStrategy {
    trace: ScheduleTrace,
    is_fair: bool,
    cursor: usize,
}

impl ReplayStrategy {
    /// Replay `trace`, which was recorded by a strategy of the given fairness
    pub fn new(trace: ScheduleTrace, is_fair: bool) -> Self {
        Self {
            trace,
            is_fair,
            cursor: 0,
        }
    }

    /// Trace being replayed
    pub fn trace(&self) -> &ScheduleTrace {
        &self.trace
    }

    fn next_step(&self) -> Result<&ScheduleStep, SchedulingError> {
        self.trace.get(self.cursor).ok_or_else(|| {
            SchedulingError::not_reproducible(self.cursor, "execution is longer than trace")
        })
    }
}

impl SchedulingStrategy for ReplayStrategy {
    fn next_unit(
        &mut self,
        _ctx: &mut ExplorationContext<'_>,
        choices: &[SchedulableUnit],
        _current: Option<&SchedulableUnit>,
    ) -> Result<UnitId, SchedulingError> {
        if enabled(choices).next().is_none() {
            return Err(SchedulingError::NoEnabledChoice);
        }

        let step = self.next_step()?;
        let unit = step.scheduled_unit().ok_or_else(|| {
            SchedulingError::not_reproducible(self.cursor, "next step is not a scheduling choice")
        })?;
        if !enabled(choices).any(|u| u.id == unit) {
            return Err(SchedulingError::not_reproducible(
                self.cursor,
                format!("cannot detect enabled unit '{}'", unit),
            ));
        }

        debug!(target: "fairloop::strategy", "Replaying step {} -> {}", self.cursor, unit);
        self.cursor += 1;
        Ok(unit)
    }

    fn next_boolean(&mut self, _ctx: &mut ExplorationContext<'_>, _max_value: u64) -> Result<bool, SchedulingError> {
        let step = self.next_step()?;
        if step.step_type() == ScheduleStepType::SchedulingChoice {
            return Err(SchedulingError::not_reproducible(
                self.cursor,
                "next step is not a nondeterministic choice",
            ));
        }
        let value = step.boolean_choice().ok_or_else(|| {
            SchedulingError::not_reproducible(self.cursor, "next step is not a nondeterministic boolean choice")
        })?;
        self.cursor += 1;
        Ok(value)
    }

    fn next_integer(&mut self, _ctx: &mut ExplorationContext<'_>, _max_value: u64) -> Result<u64, SchedulingError> {
        let step = self.next_step()?;
        if step.step_type() != ScheduleStepType::NondeterministicChoice {
            return Err(SchedulingError::not_reproducible(
                self.cursor,
                "next step is not a nondeterministic choice",
            ));
        }
        let value = step.integer_choice().ok_or_else(|| {
            SchedulingError::not_reproducible(self.cursor, "next step is not a nondeterministic integer choice")
        })?;
        self.cursor += 1;
        Ok(value)
    }

    fn prepare_for_next_iteration(&mut self) -> bool {
        self.cursor = 0;
        true
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn scheduled_steps(&self) -> usize {
        self.cursor
    }

    fn has_reached_max_steps(&self) -> bool {
        !self.trace.is_empty() && self.cursor >= self.trace.len()
    }

    fn is_fair(&self) -> bool {
        self.is_fair
    }

    fn description(&self) -> String {
        format!("replay ({} steps)", self.trace.len())
    }
}
