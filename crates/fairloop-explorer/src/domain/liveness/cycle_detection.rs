//! Cycle Detection Strategy
//!
//! # Overview
//!
//! Decorator around a base strategy. Before every choice it captures the
//! program state reached by the previous step. When the state repeats, the
//! steps since its previous occurrence become a candidate cycle; a fair
//! candidate that keeps some monitor hot is replayed choice by choice while a
//! temperature counter rises. Reaching the threshold reports a
//! [`LivenessViolation`].
//!
//! # Escape
//!
//! The replay is abandoned, and the current request forwarded to the base
//! strategy, when
//! - a monitor of the cycle cooled down,
//! - a state captured after the cycle start is not part of the cycle, or
//! - the request does not match the recorded step (kind or enabled target).
//!
//! Escaping is ordinary control flow and never an error.

use super::fairness::{hot_monitors, is_nondeterminism_fair, is_scheduling_fair};
use super::CycleStep;
use crate::domain::config::Configuration;
use crate::domain::state_cache::Fingerprint;
use crate::domain::strategy::{enabled, resolve_seed, ExplorationContext, SchedulingStrategy};
use crate::domain::trace::{ScheduleStep, ScheduleStepType};
use fairloop_core::{LivenessViolation, MonitorId, SchedulableUnit, SchedulingError, UnitId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Alternate windows tried when the latest candidate cycle is unfair
const MAX_FAIRNESS_RETRIES: usize = 3;

/// Derived temperature threshold per step of the cycle
const TEMPERATURE_PER_CYCLE_STEP: usize = 10;

/// Liveness checker wrapping a base strategy
pub struct CycleDetectionStrategy {
    base: Box<dyn SchedulingStrategy>,
    rng: StdRng,
    safety_prefix_bound: usize,
    configured_threshold: usize,
    debugging: bool,

    potential_cycle: Vec<CycleStep>,
    cycle_fingerprints: HashSet<Fingerprint>,
    hot_monitors: Vec<MonitorId>,
    end_of_cycle_index: usize,
    temperature: usize,
    threshold: usize,
    replaying: bool,
    cursor: usize,
    next_walk_index: usize,
    replayed_steps: usize,
}

impl CycleDetectionStrategy {
    /// Wrap `base` using the liveness settings of `config`
    pub fn new(base: Box<dyn SchedulingStrategy>, config: &Configuration) -> Self {
        Self {
            base,
            rng: StdRng::seed_from_u64(resolve_seed(config.random_seed)),
            safety_prefix_bound: config.safety_prefix_bound,
            configured_threshold: config.liveness_temperature_threshold,
            debugging: config.enable_debugging,
            potential_cycle: Vec::new(),
            cycle_fingerprints: HashSet::new(),
            hot_monitors: Vec::new(),
            end_of_cycle_index: 0,
            temperature: 0,
            threshold: 0,
            replaying: false,
            cursor: 0,
            next_walk_index: 0,
            replayed_steps: 0,
        }
    }

    /// Whether a candidate cycle is being replayed
    #[inline]
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Current liveness temperature
    #[inline]
    pub fn temperature(&self) -> usize {
        self.temperature
    }

    /// Threshold of the current cycle (0 when none)
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Monitors hot throughout the current cycle
    pub fn hot_monitors(&self) -> &[MonitorId] {
        &self.hot_monitors
    }

    /// Steps of the current candidate cycle
    pub fn potential_cycle(&self) -> &[CycleStep] {
        &self.potential_cycle
    }

    /// Wrapped strategy
    pub fn base(&self) -> &dyn SchedulingStrategy {
        self.base.as_ref()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // State capture
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Capture the state reached by the last step and advance the checker
    fn capture_and_check(&mut self, ctx: &mut ExplorationContext<'_>) -> Result<(), SchedulingError> {
        let Some(last) = ctx.trace.last() else {
            return Ok(());
        };
        if self.safety_prefix_bound > self.scheduled_steps() {
            return Ok(());
        }

        let capture = ctx.cache.capture_state(last.index(), ctx.units);
        if capture.is_repeat {
            debug!(
                target: "fairloop::liveness",
                "Detected potential infinite execution at step {} ({})",
                last.index(),
                capture.fingerprint
            );
            self.check_liveness_at_trace_cycle(ctx, capture.fingerprint);
        }

        if !self.potential_cycle.is_empty() {
            self.check_liveness_temperature(ctx)?;
        }
        Ok(())
    }

    fn collect_cycle(ctx: &ExplorationContext<'_>, start: usize) -> Vec<CycleStep> {
        ctx.trace
            .iter()
            .skip(start)
            .filter_map(|step| {
                ctx.cache.state_at(step.index()).map(|state| CycleStep {
                    step: step.clone(),
                    state: state.clone(),
                })
            })
            .collect()
    }

    fn is_fair_cycle(cycle: &[CycleStep]) -> bool {
        is_scheduling_fair(cycle) && is_nondeterminism_fair(cycle)
    }

    fn check_liveness_at_trace_cycle(&mut self, ctx: &ExplorationContext<'_>, fingerprint: Fingerprint) {
        if !self.potential_cycle.is_empty() {
            return;
        }

        let indices = ctx.cache.indices_of(fingerprint).to_vec();
        let k = indices.len();
        if k < 2 {
            return;
        }

        let mut cycle = Self::collect_cycle(ctx, indices[k - 2] + 1);
        if !Self::is_fair_cycle(&cycle) {
            let retries = (k - 1).min(MAX_FAIRNESS_RETRIES);
            let mut found = false;
            for _ in 0..retries {
                let pick = if k > 2 { self.rng.gen_range(0..k - 2) } else { 0 };
                cycle = Self::collect_cycle(ctx, indices[pick] + 1);
                if Self::is_fair_cycle(&cycle) {
                    found = true;
                    break;
                }
            }
            if !found {
                debug!(target: "fairloop::liveness", "Potential cycle is unfair, resuming exploration");
                return;
            }
        }

        let hot = hot_monitors(&cycle);
        if hot.is_empty() {
            debug!(target: "fairloop::liveness", "No monitor stays hot in the cycle, resuming exploration");
            return;
        }

        if self.debugging {
            self.dump_schedule(ctx);
            for entry in &cycle {
                debug!(target: "fairloop::liveness", "cycle: {} :: {}", entry.step, entry.state);
            }
        }

        self.end_of_cycle_index = cycle.iter().map(|entry| entry.step.index()).min().unwrap_or_default();
        self.threshold = if self.configured_threshold > 0 {
            self.configured_threshold
        } else {
            TEMPERATURE_PER_CYCLE_STEP * cycle.len()
        };
        self.cycle_fingerprints = cycle.iter().map(|entry| entry.state.fingerprint).collect();
        self.next_walk_index = self.end_of_cycle_index + 1;
        self.hot_monitors = hot;
        self.potential_cycle = cycle;
        self.temperature = 0;
        self.cursor = 0;
        self.replaying = true;

        info!(
            target: "fairloop::liveness",
            "🔥 Replaying fair cycle of {} steps, hot monitors {:?}, threshold {}",
            self.potential_cycle.len(),
            self.hot_monitors,
            self.threshold
        );
    }

    fn check_liveness_temperature(&mut self, ctx: &ExplorationContext<'_>) -> Result<(), SchedulingError> {
        if let Some(cooled) = self.hot_monitors.iter().find(|m| ctx.cache.monitor_status(m).is_cold()) {
            let reason = format!("monitor '{}' became cold", cooled);
            self.escape(&reason);
            return Ok(());
        }

        let last_index = ctx.trace.last().map(ScheduleStep::index).unwrap_or_default();
        while self.next_walk_index <= last_index {
            let index = self.next_walk_index;
            self.next_walk_index += 1;
            if let Some(state) = ctx.cache.state_at(index) {
                if !self.cycle_fingerprints.contains(&state.fingerprint) {
                    let reason = format!("state at step {} left the cycle", index);
                    self.escape(&reason);
                    return Ok(());
                }
            }
        }

        self.temperature += 1;
        if self.temperature < self.threshold {
            return Ok(());
        }

        let violation = LivenessViolation {
            monitors: self.hot_monitors.clone(),
            temperature: self.temperature,
            cycle_len: self.potential_cycle.len(),
        };
        warn!(target: "fairloop::liveness", "❌ {}", violation);
        if self.debugging {
            self.dump_schedule(ctx);
        }
        self.clear_cycle();
        Err(SchedulingError::Liveness(violation))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Replay
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn current_replay_step(&self) -> Option<&ScheduleStep> {
        if !self.replaying {
            return None;
        }
        self.potential_cycle.get(self.cursor).map(|entry| &entry.step)
    }

    fn advance_replay(&mut self) {
        self.cursor = (self.cursor + 1) % self.potential_cycle.len().max(1);
        self.replayed_steps += 1;
    }

    fn escape(&mut self, reason: &str) {
        warn!(target: "fairloop::liveness", "↩️  Escaping cycle replay: {}", reason);
        self.clear_cycle();
    }

    fn clear_cycle(&mut self) {
        self.potential_cycle.clear();
        self.cycle_fingerprints.clear();
        self.hot_monitors.clear();
        self.end_of_cycle_index = 0;
        self.temperature = 0;
        self.threshold = 0;
        self.cursor = 0;
        self.next_walk_index = 0;
        self.replaying = false;
    }

    fn dump_schedule(&self, ctx: &ExplorationContext<'_>) {
        for step in ctx.trace {
            let fingerprint = ctx
                .cache
                .state_at(step.index())
                .map(|s| s.fingerprint.to_string())
                .unwrap_or_else(|| "-".to_string());
            debug!(target: "fairloop::liveness", "schedule: {} :: {}", step, fingerprint);
        }
    }
}

impl SchedulingStrategy for CycleDetectionStrategy {
    fn next_unit(
        &mut self,
        ctx: &mut ExplorationContext<'_>,
        choices: &[SchedulableUnit],
        current: Option<&SchedulableUnit>,
    ) -> Result<UnitId, SchedulingError> {
        self.capture_and_check(ctx)?;

        if let Some(step) = self.current_replay_step() {
            match step.scheduled_unit() {
                Some(unit) if enabled(choices).any(|u| u.id == unit) => {
                    self.advance_replay();
                    return Ok(unit);
                }
                Some(unit) => {
                    let reason = format!("recorded unit {} is not enabled", unit);
                    self.escape(&reason);
                }
                None => self.escape("recorded step is not a scheduling choice"),
            }
        }

        self.base.next_unit(ctx, choices, current)
    }

    fn next_boolean(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<bool, SchedulingError> {
        self.capture_and_check(ctx)?;

        if let Some(step) = self.current_replay_step() {
            match step.boolean_choice() {
                Some(value) if !step.is_scheduling() => {
                    self.advance_replay();
                    return Ok(value);
                }
                _ => self.escape("recorded step is not a boolean choice"),
            }
        }

        self.base.next_boolean(ctx, max_value)
    }

    fn next_integer(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<u64, SchedulingError> {
        self.capture_and_check(ctx)?;

        if let Some(step) = self.current_replay_step() {
            match step.integer_choice() {
                Some(value) if step.step_type() == ScheduleStepType::NondeterministicChoice => {
                    self.advance_replay();
                    return Ok(value);
                }
                _ => self.escape("recorded step is not an integer choice"),
            }
        }

        self.base.next_integer(ctx, max_value)
    }

    fn prepare_for_next_iteration(&mut self) -> bool {
        self.replayed_steps = 0;
        // The base always closes its iteration, even when the replay carries over
        let base_continues = self.base.prepare_for_next_iteration();
        if self.replaying {
            self.cursor = 0;
            self.next_walk_index = self.end_of_cycle_index + 1;
        }
        base_continues
    }

    fn reset(&mut self) {
        self.cursor = 0;
        self.replayed_steps = 0;
        self.base.reset();
    }

    fn scheduled_steps(&self) -> usize {
        self.base.scheduled_steps() + self.replayed_steps
    }

    fn has_reached_max_steps(&self) -> bool {
        !self.replaying && self.base.has_reached_max_steps()
    }

    fn is_fair(&self) -> bool {
        self.replaying || self.base.is_fair()
    }

    fn description(&self) -> String {
        format!("cycle detection over {}", self.base.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::Harness;
    use crate::domain::strategy::DfsStrategy;
    use fairloop_core::MonitorStatus;

    /// Alternates over the enabled units in order
    struct RoundRobin {
        steps: usize,
    }

    impl SchedulingStrategy for RoundRobin {
        fn next_unit(
            &mut self,
            _ctx: &mut ExplorationContext<'_>,
            choices: &[SchedulableUnit],
            _current: Option<&SchedulableUnit>,
        ) -> Result<UnitId, SchedulingError> {
            let candidates: Vec<UnitId> = enabled(choices).map(|u| u.id).collect();
            if candidates.is_empty() {
                return Err(SchedulingError::NoEnabledChoice);
            }
            let unit = candidates[self.steps % candidates.len()];
            self.steps += 1;
            Ok(unit)
        }

        fn next_boolean(&mut self, _ctx: &mut ExplorationContext<'_>, _max: u64) -> Result<bool, SchedulingError> {
            self.steps += 1;
            Ok(false)
        }

        fn next_integer(&mut self, _ctx: &mut ExplorationContext<'_>, _max: u64) -> Result<u64, SchedulingError> {
            self.steps += 1;
            Ok(0)
        }

        fn prepare_for_next_iteration(&mut self) -> bool {
            self.steps = 0;
            true
        }

        fn reset(&mut self) {
            self.steps = 0;
        }

        fn scheduled_steps(&self) -> usize {
            self.steps
        }

        fn has_reached_max_steps(&self) -> bool {
            false
        }

        fn is_fair(&self) -> bool {
            true
        }

        fn description(&self) -> String {
            "round robin".to_string()
        }
    }

    const PHASES: [&str; 4] = ["A", "B", "C", "D"];

    fn config() -> Configuration {
        Configuration {
            random_seed: Some(3),
            enable_cycle_detection: true,
            ..Configuration::default()
        }
    }

    /// Two units scheduled against a machine cycling through four states
    /// while monitor `M` sits hot
    fn harness() -> Harness {
        let mut harness = Harness::with_units(&[1, 2]);
        harness.cache.enter_state(UnitId(1), PHASES[0]);
        harness
            .cache
            .monitor_enter_state(&MonitorId::new("M"), "Waiting", MonitorStatus::Hot);
        harness
    }

    /// Replace the state of machine 1
    fn move_to(harness: &mut Harness, state: &str) {
        if let Some(current) = harness.cache.current_state(UnitId(1)).map(str::to_owned) {
            harness.cache.exit_state(UnitId(1), &current);
        }
        harness.cache.enter_state(UnitId(1), state);
    }

    /// Schedules units in a fixed order
    struct Scripted {
        script: Vec<u64>,
        steps: usize,
    }

    impl SchedulingStrategy for Scripted {
        fn next_unit(
            &mut self,
            _ctx: &mut ExplorationContext<'_>,
            _choices: &[SchedulableUnit],
            _current: Option<&SchedulableUnit>,
        ) -> Result<UnitId, SchedulingError> {
            let unit = UnitId(self.script[self.steps % self.script.len()]);
            self.steps += 1;
            Ok(unit)
        }

        fn next_boolean(&mut self, _ctx: &mut ExplorationContext<'_>, _max: u64) -> Result<bool, SchedulingError> {
            self.steps += 1;
            Ok(false)
        }

        fn next_integer(&mut self, _ctx: &mut ExplorationContext<'_>, _max: u64) -> Result<u64, SchedulingError> {
            self.steps += 1;
            Ok(0)
        }

        fn prepare_for_next_iteration(&mut self) -> bool {
            self.steps = 0;
            true
        }

        fn reset(&mut self) {
            self.steps = 0;
        }

        fn scheduled_steps(&self) -> usize {
            self.steps
        }

        fn has_reached_max_steps(&self) -> bool {
            false
        }

        fn is_fair(&self) -> bool {
            true
        }

        fn description(&self) -> String {
            "scripted".to_string()
        }
    }

    /// Schedule one step and move the machine to its next phase
    fn step(harness: &mut Harness, strategy: &mut CycleDetectionStrategy) -> Result<UnitId, SchedulingError> {
        let unit = harness.schedule(strategy)?;
        let phase = harness.trace.len();
        harness.cache.exit_state(UnitId(1), PHASES[(phase - 1) % 4]);
        harness.cache.enter_state(UnitId(1), PHASES[phase % 4]);
        Ok(unit)
    }

    #[test]
    fn test_hot_cycle_raises_violation_once() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config());
        let mut h = harness();

        let mut violations = Vec::new();
        for _ in 0..200 {
            match step(&mut h, &mut strategy) {
                Ok(_) => {}
                Err(SchedulingError::Liveness(v)) => {
                    violations.push(v);
                    break;
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(violations.len(), 1);
        let violation = &violations[0];
        assert_eq!(violation.monitors, vec![MonitorId::new("M")]);
        assert_eq!(violation.cycle_len, 4);
        assert_eq!(violation.temperature, 40);
        assert!(!strategy.is_replaying());
        assert_eq!(strategy.temperature(), 0);
    }

    #[test]
    fn test_replay_suppresses_bound_and_reports_fair() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(DfsStrategy::new(1)), &config());
        assert!(!strategy.is_fair());

        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config());
        let mut h = harness();
        for _ in 0..6 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(strategy.is_replaying());
        assert_eq!(strategy.threshold(), 40);
        assert_eq!(strategy.hot_monitors(), &[MonitorId::new("M")]);
        assert_eq!(strategy.potential_cycle().len(), 4);
        assert!(strategy.is_fair());
        assert!(!strategy.has_reached_max_steps());
    }

    #[test]
    fn test_boolean_request_during_replay_escapes() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config());
        let mut h = harness();
        for _ in 0..6 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(strategy.is_replaying());

        let value = h.boolean(&mut strategy).unwrap();
        assert!(!value);
        assert!(!strategy.is_replaying());
        assert!(strategy.potential_cycle().is_empty());
        assert!(strategy.hot_monitors().is_empty());
        assert_eq!(strategy.temperature(), 0);
    }

    #[test]
    fn test_cooled_monitor_escapes() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config());
        let mut h = harness();
        for _ in 0..6 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(strategy.is_replaying());

        h.cache.monitor_status_changed(&MonitorId::new("M"), MonitorStatus::Cold);
        step(&mut h, &mut strategy).unwrap();
        assert!(!strategy.is_replaying());
    }

    #[test]
    fn test_unfair_cycle_is_not_replayed() {
        // DFS always picks unit 1 while unit 2 stays enabled
        let mut strategy = CycleDetectionStrategy::new(Box::new(DfsStrategy::new(0)), &config());
        let mut h = harness();
        for _ in 0..100 {
            step(&mut h, &mut strategy).unwrap();
            assert!(!strategy.is_replaying());
        }
    }

    #[test]
    fn test_state_outside_cycle_escapes() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config());
        let mut h = harness();
        for _ in 0..6 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(strategy.is_replaying());

        move_to(&mut h, "Z");
        h.schedule(&mut strategy).unwrap();
        assert!(!strategy.is_replaying());
        assert_eq!(strategy.temperature(), 0);
        assert!(strategy.potential_cycle().is_empty());
    }

    #[test]
    fn test_disabled_recorded_unit_escapes() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config());
        let mut h = harness();
        for _ in 0..6 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(strategy.is_replaying());

        // One step of the cycle was replayed, the second is next
        let recorded = strategy.potential_cycle()[1].step.scheduled_unit().unwrap();
        let choices: Vec<SchedulableUnit> = h
            .units
            .iter()
            .map(|u| u.clone().enabled(u.id != recorded))
            .collect();
        let mut ctx = ExplorationContext {
            trace: &h.trace,
            cache: &mut h.cache,
            units: &h.units,
        };

        let unit = strategy.next_unit(&mut ctx, &choices, None).unwrap();
        assert_ne!(unit, recorded);
        assert!(!strategy.is_replaying());
        assert!(strategy.hot_monitors().is_empty());
    }

    #[test]
    fn test_unfair_window_retries_earlier_repeat() {
        // A repeats at steps 0, 2 and 4: the last window only runs unit 2,
        // the one before only unit 1, together both units run
        let script = vec![1, 1, 1, 2, 2];
        let states = ["A", "B", "A", "C", "A"];
        let mut strategy = CycleDetectionStrategy::new(
            Box::new(Scripted {
                script: script.clone(),
                steps: 0,
            }),
            &config(),
        );
        let mut h = harness();
        for state in states {
            h.schedule(&mut strategy).unwrap();
            assert!(!strategy.is_replaying());
            move_to(&mut h, state);
        }

        h.schedule(&mut strategy).unwrap();
        assert!(strategy.is_replaying());
        let scheduled: Vec<u64> = strategy
            .potential_cycle()
            .iter()
            .filter_map(|entry| entry.step.scheduled_unit())
            .map(|unit| unit.as_u64())
            .collect();
        assert_eq!(scheduled, script[1..].to_vec());
        assert_eq!(strategy.hot_monitors(), &[MonitorId::new("M")]);
    }

    #[test]
    fn test_base_closes_iteration_while_replay_carries_over() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(DfsStrategy::new(0)), &config());
        let mut h = harness();
        h.units.truncate(1);
        for _ in 0..6 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(strategy.is_replaying());
        assert_eq!(strategy.scheduled_steps(), 6);

        // A single unit leaves DFS nothing else to explore
        assert!(!strategy.prepare_for_next_iteration());
        assert!(strategy.is_replaying());
        assert_eq!(strategy.scheduled_steps(), 0);

        h.next_iteration();
        assert!(!h.boolean(&mut strategy).unwrap());
        assert!(!strategy.is_replaying());
        assert_eq!(strategy.scheduled_steps(), 1);
    }

    #[test]
    fn test_cold_monitor_cycle_is_not_replayed() {
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config());
        let mut h = harness();
        h.cache.monitor_status_changed(&MonitorId::new("M"), MonitorStatus::Cold);
        for _ in 0..50 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(!strategy.is_replaying());
    }

    #[test]
    fn test_safety_prefix_defers_capture() {
        let config = Configuration {
            safety_prefix_bound: 1_000,
            ..config()
        };
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config);
        let mut h = harness();
        for _ in 0..50 {
            step(&mut h, &mut strategy).unwrap();
        }
        assert!(h.cache.is_empty());
        assert!(!strategy.is_replaying());
    }

    #[test]
    fn test_configured_threshold_overrides_derived() {
        let config = Configuration {
            liveness_temperature_threshold: 5,
            ..config()
        };
        let mut strategy = CycleDetectionStrategy::new(Box::new(RoundRobin { steps: 0 }), &config);
        let mut h = harness();

        let mut fired_at = None;
        for call in 1..=100 {
            if let Err(SchedulingError::Liveness(v)) = step(&mut h, &mut strategy) {
                assert_eq!(v.temperature, 5);
                fired_at = Some(call);
                break;
            }
        }
        assert_eq!(fired_at, Some(10));
    }
}
