//! Test Reports
//!
//! # Overview
//!
//! A [`TestReport`] aggregates every iteration of a run: schedule counts and
//! step statistics, the bugs found with their kinds and (optionally) their
//! reproducing traces, and the state coverage observed.
//!
//! Reports from independent runs combine with [`TestReport::merge`], which
//! is how parallel workers and minimization rounds fold their results.

use super::trace::TraceRecord;
use fairloop_core::BugKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// States visited per machine label and per monitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageInfo {
    /// Machine label -> states entered
    pub machine_states: BTreeMap<String, BTreeSet<String>>,
    /// Monitor name -> states entered
    pub monitor_states: BTreeMap<String, BTreeSet<String>>,
}

impl CoverageInfo {
    /// Record that machine `label` entered `state`
    pub fn record_machine_state(&mut self, label: &str, state: &str) {
        self.machine_states
            .entry(label.to_owned())
            .or_default()
            .insert(state.to_owned());
    }

    /// Record that `monitor` entered `state`
    pub fn record_monitor_state(&mut self, monitor: &str, state: &str) {
        self.monitor_states
            .entry(monitor.to_owned())
            .or_default()
            .insert(state.to_owned());
    }

    /// Set union with `other`
    pub fn merge(&mut self, other: &CoverageInfo) {
        for (label, states) in &other.machine_states {
            self.machine_states
                .entry(label.clone())
                .or_default()
                .extend(states.iter().cloned());
        }
        for (monitor, states) in &other.monitor_states {
            self.monitor_states
                .entry(monitor.clone())
                .or_default()
                .extend(states.iter().cloned());
        }
    }

    /// Distinct (owner, state) pairs covered
    pub fn total_states(&self) -> usize {
        self.machine_states.values().map(BTreeSet::len).sum::<usize>()
            + self.monitor_states.values().map(BTreeSet::len).sum::<usize>()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.machine_states.is_empty() && self.monitor_states.is_empty()
    }
}

/// One bug with the schedule that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugTrace {
    /// Bug classification
    pub kind: BugKind,
    /// Human-readable description
    pub message: String,
    /// Whether the producing strategy was fair
    pub is_fair: bool,
    /// Recorded choices, empty when traces are not attached
    pub steps: Vec<TraceRecord>,
    /// Narrative lines logged during the iteration
    pub narrative: Vec<String>,
}

/// Aggregated result of a testing run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    /// Description of the strategy that ran
    pub strategy: String,
    /// Whether any bug was found
    pub bug_found: bool,
    /// Message of the first bug found
    pub bug_report: String,
    /// Bugs found across all iterations
    pub num_of_found_bugs: usize,
    /// Iterations completed
    pub explored_schedules_count: usize,
    /// Iterations driven by a fair strategy
    pub num_of_explored_fair_schedules: usize,
    /// Iterations driven by an unfair strategy
    pub num_of_explored_unfair_schedules: usize,
    /// Fewest steps in one iteration
    pub min_explored_steps: Option<usize>,
    /// Most steps in one iteration
    pub max_explored_steps: usize,
    /// Steps over all iterations
    pub total_explored_steps: usize,
    /// Bugs per kind
    pub bug_kinds: BTreeMap<BugKind, usize>,
    /// Reproducing traces of the bugs found
    pub bug_traces: Vec<BugTrace>,
    /// Coverage over all iterations
    pub coverage: CoverageInfo,
    /// Failures of the engine or the program outside the tested behavior
    pub internal_errors: Vec<String>,
}

impl TestReport {
    /// Empty report for `strategy`
    pub fn new(strategy: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            ..Self::default()
        }
    }

    /// Count one completed iteration of `steps` steps
    pub fn record_schedule(&mut self, steps: usize, is_fair: bool) {
        self.explored_schedules_count += 1;
        if is_fair {
            self.num_of_explored_fair_schedules += 1;
        } else {
            self.num_of_explored_unfair_schedules += 1;
        }
        self.min_explored_steps = Some(self.min_explored_steps.map_or(steps, |min| min.min(steps)));
        self.max_explored_steps = self.max_explored_steps.max(steps);
        self.total_explored_steps += steps;
    }

    /// Record a bug
    pub fn record_bug(&mut self, bug: BugTrace) {
        if !self.bug_found {
            self.bug_found = true;
            self.bug_report = bug.message.clone();
        }
        self.num_of_found_bugs += 1;
        *self.bug_kinds.entry(bug.kind).or_default() += 1;
        self.bug_traces.push(bug);
    }

    /// Record a failure that is not a bug of the program under test
    pub fn record_internal_error(&mut self, message: impl Into<String>) {
        self.internal_errors.push(message.into());
    }

    /// Fold `other` into this report
    pub fn merge(&mut self, other: &TestReport) {
        if self.strategy.is_empty() {
            self.strategy = other.strategy.clone();
        }
        if !self.bug_found && other.bug_found {
            self.bug_report = other.bug_report.clone();
        }
        self.bug_found |= other.bug_found;
        self.num_of_found_bugs += other.num_of_found_bugs;
        self.explored_schedules_count += other.explored_schedules_count;
        self.num_of_explored_fair_schedules += other.num_of_explored_fair_schedules;
        self.num_of_explored_unfair_schedules += other.num_of_explored_unfair_schedules;
        self.min_explored_steps = match (self.min_explored_steps, other.min_explored_steps) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_explored_steps = self.max_explored_steps.max(other.max_explored_steps);
        self.total_explored_steps += other.total_explored_steps;
        for (kind, count) in &other.bug_kinds {
            *self.bug_kinds.entry(*kind).or_default() += count;
        }
        self.bug_traces.extend(other.bug_traces.iter().cloned());
        self.coverage.merge(&other.coverage);
        self.internal_errors.extend(other.internal_errors.iter().cloned());
    }

    /// Mean steps per iteration
    pub fn average_explored_steps(&self) -> f64 {
        if self.explored_schedules_count == 0 {
            0.0
        } else {
            self.total_explored_steps as f64 / self.explored_schedules_count as f64
        }
    }

    /// Bugs of `kind`
    pub fn bugs_of(&self, kind: BugKind) -> usize {
        self.bug_kinds.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Strategy: {}", self.strategy)?;
        writeln!(
            f,
            "Explored {} schedules ({} fair, {} unfair), {:.1} steps on average",
            self.explored_schedules_count,
            self.num_of_explored_fair_schedules,
            self.num_of_explored_unfair_schedules,
            self.average_explored_steps()
        )?;
        if self.bug_found {
            writeln!(f, "Found {} bug(s): {}", self.num_of_found_bugs, self.bug_report)?;
            for (kind, count) in &self.bug_kinds {
                writeln!(f, "  {} × {}", count, kind)?;
            }
        } else {
            writeln!(f, "No bugs found")?;
        }
        write!(f, "Covered {} states", self.coverage.total_states())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bug(kind: BugKind, message: &str) -> BugTrace {
        BugTrace {
            kind,
            message: message.to_string(),
            is_fair: true,
            steps: Vec::new(),
            narrative: Vec::new(),
        }
    }

    #[test]
    fn test_record_schedule_statistics() {
        let mut report = TestReport::new("random");
        report.record_schedule(10, true);
        report.record_schedule(4, false);
        report.record_schedule(7, true);

        assert_eq!(report.explored_schedules_count, 3);
        assert_eq!(report.num_of_explored_fair_schedules, 2);
        assert_eq!(report.num_of_explored_unfair_schedules, 1);
        assert_eq!(report.min_explored_steps, Some(4));
        assert_eq!(report.max_explored_steps, 10);
        assert_eq!(report.total_explored_steps, 21);
        assert!((report.average_explored_steps() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_bug_is_the_report() {
        let mut report = TestReport::new("dfs");
        report.record_bug(bug(BugKind::Safety, "first"));
        report.record_bug(bug(BugKind::Liveness, "second"));

        assert!(report.bug_found);
        assert_eq!(report.bug_report, "first");
        assert_eq!(report.num_of_found_bugs, 2);
        assert_eq!(report.bugs_of(BugKind::Safety), 1);
        assert_eq!(report.bugs_of(BugKind::HotAtTermination), 0);
    }

    #[test]
    fn test_merge() {
        let mut a = TestReport::new("random");
        a.record_schedule(5, true);
        a.coverage.record_machine_state("Server(1)", "Init");

        let mut b = TestReport::new("random");
        b.record_schedule(2, true);
        b.record_bug(bug(BugKind::Safety, "boom"));
        b.coverage.record_machine_state("Server(1)", "Active");
        b.coverage.record_monitor_state("Progress", "Waiting");

        a.merge(&b);
        assert!(a.bug_found);
        assert_eq!(a.bug_report, "boom");
        assert_eq!(a.explored_schedules_count, 2);
        assert_eq!(a.min_explored_steps, Some(2));
        assert_eq!(a.bugs_of(BugKind::Safety), 1);
        assert_eq!(a.coverage.total_states(), 3);
    }

    #[test]
    fn test_json_shape() {
        let mut report = TestReport::new("random");
        report.record_bug(bug(BugKind::Liveness, "hot"));
        let json = serde_json::to_string(&report).unwrap();
        let back: TestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
