//! Schedule Trace
//!
//! # Overview
//!
//! Append-only record of every choice made during one iteration. Each step
//! carries exactly one payload (a scheduled unit, a boolean or an integer),
//! consistent with its [`ScheduleStepType`]. Replaying the same sequence of
//! payloads against a deterministic runtime reproduces the run exactly.
//!
//! # Persisted Form
//!
//! A trace flattens to an ordered list of [`TraceRecord`]s:
//!
//! ```text
//! [ {"type":"schedule","unit":1},
//!   {"type":"boolean","value":true},
//!   {"type":"fair_boolean","id":"retry","value":false},
//!   {"type":"integer","value":3} ]
//! ```
//!
//! Indices are implicit in the list order and recomputed on load.

use fairloop_core::UnitId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of choice recorded by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleStepType {
    /// The scheduler picked the next unit to run
    SchedulingChoice,
    /// The program asked for a boolean or integer value
    NondeterministicChoice,
    /// The program asked for a boolean that must be resolved fairly
    FairNondeterministicChoice,
}

impl fmt::Display for ScheduleStepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchedulingChoice => write!(f, "SchedulingChoice"),
            Self::NondeterministicChoice => write!(f, "NondeterministicChoice"),
            Self::FairNondeterministicChoice => write!(f, "FairNondeterministicChoice"),
        }
    }
}

/// Value carried by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StepPayload {
    Unit(UnitId),
    Boolean(bool),
    Integer(u64),
}

/// One recorded choice
///
/// Exactly one of the unit, boolean and integer payloads is present,
/// consistent with the step type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStep {
    index: usize,
    step_type: ScheduleStepType,
    payload: StepPayload,
    nondet_choice_id: Option<String>,
}

impl ScheduleStep {
    /// A scheduling choice
    pub fn scheduling(index: usize, unit: UnitId) -> Self {
        Self {
            index,
            step_type: ScheduleStepType::SchedulingChoice,
            payload: StepPayload::Unit(unit),
            nondet_choice_id: None,
        }
    }

    /// A nondeterministic boolean choice
    pub fn boolean(index: usize, value: bool) -> Self {
        Self {
            index,
            step_type: ScheduleStepType::NondeterministicChoice,
            payload: StepPayload::Boolean(value),
            nondet_choice_id: None,
        }
    }

    /// A fair nondeterministic boolean choice identified by `choice_id`
    pub fn fair_boolean(index: usize, value: bool, choice_id: impl Into<String>) -> Self {
        Self {
            index,
            step_type: ScheduleStepType::FairNondeterministicChoice,
            payload: StepPayload::Boolean(value),
            nondet_choice_id: Some(choice_id.into()),
        }
    }

    /// A nondeterministic integer choice
    pub fn integer(index: usize, value: u64) -> Self {
        Self {
            index,
            step_type: ScheduleStepType::NondeterministicChoice,
            payload: StepPayload::Integer(value),
            nondet_choice_id: None,
        }
    }

    /// Position in the trace
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Kind of choice
    #[inline]
    pub fn step_type(&self) -> ScheduleStepType {
        self.step_type
    }

    /// Chosen unit, for scheduling choices
    #[inline]
    pub fn scheduled_unit(&self) -> Option<UnitId> {
        match self.payload {
            StepPayload::Unit(unit) => Some(unit),
            _ => None,
        }
    }

    /// Chosen boolean, for boolean choices
    #[inline]
    pub fn boolean_choice(&self) -> Option<bool> {
        match self.payload {
            StepPayload::Boolean(value) => Some(value),
            _ => None,
        }
    }

    /// Chosen integer, for integer choices
    #[inline]
    pub fn integer_choice(&self) -> Option<u64> {
        match self.payload {
            StepPayload::Integer(value) => Some(value),
            _ => None,
        }
    }

    /// Identifier of a fair boolean choice
    #[inline]
    pub fn nondet_choice_id(&self) -> Option<&str> {
        self.nondet_choice_id.as_deref()
    }

    /// Whether this is a scheduling choice
    #[inline]
    pub fn is_scheduling(&self) -> bool {
        self.step_type == ScheduleStepType::SchedulingChoice
    }

    /// Flat persisted form
    pub fn to_record(&self) -> TraceRecord {
        match self.payload {
            StepPayload::Unit(unit) => TraceRecord::Schedule { unit },
            StepPayload::Boolean(value) => match &self.nondet_choice_id {
                Some(id) => TraceRecord::FairBoolean {
                    id: id.clone(),
                    value,
                },
                None => TraceRecord::Boolean { value },
            },
            StepPayload::Integer(value) => TraceRecord::Integer { value },
        }
    }

    fn from_record(index: usize, record: TraceRecord) -> Self {
        match record {
            TraceRecord::Schedule { unit } => Self::scheduling(index, unit),
            TraceRecord::Boolean { value } => Self::boolean(index, value),
            TraceRecord::FairBoolean { id, value } => Self::fair_boolean(index, value, id),
            TraceRecord::Integer { value } => Self::integer(index, value),
        }
    }
}

impl fmt::Display for ScheduleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :: {} :: ", self.index, self.step_type)?;
        match self.payload {
            StepPayload::Unit(unit) => write!(f, "{}", unit),
            StepPayload::Boolean(value) => write!(f, "{}", value),
            StepPayload::Integer(value) => write!(f, "{}", value),
        }
    }
}

/// Persisted form of one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceRecord {
    /// Scheduling choice
    Schedule {
        /// Chosen unit
        unit: UnitId,
    },
    /// Boolean choice
    Boolean {
        /// Chosen value
        value: bool,
    },
    /// Fair boolean choice
    FairBoolean {
        /// Choice identifier
        id: String,
        /// Chosen value
        value: bool,
    },
    /// Integer choice
    Integer {
        /// Chosen value
        value: u64,
    },
}

/// Ordered, append-only sequence of schedule steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTrace {
    steps: Vec<ScheduleStep>,
}

impl ScheduleTrace {
    /// Create an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a scheduling choice, returning its index
    pub fn add_scheduling_choice(&mut self, unit: UnitId) -> usize {
        let index = self.steps.len();
        self.steps.push(ScheduleStep::scheduling(index, unit));
        index
    }

    /// Record a boolean choice, returning its index
    pub fn add_boolean_choice(&mut self, value: bool) -> usize {
        let index = self.steps.len();
        self.steps.push(ScheduleStep::boolean(index, value));
        index
    }

    /// Record a fair boolean choice, returning its index
    pub fn add_fair_boolean_choice(&mut self, value: bool, choice_id: &str) -> usize {
        let index = self.steps.len();
        self.steps
            .push(ScheduleStep::fair_boolean(index, value, choice_id));
        index
    }

    /// Record an integer choice, returning its index
    pub fn add_integer_choice(&mut self, value: u64) -> usize {
        let index = self.steps.len();
        self.steps.push(ScheduleStep::integer(index, value));
        index
    }

    /// Number of steps
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no step was recorded
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at `index`
    #[inline]
    pub fn get(&self, index: usize) -> Option<&ScheduleStep> {
        self.steps.get(index)
    }

    /// Most recent step
    #[inline]
    pub fn last(&self) -> Option<&ScheduleStep> {
        self.steps.last()
    }

    /// Iterate steps in order
    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleStep> {
        self.steps.iter()
    }

    /// Steps as a slice
    pub fn steps(&self) -> &[ScheduleStep] {
        &self.steps
    }

    /// Drop every step
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Flat persisted form
    pub fn to_records(&self) -> Vec<TraceRecord> {
        self.steps.iter().map(ScheduleStep::to_record).collect()
    }

    /// Rebuild a trace from its persisted form
    pub fn from_records(records: impl IntoIterator<Item = TraceRecord>) -> Self {
        let steps = records
            .into_iter()
            .enumerate()
            .map(|(index, record)| ScheduleStep::from_record(index, record))
            .collect();
        Self { steps }
    }
}

impl<'a> IntoIterator for &'a ScheduleTrace {
    type Item = &'a ScheduleStep;
    type IntoIter = std::slice::Iter<'a, ScheduleStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl std::ops::Index<usize> for ScheduleTrace {
    type Output = ScheduleStep;

    fn index(&self, index: usize) -> &Self::Output {
        &self.steps[index]
    }
}
