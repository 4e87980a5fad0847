//! Fairness validation of candidate cycles
//!
//! A cycle only witnesses an infinite execution if a fair scheduler could
//! repeat it forever: no enabled unit is starved and every fair boolean
//! choice resolves both ways.

use super::CycleStep;
use crate::domain::trace::ScheduleStepType;
use fairloop_core::{MonitorId, UnitId};
use std::collections::{BTreeSet, HashMap};

/// Units enabled somewhere in the cycle are exactly the units scheduled in it
pub fn is_scheduling_fair(cycle: &[CycleStep]) -> bool {
    let enabled: BTreeSet<UnitId> = cycle
        .iter()
        .flat_map(|entry| entry.state.enabled_units.iter().copied())
        .collect();
    let scheduled: BTreeSet<UnitId> = cycle.iter().filter_map(|entry| entry.step.scheduled_unit()).collect();
    enabled == scheduled
}

/// Every fair choice id in the cycle was resolved both `true` and `false`
pub fn is_nondeterminism_fair(cycle: &[CycleStep]) -> bool {
    // (seen true, seen false)
    let mut outcomes: HashMap<&str, (bool, bool)> = HashMap::new();
    for entry in cycle {
        if entry.step.step_type() != ScheduleStepType::FairNondeterministicChoice {
            continue;
        }
        let (Some(id), Some(value)) = (entry.step.nondet_choice_id(), entry.step.boolean_choice()) else {
            continue;
        };
        let seen = outcomes.entry(id).or_default();
        if value {
            seen.0 = true;
        } else {
            seen.1 = true;
        }
    }
    outcomes.values().all(|&(t, f)| t && f)
}

/// Monitors hot in every state of the cycle
///
/// A monitor hot throughout is never cold, so the result is also the set of
/// monitors that never cooled down inside the cycle.
pub fn hot_monitors(cycle: &[CycleStep]) -> Vec<MonitorId> {
    let Some(first) = cycle.first() else {
        return Vec::new();
    };
    first
        .state
        .monitor_status
        .iter()
        .filter(|(_, status)| status.is_hot())
        .map(|(monitor, _)| monitor)
        .filter(|monitor| cycle.iter().all(|entry| entry.state.status_of(monitor).is_hot()))
        .cloned()
        .collect()
}
