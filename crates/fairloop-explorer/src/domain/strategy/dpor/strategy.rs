//! DPOR strategy with a zero-allocation unit set

use super::vector_clock::VectorClock;
use super::MAX_UNITS;
use crate::domain::config::Configuration;
use crate::domain::strategy::{bound_reached, enabled, ExplorationContext, SchedulingStrategy};
use fairloop_core::{SchedulableUnit, SchedulingError, UnitId};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Set of unit slots backed by a single u64
///
/// ```text
/// insert(3):     bits |= (1 << 3)
/// contains(3):   bits & (1 << 3)
/// difference:    A & !B
/// first:         trailing_zeros()
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub struct UnitSet {
    bits: u64,
}

impl UnitSet {
    /// Empty set
    #[inline(always)]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Insert `slot`; slots past the capacity are ignored
    #[inline(always)]
    pub fn insert(&mut self, slot: usize) {
        if slot < MAX_UNITS {
            self.bits |= 1u64 << slot;
        }
    }

    /// Whether `slot` is present
    #[inline(always)]
    pub fn contains(&self, slot: usize) -> bool {
        slot < MAX_UNITS && (self.bits & (1u64 << slot)) != 0
    }

    /// Add every member of `other`
    #[inline(always)]
    pub fn union_with(&mut self, other: &Self) {
        self.bits |= other.bits;
    }

    /// `self \ other`
    #[inline(always)]
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Lowest member
    #[inline(always)]
    pub fn first(&self) -> Option<usize> {
        if self.bits == 0 {
            None
        } else {
            Some(self.bits.trailing_zeros() as usize)
        }
    }

    /// Whether the set is empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of members
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }
}

impl fmt::Debug for UnitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitSet({:#018x})", self.bits)
    }
}

/// One executed scheduling step
#[derive(Clone, Copy, Debug)]
struct StepRecord {
    slot: usize,
    target: Option<UnitId>,
    clock: VectorClock,
}

impl StepRecord {
    #[inline]
    fn is_dependent(&self, slot: usize, target: Option<UnitId>) -> bool {
        self.slot != slot
            && match (self.target, target) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }
}

#[derive(Debug)]
enum Frame {
    Schedule {
        enabled: UnitSet,
        backtrack: UnitSet,
        done: UnitSet,
        chosen: usize,
        record: Option<StepRecord>,
    },
    Value {
        count: u64,
        chosen: u64,
    },
}

/// Exploration statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DporStats {
    /// Completed schedules
    pub explored_schedules: usize,
    /// Races that added a backtrack point
    pub races: usize,
    /// Deepest stack reached
    pub max_depth: usize,
}

/// Depth-first exploration restricted to backtrack sets
pub struct DporStrategy {
    stack: Vec<Frame>,
    depth: usize,
    slots: HashMap<UnitId, usize>,
    units: Vec<UnitId>,
    unit_clocks: Vec<VectorClock>,
    max_steps: usize,
    scheduled_steps: usize,
    stats: DporStats,
}

impl DporStrategy {
    /// Create a strategy with a step bound (0 for unbounded)
    pub fn new(max_steps: usize) -> Self {
        Self {
            stack: Vec::new(),
            depth: 0,
            slots: HashMap::new(),
            units: Vec::new(),
            unit_clocks: Vec::new(),
            max_steps,
            scheduled_steps: 0,
            stats: DporStats::default(),
        }
    }

    /// Build with the unfair step bound
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.step_bound(false))
    }

    /// Exploration statistics
    pub fn stats(&self) -> DporStats {
        self.stats
    }

    fn slot_of(&mut self, unit: UnitId) -> Option<usize> {
        if let Some(&slot) = self.slots.get(&unit) {
            return Some(slot);
        }
        if self.units.len() >= MAX_UNITS {
            return None;
        }
        let slot = self.units.len();
        self.slots.insert(unit, slot);
        self.units.push(unit);
        self.unit_clocks.push(VectorClock::new());
        Some(slot)
    }

    /// Record the step of `slot` at the current depth and grow backtrack sets
    fn commit(&mut self, slot: usize, target: Option<UnitId>) {
        let depth = self.depth;
        let pre = self.unit_clocks[slot];
        let mut clock = pre;
        let mut races = Vec::new();

        for (i, frame) in self.stack[..depth].iter().enumerate() {
            if let Frame::Schedule { record: Some(past), .. } = frame {
                if past.is_dependent(slot, target) {
                    if !past.clock.dominated_by(&pre) {
                        races.push(i);
                    }
                    clock.merge(&past.clock);
                }
            }
        }

        for i in races {
            if let Frame::Schedule { enabled, backtrack, .. } = &mut self.stack[i] {
                if enabled.contains(slot) {
                    backtrack.insert(slot);
                } else {
                    backtrack.union_with(enabled);
                }
                self.stats.races += 1;
            }
        }

        clock.tick(slot);
        self.unit_clocks[slot] = clock;

        if let Frame::Schedule { done, record, .. } = &mut self.stack[depth] {
            done.insert(slot);
            *record = Some(StepRecord { slot, target, clock });
        }
    }

    fn value_frame(&mut self, count: u64) -> Result<u64, SchedulingError> {
        if self.depth == self.stack.len() {
            self.stack.push(Frame::Value { count, chosen: 0 });
        }
        let chosen = match &self.stack[self.depth] {
            Frame::Value { count: recorded, chosen } if *recorded == count => *chosen,
            _ => {
                return Err(SchedulingError::not_reproducible(
                    self.depth,
                    "program made a different choice than in the previous schedule",
                ))
            }
        };
        self.depth += 1;
        self.scheduled_steps += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
        Ok(chosen)
    }
}

impl SchedulingStrategy for DporStrategy {
    fn next_unit(
        &mut self,
        _ctx: &mut ExplorationContext<'_>,
        choices: &[SchedulableUnit],
        _current: Option<&SchedulableUnit>,
    ) -> Result<UnitId, SchedulingError> {
        let mut enabled_set = UnitSet::new();
        let mut any = false;
        for unit in enabled(choices) {
            any = true;
            match self.slot_of(unit.id) {
                Some(slot) => enabled_set.insert(slot),
                None => {
                    warn!(target: "fairloop::strategy", "⚠️  DPOR tracks at most {} units, ending schedule", MAX_UNITS);
                    return Err(SchedulingError::Exhausted);
                }
            }
        }
        if !any {
            return Err(SchedulingError::NoEnabledChoice);
        }

        if self.depth == self.stack.len() {
            let first = enabled_set.first().unwrap_or_default();
            let mut backtrack = UnitSet::new();
            backtrack.insert(first);
            self.stack.push(Frame::Schedule {
                enabled: enabled_set,
                backtrack,
                done: UnitSet::new(),
                chosen: first,
                record: None,
            });
        }

        let slot = match &self.stack[self.depth] {
            Frame::Schedule { enabled, chosen, .. } if *enabled == enabled_set => *chosen,
            _ => {
                return Err(SchedulingError::not_reproducible(
                    self.depth,
                    "enabled units differ from the previous schedule",
                ))
            }
        };

        let unit = self.units[slot];
        let target = choices
            .iter()
            .find(|u| u.id == unit)
            .and_then(|u| u.pending)
            .map(|p| p.target);

        self.commit(slot, target);
        self.depth += 1;
        self.scheduled_steps += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
        Ok(unit)
    }

    fn next_boolean(&mut self, _ctx: &mut ExplorationContext<'_>, _max_value: u64) -> Result<bool, SchedulingError> {
        self.value_frame(2).map(|chosen| chosen == 1)
    }

    fn next_integer(&mut self, _ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<u64, SchedulingError> {
        self.value_frame(max_value.max(1))
    }

    fn prepare_for_next_iteration(&mut self) -> bool {
        self.stats.explored_schedules += 1;
        self.stack.truncate(self.depth);

        while let Some(frame) = self.stack.last_mut() {
            let advanced = match frame {
                Frame::Schedule {
                    backtrack,
                    done,
                    chosen,
                    record,
                    ..
                } => match backtrack.difference(done).first() {
                    Some(next) => {
                        *chosen = next;
                        *record = None;
                        true
                    }
                    None => false,
                },
                Frame::Value { count, chosen } => {
                    if *chosen + 1 < *count {
                        *chosen += 1;
                        true
                    } else {
                        false
                    }
                }
            };
            if advanced {
                break;
            }
            self.stack.pop();
        }

        self.depth = 0;
        self.scheduled_steps = 0;
        for clock in &mut self.unit_clocks {
            *clock = VectorClock::new();
        }

        debug!(
            target: "fairloop::strategy",
            "DPOR backtracked to depth {} ({} races so far)",
            self.stack.len(),
            self.stats.races
        );
        !self.stack.is_empty()
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.depth = 0;
        self.scheduled_steps = 0;
        self.slots.clear();
        self.units.clear();
        self.unit_clocks.clear();
        self.stats = DporStats::default();
    }

    fn scheduled_steps(&self) -> usize {
        self.scheduled_steps
    }

    fn has_reached_max_steps(&self) -> bool {
        bound_reached(self.scheduled_steps, self.max_steps)
    }

    fn is_fair(&self) -> bool {
        false
    }

    fn description(&self) -> String {
        "dpor".to_string()
    }
}
