//! Exhaustive depth-first exploration
//!
//! # Algorithm
//!
//! Stateless search over a stack of choice frames. Every iteration replays the
//! choices recorded on the stack, extends it with the first alternative of
//! every new choice point, and on `prepare_for_next_iteration` advances the
//! deepest frame that still has an unexplored alternative, dropping every
//! frame below it.
//!
//! ```text
//! depth 0: [u1, u2, u3]  taken 0
//! depth 1: [false, true] taken 1   ← deepest frame with alternatives left
//! depth 2: [u2, u3]      taken 1   ← exhausted, popped
//! ```

use super::{bound_reached, enabled, ExplorationContext, SchedulingStrategy};
use crate::domain::config::Configuration;
use fairloop_core::{SchedulableUnit, SchedulingError, UnitId};
use tracing::debug;

#[derive(Debug, Clone)]
enum Alternatives {
    Units(Vec<UnitId>),
    Booleans,
    Integers(u64),
}

impl Alternatives {
    fn len(&self) -> usize {
        match self {
            Self::Units(units) => units.len(),
            Self::Booleans => 2,
            Self::Integers(max) => *max as usize,
        }
    }
}

#[derive(Debug, Clone)]
struct ChoiceFrame {
    alternatives: Alternatives,
    taken: usize,
}

/// Depth-first search over every interleaving and value choice
pub struct DfsStrategy {
    stack: Vec<ChoiceFrame>,
    depth: usize,
    max_steps: usize,
    scheduled_steps: usize,
    explored: usize,
}

impl DfsStrategy {
    /// Create a strategy with a step bound (0 for unbounded)
    pub fn new(max_steps: usize) -> Self {
        Self {
            stack: Vec::new(),
            depth: 0,
            max_steps,
            scheduled_steps: 0,
            explored: 0,
        }
    }

    /// Build with the unfair step bound
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.step_bound(false))
    }

    /// Completed iterations
    pub fn explored_schedules(&self) -> usize {
        self.explored
    }

    fn frame_at_depth(&mut self, alternatives: Alternatives) -> Result<&ChoiceFrame, SchedulingError> {
        if self.depth == self.stack.len() {
            self.stack.push(ChoiceFrame { alternatives, taken: 0 });
        } else {
            let frame = &self.stack[self.depth];
            let matches = match (&frame.alternatives, &alternatives) {
                (Alternatives::Units(a), Alternatives::Units(b)) => a == b,
                (Alternatives::Booleans, Alternatives::Booleans) => true,
                (Alternatives::Integers(a), Alternatives::Integers(b)) => a == b,
                _ => false,
            };
            if !matches {
                return Err(SchedulingError::not_reproducible(
                    self.depth,
                    "program made a different choice than in the previous schedule",
                ));
            }
        }
        let frame = &self.stack[self.depth];
        self.depth += 1;
        self.scheduled_steps += 1;
        Ok(frame)
    }
}

impl SchedulingStrategy for DfsStrategy {
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

        let frame = self.frame_at_depth(Alternatives::Units(candidates))?;
        match &frame.alternatives {
            Alternatives::Units(units) => Ok(units[frame.taken]),
            _ => Err(SchedulingError::Exhausted),
        }
    }

    fn next_boolean(&mut self, _ctx: &mut ExplorationContext<'_>, _max_value: u64) -> Result<bool, SchedulingError> {
        let frame = self.frame_at_depth(Alternatives::Booleans)?;
        Ok(frame.taken == 1)
    }

    fn next_integer(&mut self, _ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<u64, SchedulingError> {
        let frame = self.frame_at_depth(Alternatives::Integers(max_value.max(1)))?;
        Ok(frame.taken as u64)
    }

    fn prepare_for_next_iteration(&mut self) -> bool {
        self.explored += 1;
        self.stack.truncate(self.depth);

        while let Some(frame) = self.stack.last_mut() {
            if frame.taken + 1 < frame.alternatives.len() {
                frame.taken += 1;
                break;
            }
            self.stack.pop();
        }

        self.depth = 0;
        self.scheduled_steps = 0;
        debug!(target: "fairloop::strategy", "DFS backtracked to depth {}", self.stack.len());
        !self.stack.is_empty()
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.depth = 0;
        self.scheduled_steps = 0;
        self.explored = 0;
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
        "dfs".to_string()
    }
}
