//! Seeded random exploration

use super::{bound_reached, enabled, resolve_seed, ExplorationContext, SchedulingStrategy};
use crate::domain::config::Configuration;
use fairloop_core::{SchedulableUnit, SchedulingError, UnitId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform random choices from an explicitly seeded generator
///
/// The generator is seeded once and never reseeded, so a run is reproducible
/// from the seed alone. Random scheduling is fair with probability 1.
pub struct RandomStrategy {
    rng: StdRng,
    seed: u64,
    max_steps: usize,
    scheduled_steps: usize,
}

impl RandomStrategy {
    /// Create a strategy with a step bound (0 for unbounded)
    pub fn new(seed: u64, max_steps: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
            max_steps,
            scheduled_steps: 0,
        }
    }

    /// Build from the configured seed and the fair step bound
    pub fn from_config(config: &Configuration) -> Self {
        Self::new(resolve_seed(config.random_seed), config.step_bound(true))
    }

    /// Seed in use
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl SchedulingStrategy for RandomStrategy {
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

        let idx = self.rng.gen_range(0..candidates.len());
        self.scheduled_steps += 1;
        Ok(candidates[idx])
    }

    fn next_boolean(&mut self, _ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<bool, SchedulingError> {
        let value = self.rng.gen_range(0..max_value.max(1)) == 0;
        self.scheduled_steps += 1;
        Ok(value)
    }

    fn next_integer(&mut self, _ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<u64, SchedulingError> {
        let value = self.rng.gen_range(0..max_value.max(1));
        self.scheduled_steps += 1;
        Ok(value)
    }

    fn prepare_for_next_iteration(&mut self) -> bool {
        self.scheduled_steps = 0;
        true
    }

    fn reset(&mut self) {
        self.scheduled_steps = 0;
    }

    fn scheduled_steps(&self) -> usize {
        self.scheduled_steps
    }

    fn has_reached_max_steps(&self) -> bool {
        bound_reached(self.scheduled_steps, self.max_steps)
    }

    fn is_fair(&self) -> bool {
        true
    }

    fn description(&self) -> String {
        format!("random (seed {})", self.seed)
    }
}
