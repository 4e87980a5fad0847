//! Scheduling Strategies
//!
//! # Overview
//!
//! A strategy resolves every choice the program under test leaves open:
//! which enabled unit runs next, and which value a nondeterministic boolean
//! or integer takes. Strategies compose as decorators: a wrapper owns its
//! inner strategy as a `Box<dyn SchedulingStrategy>` and forwards whatever it
//! does not handle itself.
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ CriticalTransitionStrategy    │  replay prefix, then suffix
//! │  └─ CycleDetectionStrategy    │  liveness checking
//! │      └─ Random | Dfs | Dpor   │  base exploration
//! └───────────────────────────────┘
//! ```
//!
//! # Shared State
//!
//! The schedule trace and the state cache belong to the caller (the
//! controlled scheduler of the running iteration). They reach a strategy
//! through [`ExplorationContext`] on every call; strategies keep only their
//! own cursors and counters.

pub mod dfs;
#[cfg(feature = "dpor")]
pub mod dpor;
pub mod random;
pub mod replay;

pub use dfs::DfsStrategy;
#[cfg(feature = "dpor")]
pub use dpor::DporStrategy;
pub use random::RandomStrategy;
pub use replay::ReplayStrategy;

use super::config::{Configuration, StrategyKind};
use super::error::{EngineError, EngineResult};
use super::state_cache::StateCache;
use super::trace::ScheduleTrace;
use fairloop_core::{SchedulableUnit, SchedulingError, UnitId};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Caller-owned state visible to a strategy during one call
pub struct ExplorationContext<'a> {
    /// Choices recorded so far in this iteration
    pub trace: &'a ScheduleTrace,
    /// Captured states of this iteration
    pub cache: &'a mut StateCache,
    /// Units as reported by the runtime at the latest scheduling point
    ///
    /// Choices requested from inside a handler see the set from before the
    /// handler ran, since the runtime cannot be queried while it executes.
    /// States captured at those steps are fingerprinted with that set.
    pub units: &'a [SchedulableUnit],
}

/// Pluggable choice resolution
///
/// Implementations are driven by exactly one iteration at a time and are
/// moved between threads only between runs.
pub trait SchedulingStrategy: Send {
    /// Pick one enabled unit among `choices`
    ///
    /// Returns `Err(SchedulingError::NoEnabledChoice)` when none is enabled.
    fn next_unit(
        &mut self,
        ctx: &mut ExplorationContext<'_>,
        choices: &[SchedulableUnit],
        current: Option<&SchedulableUnit>,
    ) -> Result<UnitId, SchedulingError>;

    /// Resolve a boolean choice
    fn next_boolean(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<bool, SchedulingError>;

    /// Resolve an integer choice in `[0, max_value)`
    fn next_integer(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<u64, SchedulingError>;

    /// Prepare the next iteration; `false` ends exploration
    fn prepare_for_next_iteration(&mut self) -> bool;

    /// Reset per-iteration counters
    fn reset(&mut self);

    /// Choices made in the current iteration
    fn scheduled_steps(&self) -> usize;

    /// Whether the step bound of the current iteration is reached
    fn has_reached_max_steps(&self) -> bool;

    /// Whether the strategy schedules fairly
    fn is_fair(&self) -> bool;

    /// Human-readable description for reports
    fn description(&self) -> String;
}

impl<S: SchedulingStrategy + ?Sized> SchedulingStrategy for Box<S> {
    fn next_unit(
        &mut self,
        ctx: &mut ExplorationContext<'_>,
        choices: &[SchedulableUnit],
        current: Option<&SchedulableUnit>,
    ) -> Result<UnitId, SchedulingError> {
        (**self).next_unit(ctx, choices, current)
    }

    fn next_boolean(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<bool, SchedulingError> {
        (**self).next_boolean(ctx, max_value)
    }

    fn next_integer(&mut self, ctx: &mut ExplorationContext<'_>, max_value: u64) -> Result<u64, SchedulingError> {
        (**self).next_integer(ctx, max_value)
    }

    fn prepare_for_next_iteration(&mut self) -> bool {
        (**self).prepare_for_next_iteration()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn scheduled_steps(&self) -> usize {
        (**self).scheduled_steps()
    }

    fn has_reached_max_steps(&self) -> bool {
        (**self).has_reached_max_steps()
    }

    fn is_fair(&self) -> bool {
        (**self).is_fair()
    }

    fn description(&self) -> String {
        (**self).description()
    }
}

/// Enabled subset of `choices`
#[inline]
pub(crate) fn enabled(choices: &[SchedulableUnit]) -> impl Iterator<Item = &SchedulableUnit> {
    choices.iter().filter(|u| u.is_enabled)
}

/// `steps >= bound`, with a zero bound meaning unbounded
#[inline]
pub(crate) fn bound_reached(steps: usize, bound: usize) -> bool {
    bound != 0 && steps >= bound
}

/// Configured seed, or one drawn from the clock and logged for reproduction
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        let drawn = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        info!(target: "fairloop::strategy", "🎲 No random seed configured, using {}", drawn);
        drawn
    })
}

/// Build the base strategy selected by `config`
///
/// `Replay` needs a recorded trace and is built with [`ReplayStrategy::new`].
pub fn build_base_strategy(config: &Configuration) -> EngineResult<Box<dyn SchedulingStrategy>> {
    match config.strategy {
        StrategyKind::Random => Ok(Box::new(RandomStrategy::from_config(config))),
        StrategyKind::Dfs => Ok(Box::new(DfsStrategy::from_config(config))),
        #[cfg(feature = "dpor")]
        StrategyKind::Dpor => Ok(Box::new(DporStrategy::from_config(config))),
        #[cfg(not(feature = "dpor"))]
        StrategyKind::Dpor => Err(EngineError::MissingStrategyInput {
            strategy: "dpor",
            requirement: "the `dpor` feature",
        }),
        StrategyKind::Replay => Err(EngineError::MissingStrategyInput {
            strategy: "replay",
            requirement: "a schedule trace",
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_reached() {
        assert!(!bound_reached(100, 0));
        assert!(!bound_reached(9, 10));
        assert!(bound_reached(10, 10));
    }

    #[test]
    fn test_resolve_seed_keeps_configured_value() {
        assert_eq!(resolve_seed(Some(42)), 42);
    }

    #[test]
    fn test_replay_needs_trace() {
        let config = Configuration {
            strategy: StrategyKind::Replay,
            ..Configuration::default()
        };
        assert!(matches!(
            build_base_strategy(&config),
            Err(EngineError::MissingStrategyInput { strategy: "replay", .. })
        ));
    }

    #[test]
    fn test_build_random() {
        let config = Configuration::default();
        let strategy = build_base_strategy(&config).unwrap();
        assert!(strategy.is_fair());
        assert!(strategy.description().starts_with("random"));
    }

    #[test]
    fn test_base_strategies_take_bound_by_fairness() {
        let steps_until_bound = |strategy: StrategyKind| {
            let config = Configuration {
                strategy,
                max_fair_scheduling_steps: 3,
                max_unfair_scheduling_steps: 2,
                random_seed: Some(1),
                ..Configuration::default()
            };
            let mut strategy = build_base_strategy(&config).unwrap();
            let mut harness = test_support::Harness::with_units(&[1]);
            let mut steps = 0;
            while !strategy.has_reached_max_steps() {
                harness.schedule(strategy.as_mut()).unwrap();
                steps += 1;
            }
            steps
        };

        assert_eq!(steps_until_bound(StrategyKind::Random), 3);
        assert_eq!(steps_until_bound(StrategyKind::Dfs), 2);
    }
}
