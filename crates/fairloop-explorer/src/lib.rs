//! Fairloop Explorer
//!
//! # Overview
//!
//! `fairloop-explorer` systematically tests actor programs by taking over
//! every scheduling and nondeterministic decision they make. Each iteration
//! runs the program to quiescence under a [`SchedulingStrategy`]; bugs are
//! reported together with a schedule trace that replays them exactly.
//!
//! # Trinity Architecture
//!
//! This crate follows the Trinity Architecture pattern:
//!
//! - **Domain**: strategies, traces, state fingerprints, liveness and
//!   minimization logic
//! - **Infrastructure**: trace persistence and background execution
//! - **Adapters**: the controlled scheduler bridging the domain to an
//!   [`fairloop_core::ActorRuntime`], and the engines driving iterations
//!
//! # Verification Capabilities
//!
//! - **Safety**: assertion failures raised through the execution handle
//! - **Liveness**: lasso-shaped cycles in which a monitor stays hot under a
//!   fair schedule, and monitors still hot when a fair run terminates
//! - **Reproduction**: verbatim replay of a recorded trace
//! - **Localization**: binary search for the critical transition of a trace
//!
//! # Usage
//!
//! ```rust
//! use fairloop_core::{ActorRuntime, ExecutionHalted, ExecutionHandle, MonitorId, SchedulableUnit, UnitId};
//! use fairloop_explorer::domain::{ConfigurationBuilder, StrategyKind};
//! use fairloop_explorer::TestingEngine;
//!
//! // Two units increment a shared counter without synchronization.
//! struct Counter { value: u32, pending: [bool; 2] }
//!
//! impl ActorRuntime for Counter {
//!     fn start(&mut self, _: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> { Ok(()) }
//!     fn enabled_units(&self) -> Vec<SchedulableUnit> {
//!         (0..2).map(|i| SchedulableUnit::actor(UnitId(i)).enabled(self.pending[i as usize])).collect()
//!     }
//!     fn current_unit(&self) -> Option<SchedulableUnit> { None }
//!     fn execute(&mut self, unit: UnitId, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
//!         self.pending[unit.0 as usize] = false;
//!         self.value += 1;
//!         handle.assert(self.value <= 2, "counter overflow")
//!     }
//!     fn hot_monitors(&self) -> Vec<MonitorId> { Vec::new() }
//! }
//!
//! let config = ConfigurationBuilder::new()
//!     .strategy(StrategyKind::Dfs)
//!     .iterations(10)
//!     .build()
//!     .unwrap();
//!
//! let mut engine = TestingEngine::new(config, || Counter { value: 0, pending: [true; 2] }).unwrap();
//! let report = engine.run().unwrap();
//!
//! assert!(!report.bug_found);
//! assert_eq!(report.explored_schedules_count, 2);
//! ```
//!
//! # Feature Flags
//!
//! - `dpor` (default): dynamic partial-order reduction strategy

#![warn(missing_docs)]
#![warn(clippy::all)]

// Trinity Architecture Layers
pub mod adapters;
pub mod domain;
pub mod infrastructure;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// Strategies
pub use domain::{
    CriticalTransitionStrategy, CycleDetectionStrategy, DfsStrategy, RandomStrategy, ReplayStrategy,
    SchedulingStrategy,
};
#[cfg(feature = "dpor")]
pub use domain::DporStrategy;

// Traces and state
pub use domain::{ScheduleStep, ScheduleStepType, ScheduleTrace, State, StateCache};

// Configuration and results
pub use domain::{Configuration, ConfigurationBuilder, EngineError, EngineResult, StrategyKind, TestReport};

// Engines
pub use adapters::{
    CancellationToken, ControlledScheduler, MinimizationReport, MinimizingEngine, ParallelTestingEngine,
    TestHooks, TestingEngine,
};

// Persistence and background execution
pub use infrastructure::{load_trace, run_in_background, save_trace, TraceFile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
