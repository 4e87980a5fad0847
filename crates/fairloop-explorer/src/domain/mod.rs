//! Domain Layer
//!
//! # Architecture Overview
//!
//! Pure exploration logic. Nothing in this layer touches threads, files or
//! the runtime under test directly.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  Trace Module                 State Cache Module            │
//! │  ├─ ScheduleTrace             ├─ StateCache                 │
//! │  └─ TraceRecord               └─ Fingerprint / State        │
//! │                                                             │
//! │  Strategy Module                                            │
//! │  ├─ SchedulingStrategy (trait)                              │
//! │  ├─ RandomStrategy / DfsStrategy / ReplayStrategy           │
//! │  └─ DporStrategy (feature `dpor`)                           │
//! │                                                             │
//! │  Liveness Module              Minimize Module               │
//! │  └─ CycleDetectionStrategy    ├─ CriticalTransitionStrategy │
//! │                               └─ SearchBounds               │
//! │                                                             │
//! │  Configuration / TestReport / EngineError                   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Composition
//!
//! Strategies nest as decorators, each layer owning its inner strategy:
//!
//! ```text
//! CriticalTransitionStrategy
//!   └─ suffix: CycleDetectionStrategy
//!        └─ base: RandomStrategy
//! ```

pub mod config;
pub mod error;
pub mod liveness;
pub mod minimize;
pub mod report;
pub mod state_cache;
pub mod strategy;
pub mod trace;

pub use config::{Configuration, ConfigurationBuilder, StrategyKind};
pub use error::{EngineError, EngineResult};
pub use liveness::{CycleDetectionStrategy, CycleStep};
pub use minimize::{CriticalTransitionStrategy, SearchBounds};
pub use report::{BugTrace, CoverageInfo, TestReport};
pub use state_cache::{Capture, Fingerprint, State, StateCache};
pub use strategy::{
    build_base_strategy, DfsStrategy, ExplorationContext, RandomStrategy, ReplayStrategy, SchedulingStrategy,
};
#[cfg(feature = "dpor")]
pub use strategy::DporStrategy;
pub use trace::{ScheduleStep, ScheduleStepType, ScheduleTrace, TraceRecord};
