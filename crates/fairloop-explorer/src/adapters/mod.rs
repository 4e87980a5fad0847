//! Adapters Layer - Ports & Adapters Pattern
//!
//! Connects the domain strategies to an external actor runtime.
//!
//! # Hexagonal Architecture
//! - Inbound port: [`fairloop_core::ExecutionHandle`], implemented by the
//!   [`ControlledScheduler`] and called by the runtime under test
//! - Outbound port: [`fairloop_core::ActorRuntime`], driven by the scheduler
//! - Drivers: the engines in [`engine`] repeat iterations and fold their
//!   outcomes into reports

pub mod engine;
pub mod scheduler;

// Re-exports
pub use engine::{
    compose_strategy, CancellationToken, Engine, MinimizationReport, MinimizingEngine, ParallelTestingEngine,
    RuntimeFactory, TestHooks, TestingEngine,
};
pub use scheduler::{BugRecord, ControlledScheduler, IterationOutcome, Termination};
