//! # Fairloop Core
//!
//! Shared vocabulary between the exploration engine and actor runtimes.
//!
//! ## Module Organization
//!
//! - `types`: schedulable units, monitor identifiers and statuses
//! - `error`: scheduling errors, liveness violations, bug classification
//! - `traits`: runtime and execution-handle contracts

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{BugKind, ExecutionHalted, LivenessViolation, SchedulingError};
pub use traits::{ActorRuntime, ExecutionHandle};
pub use types::{
    MonitorId, MonitorStatus, OperationKind, PendingOperation, SchedulableUnit, UnitId, UnitKind,
};

/// Library version
pub const FAIRLOOP_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
