//! Infrastructure Layer - External Technology Stack
//!
//! Concrete integrations that depend on the file system and the async
//! runtime.
//!
//! # Responsibilities
//! - Trace persistence (JSON via `serde_json`)
//! - Background execution of engines (tokio blocking pool)

pub mod harness;
pub mod trace_store;

// Re-exports
pub use harness::{run_in_background, BackgroundRun};
pub use trace_store::{load_trace, save_trace, TraceFile, TRACE_FORMAT_VERSION};
