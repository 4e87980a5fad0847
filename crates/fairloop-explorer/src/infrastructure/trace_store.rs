//! JSON persistence of schedule traces
//!
//! A bug found by one run is saved as a [`TraceFile`] and fed back to a
//! replay or minimizing run later.
//!
//! ```json
//! {
//!   "version": 1,
//!   "is_fair": true,
//!   "steps": [
//!     { "type": "schedule", "unit": 2 },
//!     { "type": "fair_boolean", "id": "retry", "value": false }
//!   ]
//! }
//! ```

use crate::domain::report::BugTrace;
use crate::domain::trace::{ScheduleTrace, TraceRecord};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Format version written by this build
pub const TRACE_FORMAT_VERSION: u32 = 1;

/// Persisted schedule trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFile {
    /// Format version
    pub version: u32,
    /// Whether the recording strategy was fair
    pub is_fair: bool,
    /// Recorded choices in order
    pub steps: Vec<TraceRecord>,
}

impl TraceFile {
    /// Snapshot of `trace`
    pub fn from_trace(trace: &ScheduleTrace, is_fair: bool) -> Self {
        Self {
            version: TRACE_FORMAT_VERSION,
            is_fair,
            steps: trace.to_records(),
        }
    }

    /// Trace attached to a reported bug
    pub fn from_bug(bug: &BugTrace) -> Self {
        Self {
            version: TRACE_FORMAT_VERSION,
            is_fair: bug.is_fair,
            steps: bug.steps.clone(),
        }
    }

    /// Rebuild the in-memory trace
    pub fn to_trace(&self) -> ScheduleTrace {
        ScheduleTrace::from_records(self.steps.iter().cloned())
    }
}

/// Write `file` as pretty JSON, creating parent directories
pub fn save_trace<P: AsRef<Path>>(path: P, file: &TraceFile) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create trace directory")?;
    }

    let json = serde_json::to_string_pretty(file).context("Failed to serialize trace")?;
    fs::write(path, json).with_context(|| format!("Failed to write trace to {:?}", path))?;

    info!(target: "fairloop::trace", "💾 Saved {}-step trace to {:?}", file.steps.len(), path);
    Ok(())
}

/// Read a trace written by [`save_trace`]
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<TraceFile> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read trace from {:?}", path))?;
    let file: TraceFile = serde_json::from_str(&json).context("Failed to deserialize trace")?;

    if file.version != TRACE_FORMAT_VERSION {
        bail!(
            "Unsupported trace format version {} (expected {})",
            file.version,
            TRACE_FORMAT_VERSION
        );
    }

    info!(target: "fairloop::trace", "📂 Loaded {}-step trace from {:?}", file.steps.len(), path);
    Ok(file)
}
