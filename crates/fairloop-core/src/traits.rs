//! # Behavior Contracts
//!
//! Contracts between the exploration engine and the actor runtime it drives.
//!
//! - [`ActorRuntime`] is implemented by the runtime: it reports the enabled
//!   units and runs one handler of a chosen unit at a time.
//! - [`ExecutionHandle`] is implemented by the engine's controlled scheduler
//!   and handed to the runtime for the duration of one step. Every
//!   nondeterministic choice the program makes goes through it, and every
//!   state transition is reported to it.
//!
//! # Step Protocol
//!
//! ```text
//! engine                          runtime
//!   │ start(handle) ───────────────▶ │  create machines, register monitors
//!   │ ◀──────────── enabled_units()  │
//!   │ choose unit (strategy)         │
//!   │ execute(unit, handle) ───────▶ │  run one handler
//!   │ ◀── next_boolean / assert / on_enter_state ...
//!   │ ...repeat until no unit is enabled or the run is halted
//! ```

use crate::error::ExecutionHalted;
use crate::types::{MonitorId, MonitorStatus, SchedulableUnit, UnitId};

/// The actor runtime under test
///
/// One instance covers exactly one iteration; the engine builds a fresh one
/// from a factory before every iteration. Implementations must be
/// deterministic given the sequence of choices made through the handle.
pub trait ActorRuntime {
    /// Run the test entry point
    ///
    /// Typically creates the initial machines and registers monitors.
    fn start(&mut self, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted>;

    /// All schedulable units, with their current enabled flag
    fn enabled_units(&self) -> Vec<SchedulableUnit>;

    /// The unit that executed the previous step, if any
    fn current_unit(&self) -> Option<SchedulableUnit>;

    /// Run one handler of `unit`
    ///
    /// Returns `Err(ExecutionHalted)` as soon as the handle reports the run
    /// was stopped.
    fn execute(&mut self, unit: UnitId, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted>;

    /// Monitors currently in a hot state
    fn hot_monitors(&self) -> Vec<MonitorId>;

    /// Label used in bug narratives and coverage
    fn describe_unit(&self, unit: UnitId) -> String {
        unit.to_string()
    }
}

/// The scheduler side of one iteration, as seen by the runtime
pub trait ExecutionHandle {
    // === Nondeterministic choices ===

    /// Boolean choice; `true` with probability `1 / max_value` under random exploration
    fn next_boolean(&mut self, max_value: u64) -> Result<bool, ExecutionHalted>;

    /// Boolean choice that must resolve both ways infinitely often in a fair run
    fn next_fair_boolean(&mut self, choice_id: &str) -> Result<bool, ExecutionHalted>;

    /// Integer choice in `[0, max_value)`
    fn next_integer(&mut self, max_value: u64) -> Result<u64, ExecutionHalted>;

    // === Assertions & Monitors ===

    /// Report a safety violation when `condition` is false
    fn assert(&mut self, condition: bool, message: &str) -> Result<(), ExecutionHalted>;

    // === State notifications ===

    /// A machine pushed `state` on its state stack
    fn on_enter_state(&mut self, unit: UnitId, state: &str);

    /// A machine popped `state` from its state stack
    fn on_exit_state(&mut self, unit: UnitId, state: &str);

    /// A monitor transitioned to `state`
    fn on_monitor_enter_state(&mut self, monitor: &MonitorId, state: &str, status: MonitorStatus);

    /// A monitor changed temperature without changing state
    fn on_monitor_status_changed(&mut self, monitor: &MonitorId, status: MonitorStatus);

    /// User-supplied hash of a machine's extra local state
    fn on_local_state_changed(&mut self, unit: UnitId, hash: u64);

    /// Append a line to the bug narrative
    fn log(&mut self, line: &str);
}
