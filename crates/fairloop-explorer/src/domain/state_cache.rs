//! State Cache & Fingerprinting
//!
//! # Overview
//!
//! The cache mirrors the observable program state from runtime notifications
//! (state stack pushes and pops, monitor transitions, local state hashes) and
//! snapshots it once per step into a [`State`] with a [`Fingerprint`].
//!
//! # Fingerprint
//!
//! Every element of the global state (one machine, one monitor, one enabled
//! unit) is hashed on its own and the element hashes are combined with
//! wrapping addition:
//!
//! ```text
//! F = Σ h(machine_i) + Σ h(monitor_j) + Σ h(enabled_k)     (mod 2^64)
//! ```
//!
//! Addition is commutative, so the fingerprint does not depend on the order
//! in which units or monitors are visited. Element hashes are cached and the
//! running sums are patched on every notification, so capturing a state never
//! rehashes unchanged machines or monitors.
//!
//! # Repeat Detection
//!
//! The cache keeps a fingerprint index (`fingerprint -> [step indices]`) for
//! the current iteration. A capture is a repeat when its fingerprint was
//! already recorded for an earlier step.

use fairloop_core::{MonitorId, MonitorStatus, SchedulableUnit, UnitId};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Order-independent hash of the global program state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Wrap a raw hash value
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw hash value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Snapshot of the global state after one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// Fingerprint of the snapshot
    pub fingerprint: Fingerprint,
    /// Units enabled when the snapshot was taken
    pub enabled_units: BTreeSet<UnitId>,
    /// Status of every registered monitor
    pub monitor_status: BTreeMap<MonitorId, MonitorStatus>,
}

impl State {
    /// Status of `monitor`, `None` if it is unknown
    pub fn status_of(&self, monitor: &MonitorId) -> MonitorStatus {
        self.monitor_status.get(monitor).copied().unwrap_or_default()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state {} enabled [", self.fingerprint)?;
        for (i, unit) in self.enabled_units.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", unit.as_u64())?;
        }
        write!(f, "] monitors {{")?;
        for (i, (monitor, status)) in self.monitor_status.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", monitor, status)?;
        }
        write!(f, "}}")
    }
}

/// Result of [`StateCache::capture_state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    /// Fingerprint of the captured state
    pub fingerprint: Fingerprint,
    /// Whether the same fingerprint was captured at an earlier step
    pub is_repeat: bool,
}

#[derive(Debug, Default)]
struct MachineEntry {
    stack: Vec<String>,
    local_hash: Option<u64>,
    hash: u64,
}

#[derive(Debug, Default)]
struct MonitorEntry {
    state: String,
    status: MonitorStatus,
    hash: u64,
}

/// Per-iteration cache of captured states
#[derive(Debug, Default)]
pub struct StateCache {
    machines: HashMap<UnitId, MachineEntry>,
    monitors: BTreeMap<MonitorId, MonitorEntry>,
    machines_sum: u64,
    monitors_sum: u64,
    states: HashMap<usize, State>,
    fingerprint_index: HashMap<Fingerprint, Vec<usize>>,
}

#[inline]
fn element_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

impl MachineEntry {
    fn rehash(&mut self, unit: UnitId) -> u64 {
        let top = self.stack.last().map(String::as_str);
        self.hash = element_hash(&("machine", unit, top, self.local_hash));
        self.hash
    }
}

impl MonitorEntry {
    fn rehash(&mut self, monitor: &MonitorId) -> u64 {
        self.hash = element_hash(&("monitor", monitor, self.state.as_str(), self.status));
        self.hash
    }
}

impl StateCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Runtime notifications
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn update_machine(&mut self, unit: UnitId, f: impl FnOnce(&mut MachineEntry)) {
        let entry = self.machines.entry(unit).or_default();
        let old = entry.hash;
        f(entry);
        let new = entry.rehash(unit);
        self.machines_sum = self.machines_sum.wrapping_sub(old).wrapping_add(new);
    }

    fn update_monitor(&mut self, monitor: &MonitorId, f: impl FnOnce(&mut MonitorEntry)) {
        let entry = self.monitors.entry(monitor.clone()).or_default();
        let old = entry.hash;
        f(entry);
        let new = entry.rehash(monitor);
        self.monitors_sum = self.monitors_sum.wrapping_sub(old).wrapping_add(new);
    }

    /// A machine pushed `state`
    pub fn enter_state(&mut self, unit: UnitId, state: &str) {
        self.update_machine(unit, |m| m.stack.push(state.to_owned()));
    }

    /// A machine popped `state`
    ///
    /// Pops only when `state` is on top; a mismatched exit leaves the stack
    /// untouched.
    pub fn exit_state(&mut self, unit: UnitId, state: &str) {
        self.update_machine(unit, |m| {
            if m.stack.last().map(String::as_str) == Some(state) {
                m.stack.pop();
            }
        });
    }

    /// Replace the user-supplied local state hash of a machine
    pub fn set_local_hash(&mut self, unit: UnitId, hash: u64) {
        self.update_machine(unit, |m| m.local_hash = Some(hash));
    }

    /// A monitor transitioned to `state` with `status`
    pub fn monitor_enter_state(&mut self, monitor: &MonitorId, state: &str, status: MonitorStatus) {
        self.update_monitor(monitor, |m| {
            m.state.clear();
            m.state.push_str(state);
            m.status = status;
        });
    }

    /// A monitor changed temperature
    pub fn monitor_status_changed(&mut self, monitor: &MonitorId, status: MonitorStatus) {
        self.update_monitor(monitor, |m| m.status = status);
    }

    /// Current status of `monitor`
    pub fn monitor_status(&self, monitor: &MonitorId) -> MonitorStatus {
        self.monitors
            .get(monitor)
            .map(|m| m.status)
            .unwrap_or_default()
    }

    /// Top of the state stack of `unit`
    pub fn current_state(&self, unit: UnitId) -> Option<&str> {
        self.machines
            .get(&unit)
            .and_then(|m| m.stack.last())
            .map(String::as_str)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Capture
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fingerprint of the current state with the given enabled set
    pub fn fingerprint(&self, units: &[SchedulableUnit]) -> Fingerprint {
        let enabled_sum = units
            .iter()
            .filter(|u| u.is_enabled)
            .fold(0u64, |acc, u| acc.wrapping_add(element_hash(&("enabled", u.id))));
        Fingerprint(
            self.machines_sum
                .wrapping_add(self.monitors_sum)
                .wrapping_add(enabled_sum),
        )
    }

    /// Snapshot the current state and associate it with `step_index`
    ///
    /// Capturing the same step twice returns the first capture unchanged.
    pub fn capture_state(&mut self, step_index: usize, units: &[SchedulableUnit]) -> Capture {
        if let Some(existing) = self.states.get(&step_index) {
            let fingerprint = existing.fingerprint;
            return Capture {
                fingerprint,
                is_repeat: self.indices_of(fingerprint).len() > 1,
            };
        }

        let fingerprint = self.fingerprint(units);
        let state = State {
            fingerprint,
            enabled_units: units.iter().filter(|u| u.is_enabled).map(|u| u.id).collect(),
            monitor_status: self
                .monitors
                .iter()
                .map(|(id, m)| (id.clone(), m.status))
                .collect(),
        };
        self.states.insert(step_index, state);

        let indices = self.fingerprint_index.entry(fingerprint).or_default();
        indices.push(step_index);

        Capture {
            fingerprint,
            is_repeat: indices.len() > 1,
        }
    }

    /// State captured at `step_index`
    #[inline]
    pub fn state_at(&self, step_index: usize) -> Option<&State> {
        self.states.get(&step_index)
    }

    /// Step indices at which `fingerprint` was captured, in capture order
    pub fn indices_of(&self, fingerprint: Fingerprint) -> &[usize] {
        self.fingerprint_index
            .get(&fingerprint)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of captured states
    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether nothing was captured yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Forget everything, ready for a new iteration
    pub fn clear(&mut self) {
        self.machines.clear();
        self.monitors.clear();
        self.machines_sum = 0;
        self.monitors_sum = 0;
        self.states.clear();
        self.fingerprint_index.clear();
    }
}
