//! # Schedulable Unit Vocabulary
//!
//! Identifiers and records exchanged between the exploration engine and the
//! actor runtime under test. The runtime owns every value defined here; the
//! engine only queries them.
//!
//! # Unit Kinds
//!
//! ```text
//! ActorUnit  ─── the machine itself (create, start, halt)
//! InboxUnit  ─── the machine's event queue (send, receive)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a schedulable unit (a machine or a machine's inbox)
///
/// Ids are assigned by the runtime and must be stable across iterations for
/// replay to work: the same program, driven by the same choices, must hand
/// out the same ids in the same order.
///
/// # Example
///
/// ```rust
/// use fairloop_core::UnitId;
///
/// let a = UnitId::new(1);
/// let b = UnitId::new(2);
/// assert!(a < b);
/// assert_eq!(a.to_string(), "unit(1)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl UnitId {
    /// Create a new unit id
    #[inline(always)]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric id
    #[inline(always)]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit({})", self.0)
    }
}

/// What a schedulable unit stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    /// The machine itself
    ActorUnit,
    /// The inbox of a machine
    InboxUnit,
}

/// Kind of operation a unit will perform when scheduled next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Creating a new machine
    Create,
    /// Starting a created machine
    Start,
    /// Enqueueing an event in a target inbox
    Send,
    /// Dequeueing an event from the unit's own inbox
    Receive,
    /// Halting a machine
    Stop,
}

/// The operation a unit is about to perform
///
/// Partial-order reduction uses this to decide whether two steps commute.
/// Two operations are dependent when they act on the same `target` from
/// different units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Operation kind
    pub kind: OperationKind,
    /// Unit or inbox the operation acts upon
    pub target: UnitId,
}

impl PendingOperation {
    /// Create a pending operation
    pub const fn new(kind: OperationKind, target: UnitId) -> Self {
        Self { kind, target }
    }
}

/// One thing the scheduler can choose to run next
///
/// # Invariants
///
/// - `id` is unique among the units returned by one `enabled_units()` call
/// - a unit with `is_enabled == false` is never chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulableUnit {
    /// Unit identifier
    pub id: UnitId,
    /// Machine or inbox
    pub kind: UnitKind,
    /// Whether the unit can make progress right now
    pub is_enabled: bool,
    /// Operation the unit performs when scheduled, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingOperation>,
}

impl SchedulableUnit {
    /// An enabled actor unit with no declared pending operation
    pub const fn actor(id: UnitId) -> Self {
        Self {
            id,
            kind: UnitKind::ActorUnit,
            is_enabled: true,
            pending: None,
        }
    }

    /// An enabled inbox unit with no declared pending operation
    pub const fn inbox(id: UnitId) -> Self {
        Self {
            id,
            kind: UnitKind::InboxUnit,
            is_enabled: true,
            pending: None,
        }
    }

    /// Set the enabled flag
    #[must_use]
    pub const fn enabled(mut self, is_enabled: bool) -> Self {
        self.is_enabled = is_enabled;
        self
    }

    /// Declare the pending operation
    #[must_use]
    pub const fn with_pending(mut self, pending: PendingOperation) -> Self {
        self.pending = Some(pending);
        self
    }
}

/// Identifier of a safety or liveness monitor
///
/// Monitors are named by their monitor type, e.g. `"EventuallyLeader"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorId(pub String);

impl MonitorId {
    /// Create a monitor id
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Monitor name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MonitorId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Temperature classification of a monitor state
///
/// A `Hot` state must eventually be left for a `Cold` one; staying hot
/// forever is a liveness violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MonitorStatus {
    /// Neither hot nor cold
    #[default]
    None,
    /// Obligation pending
    Hot,
    /// Obligation discharged
    Cold,
}

impl MonitorStatus {
    /// Whether the status is `Hot`
    #[inline]
    pub const fn is_hot(self) -> bool {
        matches!(self, Self::Hot)
    }

    /// Whether the status is `Cold`
    #[inline]
    pub const fn is_cold(self) -> bool {
        matches!(self, Self::Cold)
    }
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Hot => write!(f, "hot"),
            Self::Cold => write!(f, "cold"),
        }
    }
}
