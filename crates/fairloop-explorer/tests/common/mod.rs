//! Simulated actor programs shared by the integration tests

#![allow(dead_code)]

use fairloop_core::{
    ActorRuntime, ExecutionHalted, ExecutionHandle, MonitorId, MonitorStatus, OperationKind, PendingOperation,
    SchedulableUnit, UnitId,
};
use fairloop_explorer::domain::{Configuration, StrategyKind};

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Configuration for a seeded run of `strategy`
pub fn config(strategy: StrategyKind, iterations: usize) -> Configuration {
    Configuration {
        strategy,
        scheduling_iterations: iterations,
        random_seed: Some(0x5eed),
        ..Configuration::default()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ping-pong
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const CLIENT: UnitId = UnitId(1);
pub const SERVER: UnitId = UnitId(2);
pub const PROGRESS: &str = "Progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
    Sending,
    Waiting,
    Done,
}

/// Client pings a server `rounds` times and waits for every pong
///
/// The `Progress` monitor is hot while a ping is unanswered. A lossy server
/// may drop the last pong, leaving the monitor hot when the program stops.
pub struct PingPong {
    rounds: u32,
    lossy: bool,
    sent: u32,
    client: ClientState,
    server_inbox: u32,
    client_inbox: u32,
}

impl PingPong {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds,
            lossy: false,
            sent: 0,
            client: ClientState::Sending,
            server_inbox: 0,
            client_inbox: 0,
        }
    }

    pub fn lossy(rounds: u32) -> Self {
        Self {
            lossy: true,
            ..Self::new(rounds)
        }
    }
}

impl ActorRuntime for PingPong {
    fn start(&mut self, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
        handle.on_enter_state(CLIENT, "Sending");
        handle.on_enter_state(SERVER, "Serving");
        handle.on_monitor_enter_state(&MonitorId::new(PROGRESS), "Idle", MonitorStatus::Cold);
        Ok(())
    }

    fn enabled_units(&self) -> Vec<SchedulableUnit> {
        let client_op = if self.client == ClientState::Sending {
            PendingOperation::new(OperationKind::Send, SERVER)
        } else {
            PendingOperation::new(OperationKind::Receive, CLIENT)
        };
        vec![
            SchedulableUnit::actor(CLIENT)
                .enabled(self.client == ClientState::Sending || self.client_inbox > 0)
                .with_pending(client_op),
            SchedulableUnit::actor(SERVER)
                .enabled(self.server_inbox > 0)
                .with_pending(PendingOperation::new(OperationKind::Receive, SERVER)),
        ]
    }

    fn current_unit(&self) -> Option<SchedulableUnit> {
        None
    }

    fn execute(&mut self, unit: UnitId, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
        let progress = MonitorId::new(PROGRESS);
        if unit == SERVER {
            self.server_inbox -= 1;
            let last = self.sent == self.rounds;
            if self.lossy && last && handle.next_boolean(2)? {
                handle.log("<ActionLog> Server dropped the last pong");
                return Ok(());
            }
            self.client_inbox += 1;
            return Ok(());
        }

        if self.client == ClientState::Sending {
            self.sent += 1;
            self.server_inbox += 1;
            handle.on_exit_state(CLIENT, "Sending");
            handle.on_enter_state(CLIENT, "Waiting");
            handle.on_monitor_enter_state(&progress, "Waiting", MonitorStatus::Hot);
            self.client = ClientState::Waiting;
            return Ok(());
        }

        self.client_inbox -= 1;
        handle.on_monitor_enter_state(&progress, "Idle", MonitorStatus::Cold);
        handle.on_exit_state(CLIENT, "Waiting");
        if self.sent < self.rounds {
            handle.on_enter_state(CLIENT, "Sending");
            self.client = ClientState::Sending;
        } else {
            handle.on_enter_state(CLIENT, "Done");
            self.client = ClientState::Done;
        }
        Ok(())
    }

    fn hot_monitors(&self) -> Vec<MonitorId> {
        if self.client == ClientState::Waiting && self.client_inbox == 0 && self.server_inbox == 0 {
            vec![MonitorId::new(PROGRESS)]
        } else {
            Vec::new()
        }
    }

    fn describe_unit(&self, unit: UnitId) -> String {
        if unit == CLIENT {
            "Client(1)".to_string()
        } else {
            "Server(2)".to_string()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Spinner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const POLLER: UnitId = UnitId(1);
pub const WORKER: UnitId = UnitId(2);
pub const EVENTUALLY_DONE: &str = "EventuallyDone";

/// A worker toggles between `Idle` and `Busy` while a poller waits for it
///
/// Without a budget the worker never finishes, so `EventuallyDone` stays
/// hot along an infinite fair execution. With a budget the worker finishes
/// after that many toggles and every state carries the remaining budget.
pub struct Spinner {
    budget: Option<u32>,
    busy: bool,
    done: bool,
}

impl Spinner {
    pub fn forever() -> Self {
        Self {
            budget: None,
            busy: false,
            done: false,
        }
    }

    pub fn finishing_after(toggles: u32) -> Self {
        Self {
            budget: Some(toggles),
            ..Self::forever()
        }
    }
}

impl ActorRuntime for Spinner {
    fn start(&mut self, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
        handle.on_enter_state(POLLER, "Polling");
        handle.on_enter_state(WORKER, "Idle");
        handle.on_monitor_enter_state(&MonitorId::new(EVENTUALLY_DONE), "Pending", MonitorStatus::Hot);
        Ok(())
    }

    fn enabled_units(&self) -> Vec<SchedulableUnit> {
        vec![
            SchedulableUnit::actor(POLLER).enabled(!self.done),
            SchedulableUnit::actor(WORKER).enabled(!self.done),
        ]
    }

    fn current_unit(&self) -> Option<SchedulableUnit> {
        None
    }

    fn execute(&mut self, unit: UnitId, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
        if unit == POLLER {
            handle.on_exit_state(POLLER, "Polling");
            handle.on_enter_state(POLLER, "Polling");
            return Ok(());
        }

        let (from, to) = if self.busy { ("Busy", "Idle") } else { ("Idle", "Busy") };
        handle.on_exit_state(WORKER, from);
        handle.on_enter_state(WORKER, to);
        self.busy = !self.busy;

        if let Some(remaining) = self.budget.as_mut() {
            *remaining -= 1;
            handle.on_local_state_changed(WORKER, u64::from(*remaining));
            if *remaining == 0 {
                self.done = true;
                handle.on_monitor_enter_state(&MonitorId::new(EVENTUALLY_DONE), "Finished", MonitorStatus::Cold);
            }
        }
        Ok(())
    }

    fn hot_monitors(&self) -> Vec<MonitorId> {
        if self.done {
            Vec::new()
        } else {
            vec![MonitorId::new(EVENTUALLY_DONE)]
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Bank
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const TELLER_A: UnitId = UnitId(1);
pub const TELLER_B: UnitId = UnitId(2);
pub const AUDITOR: UnitId = UnitId(3);
pub const ACCOUNT: UnitId = UnitId(100);
pub const LEDGER: UnitId = UnitId(200);
pub const LOST_UPDATE: &str = "balance does not match withdrawals";

const OPENING_BALANCE: u64 = 100;
const WITHDRAWAL: u64 = 60;

/// Two tellers withdraw from one account with a read step and a write step
///
/// When both reads precede both writes, one withdrawal is lost. An auditor
/// appends two entries to an unrelated ledger. The check runs once every
/// unit finished, so every schedule has the same length.
pub struct Bank {
    balance: u64,
    withdrawn: u64,
    seen: [Option<u64>; 2],
    pc: [u8; 3],
}

impl Bank {
    pub fn new() -> Self {
        Self {
            balance: OPENING_BALANCE,
            withdrawn: 0,
            seen: [None; 2],
            pc: [0; 3],
        }
    }

    fn slot(unit: UnitId) -> usize {
        (unit.0 - 1) as usize
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorRuntime for Bank {
    fn start(&mut self, _handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
        Ok(())
    }

    fn enabled_units(&self) -> Vec<SchedulableUnit> {
        let teller = |id: UnitId| {
            let pc = self.pc[Self::slot(id)];
            let kind = if pc == 0 { OperationKind::Receive } else { OperationKind::Send };
            SchedulableUnit::actor(id)
                .enabled(pc < 2)
                .with_pending(PendingOperation::new(kind, ACCOUNT))
        };
        vec![
            teller(TELLER_A),
            teller(TELLER_B),
            SchedulableUnit::actor(AUDITOR)
                .enabled(self.pc[2] < 2)
                .with_pending(PendingOperation::new(OperationKind::Send, LEDGER)),
        ]
    }

    fn current_unit(&self) -> Option<SchedulableUnit> {
        None
    }

    fn execute(&mut self, unit: UnitId, handle: &mut dyn ExecutionHandle) -> Result<(), ExecutionHalted> {
        let slot = Self::slot(unit);
        self.pc[slot] += 1;

        if unit != AUDITOR {
            if self.pc[slot] == 1 {
                self.seen[slot] = Some(self.balance);
            } else if let Some(read) = self.seen[slot] {
                if read >= WITHDRAWAL {
                    self.balance = read - WITHDRAWAL;
                    self.withdrawn += WITHDRAWAL;
                }
            }
        }

        if self.pc.iter().all(|&pc| pc == 2) {
            handle.assert(self.balance + self.withdrawn == OPENING_BALANCE, LOST_UPDATE)?;
        }
        Ok(())
    }

    fn hot_monitors(&self) -> Vec<MonitorId> {
        Vec::new()
    }

    fn describe_unit(&self, unit: UnitId) -> String {
        match unit {
            TELLER_A => "Teller(A)".to_string(),
            TELLER_B => "Teller(B)".to_string(),
            _ => "Auditor".to_string(),
        }
    }
}
