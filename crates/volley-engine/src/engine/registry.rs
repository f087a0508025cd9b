use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

pub type ConnectionId = u32;

/// A connection only moves forward: Dialing -> {Established|Error} -> Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Dialing,
    Established,
    Error,
    Closed,
}

impl ConnectionStatus {
    /// Established or Error, the point at which the processing
    /// duration is frozen.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionStatus::Established | ConnectionStatus::Error)
    }
}

/// Lifecycle update emitted by a worker. `elapsed` is measured by the
/// worker from its own dial start so aggregation latency never skews
/// the recorded duration.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionEvent {
    pub id: ConnectionId,
    pub status: ConnectionStatus,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub status: ConnectionStatus,
    pub launched_at: Instant,
    pub terminal_at: Option<Instant>,
    /// Elapsed time from dial start to the first terminal status.
    /// Set exactly once; closure does not alter it.
    pub processing: Duration,
    pub ever_established: bool,
}

impl ConnectionRecord {
    fn new(id: ConnectionId, now: Instant) -> Self {
        Self {
            id,
            status: ConnectionStatus::Dialing,
            launched_at: now,
            terminal_at: None,
            processing: Duration::ZERO,
            ever_established: false,
        }
    }

    /// Still dialing or currently established.
    pub fn is_ok(&self) -> bool {
        self.status == ConnectionStatus::Established
    }

    /// Reached Established or Error at least once.
    pub fn is_resolved(&self) -> bool {
        self.terminal_at.is_some()
    }
}

/// The single shared piece of run state. Exclusively owned and mutated
/// by the aggregator task; everyone else reads cloned snapshots, so no
/// lock guards it.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    records: HashMap<ConnectionId, ConnectionRecord>,
    live_established: usize,
    high_water_mark: usize,
    closed_while_established: usize,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one lifecycle event into the registry.
    pub fn apply(&mut self, event: ConnectionEvent) {
        let now = Instant::now();
        let record = self
            .records
            .entry(event.id)
            .or_insert_with(|| ConnectionRecord::new(event.id, now));

        let was_established = record.status == ConnectionStatus::Established;

        if event.status == ConnectionStatus::Established {
            self.live_established += 1;
            if self.live_established > self.high_water_mark {
                self.high_water_mark = self.live_established;
            }
        } else if was_established {
            self.live_established -= 1;
            if event.status == ConnectionStatus::Closed {
                // The connection was still up when the closure broadcast
                // reached it.
                self.closed_while_established += 1;
            }
        }

        if event.status.is_terminal() && record.terminal_at.is_none() {
            record.terminal_at = Some(now);
            record.processing = event.elapsed;
            record.ever_established = event.status == ConnectionStatus::Established;
        }

        record.status = event.status;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: ConnectionId) -> Option<&ConnectionRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ConnectionRecord> {
        self.records.values()
    }

    /// Records that reached Established at least once, even if closed
    /// since.
    pub fn ever_established(&self) -> Vec<&ConnectionRecord> {
        self.records
            .values()
            .filter(|r| r.ever_established)
            .collect()
    }

    /// Records that resolved without ever establishing.
    pub fn never_established(&self) -> Vec<&ConnectionRecord> {
        self.records
            .values()
            .filter(|r| r.is_resolved() && !r.ever_established)
            .collect()
    }

    /// Records currently in the Established state.
    pub fn currently_ok(&self) -> Vec<&ConnectionRecord> {
        self.records.values().filter(|r| r.is_ok()).collect()
    }

    pub fn at_least_one_ok(&self) -> bool {
        self.records.values().any(|r| r.ever_established)
    }

    pub fn at_least_one_error(&self) -> bool {
        self.records
            .values()
            .any(|r| r.is_resolved() && !r.ever_established)
    }

    /// Attempts that have reached a terminal status.
    pub fn resolved_count(&self) -> usize {
        self.records.values().filter(|r| r.is_resolved()).count()
    }

    pub fn live_established(&self) -> usize {
        self.live_established
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    pub fn closed_while_established(&self) -> usize {
        self.closed_while_established
    }

    /// One-line per-status tally for progress display.
    pub fn summary(&self) -> String {
        let mut dialing = 0usize;
        let mut established = 0usize;
        let mut errored = 0usize;
        let mut closed = 0usize;
        for record in self.records.values() {
            match record.status {
                ConnectionStatus::Dialing => dialing += 1,
                ConnectionStatus::Established => established += 1,
                ConnectionStatus::Error => errored += 1,
                ConnectionStatus::Closed => closed += 1,
            }
        }
        format!(
            "{} dialing, {} established, {} error, {} closed (max concurrent: {})",
            dialing, established, errored, closed, self.high_water_mark
        )
    }
}

/// Spawn the single consumer task that owns the registry. Events are
/// folded in arrival order and a cloned snapshot is published after
/// every event. The task resolves to the settled registry once every
/// producer handle has been dropped, which is the completion signal the
/// report builder awaits.
pub fn spawn_aggregator(
    mut events: mpsc::Receiver<ConnectionEvent>,
    snapshots: watch::Sender<ConnectionRegistry>,
) -> JoinHandle<ConnectionRegistry> {
    tokio::spawn(async move {
        let mut registry = ConnectionRegistry::new();
        while let Some(event) = events.recv().await {
            debug!(id = event.id, status = ?event.status, "Connection event");
            registry.apply(event);
            let _ = snapshots.send(registry.clone());
        }
        registry
    })
}
