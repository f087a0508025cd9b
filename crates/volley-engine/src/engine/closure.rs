use super::registry::ConnectionRegistry;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Broadcast signal instructing every worker to terminate its
/// connection. Delivered once, to all workers simultaneously, so the
/// "established at closure" count is a reproducible measurement.
#[derive(Debug, Clone, Default)]
pub struct ClosureTrigger {
    token: CancellationToken,
}

impl ClosureTrigger {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Handle a worker waits on.
    pub fn watcher(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn fire(&self) {
        self.token.cancel();
    }

    pub fn has_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// One-shot closure policy: broadcast when every attempt has
    /// resolved, or when the timer expires, whichever comes first. A
    /// zero timer closes immediately and aborts attempts still dialing.
    pub fn arm(
        &self,
        close_after: std::time::Duration,
        mut snapshots: watch::Receiver<ConnectionRegistry>,
        expected: usize,
    ) {
        let trigger = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(close_after) => {
                    info!("Closure timer expired, broadcasting shutdown");
                }
                res = snapshots.wait_for(|r| r.resolved_count() >= expected) => {
                    if res.is_ok() {
                        info!("All attempts resolved, broadcasting shutdown");
                    }
                }
            }
            trigger.fire();
        });
    }
}
