use super::closure::ClosureTrigger;
use super::registry::{spawn_aggregator, ConnectionRegistry};
use super::worker;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use volley_common::RunConfig;

/// Dialing, one terminal status, Closed. The event channel is sized to
/// this theoretical maximum per connection so no worker ever blocks on
/// the aggregator; the bound is a correctness requirement, not a
/// performance tweak.
const MAX_EVENTS_PER_CONNECTION: usize = 3;

/// Burst parameters, resolved from configuration before orchestration.
/// Three independently named timing fields; none is positional.
#[derive(Debug, Clone, Copy)]
pub struct BurstOptions {
    pub connections: u32,
    pub launch_delay: Duration,
    pub dial_timeout: Duration,
    pub close_after: Duration,
}

impl From<&RunConfig> for BurstOptions {
    fn from(run: &RunConfig) -> Self {
        Self {
            connections: run.connections,
            launch_delay: run.launch_delay(),
            dial_timeout: run.dial_timeout(),
            close_after: run.close_after(),
        }
    }
}

/// Launch the full burst and drive it to completion: spawn the
/// aggregator, arm the closure trigger, launch exactly N workers with
/// launch starts staggered by the configured delay, then wait for every
/// worker to report Closed. Resolves to the settled registry; there is
/// no timed sleep between the last event and the returned state.
///
/// Dial failures are local to their worker and never abort the run.
/// Snapshots of the registry are published on `snapshots` as events
/// arrive, for progress display.
pub async fn run_burst(
    target: SocketAddr,
    opts: &BurstOptions,
    snapshots: watch::Sender<ConnectionRegistry>,
) -> ConnectionRegistry {
    let fan_out = opts.connections as usize;
    let (events, inbox) = mpsc::channel((fan_out * MAX_EVENTS_PER_CONNECTION).max(1));

    let trigger = ClosureTrigger::new();
    trigger.arm(opts.close_after, snapshots.subscribe(), fan_out);
    let aggregator = spawn_aggregator(inbox, snapshots);

    info!(
        peer = %target,
        connections = fan_out,
        launch_delay_ms = opts.launch_delay.as_millis() as u64,
        dial_timeout_ms = opts.dial_timeout.as_millis() as u64,
        "Launching burst"
    );

    let mut workers = Vec::with_capacity(fan_out);
    for id in 0..opts.connections {
        if id > 0 && !opts.launch_delay.is_zero() {
            tokio::time::sleep(opts.launch_delay).await;
        }
        workers.push(tokio::spawn(worker::run_attempt(
            id,
            target,
            opts.dial_timeout,
            events.clone(),
            trigger.watcher(),
        )));
    }
    // Only worker clones keep the channel open from here on; the
    // aggregator settles once the last of them is gone.
    drop(events);

    for handle in workers {
        if let Err(e) = handle.await {
            error!(error = %e, "Connection worker panicked");
        }
    }

    match aggregator.await {
        Ok(registry) => registry,
        Err(e) => {
            error!(error = %e, "Aggregator task failed");
            ConnectionRegistry::new()
        }
    }
}
