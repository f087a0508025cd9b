use super::registry::{ConnectionEvent, ConnectionId, ConnectionStatus};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One logical connection attempt, start to finish: dial once, report
/// the outcome, hold the socket until the closure broadcast, close,
/// report Closed. There is no retry; the point is to hit the target
/// with exactly N simultaneous attempts.
pub async fn run_attempt(
    id: ConnectionId,
    target: SocketAddr,
    dial_timeout: Duration,
    events: mpsc::Sender<ConnectionEvent>,
    closure: CancellationToken,
) {
    let started = Instant::now();
    send(&events, id, ConnectionStatus::Dialing, Duration::ZERO).await;

    let stream = tokio::select! {
        dialed = timeout(dial_timeout, TcpStream::connect(target)) => {
            match dialed {
                Ok(Ok(stream)) => {
                    debug!(id, peer = %target, "Connection established");
                    send(&events, id, ConnectionStatus::Established, started.elapsed()).await;
                    Some(stream)
                }
                Ok(Err(e)) => {
                    debug!(id, peer = %target, error = %e, "Dial failed");
                    send(&events, id, ConnectionStatus::Error, started.elapsed()).await;
                    None
                }
                Err(_) => {
                    warn!(id, peer = %target, timeout_ms = dial_timeout.as_millis() as u64,
                        "Dial timed out");
                    send(&events, id, ConnectionStatus::Error, started.elapsed()).await;
                    None
                }
            }
        }
        _ = closure.cancelled() => {
            // Aborted mid-dial by the global closure broadcast.
            debug!(id, "Dial aborted by closure broadcast");
            send(&events, id, ConnectionStatus::Error, started.elapsed()).await;
            None
        }
    };

    closure.cancelled().await;
    drop(stream);
    send(&events, id, ConnectionStatus::Closed, started.elapsed()).await;
}

async fn send(
    events: &mpsc::Sender<ConnectionEvent>,
    id: ConnectionId,
    status: ConnectionStatus,
    elapsed: Duration,
) {
    // The channel is sized for 3 events per connection, so this never
    // blocks while the aggregator is alive.
    if events
        .send(ConnectionEvent {
            id,
            status,
            elapsed,
        })
        .await
        .is_err()
    {
        warn!(id, status = ?status, "Aggregator gone, event dropped");
    }
}
