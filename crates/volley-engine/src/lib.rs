pub mod engine;
pub mod metrics;
pub mod report;
pub mod stats;

pub use engine::orchestrator::{run_burst, BurstOptions};
pub use engine::registry::{
    ConnectionEvent, ConnectionId, ConnectionRecord, ConnectionRegistry, ConnectionStatus,
};
pub use report::FinalReport;
pub use stats::MetricsSnapshot;

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot resolve target {host}:{port}")]
    Resolution { host: String, port: u16 },
}

/// Resolve the target name once, before any worker launches. An
/// unresolvable name is fatal for the run.
pub async fn resolve_target(host: &str, port: u16) -> Result<SocketAddr, RunError> {
    let unresolvable = || RunError::Resolution {
        host: host.to_string(),
        port,
    };
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| unresolvable())?
        .next()
        .ok_or_else(unresolvable)
}
