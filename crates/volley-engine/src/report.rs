use crate::engine::registry::ConnectionRegistry;
use crate::stats::{self, MetricsSnapshot};
use std::fmt;
use std::time::Duration;
use tokio::sync::watch;

/// Run summary derived from a settled registry. Building it is a pure
/// function: the same registry always yields the same report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub attempted: usize,
    pub total_established: usize,
    pub high_water_mark: usize,
    pub established_at_closure: usize,
    pub success: MetricsSnapshot,
    pub error: MetricsSnapshot,
}

impl FinalReport {
    pub fn from_registry(registry: &ConnectionRegistry) -> Self {
        Self {
            attempted: registry.len(),
            total_established: registry.ever_established().len(),
            high_water_mark: registry.high_water_mark(),
            established_at_closure: registry.closed_while_established(),
            success: stats::summarize(registry.ever_established()),
            error: stats::summarize(registry.never_established()),
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn ping_style_line(f: &mut fmt::Formatter<'_>, class: &str, m: &MetricsSnapshot) -> fmt::Result {
    writeln!(f, "{} connections: {}", class, m.count)?;
    writeln!(
        f,
        "{} round-trip min/avg/max/stddev = {:.3}/{:.3}/{:.3}/{:.3} ms",
        class,
        millis(m.min),
        millis(m.avg),
        millis(m.max),
        millis(m.stddev),
    )
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- tcpvolley execution statistics ---")?;
        writeln!(f, "Attempted connections: {}", self.attempted)?;
        writeln!(f, "Total established connections: {}", self.total_established)?;
        writeln!(
            f,
            "Max concurrent established connections: {}",
            self.high_water_mark
        )?;
        writeln!(
            f,
            "Established connections on closure: {}",
            self.established_at_closure
        )?;
        if self.success.count > 0 {
            ping_style_line(f, "successful", &self.success)?;
        }
        if self.error.count > 0 {
            ping_style_line(f, "failed", &self.error)?;
        }
        Ok(())
    }
}

/// Print the registry summary at a fixed interval while the run is in
/// flight. Returns once the snapshot channel closes, which happens when
/// the aggregator settles. A zero interval disables progress output.
pub async fn report_progress(mut snapshots: watch::Receiver<ConnectionRegistry>, every: Duration) {
    if every.is_zero() {
        return;
    }
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        println!("{}", snapshots.borrow_and_update().summary());
        if snapshots.has_changed().is_err() {
            break;
        }
    }
}
