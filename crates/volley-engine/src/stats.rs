use crate::engine::registry::ConnectionRecord;
use std::time::Duration;

/// Aggregate timing statistics over a subset of connection records.
/// An empty subset is a valid input and yields the all-zero snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub count: usize,
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
    pub stddev: Duration,
}

/// Two-pass summary of processing durations: mean first, then the sum
/// of squared deviations from it. Standard deviation is the population
/// form (divide by count, not count - 1).
pub fn summarize<'a, I>(records: I) -> MetricsSnapshot
where
    I: IntoIterator<Item = &'a ConnectionRecord>,
{
    let durations: Vec<Duration> = records.into_iter().map(|r| r.processing).collect();
    if durations.is_empty() {
        return MetricsSnapshot::default();
    }

    let count = durations.len();
    let mut min = durations[0];
    let mut max = durations[0];
    let mut total = Duration::ZERO;
    for d in &durations {
        min = min.min(*d);
        max = max.max(*d);
        total += *d;
    }
    let avg = total / count as u32;

    let avg_secs = avg.as_secs_f64();
    let sum_sq: f64 = durations
        .iter()
        .map(|d| {
            let dev = d.as_secs_f64() - avg_secs;
            dev * dev
        })
        .sum();
    let stddev_secs = (sum_sq / count as f64).sqrt();

    MetricsSnapshot {
        count,
        min,
        max,
        avg,
        stddev: Duration::from_secs_f64(stddev_secs),
    }
}
