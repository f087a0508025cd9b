use crate::report::FinalReport;
use lazy_static::lazy_static;
use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

const LABELS: &[&str] = &["target_ip", "target_port", "delay_ms", "timeout_ms"];

fn gauge(name: &str, help: &str) -> GaugeVec {
    GaugeVec::new(Opts::new(format!("tcpvolley_{}", name), help), LABELS)
        .expect("metric can be created")
}

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ESTABLISHED_CONNECTIONS: GaugeVec = gauge(
        "established_connections_count",
        "Number of totally established connections"
    );
    pub static ref MAX_CONCURRENT_CONNECTIONS: GaugeVec = gauge(
        "max_concurrent_connections_count",
        "Max concurrent established connections"
    );
    pub static ref ESTABLISHED_ON_CLOSURE: GaugeVec = gauge(
        "established_connections_on_closure_count",
        "Number of established connections on closure"
    );
    pub static ref MIN_RESPONSE_TIME: GaugeVec =
        gauge("min_response_time_secs", "Minimum wait for SYN-ACK");
    pub static ref MAX_RESPONSE_TIME: GaugeVec =
        gauge("max_response_time_secs", "Maximum wait for SYN-ACK");
    pub static ref AVG_RESPONSE_TIME: GaugeVec =
        gauge("avg_response_time_secs", "Average wait for SYN-ACK");
    pub static ref STDDEV_RESPONSE_TIME: GaugeVec = gauge(
        "stddev_response_time_secs",
        "Standard deviation of wait for SYN-ACK"
    );
    pub static ref ATTEMPTED_CONNECTIONS: GaugeVec = gauge(
        "attempted_connection_count",
        "Number of connections attempted to connect"
    );
}

/// Label set identifying one run's parameters.
#[derive(Debug, Clone)]
pub struct RunLabels {
    pub target_ip: String,
    pub target_port: u16,
    pub delay_ms: u64,
    pub timeout_ms: u64,
}

impl RunLabels {
    fn values(&self) -> [String; 4] {
        [
            self.target_ip.clone(),
            self.target_port.to_string(),
            self.delay_ms.to_string(),
            self.timeout_ms.to_string(),
        ]
    }
}

pub fn register_metrics() {
    let _ = REGISTRY.register(Box::new(ESTABLISHED_CONNECTIONS.clone()));
    let _ = REGISTRY.register(Box::new(MAX_CONCURRENT_CONNECTIONS.clone()));
    let _ = REGISTRY.register(Box::new(ESTABLISHED_ON_CLOSURE.clone()));
    let _ = REGISTRY.register(Box::new(MIN_RESPONSE_TIME.clone()));
    let _ = REGISTRY.register(Box::new(MAX_RESPONSE_TIME.clone()));
    let _ = REGISTRY.register(Box::new(AVG_RESPONSE_TIME.clone()));
    let _ = REGISTRY.register(Box::new(STDDEV_RESPONSE_TIME.clone()));
    let _ = REGISTRY.register(Box::new(ATTEMPTED_CONNECTIONS.clone()));
}

/// Map a final report onto the exported gauges, labeled by the run's
/// target and timing parameters. Success-class timings only; the error
/// class stays in the textual report.
pub fn publish_report(report: &FinalReport, labels: &RunLabels) {
    let values = labels.values();
    let label_values: Vec<&str> = values.iter().map(String::as_str).collect();

    ESTABLISHED_CONNECTIONS
        .with_label_values(&label_values)
        .set(report.total_established as f64);
    MAX_CONCURRENT_CONNECTIONS
        .with_label_values(&label_values)
        .set(report.high_water_mark as f64);
    ESTABLISHED_ON_CLOSURE
        .with_label_values(&label_values)
        .set(report.established_at_closure as f64);
    MIN_RESPONSE_TIME
        .with_label_values(&label_values)
        .set(report.success.min.as_secs_f64());
    MAX_RESPONSE_TIME
        .with_label_values(&label_values)
        .set(report.success.max.as_secs_f64());
    AVG_RESPONSE_TIME
        .with_label_values(&label_values)
        .set(report.success.avg.as_secs_f64());
    STDDEV_RESPONSE_TIME
        .with_label_values(&label_values)
        .set(report.success.stddev.as_secs_f64());
    ATTEMPTED_CONNECTIONS
        .with_label_values(&label_values)
        .set(report.attempted as f64);
}

pub fn render_metrics() -> String {
    let metric_families = REGISTRY.gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}", e);
    }

    String::from_utf8(buffer).unwrap_or_else(|_| "# Error: Invalid UTF8".to_string())
}
