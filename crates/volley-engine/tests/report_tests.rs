use std::time::Duration;
use volley_engine::{ConnectionEvent, ConnectionRegistry, ConnectionStatus, FinalReport};

fn ev(id: u32, status: ConnectionStatus, elapsed_ms: u64) -> ConnectionEvent {
    ConnectionEvent {
        id,
        status,
        elapsed: Duration::from_millis(elapsed_ms),
    }
}

fn settled_registry() -> ConnectionRegistry {
    let mut registry = ConnectionRegistry::new();
    for id in 0..3 {
        registry.apply(ev(id, ConnectionStatus::Dialing, 0));
    }
    registry.apply(ev(0, ConnectionStatus::Established, 5));
    registry.apply(ev(1, ConnectionStatus::Established, 15));
    registry.apply(ev(2, ConnectionStatus::Error, 100));
    registry.apply(ev(0, ConnectionStatus::Closed, 200));
    registry.apply(ev(1, ConnectionStatus::Closed, 200));
    registry.apply(ev(2, ConnectionStatus::Closed, 200));
    registry
}

#[test]
fn report_partitions_success_and_error_classes() {
    let report = FinalReport::from_registry(&settled_registry());

    assert_eq!(report.attempted, 3);
    assert_eq!(report.total_established, 2);
    assert_eq!(report.high_water_mark, 2);
    assert_eq!(report.established_at_closure, 2);
    assert_eq!(report.success.count, 2);
    assert_eq!(report.success.avg, Duration::from_millis(10));
    assert_eq!(report.error.count, 1);
    assert_eq!(report.error.avg, Duration::from_millis(100));
}

#[test]
fn report_building_is_idempotent() {
    let registry = settled_registry();
    let first = FinalReport::from_registry(&registry);
    let second = FinalReport::from_registry(&registry);
    assert_eq!(first, second);
}

#[test]
fn empty_registry_yields_the_zero_report() {
    let report = FinalReport::from_registry(&ConnectionRegistry::new());
    assert_eq!(report.attempted, 0);
    assert_eq!(report.total_established, 0);
    assert_eq!(report.high_water_mark, 0);
    assert_eq!(report.established_at_closure, 0);
    assert_eq!(report.success.count, 0);
    assert_eq!(report.success.stddev, Duration::ZERO);
    assert_eq!(report.error.count, 0);
}

#[test]
fn rendered_report_lists_statistics_per_class() {
    let rendered = FinalReport::from_registry(&settled_registry()).to_string();

    assert!(rendered.contains("tcpvolley execution statistics"));
    assert!(rendered.contains("Total established connections: 2"));
    assert!(rendered.contains("Max concurrent established connections: 2"));
    assert!(rendered.contains("Established connections on closure: 2"));
    assert!(rendered.contains("successful round-trip min/avg/max/stddev"));
    assert!(rendered.contains("failed round-trip min/avg/max/stddev"));
}

#[test]
fn rendered_report_omits_empty_classes() {
    let rendered = FinalReport::from_registry(&ConnectionRegistry::new()).to_string();
    assert!(!rendered.contains("round-trip"));
}
