use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use volley_engine::{
    run_burst, BurstOptions, ConnectionRegistry, ConnectionStatus, FinalReport,
};

fn options(connections: u32, dial_timeout_ms: u64, close_after_ms: u64) -> BurstOptions {
    BurstOptions {
        connections,
        launch_delay: Duration::ZERO,
        dial_timeout: Duration::from_millis(dial_timeout_ms),
        close_after: Duration::from_millis(close_after_ms),
    }
}

#[tokio::test]
async fn burst_against_live_listener_settles_with_all_established() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let (snapshots, mut progress) = watch::channel(ConnectionRegistry::new());
    let hwm_watcher = tokio::spawn(async move {
        let mut last = 0usize;
        while progress.changed().await.is_ok() {
            let hwm = progress.borrow().high_water_mark();
            assert!(hwm >= last, "high-water mark regressed: {} -> {}", last, hwm);
            last = hwm;
        }
        last
    });

    let registry = run_burst(target, &options(5, 1000, 10_000), snapshots).await;

    assert_eq!(registry.len(), 5);
    for record in registry.records() {
        assert_eq!(record.status, ConnectionStatus::Closed);
        assert!(record.is_resolved());
        assert!(record.ever_established);
    }
    assert_eq!(registry.high_water_mark(), 5);
    assert_eq!(registry.closed_while_established(), 5);
    assert_eq!(hwm_watcher.await.unwrap(), 5);

    let report = FinalReport::from_registry(&registry);
    assert_eq!(report.attempted, 5);
    assert_eq!(report.total_established, 5);
    assert_eq!(report.established_at_closure, 5);
    assert_eq!(report.success.count, 5);
    assert_eq!(report.error.count, 0);
}

#[tokio::test]
async fn refused_dials_settle_as_error_records() {
    // Bind and drop to learn a loopback port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = listener.local_addr().unwrap();
    drop(listener);

    let (snapshots, _progress) = watch::channel(ConnectionRegistry::new());
    let registry = run_burst(target, &options(3, 1000, 10_000), snapshots).await;

    assert_eq!(registry.len(), 3);
    for record in registry.records() {
        assert_eq!(record.status, ConnectionStatus::Closed);
        assert!(record.is_resolved());
        assert!(!record.ever_established);
    }

    // Every attempt failing still yields a valid report.
    let report = FinalReport::from_registry(&registry);
    assert_eq!(report.total_established, 0);
    assert_eq!(report.high_water_mark, 0);
    assert_eq!(report.established_at_closure, 0);
    assert_eq!(report.success.count, 0);
    assert_eq!(report.success.avg, Duration::ZERO);
    assert_eq!(report.error.count, 3);
}

#[tokio::test]
async fn zero_connections_completes_with_empty_registry() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = listener.local_addr().unwrap();

    let (snapshots, _progress) = watch::channel(ConnectionRegistry::new());
    let registry = run_burst(target, &options(0, 100, 100), snapshots).await;

    assert!(registry.is_empty());
    let report = FinalReport::from_registry(&registry);
    assert_eq!(report.attempted, 0);
    assert_eq!(report.success.count, 0);
    assert_eq!(report.error.count, 0);
}

#[tokio::test]
async fn immediate_closure_aborts_attempts_still_dialing() {
    // TEST-NET-3 address: the handshake cannot complete, so attempts
    // are still dialing (or already failed) when closure fires at once.
    let target = "203.0.113.1:9".parse().unwrap();

    let (snapshots, _progress) = watch::channel(ConnectionRegistry::new());
    let registry = run_burst(target, &options(2, 30_000, 0), snapshots).await;

    assert_eq!(registry.len(), 2);
    for record in registry.records() {
        assert_eq!(record.status, ConnectionStatus::Closed);
        assert!(record.is_resolved());
        assert!(!record.ever_established);
    }

    let report = FinalReport::from_registry(&registry);
    assert_eq!(report.success.count, 0);
    assert_eq!(report.error.count, 2);
}
