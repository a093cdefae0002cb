//! End-to-end collection tests against a stubbed MongoShake status API.
//!
//! One healthy instance answering all four endpoints and one instance with
//! connection refused everywhere: after a cycle the healthy instance must
//! have all nine series populated, the dead one must have none, and the
//! cycle stats must report one of two targets clean.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, routing::get};
use mongoshake_exporter::{ApiClient, CategorySet, CycleStats, ShakeMetrics, run_cycle};
use prometheus::Registry;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Fixed cursor timestamp used by the stub; old enough that a missing
/// suppression rule would show up as a huge sync delay.
const LSN_UNIX: i64 = 1_600_000_000;

/// Serve a healthy MongoShake status API on a random port.
async fn start_stub_instance() -> (u16, JoinHandle<()>) {
    let router = Router::new()
        .route(
            "/repl",
            get(|| async {
                Json(json!({
                    "lsn": {"unix": LSN_UNIX, "ts": 6_871_947_673_600_i64},
                    "lsn_ack": {"unix": LSN_UNIX},
                    "logs_get": 1000,
                    "logs_success": 990,
                    "tps": 12.5
                }))
            }),
        )
        .route("/sentinel", get(|| async { Json(json!({"Pause": true})) }))
        .route("/worker", get(|| async { Json(json!({"count": 990})) }))
        .route(
            "/queue",
            get(|| async {
                Json(json!({
                    "logs_queue_size": 128,
                    "syncer_inner_queue": [
                        {"logs_queue_used": 10, "pending_queue_used": 5},
                        {"logs_queue_used": 20, "pending_queue_used": 5}
                    ]
                }))
            }),
        )
        .route(
            "/persist",
            get(|| async { Json(json!({"buffer_used": 50, "buffer_size": 100})) }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let port = listener.local_addr().expect("failed to get local addr").port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (port, handle)
}

/// Reserve a port with nothing listening on it.
async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Instance label values present anywhere in the registry.
fn instances_in(registry: &Registry) -> Vec<String> {
    let mut instances: Vec<String> = registry
        .gather()
        .iter()
        .flat_map(|family| family.get_metric())
        .flat_map(|metric| metric.get_label())
        .filter(|label| label.get_name() == "instance")
        .map(|label| label.get_value().to_string())
        .collect();
    instances.sort();
    instances.dedup();
    instances
}

#[tokio::test]
async fn test_cycle_with_healthy_and_unreachable_targets() {
    let (healthy_port, server) = start_stub_instance().await;
    let dead_port = refused_port().await;

    let mut targets = BTreeMap::new();
    targets.insert("healthy".to_string(), format!("127.0.0.1:{healthy_port}"));
    targets.insert("dead".to_string(), format!("127.0.0.1:{dead_port}"));

    let registry = Registry::new();
    let metrics = ShakeMetrics::new().unwrap();
    metrics.register(&registry).unwrap();
    let client = ApiClient::new(Duration::from_secs(2)).unwrap();
    let categories = CategorySet::all();

    let stats = run_cycle(&client, &metrics, &categories, &targets).await;
    assert_eq!(stats, CycleStats { succeeded: 1, total: 2 });

    // All nine series populated for the healthy instance.
    let healthy = |vec: &prometheus::GaugeVec| vec.with_label_values(&["healthy"]).get();
    assert_eq!(healthy(&metrics.sync_delay), 0.0); // caught up, suppressed
    assert!(healthy(&metrics.fetch_delay) > 0.0); // LSN_UNIX is in the past
    assert_eq!(healthy(&metrics.tps), 12.5);
    assert_eq!(healthy(&metrics.logs_get), 1000.0);
    assert_eq!(healthy(&metrics.logs_success), 990.0);
    assert_eq!(healthy(&metrics.worker_count), 990.0);
    assert_eq!(healthy(&metrics.pause_status), 1.0);
    assert_eq!(healthy(&metrics.buffer_used), 0.5);
    assert_eq!(
        metrics.queue_used.with_label_values(&["healthy", "logs"]).get(),
        30.0 / 256.0
    );
    assert_eq!(
        metrics
            .queue_used
            .with_label_values(&["healthy", "pending"])
            .get(),
        10.0 / 256.0
    );

    // First-ever cycle: the unreachable instance has no series at all.
    assert_eq!(instances_in(&registry), vec!["healthy".to_string()]);

    // Kill the healthy instance and run another cycle: last-known values
    // stay published, nothing is deleted or marked stale.
    server.abort();
    let _ = server.await;

    let stats = run_cycle(&client, &metrics, &categories, &targets).await;
    assert_eq!(stats, CycleStats { succeeded: 0, total: 2 });
    assert_eq!(healthy(&metrics.tps), 12.5);
    assert_eq!(healthy(&metrics.pause_status), 1.0);
    assert_eq!(instances_in(&registry), vec!["healthy".to_string()]);
}

#[tokio::test]
async fn test_cycle_respects_category_gating() {
    let (port, _server) = start_stub_instance().await;

    let mut targets = BTreeMap::new();
    targets.insert("only-queue".to_string(), format!("127.0.0.1:{port}"));

    let registry = Registry::new();
    let metrics = ShakeMetrics::new().unwrap();
    metrics.register(&registry).unwrap();
    let client = ApiClient::new(Duration::from_secs(2)).unwrap();

    let stats = run_cycle(&client, &metrics, &CategorySet::parse("queue"), &targets).await;
    assert_eq!(stats, CycleStats { succeeded: 1, total: 1 });

    // Queue and persist series exist; nothing else was polled.
    assert_eq!(
        metrics.buffer_used.with_label_values(&["only-queue"]).get(),
        0.5
    );
    let names: Vec<String> = registry
        .gather()
        .iter()
        .filter(|family| !family.get_metric().is_empty())
        .map(|family| family.get_name().to_string())
        .collect();
    assert!(names.contains(&"mongoshake_queue_used_ratio".to_string()));
    assert!(names.contains(&"mongoshake_buffer_used_ratio".to_string()));
    assert!(!names.contains(&"mongoshake_pause_status".to_string()));
    assert!(!names.contains(&"mongoshake_sync_delay_seconds".to_string()));
}

#[tokio::test]
async fn test_scrape_reflects_collected_values() {
    let (port, _server) = start_stub_instance().await;

    let mut targets = BTreeMap::new();
    targets.insert("shard-a".to_string(), format!("127.0.0.1:{port}"));

    let registry = Arc::new(Registry::new());
    let metrics = ShakeMetrics::new().unwrap();
    metrics.register(&registry).unwrap();
    let client = ApiClient::new(Duration::from_secs(2)).unwrap();

    run_cycle(&client, &metrics, &CategorySet::all(), &targets).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mongoshake_exporter::server::serve(
        listener,
        Arc::clone(&registry),
        std::future::pending(),
    ));

    let body = reqwest::get(format!("http://{}/metrics", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("mongoshake_sync_delay_seconds{instance=\"shard-a\"} 0"));
    assert!(body.contains("mongoshake_pause_status{instance=\"shard-a\"} 1"));
    assert!(body.contains("mongoshake_queue_used_ratio{instance=\"shard-a\",queue_type=\"logs\"}"));
    assert!(
        body.contains("mongoshake_queue_used_ratio{instance=\"shard-a\",queue_type=\"pending\"}")
    );
    assert!(body.contains("mongoshake_buffer_used_ratio{instance=\"shard-a\"} 0.5"));
}
