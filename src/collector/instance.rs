//! Per-instance metric extraction across the enabled status endpoints.

use serde_json::Value;

use crate::config::{Category, CategorySet};
use crate::metrics::{QUEUE_TYPE_LOGS, QUEUE_TYPE_PENDING, ShakeMetrics};

use super::client::ApiClient;
use super::endpoints::{
    PERSIST_PATH, PersistStatus, QUEUE_PATH, QueueStatus, REPL_PATH, ReplLatency, ReplThroughput,
    SENTINEL_PATH, SentinelStatus, WORKER_PATH, WorkerStatus, buffer_ratio, fetch_delay,
    queue_ratios, sync_delay,
};

/// Poll every endpoint enabled for this instance and publish the extracted
/// observations.
///
/// Returns `true` when every attempted fetch returned data that parsed
/// cleanly. Absent responses leave previous gauge values untouched; shape
/// errors abort only the endpoint they occurred on. Neither propagates.
pub async fn collect_instance(
    client: &ApiClient,
    metrics: &ShakeMetrics,
    categories: &CategorySet,
    name: &str,
    host: &str,
    port: u16,
) -> bool {
    let now_unix = chrono::Utc::now().timestamp();
    let mut clean = true;

    if categories.contains(Category::Latency) || categories.contains(Category::Throughput) {
        match client.fetch_json(host, port, REPL_PATH).await {
            Some(body) => {
                if let Err(e) = extract_repl(metrics, categories, name, now_unix, &body) {
                    tracing::error!(
                        instance = %name,
                        endpoint = REPL_PATH,
                        error = %e,
                        "failed to parse replication status"
                    );
                    clean = false;
                }
            }
            None => clean = false,
        }
    }

    if categories.contains(Category::Status) {
        match client.fetch_json(host, port, SENTINEL_PATH).await {
            Some(body) => {
                if let Err(e) = extract_sentinel(metrics, name, &body) {
                    tracing::error!(
                        instance = %name,
                        endpoint = SENTINEL_PATH,
                        error = %e,
                        "failed to parse sentinel status"
                    );
                    clean = false;
                }
            }
            None => clean = false,
        }
    }

    if categories.contains(Category::Throughput) {
        match client.fetch_json(host, port, WORKER_PATH).await {
            Some(body) => {
                if let Err(e) = extract_worker(metrics, name, &body) {
                    tracing::error!(
                        instance = %name,
                        endpoint = WORKER_PATH,
                        error = %e,
                        "failed to parse worker status"
                    );
                    clean = false;
                }
            }
            None => clean = false,
        }
    }

    if categories.contains(Category::Queue) {
        // /queue and /persist are independent; one failing never blocks the other.
        match client.fetch_json(host, port, QUEUE_PATH).await {
            Some(body) => {
                if let Err(e) = extract_queue(metrics, name, &body) {
                    tracing::error!(
                        instance = %name,
                        endpoint = QUEUE_PATH,
                        error = %e,
                        "failed to parse queue status"
                    );
                    clean = false;
                }
            }
            None => clean = false,
        }

        match client.fetch_json(host, port, PERSIST_PATH).await {
            Some(body) => {
                if let Err(e) = extract_persist(metrics, name, &body) {
                    tracing::error!(
                        instance = %name,
                        endpoint = PERSIST_PATH,
                        error = %e,
                        "failed to parse persist status"
                    );
                    clean = false;
                }
            }
            None => clean = false,
        }
    }

    clean
}

/// Extract latency and throughput fields from one `/repl` payload.
///
/// Latency runs first; a shape error there skips throughput too, since the
/// payload as a whole is suspect.
fn extract_repl(
    metrics: &ShakeMetrics,
    categories: &CategorySet,
    name: &str,
    now_unix: i64,
    body: &Value,
) -> Result<(), serde_json::Error> {
    if categories.contains(Category::Latency) {
        let latency: ReplLatency = serde_json::from_value(body.clone())?;
        metrics
            .fetch_delay
            .with_label_values(&[name])
            .set(fetch_delay(now_unix, latency.lsn.unix));
        metrics
            .sync_delay
            .with_label_values(&[name])
            .set(sync_delay(now_unix, latency.lsn.unix, latency.lsn_ack.unix));
    }

    if categories.contains(Category::Throughput) {
        let throughput: ReplThroughput = serde_json::from_value(body.clone())?;
        metrics
            .logs_get
            .with_label_values(&[name])
            .set(throughput.logs_get);
        metrics
            .logs_success
            .with_label_values(&[name])
            .set(throughput.logs_success);
        metrics.tps.with_label_values(&[name]).set(throughput.tps);
    }

    Ok(())
}

fn extract_sentinel(
    metrics: &ShakeMetrics,
    name: &str,
    body: &Value,
) -> Result<(), serde_json::Error> {
    let sentinel: SentinelStatus = serde_json::from_value(body.clone())?;
    metrics
        .pause_status
        .with_label_values(&[name])
        .set(if sentinel.pause { 1.0 } else { 0.0 });
    Ok(())
}

fn extract_worker(
    metrics: &ShakeMetrics,
    name: &str,
    body: &Value,
) -> Result<(), serde_json::Error> {
    let worker: WorkerStatus = serde_json::from_value(body.clone())?;
    metrics
        .worker_count
        .with_label_values(&[name])
        .set(worker.count);
    Ok(())
}

fn extract_queue(
    metrics: &ShakeMetrics,
    name: &str,
    body: &Value,
) -> Result<(), serde_json::Error> {
    let status: QueueStatus = serde_json::from_value(body.clone())?;
    if let Some((logs, pending)) = queue_ratios(&status) {
        metrics
            .queue_used
            .with_label_values(&[name, QUEUE_TYPE_LOGS])
            .set(logs);
        metrics
            .queue_used
            .with_label_values(&[name, QUEUE_TYPE_PENDING])
            .set(pending);
    }
    Ok(())
}

fn extract_persist(
    metrics: &ShakeMetrics,
    name: &str,
    body: &Value,
) -> Result<(), serde_json::Error> {
    let status: PersistStatus = serde_json::from_value(body.clone())?;
    if let Some(ratio) = buffer_ratio(&status) {
        metrics.buffer_used.with_label_values(&[name]).set(ratio);
    }
    Ok(())
}
