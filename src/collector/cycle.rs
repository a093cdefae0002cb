//! The collection cycle: one pass over every configured target, repeated on
//! a fixed interval until shutdown.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::config::{CategorySet, split_host_port};
use crate::metrics::ShakeMetrics;

use super::client::ApiClient;
use super::instance::collect_instance;

/// Outcome of one collection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Targets polled without any fetch or parse error.
    pub succeeded: usize,
    /// Targets configured.
    pub total: usize,
}

/// Poll every target once, in sequence.
///
/// A malformed `host:port` is logged and skipped; everything else that can
/// go wrong for one target is contained inside [`collect_instance`], so no
/// target can abort the cycle for the others. Logs one summary line with the
/// cycle duration and the succeeded/total counts.
pub async fn run_cycle(
    client: &ApiClient,
    metrics: &ShakeMetrics,
    categories: &CategorySet,
    targets: &BTreeMap<String, String>,
) -> CycleStats {
    let start = Instant::now();
    let mut succeeded = 0;

    for (name, host_port) in targets {
        match split_host_port(host_port) {
            Some((host, port)) => {
                if collect_instance(client, metrics, categories, name, host, port).await {
                    succeeded += 1;
                }
            }
            None => {
                tracing::error!(instance = %name, target = %host_port, "invalid target format");
            }
        }
    }

    let stats = CycleStats {
        succeeded,
        total: targets.len(),
    };
    tracing::info!(
        duration_ms = start.elapsed().as_millis() as u64,
        succeeded = stats.succeeded,
        total = stats.total,
        "collection cycle completed"
    );
    stats
}

/// Run collection cycles forever, sleeping `poll_interval` between passes.
///
/// The interval is fixed: no jitter, no backoff, no stretching after a slow
/// cycle. Returns once `shutdown` resolves; a cycle already in flight runs
/// to completion first, bounded by the client's fetch timeout.
pub async fn run_loop(
    client: &ApiClient,
    metrics: &ShakeMetrics,
    categories: &CategorySet,
    targets: &BTreeMap<String, String>,
    poll_interval: Duration,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        run_cycle(client, metrics, categories, targets).await;

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = &mut shutdown => {
                tracing::info!("collection loop stopping");
                return;
            }
        }
    }
}
