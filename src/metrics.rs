//! The exported metric series.
//!
//! Every series is a labeled gauge with last-write-wins semantics: once an
//! instance has reported a value it stays published until overwritten, even
//! if the instance later becomes unreachable. Consumers are expected to
//! detect staleness via scrape timestamps; nothing is expired here.

use prometheus::{GaugeVec, Opts, Registry};

/// `queue_type` label value for the raw oplog queues.
pub const QUEUE_TYPE_LOGS: &str = "logs";

/// `queue_type` label value for the pending-apply queues.
pub const QUEUE_TYPE_PENDING: &str = "pending";

/// The fixed set of series this exporter publishes.
///
/// `logs_get`, `logs_success` and `worker_count` are monotonic counters on
/// the MongoShake side but are exposed as gauges carrying the raw value, so
/// they are `set()` rather than incremented; dashboards `rate()` them.
#[derive(Debug, Clone)]
pub struct ShakeMetrics {
    /// End-to-end replication delay in seconds, suppressed to zero when the
    /// ack cursor has caught up with the fetch cursor.
    pub sync_delay: GaugeVec,
    /// Seconds since the source-side fetch cursor last advanced.
    pub fetch_delay: GaugeVec,
    /// Oplogs per second.
    pub tps: GaugeVec,
    /// Total oplogs fetched from the source.
    pub logs_get: GaugeVec,
    /// Total oplogs successfully replicated to the target.
    pub logs_success: GaugeVec,
    /// Total oplogs processed by workers.
    pub worker_count: GaugeVec,
    /// Queue occupancy ratio, labeled by `queue_type` (`logs` | `pending`).
    pub queue_used: GaugeVec,
    /// Persist-buffer occupancy ratio.
    pub buffer_used: GaugeVec,
    /// 1 if replication is paused, 0 otherwise.
    pub pause_status: GaugeVec,
}

impl ShakeMetrics {
    /// Create the metric vectors.
    ///
    /// # Errors
    /// Returns `prometheus::Error` if a metric descriptor is invalid.
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            sync_delay: GaugeVec::new(
                Opts::new(
                    "mongoshake_sync_delay_seconds",
                    "End-to-end replication delay in seconds",
                ),
                &["instance"],
            )?,
            fetch_delay: GaugeVec::new(
                Opts::new(
                    "mongoshake_fetch_delay_seconds",
                    "Oplog fetch delay in seconds",
                ),
                &["instance"],
            )?,
            tps: GaugeVec::new(
                Opts::new("mongoshake_tps_oplog", "Transactions per second (oplogs/sec)"),
                &["instance"],
            )?,
            logs_get: GaugeVec::new(
                Opts::new(
                    "mongoshake_logs_get_total",
                    "Total oplogs fetched from source",
                ),
                &["instance"],
            )?,
            logs_success: GaugeVec::new(
                Opts::new(
                    "mongoshake_logs_success_total",
                    "Total oplogs successfully replicated to target",
                ),
                &["instance"],
            )?,
            worker_count: GaugeVec::new(
                Opts::new(
                    "mongoshake_worker_count_total",
                    "Total oplogs processed by worker",
                ),
                &["instance"],
            )?,
            queue_used: GaugeVec::new(
                Opts::new("mongoshake_queue_used_ratio", "Queue used ratio"),
                &["instance", "queue_type"],
            )?,
            buffer_used: GaugeVec::new(
                Opts::new("mongoshake_buffer_used_ratio", "Buffer used ratio"),
                &["instance"],
            )?,
            pause_status: GaugeVec::new(
                Opts::new(
                    "mongoshake_pause_status",
                    "1 if replication is paused, 0 otherwise",
                ),
                &["instance"],
            )?,
        })
    }

    /// Register all series with the given registry.
    ///
    /// # Errors
    /// Returns `prometheus::Error` if a series name is already registered.
    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.sync_delay.clone()))?;
        registry.register(Box::new(self.fetch_delay.clone()))?;
        registry.register(Box::new(self.tps.clone()))?;
        registry.register(Box::new(self.logs_get.clone()))?;
        registry.register(Box::new(self.logs_success.clone()))?;
        registry.register(Box::new(self.worker_count.clone()))?;
        registry.register(Box::new(self.queue_used.clone()))?;
        registry.register(Box::new(self.buffer_used.clone()))?;
        registry.register(Box::new(self.pause_status.clone()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_all_series() {
        let registry = Registry::new();
        let metrics = ShakeMetrics::new().unwrap();
        metrics.register(&registry).unwrap();

        // Families only show up in gather() once they have at least one child.
        metrics.pause_status.with_label_values(&["a"]).set(1.0);
        metrics
            .queue_used
            .with_label_values(&["a", QUEUE_TYPE_LOGS])
            .set(0.5);

        let families = registry.gather();
        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert!(names.contains(&"mongoshake_pause_status"));
        assert!(names.contains(&"mongoshake_queue_used_ratio"));
    }

    #[test]
    fn test_metrics_double_registration_fails() {
        let registry = Registry::new();
        let metrics = ShakeMetrics::new().unwrap();
        metrics.register(&registry).unwrap();
        assert!(metrics.register(&registry).is_err());
    }

    #[test]
    fn test_gauges_are_last_write_wins() {
        let metrics = ShakeMetrics::new().unwrap();
        let gauge = metrics.sync_delay.with_label_values(&["inst"]);
        gauge.set(12.0);
        gauge.set(3.0);
        assert_eq!(gauge.get(), 3.0);
    }
}
