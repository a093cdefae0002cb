//! Typed views of the MongoShake status endpoints and the derived values
//! computed from their fields.
//!
//! Payload shape is validated here at the boundary: fields the agent may
//! legitimately omit carry serde defaults, fields whose absence means the
//! payload is broken are required and surface as a deserialization error at
//! the extraction site.

use serde::Deserialize;

/// Replication status endpoint path.
pub const REPL_PATH: &str = "/repl";
/// Pause/run sentinel endpoint path.
pub const SENTINEL_PATH: &str = "/sentinel";
/// Worker status endpoint path.
pub const WORKER_PATH: &str = "/worker";
/// Syncer queue status endpoint path.
pub const QUEUE_PATH: &str = "/queue";
/// Persist buffer status endpoint path.
pub const PERSIST_PATH: &str = "/persist";

/// Queue capacity MongoShake uses when `logs_queue_size` is not reported.
const DEFAULT_LOGS_QUEUE_SIZE: u64 = 128;

fn default_logs_queue_size() -> u64 {
    DEFAULT_LOGS_QUEUE_SIZE
}

/// An LSN cursor position, exposed by the agent as a unix timestamp.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LsnCursor {
    pub unix: i64,
}

/// Latency fields of `/repl`. Both cursors are required; a payload without
/// them is malformed.
#[derive(Debug, Deserialize)]
pub struct ReplLatency {
    /// Last sequence number fetched from the source.
    pub lsn: LsnCursor,
    /// Last sequence number acknowledged by the target.
    pub lsn_ack: LsnCursor,
}

/// Throughput fields of `/repl`. All default to zero when absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReplThroughput {
    pub logs_get: f64,
    pub logs_success: f64,
    pub tps: f64,
}

/// `/sentinel` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SentinelStatus {
    #[serde(rename = "Pause")]
    pub pause: bool,
}

/// `/worker` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WorkerStatus {
    pub count: f64,
}

/// `/queue` payload.
#[derive(Debug, Deserialize)]
pub struct QueueStatus {
    /// Capacity of each per-worker logs queue.
    #[serde(default = "default_logs_queue_size")]
    pub logs_queue_size: u64,
    /// Per-worker queue occupancy entries.
    #[serde(default)]
    pub syncer_inner_queue: Vec<SyncerQueue>,
}

/// One per-worker queue entry inside `/queue`. Both fields are required.
#[derive(Debug, Deserialize)]
pub struct SyncerQueue {
    pub logs_queue_used: u64,
    pub pending_queue_used: u64,
}

/// `/persist` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PersistStatus {
    pub buffer_used: f64,
    pub buffer_size: f64,
}

/// Seconds since the source-side fetch cursor last advanced.
pub fn fetch_delay(now_unix: i64, lsn_unix: i64) -> f64 {
    (now_unix - lsn_unix) as f64
}

/// End-to-end replication delay in seconds.
///
/// When the ack cursor has caught up with the fetch cursor there is no
/// pending work, so the delay is zero no matter how old the cursors are;
/// otherwise wall-clock time since the last event would read as replication
/// lag on an idle source.
pub fn sync_delay(now_unix: i64, lsn_unix: i64, lsn_ack_unix: i64) -> f64 {
    if lsn_unix - lsn_ack_unix <= 0 {
        0.0
    } else {
        (now_unix - lsn_ack_unix) as f64
    }
}

/// Occupancy ratios `(logs, pending)` across all per-worker queues.
///
/// Returns `None` when total capacity is zero (no queue entries, or a zero
/// queue size), so a divide-by-zero never reaches the sink.
pub fn queue_ratios(status: &QueueStatus) -> Option<(f64, f64)> {
    let capacity = status.logs_queue_size * status.syncer_inner_queue.len() as u64;
    if capacity == 0 {
        return None;
    }
    let logs_used: u64 = status.syncer_inner_queue.iter().map(|q| q.logs_queue_used).sum();
    let pending_used: u64 = status
        .syncer_inner_queue
        .iter()
        .map(|q| q.pending_queue_used)
        .sum();
    Some((
        logs_used as f64 / capacity as f64,
        pending_used as f64 / capacity as f64,
    ))
}

/// Persist-buffer occupancy ratio, or `None` when the size is unreported.
pub fn buffer_ratio(status: &PersistStatus) -> Option<f64> {
    if status.buffer_size > 0.0 {
        Some(status.buffer_used / status.buffer_size)
    } else {
        None
    }
}
