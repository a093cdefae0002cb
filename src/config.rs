//! Exporter configuration: the target registry and the monitoring category set.
//!
//! Both are parsed once at startup from flat strings (flags or environment
//! variables) and are immutable for the process lifetime.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Default port the `/metrics` endpoint listens on.
pub const DEFAULT_EXPORTER_PORT: u16 = 9900;

/// Default pause between collection cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default per-request timeout for status fetches.
///
/// Kept short so a hanging instance cannot stall the whole cycle.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The target list parsed to an empty registry.
    #[error("no targets configured; set MONGO_SHAKE_TARGETS to a `name=host:port` list")]
    NoTargets,
}

/// Monitoring category gating which status endpoints are polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    /// Replication delay metrics from `/repl`.
    Latency,
    /// Oplog counters and TPS from `/repl` and `/worker`.
    Throughput,
    /// Pause flag from `/sentinel`.
    Status,
    /// Queue and persist-buffer occupancy from `/queue` and `/persist`.
    Queue,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 4] = [
        Category::Latency,
        Category::Throughput,
        Category::Status,
        Category::Queue,
    ];

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "latency" => Some(Self::Latency),
            "throughput" => Some(Self::Throughput),
            "status" => Some(Self::Status),
            "queue" => Some(Self::Queue),
            _ => None,
        }
    }

    /// Get the category name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latency => "latency",
            Self::Throughput => "throughput",
            Self::Status => "status",
            Self::Queue => "queue",
        }
    }
}

/// Process-wide set of enabled monitoring categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet(Vec<Category>);

impl CategorySet {
    /// Set with every category enabled.
    pub fn all() -> Self {
        Self(Category::ALL.to_vec())
    }

    /// Parse a comma-separated, case-insensitive category list.
    ///
    /// An empty string or any list containing the literal token `all` enables
    /// every category. Unrecognized tokens are ignored with a warning.
    pub fn parse(input: &str) -> Self {
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            return Self::all();
        }

        let mut enabled = Vec::new();
        for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == "all" {
                return Self::all();
            }
            match Category::from_token(token) {
                Some(category) if !enabled.contains(&category) => enabled.push(category),
                Some(_) => {}
                None => tracing::warn!(token, "unknown monitoring category, ignoring"),
            }
        }
        Self(enabled)
    }

    /// Whether a category is enabled.
    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    /// Enabled categories, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.iter().copied().filter(|c| self.contains(*c))
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|c| c.as_str()).collect();
        write!(f, "{}", names.join(","))
    }
}

/// Parse a `name1=host1:port1,name2=host2:port2` target list into a
/// name → `host:port` map.
///
/// Items without an `=` separator are silently dropped; this tolerant
/// behavior lets a trailing comma or an emptied-out entry pass through
/// without killing startup. Whether the `host:port` half is well formed is
/// checked per cycle, not here.
pub fn parse_targets(input: &str) -> BTreeMap<String, String> {
    let mut targets = BTreeMap::new();
    for item in input.split(',') {
        if let Some((name, host_port)) = item.split_once('=') {
            targets.insert(name.trim().to_string(), host_port.trim().to_string());
        }
    }
    targets
}

/// Split a `host:port` string, or `None` if it is malformed.
pub fn split_host_port(host_port: &str) -> Option<(&str, u16)> {
    let (host, port) = host_port.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port: u16 = port.parse().ok()?;
    Some((host, port))
}
