//! Prometheus exporter for MongoShake replication agents.
//!
//! Periodically polls the status endpoints of a configured set of MongoShake
//! instances and republishes replication lag, throughput, queue saturation
//! and pause state as labeled Prometheus gauges.
//!
//! # Architecture
//!
//! - [`config`]: target registry and monitoring category parsing
//! - [`collector`]: fetch, extraction and the fixed-interval cycle loop
//! - [`metrics`]: the nine exported gauge series
//! - [`server`]: axum router serving `/metrics` and `/healthz`
//!
//! The binary wires these together; the library surface exists so the
//! collection core can be driven from integration tests.

pub mod collector;
pub mod config;
pub mod metrics;
pub mod server;

pub use collector::{ApiClient, CycleStats, collect_instance, run_cycle, run_loop};
pub use config::{Category, CategorySet, ConfigError, parse_targets};
pub use metrics::ShakeMetrics;
