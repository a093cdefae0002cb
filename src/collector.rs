//! Collection core.
//!
//! One collection cycle fans out over every configured MongoShake instance,
//! polls its status endpoints according to the enabled categories, and
//! republishes the extracted fields as labeled gauges. Failures are isolated
//! per target and per endpoint: a dead instance costs one timeout and a
//! warning, never the rest of the cycle.
//!
//! # Architecture
//!
//! - [`ApiClient`]: bounded-timeout JSON fetch against one status endpoint
//! - [`endpoints`]: typed endpoint payloads and the derived-value rules
//! - [`collect_instance`]: all enabled endpoints for one instance
//! - [`run_cycle`] / [`run_loop`]: one pass over all targets, repeated forever

mod client;
mod cycle;
pub mod endpoints;
mod instance;

pub use client::ApiClient;
pub use cycle::{CycleStats, run_cycle, run_loop};
pub use instance::collect_instance;
