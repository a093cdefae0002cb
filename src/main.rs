//! Exporter binary entry point.
//!
//! Wires configuration, the metrics registry, the scrape server and the
//! collection loop together. Core functionality lives in the
//! `mongoshake_exporter` library crate.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mongoshake_exporter::{
    ApiClient, CategorySet, ConfigError, ShakeMetrics,
    collector::run_loop,
    config::{DEFAULT_EXPORTER_PORT, parse_targets},
    server,
};
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Prometheus exporter for MongoShake replication agents.
#[derive(Parser, Debug)]
#[command(name = "mongoshake-exporter", version, about, long_about = None)]
struct Cli {
    /// Comma-separated `name=host:port` list of MongoShake instances.
    #[arg(long, env = "MONGO_SHAKE_TARGETS", default_value = "default=127.0.0.1:9300")]
    targets: String,

    /// Port the /metrics endpoint listens on.
    #[arg(long, env = "EXPORTER_PORT", default_value_t = DEFAULT_EXPORTER_PORT)]
    port: u16,

    /// Comma-separated monitoring categories
    /// (all, latency, throughput, status, queue).
    #[arg(long, env = "MONITOR_CATEGORIES", default_value = "all")]
    categories: String,

    /// Seconds between collection cycles.
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 10)]
    poll_interval: u64,

    /// Per-request fetch timeout in seconds.
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 2)]
    fetch_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mongoshake_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let targets = parse_targets(&cli.targets);
    if targets.is_empty() {
        tracing::error!(error = %ConfigError::NoTargets, "startup aborted");
        std::process::exit(1);
    }
    let categories = CategorySet::parse(&cli.categories);

    tracing::info!("MongoShake exporter starting");
    tracing::info!(port = cli.port, "exporter port");
    tracing::info!(targets = ?targets, "targets");
    tracing::info!(categories = %categories, "enabled categories");

    let registry = Arc::new(Registry::new());
    let metrics = ShakeMetrics::new()?;
    metrics.register(&registry)?;

    let client = ApiClient::new(Duration::from_secs(cli.fetch_timeout))?;

    // One shutdown signal fans out to the scrape server and the cycle loop.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let addr: SocketAddr = format!("0.0.0.0:{}", cli.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("metrics server listening on http://{}", addr);

    let server_task = tokio::spawn(server::serve(listener, Arc::clone(&registry), {
        let mut rx = shutdown_rx.clone();
        async move {
            let _ = rx.changed().await;
        }
    }));

    tracing::info!("starting collection loop");
    let loop_shutdown = {
        let mut rx = shutdown_rx;
        async move {
            let _ = rx.changed().await;
        }
    };
    run_loop(
        &client,
        &metrics,
        &categories,
        &targets,
        Duration::from_secs(cli.poll_interval),
        loop_shutdown,
    )
    .await;

    server_task.await??;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("received terminate signal");
        }
    }
}
