//! hangfire-exporter — Prometheus exporter for Hangfire job storages.
//!
//! Connects to one Hangfire storage (MongoDB, SQL Server or PostgreSQL) and
//! serves its job statistics on a scrape endpoint.
//!
//! # Usage
//!
//! ```text
//! hangfire-exporter --db-type mongo \
//!     --mongo-connection mongodb://localhost:27017 --mongo-database hangfire
//! hangfire-exporter --config /etc/hangfire-exporter.toml
//! ```

mod backend;
mod cli;
mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hangfire_metrics::{DescriptorRegistry, HangfireCollector};

use crate::cli::Cli;
use crate::config::{ExporterConfig, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,hangfire=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().context("invalid configuration")?;

    init_tracing(config.log_format);

    if let Err(e) = run(config).await {
        error!(error = format!("{e:#}"), "exporter failed");
        return Err(e);
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "hangfire exporter starting");

    let timeout = config.query_timeout()?;
    let addr = config.listen_address()?;

    let statistics = backend::connect(&config, timeout)
        .await
        .with_context(|| format!("failed to connect to {} storage", config.db_type))?;
    info!(db_type = %config.db_type, ?timeout, "storage connected");

    let collector = Arc::new(HangfireCollector::new(
        statistics,
        DescriptorRegistry::new(&config.namespace),
    ));
    let router = hangfire_api::build_router(collector, &config.metrics_path);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, metrics_path = %config.metrics_path, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("hangfire exporter stopped");
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the server runs
/// until killed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}
