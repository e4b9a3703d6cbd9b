//! bridge-probe - Main entry point
//!
//! Loads a run configuration, builds the simulated bridge it describes and
//! runs one bridging verification: concurrent submissions, optional validator
//! perturbation, then exact-balance convergence checks on every destination.
//! Exits non-zero when any submission, pair or perturbation failed.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use bridge_probe_config::{validate_config, ConfigLoader, ENV_PREFIX};
use bridge_probe_metrics::{default_filter, init_tracing, MetricsCollector, MetricsServer};
use bridge_probe_orchestrator::{BridgingOrchestrator, SimulatedBridge, SimulatedBridgeConfig};
use clap::Parser;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Bridging verification harness CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run configuration (toml, yaml or json); BRIDGE_PROBE_* variables override it
    #[arg(long)]
    config: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Write the JSON run report here instead of stdout
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::from_file_with_env(&args.config, ENV_PREFIX)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    validate_config(&config)?;

    init_tracing(
        &default_filter(&config.network.log_level),
        args.json_logs || config.network.json_logs,
    )?;

    let spec = config.to_run_spec()?;

    info!("Starting bridge-probe");
    info!("  Config: {}", args.config.display());
    info!("  Chains: {}", spec.chain_ids().join(", "));
    info!("  Routes: {}", spec.routes().len());

    let bridge = Arc::new(SimulatedBridge::new(
        config.ledgers(),
        SimulatedBridgeConfig {
            settlement_delay: config.settlement_delay(),
            validators: config.simulation.validators,
            quorum: config.simulation.quorum,
        },
    ));

    let metrics = Arc::new(MetricsCollector::new());
    let cancel = CancellationToken::new();
    let server_shutdown = CancellationToken::new();

    let server = if config.network.metrics_enabled {
        let addr = format!("0.0.0.0:{}", config.network.metrics_port);
        let server = MetricsServer::new(metrics.clone(), addr);
        let shutdown = server_shutdown.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server.serve_until(shutdown).await {
                error!("Metrics server failed: {}", e);
            }
        }))
    } else {
        None
    };

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            interrupt.cancel();
        }
    });

    let orchestrator = BridgingOrchestrator::builder()
        .with_bridge(bridge)
        .with_metrics(metrics.clone())
        .with_cancel_token(cancel)
        .build()?;

    let report = orchestrator.execute(spec).await?;

    let rendered = serde_json::to_string_pretty(&report)?;
    match &args.report {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    if args.print_metrics {
        println!("{}", metrics.export_metrics()?);
    }

    server_shutdown.cancel();
    if let Some(server) = server {
        await_server_shutdown(server, Duration::from_secs(5)).await;
    }

    if report.is_success() {
        info!(
            "Run {} succeeded: {} submissions, {} pairs converged",
            report.run_id,
            report.total_submitted(),
            report.pairs.len()
        );
    } else {
        for failure in &report.failures {
            error!("{}", failure);
        }
    }

    report.into_result()?;
    Ok(())
}

/// Wait for the metrics server task to stop, logging a hung or failed task
///
/// Returns whether the server stopped cleanly within `grace`.
async fn await_server_shutdown(server: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("Metrics server task failed: {}", e);
            false
        }
        Err(_) => {
            warn!("Metrics server did not stop within {:?}", grace);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_server_shutdown_clean() {
        let server = tokio::spawn(async {});
        assert!(await_server_shutdown(server, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_server_shutdown_timeout_reported() {
        let server = tokio::spawn(tokio::time::sleep(Duration::from_secs(60)));
        assert!(!await_server_shutdown(server, Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn test_server_shutdown_panic_reported() {
        let server = tokio::spawn(async { panic!("listener crashed") });
        assert!(!await_server_shutdown(server, Duration::from_secs(1)).await);
    }
}
