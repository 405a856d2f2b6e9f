//! syncplane sync worker entry point.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use syncplane_lease::LeaseCoordinator;
use syncplane_scheduler::{Scheduler, SchedulerMetrics};
use syncplane_sync_worker::client::ControlPlaneClient;
use syncplane_sync_worker::cadence;
use syncplane_sync_worker::config::{Config, SCHEDULER_LEASE_KEY};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing; RUST_LOG overrides the configured level.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting syncplane sync worker");
    info!(
        worker_id = %config.worker_id,
        control_plane_url = %config.control_plane_url,
        node_id = %config.node_id,
        capacity = config.capacity,
        "Configuration loaded"
    );

    let client = Arc::new(ControlPlaneClient::new(&config));
    let lease = LeaseCoordinator::with_holder(
        client.clone(),
        SCHEDULER_LEASE_KEY,
        config.worker_id.clone(),
        config.lease_ttl(),
    );
    let metrics = Arc::new(SchedulerMetrics::new());

    let scheduler = Scheduler::new(
        config.scheduler_config(),
        lease,
        client.clone(),
        client.clone(),
        client.clone(),
        client.clone(),
        metrics,
    )?;

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let cadence_handle = tokio::spawn(cadence::run_schedule_cadence(
        scheduler,
        config.schedule_interval(),
        shutdown_rx,
    ));

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        _ = cadence_handle => {
            info!("Schedule cadence exited");
        }
    }

    let _ = shutdown_tx.send(true);

    info!("Sync worker shutdown complete");
    Ok(())
}
