//! Fixed-cadence re-invocation of the scheduler.
//!
//! The scheduler never re-schedules itself; this loop attempts a run on a
//! fixed interval until shutdown. Losing the lease race is routine (another
//! worker is already scheduling) and logged at debug only.

use tokio::sync::watch;
use tracing::{debug, error, info};

use syncplane_scheduler::Scheduler;

use crate::types::{JobId, SyncResource};

/// Run scheduler attempts on `interval` until the shutdown signal flips.
pub async fn run_schedule_cadence(
    scheduler: Scheduler<SyncResource, JobId>,
    interval: std::time::Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(
        interval_secs = interval.as_secs(),
        "Starting schedule cadence"
    );

    let mut timer = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                match scheduler.run().await {
                    Ok(Some(report)) => {
                        info!(
                            reason = %report.reason,
                            loops = report.loops,
                            dispatched = report.dispatched,
                            duration_ms = report.duration.as_millis() as u64,
                            "Scheduler run finished"
                        );
                    }
                    Ok(None) => {
                        debug!("Lease held elsewhere, nothing to do");
                    }
                    Err(err) => {
                        // The run already logged its metadata; the next tick
                        // is the retry.
                        error!(error = %err, "Scheduler run failed");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("Schedule cadence shutting down");
                    break;
                }
            }
        }
    }
}
