//! The lease-guarded scheduling loop.
//!
//! One [`Scheduler::run`] call is one attempt at a scheduler run:
//!
//! 1. Try to acquire the cluster-wide lease; losing the race is a silent
//!    no-op (the run never starts).
//! 2. Iterate: eligibility check → poll in-flight jobs → low-water backlog
//!    reload → budget/completion checks → capacity-gated dispatch → lease
//!    renewal → sleep.
//! 3. Stop with exactly one termination reason, release the lease on every
//!    exit path, and report loop count and duration.
//!
//! Lease loss takes effect at the iteration boundary, never mid-batch, so a
//! successor can never observe double dispatch.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use syncplane_lease::LeaseCoordinator;
use tracing::{debug, error, info, warn};

use crate::backlog::{PendingBacklog, PendingSource};
use crate::config::{ConfigError, SchedulerConfig};
use crate::dispatch::Dispatcher;
use crate::eligibility::{EligibilityCache, EligibilityOracle};
use crate::error::RunError;
use crate::inflight::{InFlightTracker, JobStatusOracle};
use crate::metrics::SchedulerMetrics;

/// Why a run stopped. Exactly one is recorded per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
    /// The node became ineligible for scheduling.
    NodeDisabled,

    /// The wall-clock run budget was exhausted.
    OverTime,

    /// Backlog and in-flight set both drained; nothing left to do.
    Complete,

    /// The source returned its final batch and it has been dispatched.
    LastBatch,

    /// The lease expired or was claimed elsewhere; stopped to preserve the
    /// single-writer invariant.
    LeaseLost,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NodeDisabled => "node_disabled",
            Self::OverTime => "over_time",
            Self::Complete => "complete",
            Self::LastBatch => "last_batch",
            Self::LeaseLost => "lease_lost",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reason: TerminationReason,
    pub loops: u64,
    pub duration: Duration,
    pub dispatched: u64,
}

/// The scheduling loop, generic over the resource (`R`) and job handle
/// (`H`) types of the deployment.
///
/// Owns its backlog and in-flight tracker exclusively for the duration of a
/// run; all collaborators are called synchronously from the loop body.
pub struct Scheduler<R, H> {
    config: SchedulerConfig,
    lease: LeaseCoordinator,
    source: Arc<dyn PendingSource<R>>,
    dispatcher: Arc<dyn Dispatcher<R, H>>,
    status: Arc<dyn JobStatusOracle<H>>,
    eligibility: Arc<dyn EligibilityOracle>,
    metrics: Arc<SchedulerMetrics>,
}

impl<R, H> Scheduler<R, H>
where
    R: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    H: Clone + Debug + Send + Sync + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SchedulerConfig,
        lease: LeaseCoordinator,
        source: Arc<dyn PendingSource<R>>,
        dispatcher: Arc<dyn Dispatcher<R, H>>,
        status: Arc<dyn JobStatusOracle<H>>,
        eligibility: Arc<dyn EligibilityOracle>,
        metrics: Arc<SchedulerMetrics>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            lease,
            source,
            dispatcher,
            status,
            eligibility,
            metrics,
        })
    }

    /// Attempt one scheduler run.
    ///
    /// Returns `Ok(None)` when another process holds the lease: the run
    /// never started, no collaborator is called, and nothing is recorded.
    /// Otherwise the run iterates to one of the five termination reasons and
    /// returns its [`RunReport`]. A collaborator failure is logged with the
    /// run's accumulated metadata and propagated as [`RunError`]; the lease
    /// is released on every exit path.
    pub async fn run(&self) -> Result<Option<RunReport>, RunError> {
        let started = Instant::now();

        match self.lease.try_acquire().await {
            Ok(true) => {}
            Ok(false) => {
                debug!(lease_key = self.lease.key(), "lease held elsewhere, skipping run");
                return Ok(None);
            }
            Err(err) => {
                return Err(self.fail(0, started, anyhow::Error::new(err)));
            }
        }

        info!(
            lease_key = self.lease.key(),
            capacity = self.config.capacity,
            batch_size = self.config.batch_size,
            run_budget_secs = self.config.run_budget.as_secs(),
            "scheduler run started"
        );

        let outcome = self.iterate(started).await;

        if let Err(err) = self.lease.release().await {
            warn!(
                lease_key = self.lease.key(),
                error = %err,
                "failed to release scheduler lease"
            );
        }

        match outcome {
            Ok(report) => {
                self.metrics.record_run(&report);
                info!(
                    reason = %report.reason,
                    loops = report.loops,
                    dispatched = report.dispatched,
                    duration_ms = report.duration.as_millis() as u64,
                    "scheduler run finished"
                );
                Ok(Some(report))
            }
            Err(err) => {
                self.metrics.record_failed_run(err.loops);
                error!(
                    error = %err.source,
                    loops = err.loops,
                    elapsed_ms = err.elapsed.as_millis() as u64,
                    "scheduler run failed"
                );
                Err(err)
            }
        }
    }

    async fn iterate(&self, started: Instant) -> Result<RunReport, RunError> {
        let mut backlog: PendingBacklog<R> = PendingBacklog::new(self.config.batch_size);
        let mut tracker: InFlightTracker<R, H> = InFlightTracker::new();
        let mut eligibility = EligibilityCache::new(self.config.eligibility_check_interval);
        let mut loops: u64 = 0;
        let mut dispatched: u64 = 0;

        let reason = loop {
            loops += 1;

            let enabled = eligibility
                .check(self.eligibility.as_ref())
                .await
                .map_err(|err| self.fail(loops, started, err))?;
            if !enabled {
                break TerminationReason::NodeDisabled;
            }

            let finished = tracker
                .poll(self.status.as_ref())
                .await
                .map_err(|err| self.fail(loops, started, err))?;
            if finished > 0 {
                debug!(finished, in_flight = tracker.count(), "reconciled finished jobs");
            }

            let mut last_batch = false;
            if backlog.below_low_water(self.config.capacity) {
                let in_flight = tracker.resources();
                let lists = self
                    .source
                    .load_candidates(&in_flight, self.config.batch_size)
                    .await
                    .map_err(|err| self.fail(loops, started, err))?;
                last_batch = backlog.refill(lists, &in_flight);
                debug!(pending = backlog.len(), last_batch, "reloaded pending backlog");
            }

            if started.elapsed() > self.config.run_budget {
                break TerminationReason::OverTime;
            }

            if backlog.is_empty() && tracker.count() == 0 {
                break TerminationReason::Complete;
            }

            let headroom = self.config.capacity.saturating_sub(tracker.count());
            let to_dispatch = headroom.min(backlog.len());
            for _ in 0..to_dispatch {
                let Some(resource) = backlog.pop() else {
                    break;
                };
                let handle = self
                    .dispatcher
                    .dispatch(&resource)
                    .await
                    .map_err(|err| self.fail(loops, started, err))?;
                match handle {
                    Some(handle) => {
                        debug!(resource = ?resource, handle = ?handle, "dispatched sync job");
                        tracker.add(resource, handle);
                        self.metrics.record_dispatch();
                        dispatched += 1;
                    }
                    None => {
                        debug!(resource = ?resource, "dispatch rejected, dropping");
                        self.metrics.record_rejection();
                    }
                }
            }
            debug_assert!(tracker.count() <= self.config.capacity);

            if last_batch {
                break TerminationReason::LastBatch;
            }

            let renewed = self
                .lease
                .renew()
                .await
                .map_err(|err| self.fail(loops, started, anyhow::Error::new(err)))?;
            if !renewed {
                break TerminationReason::LeaseLost;
            }

            tokio::time::sleep(self.config.iteration_sleep).await;
        };

        Ok(RunReport {
            reason,
            loops,
            duration: started.elapsed(),
            dispatched,
        })
    }

    fn fail(&self, loops: u64, started: Instant, source: anyhow::Error) -> RunError {
        RunError {
            loops,
            elapsed: started.elapsed(),
            source,
        }
    }
}

impl<R, H> Debug for Scheduler<R, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("lease", &self.lease)
            .finish()
    }
}
