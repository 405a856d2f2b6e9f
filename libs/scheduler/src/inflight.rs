//! Tracking of dispatched jobs that have not yet been confirmed finished.

use std::collections::HashSet;
use std::hash::Hash;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;

/// Liveness oracle for dispatched jobs, backed by the external executor.
#[async_trait]
pub trait JobStatusOracle<H>: Send + Sync {
    /// Report which of `handles` are still running, index-aligned with the
    /// input.
    async fn is_running(&self, handles: &[H]) -> Result<Vec<bool>>;
}

/// One dispatched, not-yet-finished job.
#[derive(Debug, Clone)]
pub struct InFlightJob<R, H> {
    pub resource: R,
    pub handle: H,
    pub dispatched_at: Instant,
}

/// The set of jobs dispatched but not yet confirmed finished.
///
/// Owned exclusively by the active run; freed capacity is only known after
/// [`poll`](InFlightTracker::poll), so the loop must poll before computing
/// the next dispatch batch.
#[derive(Debug)]
pub struct InFlightTracker<R, H> {
    jobs: Vec<InFlightJob<R, H>>,
}

impl<R, H> InFlightTracker<R, H>
where
    R: Clone + Eq + Hash,
    H: Clone,
{
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Record a newly dispatched job.
    pub fn add(&mut self, resource: R, handle: H) {
        self.jobs.push(InFlightJob {
            resource,
            handle,
            dispatched_at: Instant::now(),
        });
    }

    pub fn count(&self) -> usize {
        self.jobs.len()
    }

    /// Resources currently in flight, for exclusion from backlog reloads.
    pub fn resources(&self) -> HashSet<R> {
        self.jobs.iter().map(|job| job.resource.clone()).collect()
    }

    /// Reconcile against the executor: drop jobs no longer running and
    /// return how many finished since the previous poll.
    pub async fn poll(&mut self, oracle: &dyn JobStatusOracle<H>) -> Result<usize> {
        if self.jobs.is_empty() {
            return Ok(0);
        }

        let handles: Vec<H> = self.jobs.iter().map(|job| job.handle.clone()).collect();
        let running = oracle.is_running(&handles).await?;
        if running.len() != handles.len() {
            anyhow::bail!(
                "job status oracle returned {} flags for {} handles",
                running.len(),
                handles.len()
            );
        }

        let before = self.jobs.len();
        let mut flags = running.into_iter();
        self.jobs.retain(|_| flags.next().unwrap_or(false));
        Ok(before - self.jobs.len())
    }
}

impl<R, H> Default for InFlightTracker<R, H>
where
    R: Clone + Eq + Hash,
    H: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
