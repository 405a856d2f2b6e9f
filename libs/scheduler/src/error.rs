//! Fatal run errors.

use std::time::Duration;

use thiserror::Error;

/// A collaborator call failed mid-run.
///
/// Carries the run's accumulated metadata so callers and log sinks can see
/// how far the run got before failing. The lease is released before this is
/// returned; process-level retry and alerting belong to the caller.
#[derive(Debug, Error)]
#[error("scheduler run failed after {loops} loops ({elapsed:?})")]
pub struct RunError {
    /// Iterations completed or started before the failure.
    pub loops: u64,

    /// Wall-clock time since the run acquired the lease.
    pub elapsed: Duration,

    /// The underlying collaborator failure.
    #[source]
    pub source: anyhow::Error,
}
