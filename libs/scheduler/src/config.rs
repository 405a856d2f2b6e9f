//! Configuration for the scheduling loop.

use std::time::Duration;

use thiserror::Error;

/// Invalid scheduler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Capacity must admit at least one job.
    #[error("capacity must be at least 1")]
    ZeroCapacity,

    /// Batch size must request at least one candidate.
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    /// A lease that outlives less than one iteration would be lost mid-run.
    #[error("lease_ttl ({lease_ttl:?}) must exceed iteration_sleep ({iteration_sleep:?})")]
    LeaseTtlTooShort {
        lease_ttl: Duration,
        iteration_sleep: Duration,
    },
}

/// Tunables for one scheduler run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of jobs simultaneously in flight.
    pub capacity: usize,

    /// Wall-clock budget for a run; the loop stops itself once exceeded.
    pub run_budget: Duration,

    /// Number of candidates requested per backlog reload.
    pub batch_size: usize,

    /// TTL for the scheduler lease. Must exceed one iteration's sleep plus
    /// expected dispatch latency or the loop will lose the lease mid-run.
    pub lease_ttl: Duration,

    /// Fixed sleep between iterations.
    pub iteration_sleep: Duration,

    /// How often the node eligibility oracle is re-queried.
    pub eligibility_check_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            run_budget: Duration::from_secs(10 * 60),
            batch_size: 1000,
            lease_ttl: Duration::from_secs(60),
            iteration_sleep: Duration::from_secs(1),
            eligibility_check_interval: Duration::from_secs(60),
        }
    }
}

impl SchedulerConfig {
    /// Reject configurations the loop cannot run correctly with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.lease_ttl <= self.iteration_sleep {
            return Err(ConfigError::LeaseTtlTooShort {
                lease_ttl: self.lease_ttl,
                iteration_sleep: self.iteration_sleep,
            });
        }
        Ok(())
    }
}
