//! Configuration for the sync worker.

use std::time::Duration;

use anyhow::Result;
use syncplane_scheduler::SchedulerConfig;

/// Lease key all sync schedulers of a site compete for.
pub const SCHEDULER_LEASE_KEY: &str = "syncplane:sync_scheduler";

/// Sync worker configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this worker; doubles as the lease holder token.
    pub worker_id: String,

    /// Control plane API URL.
    pub control_plane_url: String,

    /// Node identifier used for eligibility checks.
    pub node_id: String,

    /// Seconds between scheduler run attempts.
    pub schedule_interval_secs: u64,

    /// Maximum simultaneously in-flight sync jobs.
    pub capacity: usize,

    /// Wall-clock budget for one scheduler run, in seconds.
    pub run_budget_secs: u64,

    /// Candidates requested per backlog reload.
    pub batch_size: usize,

    /// Scheduler lease TTL in seconds.
    pub lease_ttl_secs: u64,

    /// Sleep between loop iterations, in milliseconds.
    pub iteration_sleep_millis: u64,

    /// Seconds between node eligibility re-checks.
    pub eligibility_check_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let worker_id = std::env::var("SYNCPLANE_WORKER_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let control_plane_url = std::env::var("SYNCPLANE_CONTROL_PLANE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let node_id =
            std::env::var("SYNCPLANE_NODE_ID").unwrap_or_else(|_| "default".to_string());

        let schedule_interval_secs = env_parsed("SYNCPLANE_SCHEDULE_INTERVAL", 60);
        let capacity = env_parsed("SYNCPLANE_CAPACITY", 10);
        let run_budget_secs = env_parsed("SYNCPLANE_RUN_BUDGET", 600);
        let batch_size = env_parsed("SYNCPLANE_BATCH_SIZE", 1000);
        let lease_ttl_secs = env_parsed("SYNCPLANE_LEASE_TTL", 60);
        let iteration_sleep_millis = env_parsed("SYNCPLANE_ITERATION_SLEEP_MS", 1000);
        let eligibility_check_interval_secs =
            env_parsed("SYNCPLANE_ELIGIBILITY_CHECK_INTERVAL", 60);

        let log_level = std::env::var("SYNCPLANE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            worker_id,
            control_plane_url,
            node_id,
            schedule_interval_secs,
            capacity,
            run_budget_secs,
            batch_size,
            lease_ttl_secs,
            iteration_sleep_millis,
            eligibility_check_interval_secs,
            log_level,
        })
    }

    /// The scheduler tunables this worker runs with.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            capacity: self.capacity,
            run_budget: Duration::from_secs(self.run_budget_secs),
            batch_size: self.batch_size,
            lease_ttl: Duration::from_secs(self.lease_ttl_secs),
            iteration_sleep: Duration::from_millis(self.iteration_sleep_millis),
            eligibility_check_interval: Duration::from_secs(self.eligibility_check_interval_secs),
        }
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs)
    }

    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }
}

fn env_parsed<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test because environment variables are process-global.
    #[test]
    fn from_env_applies_defaults_and_overrides() {
        std::env::remove_var("SYNCPLANE_CAPACITY");
        std::env::remove_var("SYNCPLANE_CONTROL_PLANE_URL");

        let config = Config::from_env().unwrap();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.control_plane_url, "http://127.0.0.1:8080");
        assert_eq!(config.scheduler_config().batch_size, 1000);

        std::env::set_var("SYNCPLANE_CAPACITY", "25");
        std::env::set_var("SYNCPLANE_RUN_BUDGET", "120");

        let config = Config::from_env().unwrap();
        assert_eq!(config.capacity, 25);
        assert_eq!(
            config.scheduler_config().run_budget,
            Duration::from_secs(120)
        );

        std::env::remove_var("SYNCPLANE_CAPACITY");
        std::env::remove_var("SYNCPLANE_RUN_BUDGET");
    }
}
