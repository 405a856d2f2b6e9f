//! Cached node eligibility checks.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

/// Reports whether this node may schedule work at all (for example, the
/// site is enabled and healthy). Expected to be cheap; results are cached.
#[async_trait]
pub trait EligibilityOracle: Send + Sync {
    async fn node_enabled(&self) -> Result<bool>;
}

/// Caches the oracle's answer so the loop re-checks at most once per
/// interval instead of hammering the oracle every iteration.
#[derive(Debug)]
pub struct EligibilityCache {
    interval: Duration,
    checked: Option<(Instant, bool)>,
}

impl EligibilityCache {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            checked: None,
        }
    }

    /// Return the cached answer, or query the oracle when the cache is cold
    /// or older than the interval.
    pub async fn check(&mut self, oracle: &dyn EligibilityOracle) -> Result<bool> {
        if let Some((at, enabled)) = self.checked {
            if at.elapsed() < self.interval {
                return Ok(enabled);
            }
        }

        let enabled = oracle.node_enabled().await?;
        self.checked = Some((Instant::now(), enabled));
        Ok(enabled)
    }
}
