//! Boundary to the external job executor.

use anyhow::Result;
use async_trait::async_trait;

/// Turns one pending resource into a running job.
///
/// `Ok(None)` means the executor rejected the resource (for example it is
/// already being handled or the executor is saturated). Rejection is not an
/// error: the scheduler drops the resource silently, does not count it
/// against capacity, and leaves any retry policy to the executor. A rejected
/// resource stays eligible for later reloads since only in-flight resources
/// are excluded.
#[async_trait]
pub trait Dispatcher<R, H>: Send + Sync {
    async fn dispatch(&self, resource: &R) -> Result<Option<H>>;
}
