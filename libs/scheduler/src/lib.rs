//! Lease-guarded, time-boxed, capacity-bounded sync scheduling.
//!
//! This library coordinates dispatch of a large, dynamically-reloaded backlog
//! of independent sync jobs across a fleet of otherwise-identical worker
//! processes. One scheduler run:
//!
//! - acquires a cluster-wide lease so only one process drives dispatch;
//! - refills an in-memory backlog in batches from a pending-resource source,
//!   fair-merging multiple candidate queues so none can starve the others;
//! - admits work up to a fixed in-flight capacity and hands it to an external
//!   job executor;
//! - polls dispatched jobs for liveness to reclaim capacity;
//! - stops itself with exactly one [`TerminationReason`] (backlog drained,
//!   wall-clock budget exhausted, lease lost, node disabled, or last batch
//!   consumed).
//!
//! The loop body is single-threaded and purely sequential; concurrency lives
//! cluster-wide (the lease picks one winner) and in the external executor
//! (dispatched jobs run asynchronously, the loop only polls them).
//!
//! Re-invocation is the caller's responsibility, typically on a fixed cadence.

mod backlog;
mod config;
mod dispatch;
mod eligibility;
mod error;
mod inflight;
mod interleave;
mod metrics;
mod scheduler;

pub use backlog::{PendingBacklog, PendingSource};
pub use config::{ConfigError, SchedulerConfig};
pub use dispatch::Dispatcher;
pub use eligibility::{EligibilityCache, EligibilityOracle};
pub use error::RunError;
pub use inflight::{InFlightJob, InFlightTracker, JobStatusOracle};
pub use interleave::interleave;
pub use metrics::SchedulerMetrics;
pub use scheduler::{RunReport, Scheduler, TerminationReason};
