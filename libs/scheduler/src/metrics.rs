//! Caller-owned scheduler metrics.
//!
//! An explicit registry passed into the scheduler at construction; nothing
//! here is a process-wide singleton. Counters are monotonic across runs.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::scheduler::{RunReport, TerminationReason};

/// Monotonic counters for scheduler activity.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    loops: AtomicU64,
    jobs_dispatched: AtomicU64,
    dispatch_rejections: AtomicU64,
    failed_runs: AtomicU64,
    runs_complete: AtomicU64,
    runs_last_batch: AtomicU64,
    runs_over_time: AtomicU64,
    runs_lease_lost: AtomicU64,
    runs_node_disabled: AtomicU64,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_dispatch(&self) {
        self.jobs_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejection(&self) {
        self.dispatch_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_run(&self, report: &RunReport) {
        self.loops.fetch_add(report.loops, Ordering::Relaxed);
        self.reason_counter(report.reason)
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_run(&self, loops: u64) {
        self.loops.fetch_add(loops, Ordering::Relaxed);
        self.failed_runs.fetch_add(1, Ordering::Relaxed);
    }

    fn reason_counter(&self, reason: TerminationReason) -> &AtomicU64 {
        match reason {
            TerminationReason::Complete => &self.runs_complete,
            TerminationReason::LastBatch => &self.runs_last_batch,
            TerminationReason::OverTime => &self.runs_over_time,
            TerminationReason::LeaseLost => &self.runs_lease_lost,
            TerminationReason::NodeDisabled => &self.runs_node_disabled,
        }
    }

    pub fn loops(&self) -> u64 {
        self.loops.load(Ordering::Relaxed)
    }

    pub fn jobs_dispatched(&self) -> u64 {
        self.jobs_dispatched.load(Ordering::Relaxed)
    }

    pub fn dispatch_rejections(&self) -> u64 {
        self.dispatch_rejections.load(Ordering::Relaxed)
    }

    pub fn failed_runs(&self) -> u64 {
        self.failed_runs.load(Ordering::Relaxed)
    }

    /// Completed runs recorded with the given termination reason.
    pub fn runs_with_reason(&self, reason: TerminationReason) -> u64 {
        self.reason_counter(reason).load(Ordering::Relaxed)
    }
}
