//! syncplane sync worker.
//!
//! Runs on every secondary-site node. Each worker periodically attempts a
//! scheduler run; the cluster-wide lease (owned by the control plane)
//! guarantees that only one worker per site actually drives dispatch, so the
//! fleet can be scaled without coordination.
//!
//! ## Architecture
//!
//! - **Control plane client**: one HTTP client implements every collaborator
//!   contract the scheduler consumes (pending candidates, job dispatch, job
//!   status, node eligibility, lease operations).
//! - **Cadence loop**: re-invokes the scheduler on a fixed interval until
//!   shutdown; a run that loses the lease race is a silent no-op.

pub mod cadence;
pub mod client;
pub mod config;
pub mod types;
