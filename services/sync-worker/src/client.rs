//! Control plane API client for the sync worker.
//!
//! One HTTP client implements every collaborator contract the scheduler
//! consumes: pending candidates, job dispatch, job status, node eligibility,
//! and lease operations. The control plane is the single shared backend, so
//! the worker itself stays stateless.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syncplane_lease::{LeaseError, LeaseStore};
use syncplane_scheduler::{Dispatcher, EligibilityOracle, JobStatusOracle, PendingSource};
use tracing::debug;

use crate::config::Config;
use crate::types::{JobId, SyncResource};

/// Control plane API client.
pub struct ControlPlaneClient {
    client: reqwest::Client,
    base_url: String,
    node_id: String,
}

#[derive(Debug, Serialize)]
struct PendingQuery<'a> {
    exclude: Vec<&'a SyncResource>,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    /// One ordered list per candidate queue (never-synced first, retries
    /// second), to be fair-merged by the scheduler's backlog.
    queues: Vec<Vec<SyncResource>>,
}

#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    resource: &'a SyncResource,
}

#[derive(Debug, Deserialize)]
struct DispatchResponse {
    job_id: JobId,
}

#[derive(Debug, Serialize)]
struct StatusQuery<'a> {
    job_ids: &'a [JobId],
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    running: Vec<bool>,
}

#[derive(Debug, Deserialize)]
struct NodeResponse {
    enabled: bool,
}

#[derive(Debug, Serialize)]
struct LeaseRequest<'a> {
    holder: &'a str,
    ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
struct LeaseAcquireResponse {
    acquired: bool,
}

#[derive(Debug, Deserialize)]
struct LeaseRenewResponse {
    renewed: bool,
}

#[derive(Debug, Serialize)]
struct LeaseReleaseRequest<'a> {
    holder: &'a str,
}

impl ControlPlaneClient {
    /// Create a new control plane client.
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.control_plane_url.clone(),
            node_id: config.node_id.clone(),
        }
    }

    async fn check_ok(response: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to {action}: {status} - {body}");
        }
        Ok(response)
    }
}

#[async_trait]
impl PendingSource<SyncResource> for ControlPlaneClient {
    async fn load_candidates(
        &self,
        exclude: &HashSet<SyncResource>,
        limit: usize,
    ) -> Result<Vec<Vec<SyncResource>>> {
        let url = format!("{}/v1/sync/pending/query", self.base_url);
        let query = PendingQuery {
            exclude: exclude.iter().collect(),
            limit,
        };

        let response = self.client.post(&url).json(&query).send().await?;
        let response = Self::check_ok(response, "load pending candidates").await?;

        let pending: PendingResponse = response.json().await?;
        debug!(
            queues = pending.queues.len(),
            candidates = pending.queues.iter().map(Vec::len).sum::<usize>(),
            "Loaded pending sync candidates"
        );
        Ok(pending.queues)
    }
}

#[async_trait]
impl Dispatcher<SyncResource, JobId> for ControlPlaneClient {
    async fn dispatch(&self, resource: &SyncResource) -> Result<Option<JobId>> {
        let url = format!("{}/v1/sync/jobs", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&DispatchRequest { resource })
            .send()
            .await?;

        // The executor signals rejection (duplicate or saturated) with 409;
        // that is not an error.
        if response.status() == reqwest::StatusCode::CONFLICT {
            debug!(repository_id = resource.repository_id, "Sync job rejected");
            return Ok(None);
        }

        let response = Self::check_ok(response, "dispatch sync job").await?;
        let dispatched: DispatchResponse = response.json().await?;
        debug!(
            repository_id = resource.repository_id,
            job_id = %dispatched.job_id,
            "Dispatched sync job"
        );
        Ok(Some(dispatched.job_id))
    }
}

#[async_trait]
impl JobStatusOracle<JobId> for ControlPlaneClient {
    async fn is_running(&self, handles: &[JobId]) -> Result<Vec<bool>> {
        let url = format!("{}/v1/sync/jobs/status", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&StatusQuery { job_ids: handles })
            .send()
            .await?;
        let response = Self::check_ok(response, "query job status").await?;

        let status: StatusResponse = response.json().await?;
        Ok(status.running)
    }
}

#[async_trait]
impl EligibilityOracle for ControlPlaneClient {
    async fn node_enabled(&self) -> Result<bool> {
        let url = format!("{}/v1/nodes/{}", self.base_url, self.node_id);
        let response = self.client.get(&url).send().await?;
        let response = Self::check_ok(response, "fetch node eligibility").await?;

        let node: NodeResponse = response.json().await?;
        Ok(node.enabled)
    }
}

#[async_trait]
impl LeaseStore for ControlPlaneClient {
    async fn try_acquire(
        &self,
        key: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError> {
        let url = format!("{}/v1/leases/{}/acquire", self.base_url, key);
        let request = LeaseRequest {
            holder,
            ttl_secs: ttl.as_secs(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(LeaseError::backend)?;
        let response = Self::check_ok(response, "acquire lease")
            .await
            .map_err(LeaseError::backend)?;

        let acquired: LeaseAcquireResponse =
            response.json().await.map_err(LeaseError::backend)?;
        Ok(acquired.acquired)
    }

    async fn renew(&self, key: &str, holder: &str, ttl: Duration) -> Result<bool, LeaseError> {
        let url = format!("{}/v1/leases/{}/renew", self.base_url, key);
        let request = LeaseRequest {
            holder,
            ttl_secs: ttl.as_secs(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(LeaseError::backend)?;
        let response = Self::check_ok(response, "renew lease")
            .await
            .map_err(LeaseError::backend)?;

        let renewed: LeaseRenewResponse = response.json().await.map_err(LeaseError::backend)?;
        Ok(renewed.renewed)
    }

    async fn release(&self, key: &str, holder: &str) -> Result<(), LeaseError> {
        let url = format!("{}/v1/leases/{}/release", self.base_url, key);

        let response = self
            .client
            .post(&url)
            .json(&LeaseReleaseRequest { holder })
            .send()
            .await
            .map_err(LeaseError::backend)?;
        Self::check_ok(response, "release lease")
            .await
            .map_err(LeaseError::backend)?;
        Ok(())
    }
}

impl std::fmt::Debug for ControlPlaneClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlaneClient")
            .field("base_url", &self.base_url)
            .field("node_id", &self.node_id)
            .finish()
    }
}
