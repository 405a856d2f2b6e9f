//! ControlPlaneClient tests against a mock control plane.

use std::collections::HashSet;
use std::time::Duration;

use syncplane_lease::LeaseStore;
use syncplane_scheduler::{Dispatcher, EligibilityOracle, JobStatusOracle, PendingSource};
use syncplane_sync_worker::client::ControlPlaneClient;
use syncplane_sync_worker::config::Config;
use syncplane_sync_worker::types::{JobId, SyncKind, SyncResource};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(base_url: &str) -> Config {
    Config {
        worker_id: "worker-1".to_string(),
        control_plane_url: base_url.to_string(),
        node_id: "node-1".to_string(),
        schedule_interval_secs: 60,
        capacity: 10,
        run_budget_secs: 600,
        batch_size: 100,
        lease_ttl_secs: 60,
        iteration_sleep_millis: 1000,
        eligibility_check_interval_secs: 60,
        log_level: "info".to_string(),
    }
}

fn repo(id: u64) -> SyncResource {
    SyncResource {
        repository_id: id,
        kind: SyncKind::Repository,
    }
}

#[tokio::test]
async fn load_candidates_returns_one_list_per_queue() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sync/pending/query"))
        .and(body_partial_json(serde_json::json!({"limit": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "queues": [
                [{"repository_id": 1, "kind": "repository"}],
                [{"repository_id": 2, "kind": "wiki"}],
            ]
        })))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(&test_config(&server.uri()));
    let queues = client
        .load_candidates(&HashSet::new(), 100)
        .await
        .unwrap();

    assert_eq!(queues.len(), 2);
    assert_eq!(queues[0], vec![repo(1)]);
    assert_eq!(
        queues[1],
        vec![SyncResource {
            repository_id: 2,
            kind: SyncKind::Wiki,
        }]
    );
}

#[tokio::test]
async fn dispatch_returns_handle_on_success_and_none_on_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sync/jobs"))
        .and(body_partial_json(
            serde_json::json!({"resource": {"repository_id": 1}}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"job_id": "job-1"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sync/jobs"))
        .and(body_partial_json(
            serde_json::json!({"resource": {"repository_id": 2}}),
        ))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(&test_config(&server.uri()));

    let handle = client.dispatch(&repo(1)).await.unwrap();
    assert_eq!(handle, Some(JobId("job-1".to_string())));

    let rejected = client.dispatch(&repo(2)).await.unwrap();
    assert_eq!(rejected, None);
}

#[tokio::test]
async fn job_status_is_index_aligned() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sync/jobs/status"))
        .and(body_partial_json(
            serde_json::json!({"job_ids": ["job-1", "job-2"]}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"running": [true, false]})),
        )
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(&test_config(&server.uri()));
    let handles = vec![JobId("job-1".to_string()), JobId("job-2".to_string())];

    assert_eq!(
        client.is_running(&handles).await.unwrap(),
        vec![true, false]
    );
}

#[tokio::test]
async fn node_eligibility_reads_the_enabled_flag() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/nodes/node-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"enabled": false})),
        )
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(&test_config(&server.uri()));
    assert!(!client.node_enabled().await.unwrap());
}

#[tokio::test]
async fn lease_operations_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/leases/syncplane:sync_scheduler/acquire"))
        .and(body_partial_json(
            serde_json::json!({"holder": "worker-1", "ttl_secs": 60}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"acquired": false})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/leases/syncplane:sync_scheduler/renew"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"renewed": true})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/leases/syncplane:sync_scheduler/release"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(&test_config(&server.uri()));
    let ttl = Duration::from_secs(60);

    assert!(!client
        .try_acquire("syncplane:sync_scheduler", "worker-1", ttl)
        .await
        .unwrap());
    assert!(client
        .renew("syncplane:sync_scheduler", "worker-1", ttl)
        .await
        .unwrap());
    client
        .release("syncplane:sync_scheduler", "worker-1")
        .await
        .unwrap();
}

#[tokio::test]
async fn server_errors_propagate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sync/pending/query"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = ControlPlaneClient::new(&test_config(&server.uri()));
    let err = client
        .load_candidates(&HashSet::new(), 100)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("load pending candidates"));
}
