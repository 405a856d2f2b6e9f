//! Resource and job-handle types for repository sync scheduling.

use serde::{Deserialize, Serialize};

/// Which replicated artifact of a repository a sync job covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Repository,
    Wiki,
}

/// One pending sync: a repository plus the artifact kind to mirror.
///
/// This is the scheduler's opaque, comparable resource identity; two
/// resources are the same sync exactly when both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncResource {
    pub repository_id: u64,
    pub kind: SyncKind,
}

/// Handle of a sync job accepted by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_resource_round_trips_through_json() {
        let resource = SyncResource {
            repository_id: 42,
            kind: SyncKind::Wiki,
        };

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"repository_id": 42, "kind": "wiki"})
        );
        let back: SyncResource = serde_json::from_value(json).unwrap();
        assert_eq!(back, resource);
    }
}
