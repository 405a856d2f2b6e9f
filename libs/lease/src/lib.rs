//! Renewable mutual-exclusion lease primitives.
//!
//! A lease is a time-bounded token that guarantees at most one holder per
//! key cluster-wide at any instant. Schedulers use it to ensure a single
//! active dispatch loop across a fleet of otherwise-identical processes:
//!
//! - **Acquire**: non-blocking claim; failure means another process holds it.
//! - **Renew**: extends the TTL; failure means the lease expired or was
//!   claimed by someone else, and the holder must stop.
//! - **Release**: compare-holder-and-delete, so a stale holder can never
//!   revoke a successor's lease.
//!
//! # Invariants
//!
//! - At most one live (unexpired) holder per key.
//! - Renew and release only succeed for the current holder.
//! - An expired lease is claimable by any process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the lease backend.
#[derive(Debug, Error)]
pub enum LeaseError {
    /// The backing store failed (network, storage, serialization).
    #[error("lease backend error: {0}")]
    Backend(String),
}

impl LeaseError {
    /// Wrap a backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Storage backend for leases.
///
/// Implementations must make `try_acquire` atomic per key: two concurrent
/// callers may both observe an expired entry, but only one may win.
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Attempt to claim `key` for `holder`. Non-blocking; returns `false`
    /// when a different holder has a live lease.
    async fn try_acquire(
        &self,
        key: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError>;

    /// Extend the TTL of a lease held by `holder`. Returns `false` when the
    /// lease expired or is held by someone else.
    async fn renew(&self, key: &str, holder: &str, ttl: Duration) -> Result<bool, LeaseError>;

    /// Drop the lease if `holder` still owns it; a no-op otherwise.
    async fn release(&self, key: &str, holder: &str) -> Result<(), LeaseError>;
}

/// Binds a [`LeaseStore`] to one `{key, holder, ttl}` so callers cannot
/// accidentally renew or release with mismatched parameters.
#[derive(Clone)]
pub struct LeaseCoordinator {
    store: Arc<dyn LeaseStore>,
    key: String,
    holder: String,
    ttl: Duration,
}

impl LeaseCoordinator {
    /// Create a coordinator with a fresh random holder token.
    pub fn new(store: Arc<dyn LeaseStore>, key: impl Into<String>, ttl: Duration) -> Self {
        Self::with_holder(store, key, uuid::Uuid::new_v4().to_string(), ttl)
    }

    /// Create a coordinator with an explicit holder token (e.g. a stable
    /// worker id, useful for operational debugging).
    pub fn with_holder(
        store: Arc<dyn LeaseStore>,
        key: impl Into<String>,
        holder: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            holder: holder.into(),
            ttl,
        }
    }

    /// The lease key this coordinator manages.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The holder token this coordinator claims with.
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Attempt to acquire the lease. `false` means another process holds it.
    pub async fn try_acquire(&self) -> Result<bool, LeaseError> {
        self.store
            .try_acquire(&self.key, &self.holder, self.ttl)
            .await
    }

    /// Renew the lease. `false` means it was lost.
    pub async fn renew(&self) -> Result<bool, LeaseError> {
        self.store.renew(&self.key, &self.holder, self.ttl).await
    }

    /// Release the lease. Safe to call on every exit path; releasing a lease
    /// already claimed by a successor is a no-op.
    pub async fn release(&self) -> Result<(), LeaseError> {
        self.store.release(&self.key, &self.holder).await
    }
}

impl std::fmt::Debug for LeaseCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseCoordinator")
            .field("key", &self.key)
            .field("holder", &self.holder)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct LeaseEntry {
    holder: String,
    expires_at: Instant,
}

/// In-process lease store backed by a mutex-guarded map.
///
/// Suitable for tests and single-node deployments; multi-node deployments
/// need a shared backend (the control plane exposes one over HTTP).
#[derive(Default)]
pub struct InMemoryLeaseStore {
    entries: Mutex<HashMap<String, LeaseEntry>>,
}

impl InMemoryLeaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LeaseEntry>> {
        self.entries.lock().expect("lease store mutex poisoned")
    }
}

impl std::fmt::Debug for InMemoryLeaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLeaseStore")
            .field("entries", &self.lock().len())
            .finish()
    }
}

#[async_trait]
impl LeaseStore for InMemoryLeaseStore {
    async fn try_acquire(
        &self,
        key: &str,
        holder: &str,
        ttl: Duration,
    ) -> Result<bool, LeaseError> {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now && entry.holder != holder => Ok(false),
            _ => {
                entries.insert(
                    key.to_string(),
                    LeaseEntry {
                        holder: holder.to_string(),
                        expires_at: now + ttl,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn renew(&self, key: &str, holder: &str, ttl: Duration) -> Result<bool, LeaseError> {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get_mut(key) {
            Some(entry) if entry.holder == holder && entry.expires_at > now => {
                entry.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, key: &str, holder: &str) -> Result<(), LeaseError> {
        let mut entries = self.lock();
        if entries.get(key).is_some_and(|entry| entry.holder == holder) {
            entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn acquire_is_exclusive_per_key() {
        let store = InMemoryLeaseStore::new();

        assert!(store.try_acquire("sync", "worker-a", TTL).await.unwrap());
        assert!(!store.try_acquire("sync", "worker-b", TTL).await.unwrap());

        // A different key is independent.
        assert!(store.try_acquire("prune", "worker-b", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn reacquire_by_same_holder_succeeds() {
        let store = InMemoryLeaseStore::new();

        assert!(store.try_acquire("sync", "worker-a", TTL).await.unwrap());
        assert!(store.try_acquire("sync", "worker-a", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn expired_lease_is_claimable() {
        let store = InMemoryLeaseStore::new();

        assert!(store
            .try_acquire("sync", "worker-a", Duration::ZERO)
            .await
            .unwrap());
        assert!(store.try_acquire("sync", "worker-b", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn renew_fails_for_non_holder_and_after_expiry() {
        let store = InMemoryLeaseStore::new();

        assert!(store.try_acquire("sync", "worker-a", TTL).await.unwrap());
        assert!(!store.renew("sync", "worker-b", TTL).await.unwrap());
        assert!(store.renew("sync", "worker-a", TTL).await.unwrap());

        assert!(store
            .try_acquire("stale", "worker-a", Duration::ZERO)
            .await
            .unwrap());
        assert!(!store.renew("stale", "worker-a", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn release_only_drops_own_lease() {
        let store = InMemoryLeaseStore::new();

        assert!(store.try_acquire("sync", "worker-a", TTL).await.unwrap());

        // A stale holder cannot revoke the current one.
        store.release("sync", "worker-b").await.unwrap();
        assert!(!store.try_acquire("sync", "worker-c", TTL).await.unwrap());

        store.release("sync", "worker-a").await.unwrap();
        assert!(store.try_acquire("sync", "worker-c", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn coordinator_round_trip() {
        let store = Arc::new(InMemoryLeaseStore::new());
        let first = LeaseCoordinator::new(store.clone(), "sync", TTL);
        let second = LeaseCoordinator::new(store.clone(), "sync", TTL);

        assert!(first.try_acquire().await.unwrap());
        assert!(!second.try_acquire().await.unwrap());
        assert!(first.renew().await.unwrap());

        first.release().await.unwrap();
        assert!(second.try_acquire().await.unwrap());
    }
}
