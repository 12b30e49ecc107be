//! Ephemeral, process-lifetime key-value storage for parsed uploads.
//!
//! Entries are immutable once created: the only operations are `create`,
//! `read` and `delete`. All access goes through a single `RwLock`, so a
//! `read` racing a `delete` of the same id sees either the whole payload
//! or nothing.

use crate::error::StoreError;
use crate::utils::logging;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use uuid::Uuid;

pub mod retention;

pub use retention::{spawn_expiry_sweeper, RetentionPolicy};

/// Opaque identifier of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form handed out to clients. Anything that is not
    /// a well-formed id yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text.trim()).ok().map(Self)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug)]
struct StoredEntry<T> {
    payload: T,
    created_at: Instant,
}

pub struct EphemeralStore<T = serde_json::Value> {
    entries: Arc<RwLock<HashMap<EntryId, StoredEntry<T>>>>,
    policy: RetentionPolicy,
}

impl<T> Clone for EphemeralStore<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            policy: self.policy,
        }
    }
}

impl<T: Clone + Send + Sync> Default for EphemeralStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> EphemeralStore<T> {
    /// Store with unbounded retention: entries live until deleted.
    pub fn new() -> Self {
        Self::with_policy(RetentionPolicy::unbounded())
    }

    pub fn with_policy(policy: RetentionPolicy) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Store `payload` under a freshly allocated id.
    ///
    /// Fails only when the policy sets a capacity and every slot holds a
    /// live entry.
    pub async fn create(&self, payload: T) -> Result<EntryId, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        if let Some(limit) = self.policy.max_entries {
            if entries.len() >= limit {
                let purged = purge_locked(&mut entries, &self.policy, now);
                if purged > 0 {
                    debug!("Purged {} expired entries to make room", purged);
                }
            }
            if entries.len() >= limit {
                warn!("Store capacity of {} entries reached, rejecting create", limit);
                return Err(StoreError::CapacityExceeded { limit });
            }
        }

        // Checked under the write lock, so no two live entries share an id.
        let mut id = EntryId::generate();
        while entries.contains_key(&id) {
            id = EntryId::generate();
        }

        entries.insert(id, StoredEntry { payload, created_at: now });
        logging::log_store_operation("create", &id.to_string(), entries.len());
        Ok(id)
    }

    /// Clone of the payload stored under `id`, or `None` if there is no
    /// live entry for it.
    pub async fn read(&self, id: &EntryId) -> Option<T> {
        let now = Instant::now();
        let entries = self.entries.read().await;

        entries
            .get(id)
            .filter(|entry| !self.policy.is_expired(entry.created_at, now))
            .map(|entry| entry.payload.clone())
    }

    /// Remove the entry for `id`. Returns `false` if it was never there,
    /// was already deleted, or had expired.
    pub async fn delete(&self, id: &EntryId) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        match entries.remove(id) {
            Some(entry) => {
                logging::log_store_operation("delete", &id.to_string(), entries.len());
                !self.policy.is_expired(entry.created_at, now)
            }
            None => false,
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .values()
            .filter(|entry| !self.policy.is_expired(entry.created_at, now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        if self.policy.ttl.is_none() {
            return 0;
        }

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let purged = purge_locked(&mut entries, &self.policy, now);
        if purged > 0 {
            info!("Purged {} expired entries, {} remain", purged, entries.len());
        }
        purged
    }
}

fn purge_locked<T>(
    entries: &mut HashMap<EntryId, StoredEntry<T>>,
    policy: &RetentionPolicy,
    now: Instant,
) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !policy.is_expired(entry.created_at, now));
    before - entries.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Duration;

    #[tokio::test]
    async fn test_create_then_read_returns_payload() {
        let store = EphemeralStore::new();
        let payload = json!({"Ics file": "content of ics file"});

        let id = store.create(payload.clone()).await.unwrap();
        assert_eq!(store.read(&id).await, Some(payload));
    }

    #[tokio::test]
    async fn test_delete_is_true_once() {
        let store = EphemeralStore::new();
        let id = store.create(json!({"events": []})).await.unwrap();

        assert!(store.delete(&id).await);
        assert_eq!(store.read(&id).await, None);
        assert!(!store.delete(&id).await);
        assert!(!store.delete(&id).await);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store: EphemeralStore = EphemeralStore::new();
        let id = EntryId::generate();
        assert_eq!(store.read(&id).await, None);
        assert!(!store.delete(&id).await);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let store = EphemeralStore::new();
        let other = store.clone();
        let id = store.create(1u32).await.unwrap();
        assert_eq!(other.read(&id).await, Some(1));
        assert_eq!(other.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_get_distinct_ids() {
        let store = EphemeralStore::new();
        let mut handles = Vec::new();

        for i in 0..64u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = store.create(i).await.unwrap();
                (id, i)
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            let (id, value) = handle.await.unwrap();
            assert!(ids.insert(id));
            assert_eq!(store.read(&id).await, Some(value));
        }
        assert_eq!(store.len().await, 64);
    }

    #[tokio::test]
    async fn test_capacity_bound() {
        let store = EphemeralStore::with_policy(RetentionPolicy::unbounded().with_max_entries(2));
        let first = store.create("a").await.unwrap();
        store.create("b").await.unwrap();

        let err = store.create("c").await.unwrap_err();
        assert_eq!(err, StoreError::CapacityExceeded { limit: 2 });

        assert!(store.delete(&first).await);
        assert!(store.create("c").await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_entries_are_not_found() {
        let store = EphemeralStore::with_policy(
            RetentionPolicy::unbounded().with_ttl(Duration::from_millis(20)),
        );
        let id = store.create("short-lived").await.unwrap();
        assert_eq!(store.read(&id).await, Some("short-lived"));

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.read(&id).await, None);
        assert!(store.is_empty().await);
        assert_eq!(store.purge_expired().await, 1);
        assert!(!store.delete(&id).await);
    }

    #[tokio::test]
    async fn test_capacity_reclaims_expired_slots() {
        let store = EphemeralStore::with_policy(
            RetentionPolicy::unbounded()
                .with_ttl(Duration::from_millis(20))
                .with_max_entries(1),
        );
        store.create(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.create(2).await.is_ok());
    }

    #[test]
    fn test_entry_id_text_round_trip() {
        let id = EntryId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(EntryId::parse(&text), Some(id));
        assert_eq!(text.parse::<EntryId>().unwrap(), id);
        assert_eq!(EntryId::parse("not-an-id"), None);
    }
}
