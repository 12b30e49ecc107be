//! Parse-then-store pipeline behind the upload endpoint.

use crate::calendar;
use crate::config::{validate_config, VaultConfig};
use crate::error::AppResult;
use crate::models::{UploadMessage, UploadReceipt, UploadStatus};
use crate::store::{spawn_expiry_sweeper, EntryId, EphemeralStore};
use crate::utils::logging;
use log::info;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct IcsUploadService {
    store: EphemeralStore<Value>,
}

impl IcsUploadService {
    pub fn new(store: EphemeralStore<Value>) -> Self {
        Self { store }
    }

    pub fn from_config(config: &VaultConfig) -> AppResult<Self> {
        validate_config(config)?;
        Ok(Self::new(EphemeralStore::with_policy(
            config.store.retention_policy(),
        )))
    }

    pub fn store(&self) -> &EphemeralStore<Value> {
        &self.store
    }

    /// Start the background sweeper if the store's entries can expire.
    pub fn start_sweeper(
        &self,
        config: &VaultConfig,
        shutdown: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        self.store.policy().ttl.map(|_| {
            spawn_expiry_sweeper(self.store.clone(), config.store.sweep_interval(), shutdown)
        })
    }

    /// Parse an uploaded calendar and keep its events under a new id.
    pub async fn upload(&self, ics_bytes: &[u8]) -> AppResult<UploadReceipt> {
        let events = calendar::parse_ics(ics_bytes)?;

        let payload = json!({ "events": serde_json::to_value(&events)? });
        let json = serde_json::to_string_pretty(&events)?;
        let uid = self.store.create(payload).await.map_err(|e| {
            logging::log_error_with_context(&e, "Upload");
            e
        })?;

        info!("Stored {} events under {}", events.len(), uid);

        Ok(UploadReceipt {
            uid,
            message: UploadMessage::IcsUploadSuccess,
            status: UploadStatus::Success,
            events,
            json,
        })
    }

    /// Stored `{"events": [...]}` payload for a client-supplied id.
    pub async fn fetch(&self, uid: &str) -> Option<Value> {
        let id = EntryId::parse(uid)?;
        self.store.read(&id).await
    }

    pub async fn discard(&self, uid: &str) -> bool {
        match EntryId::parse(uid) {
            Some(id) => self.store.delete(&id).await,
            None => false,
        }
    }
}
