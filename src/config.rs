//! Configuration for the upload pipeline.
//!
//! Everything defaults to the unbounded retention the store has always
//! had; a TTL or capacity bound is opt-in.

use crate::error::{AppError, AppResult};
use crate::store::RetentionPolicy;
use log::info;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Seconds an entry stays readable; `None` keeps it until deleted.
    pub ttl_secs: Option<u64>,
    /// Upper bound on live entries; `None` for no bound.
    pub max_entries: Option<usize>,
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: None,
            max_entries: None,
            sweep_interval_secs: 60,
        }
    }
}

impl StoreConfig {
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            ttl: self.ttl_secs.map(Duration::from_secs),
            max_entries: self.max_entries,
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl VaultConfig {
    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let config: VaultConfig = serde_json::from_str(json)
            .map_err(|e| AppError::config(format!("invalid configuration: {}", e)))?;
        validate_config(&config)?;
        Ok(config)
    }
}

/// Reject settings that would make the store unusable.
pub fn validate_config(config: &VaultConfig) -> AppResult<()> {
    let store = &config.store;

    if store.ttl_secs == Some(0) {
        return Err(AppError::config("store.ttl_secs must be greater than zero"));
    }
    if store.max_entries == Some(0) {
        return Err(AppError::config("store.max_entries must be greater than zero"));
    }
    if store.sweep_interval_secs == 0 {
        return Err(AppError::config("store.sweep_interval_secs must be greater than zero"));
    }

    info!(
        "Configuration validated (ttl: {:?}, max entries: {:?})",
        store.ttl_secs, store.max_entries
    );
    Ok(())
}
