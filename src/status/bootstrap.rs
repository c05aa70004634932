//! One-shot startup read of the status key

use std::time::Duration;

use tokio::time::timeout;

use super::StatusCache;
use crate::store::{StatusStore, StoreError};

/// What the startup read did to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The stored value was copied into the cache
    Applied(String),
    /// The key is absent or empty; the cache is untouched
    Missing,
    /// The store could not be read; the cache is untouched
    Failed,
}

/// Seed `cache` from the value stored under `key`
///
/// Never fails: a missing key or an unreachable store leaves whatever the
/// cache already holds, which on a fresh process is the safe default.
pub async fn bootstrap(
    store: &dyn StatusStore,
    cache: &StatusCache,
    key: &str,
    limit: Duration,
) -> BootstrapOutcome {
    let result = match timeout(limit, store.get(key)).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    };

    match result {
        Ok(Some(value)) if !value.is_empty() => {
            cache.write(&value);
            tracing::info!("Bootstrapped {} from store: {}", key, value);
            BootstrapOutcome::Applied(value)
        }
        Ok(_) => {
            tracing::warn!("{} key missing at startup; using default {:?}", key, cache.read());
            BootstrapOutcome::Missing
        }
        Err(e) => {
            tracing::error!("Failed to bootstrap {} from store: {}", key, e);
            BootstrapOutcome::Failed
        }
    }
}
