//! Token revocation store
//!
//! Revoked token identifiers (jti) are recorded in an external key-value
//! store with native per-key expiry, so entries clean themselves up when
//! the token they protect against would have expired anyway. The store is
//! abstracted behind a minimal contract (`exists`, `set key value
//! WITH-TTL`): the in-memory implementation backs tests and
//! single-instance deployments, a networked cache satisfies the same
//! contract for multi-replica production.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Namespace prefix for revocation keys
const KEY_PREFIX: &str = "auth:revoked:";

fn revocation_key(jti: &str) -> String {
    format!("{KEY_PREFIX}{jti}")
}

/// Revocation store errors
#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("Revocation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Failed to serialize revocation entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Record stored for a revoked token, keyed by its jti
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevocationEntry {
    /// Unique identifier of the revoked token
    pub jti: String,

    /// Account the token was issued to
    pub user_id: String,

    /// Why the token was revoked (e.g. "logout", "admin-revoke")
    pub reason: String,

    /// When the token was revoked
    pub blacklisted_at: DateTime<Utc>,
}

impl RevocationEntry {
    pub fn new(jti: impl Into<String>, user_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            jti: jti.into(),
            user_id: user_id.into(),
            reason: reason.into(),
            blacklisted_at: Utc::now(),
        }
    }
}

/// Minimal key-value contract the revocation store is built on
///
/// Satisfiable by any store offering per-key expiry.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Check whether a key exists (and has not expired)
    async fn exists(&self, key: &str) -> Result<bool, RevocationError>;

    /// Set a key with a time-to-live; the entry disappears on its own
    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), RevocationError>;
}

/// Revocation store contract
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Check whether a token identifier has been revoked
    async fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError>;

    /// Register a token identifier as revoked for the remaining lifetime
    /// of the token. A non-positive `remaining_ttl_secs` is a no-op: the
    /// token has already expired naturally and there is nothing left to
    /// protect against.
    async fn revoke(
        &self,
        jti: &str,
        remaining_ttl_secs: i64,
        user_id: &str,
        reason: &str,
    ) -> Result<(), RevocationError>;
}

/// Revocation store over any [`KeyValueStore`]
pub struct KvRevocationStore<S> {
    kv: S,
}

impl<S: KeyValueStore> KvRevocationStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl<S: KeyValueStore> RevocationStore for KvRevocationStore<S> {
    async fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError> {
        self.kv.exists(&revocation_key(jti)).await
    }

    async fn revoke(
        &self,
        jti: &str,
        remaining_ttl_secs: i64,
        user_id: &str,
        reason: &str,
    ) -> Result<(), RevocationError> {
        if remaining_ttl_secs <= 0 {
            return Ok(());
        }

        let entry = RevocationEntry::new(jti, user_id, reason);
        let value = serde_json::to_vec(&entry)?;

        self.kv
            .set_with_ttl(
                &revocation_key(jti),
                value,
                Duration::from_secs(remaining_ttl_secs as u64),
            )
            .await
    }
}

/// In-memory key-value store with per-key expiry
///
/// Suitable for tests and single-instance deployments. Expired entries
/// are dropped lazily when their key is next touched.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, (Instant, Vec<u8>)>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn exists(&self, key: &str) -> Result<bool, RevocationError> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((deadline, _)) if *deadline > Instant::now() => Ok(true),
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), RevocationError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), (Instant::now() + ttl, value));
        Ok(())
    }
}

/// Check revocation with a bounded lookup, failing open.
///
/// An unreachable or slow store is treated as "not revoked" so an outage
/// cannot become a denial of service against all authenticated traffic.
/// Each occurrence logs one warning.
pub async fn is_revoked_fail_open(
    store: &Arc<dyn RevocationStore>,
    timeout: Duration,
    jti: &str,
) -> bool {
    match tokio::time::timeout(timeout, store.is_revoked(jti)).await {
        Ok(Ok(revoked)) => revoked,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, jti = %jti, "revocation store unreachable; failing open");
            false
        }
        Err(_) => {
            tracing::warn!(jti = %jti, "revocation store lookup timed out; failing open");
            false
        }
    }
}
