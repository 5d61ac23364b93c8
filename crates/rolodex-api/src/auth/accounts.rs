//! Account-lookup collaborator
//!
//! Per-request active/verified checks come from token claims, not from
//! here; the directory is only consulted when a refresh token is
//! exchanged and the principal fields must be re-resolved for the new
//! access token.

use async_trait::async_trait;
use rolodex_core::Account;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Account lookup errors
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account lookup failed: {0}")]
    LookupFailed(String),
}

/// Directory resolving account IDs to identity fields
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Find an account by its stable identifier
    async fn find_account(&self, user_id: &str) -> Result<Option<Account>, AccountError>;
}

/// In-memory account directory for tests and default wiring
#[derive(Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account
    pub async fn insert(&self, account: Account) {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id.clone(), account);
    }
}

#[async_trait]
impl AccountDirectory for InMemoryDirectory {
    async fn find_account(&self, user_id: &str) -> Result<Option<Account>, AccountError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(user_id).cloned())
    }
}
