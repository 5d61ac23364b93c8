//! Application state management

use crate::auth::{AccountDirectory, AuthService, RevocationStore};
use rolodex_core::AppConfig;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
///
/// Holds the immutable startup configuration plus handles to the two
/// injected collaborators. No per-request mutable state lives here, so
/// concurrent requests need no coordination.
pub struct AppState {
    /// Application configuration (validated at startup)
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Revocation store handle
    pub revocation: Arc<dyn RevocationStore>,
    /// Account directory handle
    pub accounts: Arc<dyn AccountDirectory>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: AppConfig,
        revocation: Arc<dyn RevocationStore>,
        accounts: Arc<dyn AccountDirectory>,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            revocation,
            accounts,
        }
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Build an auth service over this state's collaborators
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.config.auth.clone(),
            self.revocation.clone(),
            self.accounts.clone(),
        )
    }
}
