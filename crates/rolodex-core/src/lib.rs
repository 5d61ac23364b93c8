//! Rolodex Core - Domain models and shared types
//!
//! This crate defines the abstractions shared across the rolodex backend:
//! - The role enumeration and its privilege ordering
//! - The account identity used when issuing credentials
//! - Configuration management

pub mod config;

pub use config::{AppConfig, AuthConfig, ConfigError, Environment, LoggingConfig, ServerConfig};

use serde::{Deserialize, Serialize};

// ============================================================================
// Roles
// ============================================================================

/// User role enum
///
/// Roles form a fixed privilege order used for "at least this privileged"
/// checks: User < Support < Moderator < Admin. Explicit allow-list checks
/// ignore the ordering entirely and test plain membership.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Support,
    Moderator,
    Admin,
}

impl Role {
    /// Numeric rank in the privilege order (higher outranks lower)
    pub fn rank(&self) -> u8 {
        match self {
            Role::User => 1,
            Role::Support => 2,
            Role::Moderator => 3,
            Role::Admin => 4,
        }
    }

    /// Check whether this role is at least as privileged as `minimum`
    pub fn at_least(&self, minimum: Role) -> bool {
        self.rank() >= minimum.rank()
    }

    /// Convert role to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Support => "support",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }

    /// Parse role from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "support" => Some(Role::Support),
            "moderator" => Some(Role::Moderator),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// Account identity as known at credential-issuance time
///
/// These are the fields embedded into access-token claims. The issuer does
/// not re-validate them; the caller is expected to have resolved them from
/// its own user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Opaque stable identifier
    pub id: String,

    /// Email address (unique, used for login)
    pub email: String,

    /// Display username
    pub username: String,

    /// Privilege role
    pub role: Role,

    /// Whether the account may authenticate
    pub is_active: bool,

    /// Whether the email address has been verified
    pub is_verified: bool,
}

impl Account {
    /// Create a new active, unverified account
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            username: username.into(),
            role,
            is_active: true,
            is_verified: false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_conversion() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Moderator.as_str(), "moderator");
        assert_eq!(Role::Support.as_str(), "support");
        assert_eq!(Role::User.as_str(), "user");

        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("MODERATOR"), Some(Role::Moderator));
        assert_eq!(Role::parse("invalid"), None);
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::User < Role::Support);
        assert!(Role::Support < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);

        assert!(Role::Admin.at_least(Role::Moderator));
        assert!(Role::Moderator.at_least(Role::Moderator));
        assert!(!Role::User.at_least(Role::Moderator));
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Moderator).unwrap();
        assert_eq!(json, "\"moderator\"");

        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_account_creation() {
        let account = Account::new("u-1", "test@example.com", "testuser", Role::User);

        assert_eq!(account.id, "u-1");
        assert_eq!(account.email, "test@example.com");
        assert_eq!(account.username, "testuser");
        assert_eq!(account.role, Role::User);
        assert!(account.is_active);
        assert!(!account.is_verified);
    }
}
