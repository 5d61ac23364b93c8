//! Authentication and authorization module
//!
//! Token-based authentication for the rolodex API:
//! - Signed access/refresh token issuance and verification
//! - Cross-request revocation over a TTL key-value store
//! - Strict and optional request authentication middleware
//! - Role-hierarchy and allow-list authorization policies
//! - Account-lookup collaborator used by the refresh flow

pub mod accounts;
pub mod jwt;
pub mod middleware;
pub mod policy;
pub mod revocation;
pub mod service;

pub use accounts::{AccountDirectory, AccountError, InMemoryDirectory};
pub use jwt::{
    issue_access_token, issue_refresh_token, verify_access_token, verify_refresh_token,
    AccessClaims, JwtError, RefreshClaims, RefreshVerification,
};
pub use middleware::{authenticate, optional_authenticate, AuthError, Principal};
pub use policy::{authorize, require_owner, require_role};
pub use revocation::{
    is_revoked_fail_open, KeyValueStore, KvRevocationStore, MemoryKvStore, RevocationEntry,
    RevocationError, RevocationStore,
};
pub use service::{AuthService, LogoutRequest, RefreshRequest, RevokeRequest, TokenPair};
