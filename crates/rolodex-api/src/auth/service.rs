//! Authentication service layer
//!
//! Orchestrates token issuance, refresh exchange, logout, and
//! administrative revocation over the issuer/verifier, the revocation
//! store, and the account directory. Credential verification (passwords,
//! external identity providers) happens upstream; callers hand this
//! service an already-authenticated [`Account`].

use super::accounts::AccountDirectory;
use super::jwt::{
    issue_access_token, issue_refresh_token, verify_access_token, verify_refresh_token, JwtError,
};
use super::middleware::{AuthError, Principal};
use super::revocation::{is_revoked_fail_open, RevocationStore};
use crate::audit::{audit_log, AuditEvent};
use rolodex_core::{Account, AuthConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use utoipa::ToSchema;

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout request
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LogoutRequest {
    /// Refresh token to revoke alongside the access token
    pub refresh_token: Option<String>,
}

/// Administrative revocation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevokeRequest {
    /// The token (access or refresh) to revoke
    pub token: String,
    /// Reason recorded with the revocation entry
    pub reason: Option<String>,
}

/// Issued token pair
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
}

/// Authentication service
pub struct AuthService {
    auth: AuthConfig,
    revocation: Arc<dyn RevocationStore>,
    accounts: Arc<dyn AccountDirectory>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        auth: AuthConfig,
        revocation: Arc<dyn RevocationStore>,
        accounts: Arc<dyn AccountDirectory>,
    ) -> Self {
        Self {
            auth,
            revocation,
            accounts,
        }
    }

    /// Issue an access/refresh token pair for an authenticated account.
    ///
    /// This is the seam the credential-verification layer calls after it
    /// has established who the caller is.
    pub fn issue_session(&self, account: &Account) -> Result<TokenPair, AuthError> {
        let access_token = issue_access_token(&self.auth, account)?;
        let refresh_token = issue_refresh_token(&self.auth, &account.id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.auth.access_ttl().as_secs(),
        })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// Refresh tokens are single-use: the exchanged token's jti is
    /// revoked for its remaining lifetime before the new pair is
    /// returned, so a stolen refresh token cannot be replayed after its
    /// legitimate holder has rotated it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let verified = verify_refresh_token(&self.auth, refresh_token)?;

        let revoked = is_revoked_fail_open(
            &self.revocation,
            self.auth.revocation_timeout(),
            &verified.jti,
        )
        .await;
        if revoked {
            return Err(AuthError::TokenRevoked);
        }

        let account = self
            .accounts
            .find_account(&verified.user_id)
            .await?
            .ok_or(AuthError::UnknownAccount)?;

        if !account.is_active {
            return Err(AuthError::AccountInactive);
        }

        self.revoke_best_effort(
            &verified.jti,
            remaining_ttl_secs(verified.exp)?,
            &verified.user_id,
            "refresh-rotation",
        )
        .await;

        self.issue_session(&account)
    }

    /// Revoke the presented access token and, if supplied, the session's
    /// refresh token.
    pub async fn logout(
        &self,
        principal: &Principal,
        request: &LogoutRequest,
    ) -> Result<(), AuthError> {
        if let Some(jti) = &principal.jti {
            self.revoke_best_effort(
                jti,
                remaining_ttl_secs(principal.exp)?,
                &principal.id,
                "logout",
            )
            .await;
        }

        if let Some(refresh_token) = &request.refresh_token {
            // An unusable refresh token never blocks logout, and only the
            // caller's own token is accepted for revocation here.
            if let Ok(verified) = verify_refresh_token(&self.auth, refresh_token) {
                if verified.user_id == principal.id {
                    self.revoke_best_effort(
                        &verified.jti,
                        remaining_ttl_secs(verified.exp)?,
                        &verified.user_id,
                        "logout",
                    )
                    .await;
                }
            }
        }

        Ok(())
    }

    /// Administratively revoke a token (access or refresh) before its
    /// natural expiry.
    pub async fn admin_revoke(&self, request: &RevokeRequest) -> Result<(), AuthError> {
        let (jti, user_id, exp) = match verify_access_token(&self.auth, &request.token) {
            Ok(claims) => {
                let jti = claims.jti.ok_or(AuthError::NotRevocable)?;
                (jti, claims.sub, claims.exp)
            }
            Err(JwtError::WrongTokenType) => {
                let verified = verify_refresh_token(&self.auth, &request.token)?;
                (verified.jti, verified.user_id, verified.exp)
            }
            Err(e) => return Err(e.into()),
        };

        let reason = request.reason.as_deref().unwrap_or("admin-revoke");

        // Administrative revocation must not fail silently; the admin is
        // acting on the belief the token is dead afterwards.
        self.revocation
            .revoke(&jti, remaining_ttl_secs(exp)?, &user_id, reason)
            .await?;

        audit_log(&AuditEvent::TokenRevoked {
            user_id,
            jti,
            reason: reason.to_string(),
        });

        Ok(())
    }

    /// Revoke without surfacing store failures to the caller.
    ///
    /// The availability tradeoff mirrors the fail-open read path: a store
    /// outage during logout or rotation degrades revocation, it does not
    /// fail the user's request.
    async fn revoke_best_effort(&self, jti: &str, remaining_ttl_secs: i64, user_id: &str, reason: &str) {
        match self
            .revocation
            .revoke(jti, remaining_ttl_secs, user_id, reason)
            .await
        {
            Ok(()) => {
                audit_log(&AuditEvent::TokenRevoked {
                    user_id: user_id.to_string(),
                    jti: jti.to_string(),
                    reason: reason.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, jti = %jti, "failed to revoke token; continuing");
            }
        }
    }
}

fn remaining_ttl_secs(exp: u64) -> Result<i64, AuthError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(JwtError::from)?
        .as_secs();
    Ok(exp as i64 - now as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::accounts::InMemoryDirectory;
    use crate::auth::revocation::{KvRevocationStore, MemoryKvStore};
    use rolodex_core::Role;

    fn test_auth_config() -> AuthConfig {
        AuthConfig {
            secret: "unit-test-signing-secret-0123456789abcdef".to_string(),
            ..Default::default()
        }
    }

    async fn service_with(accounts: Vec<Account>) -> AuthService {
        let directory = InMemoryDirectory::new();
        for account in accounts {
            directory.insert(account).await;
        }
        AuthService::new(
            test_auth_config(),
            Arc::new(KvRevocationStore::new(MemoryKvStore::new())),
            Arc::new(directory),
        )
    }

    fn alice() -> Account {
        Account::new("u-1", "alice@example.com", "alice", Role::User)
    }

    #[tokio::test]
    async fn test_issue_session() {
        let service = service_with(vec![alice()]).await;

        let pair = service.issue_session(&alice()).unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 15 * 60);

        let claims = verify_access_token(&test_auth_config(), &pair.access_token).unwrap();
        assert_eq!(claims.sub, "u-1");
    }

    #[tokio::test]
    async fn test_refresh_rotates_old_token() {
        let service = service_with(vec![alice()]).await;
        let pair = service.issue_session(&alice()).unwrap();

        let new_pair = service.refresh(&pair.refresh_token).await.unwrap();
        assert_ne!(new_pair.refresh_token, pair.refresh_token);

        // The exchanged token is single-use
        let replay = service.refresh(&pair.refresh_token).await;
        assert!(matches!(replay, Err(AuthError::TokenRevoked)));

        // The freshly issued one still works
        assert!(service.refresh(&new_pair.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let service = service_with(vec![alice()]).await;
        let pair = service.issue_session(&alice()).unwrap();

        let result = service.refresh(&pair.access_token).await;
        assert!(matches!(
            result,
            Err(AuthError::InvalidToken(JwtError::WrongTokenType))
        ));
    }

    #[tokio::test]
    async fn test_refresh_unknown_account() {
        let service = service_with(vec![]).await;
        let pair = service.issue_session(&alice()).unwrap();

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::UnknownAccount)));
    }

    #[tokio::test]
    async fn test_refresh_inactive_account() {
        let mut deactivated = alice();
        deactivated.is_active = false;

        let service = service_with(vec![deactivated]).await;
        let pair = service.issue_session(&alice()).unwrap();

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::AccountInactive)));
    }

    #[tokio::test]
    async fn test_admin_revoke_access_token() {
        let service = service_with(vec![alice()]).await;
        let pair = service.issue_session(&alice()).unwrap();

        service
            .admin_revoke(&RevokeRequest {
                token: pair.access_token.clone(),
                reason: None,
            })
            .await
            .unwrap();

        let claims = verify_access_token(&test_auth_config(), &pair.access_token).unwrap();
        let jti = claims.jti.unwrap();
        assert!(service.revocation.is_revoked(&jti).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_revoke_refresh_token() {
        let service = service_with(vec![alice()]).await;
        let pair = service.issue_session(&alice()).unwrap();

        service
            .admin_revoke(&RevokeRequest {
                token: pair.refresh_token.clone(),
                reason: Some("compromised".to_string()),
            })
            .await
            .unwrap();

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_logout_revokes_both_tokens() {
        let service = service_with(vec![alice()]).await;
        let pair = service.issue_session(&alice()).unwrap();

        let claims = verify_access_token(&test_auth_config(), &pair.access_token).unwrap();
        let principal = Principal::from(claims);

        service
            .logout(
                &principal,
                &LogoutRequest {
                    refresh_token: Some(pair.refresh_token.clone()),
                },
            )
            .await
            .unwrap();

        let jti = principal.jti.unwrap();
        assert!(service.revocation.is_revoked(&jti).await.unwrap());

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(AuthError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_logout_ignores_foreign_refresh_token() {
        let bob = Account::new("u-2", "bob@example.com", "bob", Role::User);
        let service = service_with(vec![alice(), bob.clone()]).await;

        let alice_pair = service.issue_session(&alice()).unwrap();
        let bob_pair = service.issue_session(&bob).unwrap();

        let claims = verify_access_token(&test_auth_config(), &alice_pair.access_token).unwrap();
        let principal = Principal::from(claims);

        // Alice tries to revoke Bob's refresh token on her way out
        service
            .logout(
                &principal,
                &LogoutRequest {
                    refresh_token: Some(bob_pair.refresh_token.clone()),
                },
            )
            .await
            .unwrap();

        // Bob's token is untouched
        assert!(service.refresh(&bob_pair.refresh_token).await.is_ok());
    }
}
