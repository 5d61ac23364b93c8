//! JWT token issuance and verification
//!
//! Access tokens embed the full principal identity and are short-lived;
//! refresh tokens carry only the subject plus a `type` discriminator and
//! are used solely to mint new access tokens. Both are signed with an
//! HMAC secret fixed at process startup. Verification never consults the
//! revocation store; that check belongs to the authentication middleware.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use rolodex_core::{Account, AuthConfig, Role};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Discriminator value carried by refresh tokens
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Access-token claims
///
/// The principal identity is embedded at issuance; per-request
/// active/verified checks read these fields rather than the user store,
/// so a deactivated account stays valid until its tokens expire or are
/// explicitly revoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Token issuer
    pub iss: String,
    /// Token audience
    pub aud: String,
    /// Subject - account ID
    pub sub: String,
    /// Unique token identifier used as the revocation key.
    /// Absent on legacy minimal tokens, which skip the revocation check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: u64,
    /// Account email address
    pub email: String,
    /// Account username
    pub username: String,
    /// Privilege role
    pub role: Role,
    /// Whether the account may authenticate
    pub is_active: bool,
    /// Whether the email address has been verified
    pub is_verified: bool,
}

/// Refresh-token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Token issuer
    pub iss: String,
    /// Token audience
    pub aud: String,
    /// Subject - account ID
    pub sub: String,
    /// Unique token identifier used as the revocation key
    pub jti: String,
    /// Issued at timestamp (Unix epoch seconds)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: u64,
    /// Discriminator, always "refresh"
    #[serde(rename = "type")]
    pub token_type: String,
}

/// Result of verifying a refresh token
#[derive(Debug, Clone)]
pub struct RefreshVerification {
    /// Subject the token was issued to
    pub user_id: String,
    /// Unique token identifier
    pub jti: String,
    /// Expiration timestamp (Unix epoch seconds)
    pub exp: u64,
}

/// JWT issuance and verification errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token issuer mismatch")]
    InvalidIssuer,

    #[error("Token audience mismatch")]
    InvalidAudience,

    #[error("Token type not valid for this operation")]
    WrongTokenType,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),
}

/// Generate a fresh unique token identifier.
///
/// Combines wall-clock milliseconds with a random suffix so identifiers
/// never collide across concurrent issuances or service replicas; a
/// plain counter would.
pub fn new_jti() -> Result<String, JwtError> {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    let suffix: u64 = rand::thread_rng().gen();
    Ok(format!("{millis:x}-{suffix:016x}"))
}

fn signing_algorithm(config: &AuthConfig) -> Algorithm {
    // Restricted to the HMAC family; validated at startup.
    match config.algorithm.as_str() {
        "HS384" => Algorithm::HS384,
        "HS512" => Algorithm::HS512,
        _ => Algorithm::HS256,
    }
}

fn validation(config: &AuthConfig) -> Validation {
    let mut validation = Validation::new(signing_algorithm(config));
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.audience]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    validation
}

fn now_unix_secs() -> Result<u64, JwtError> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Issue a signed access token for an account.
///
/// The caller is expected to have already resolved and validated the
/// account fields; issuance embeds them as-is. Nothing is written to the
/// revocation store.
pub fn issue_access_token(config: &AuthConfig, account: &Account) -> Result<String, JwtError> {
    let now = now_unix_secs()?;

    let claims = AccessClaims {
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        sub: account.id.clone(),
        jti: Some(new_jti()?),
        iat: now,
        exp: now + config.access_ttl().as_secs(),
        email: account.email.clone(),
        username: account.username.clone(),
        role: account.role,
        is_active: account.is_active,
        is_verified: account.is_verified,
    };

    let token = encode(
        &Header::new(signing_algorithm(config)),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Issue a signed refresh token for an account ID.
pub fn issue_refresh_token(config: &AuthConfig, user_id: &str) -> Result<String, JwtError> {
    let now = now_unix_secs()?;

    let claims = RefreshClaims {
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        sub: user_id.to_string(),
        jti: new_jti()?,
        iat: now,
        exp: now + config.refresh_ttl().as_secs(),
        token_type: REFRESH_TOKEN_TYPE.to_string(),
    };

    let token = encode(
        &Header::new(signing_algorithm(config)),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Decode and validate signature, issuer, audience, and expiry,
/// returning the raw claims for type-discriminator inspection.
fn decode_claims(config: &AuthConfig, token: &str) -> Result<serde_json::Value, JwtError> {
    let token_data = decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation(config),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidAudience,
        _ => JwtError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Verify an access token and extract its claims.
///
/// Checks, in order: signature, issuer, audience, expiry, and that the
/// token is not a refresh token. Any failure short-circuits; no partial
/// claims are returned.
pub fn verify_access_token(config: &AuthConfig, token: &str) -> Result<AccessClaims, JwtError> {
    let claims = decode_claims(config, token)?;

    if claims.get("type").and_then(|v| v.as_str()) == Some(REFRESH_TOKEN_TYPE) {
        return Err(JwtError::WrongTokenType);
    }

    serde_json::from_value(claims).map_err(|_| JwtError::InvalidToken)
}

/// Verify a refresh token, returning its subject and identifier.
///
/// Tokens whose `type` discriminator is not "refresh" are rejected,
/// preventing an access token from being replayed against the refresh
/// path.
pub fn verify_refresh_token(
    config: &AuthConfig,
    token: &str,
) -> Result<RefreshVerification, JwtError> {
    let claims = decode_claims(config, token)?;

    if claims.get("type").and_then(|v| v.as_str()) != Some(REFRESH_TOKEN_TYPE) {
        return Err(JwtError::WrongTokenType);
    }

    let claims: RefreshClaims =
        serde_json::from_value(claims).map_err(|_| JwtError::InvalidToken)?;

    Ok(RefreshVerification {
        user_id: claims.sub,
        jti: claims.jti,
        exp: claims.exp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            secret: "unit-test-signing-secret-0123456789abcdef".to_string(),
            ..Default::default()
        }
    }

    fn test_account() -> Account {
        Account {
            id: "u-42".to_string(),
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            role: Role::Moderator,
            is_active: true,
            is_verified: true,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = test_config();
        let account = test_account();

        let token = issue_access_token(&config, &account).expect("Failed to issue token");
        let claims = verify_access_token(&config, &token).expect("Failed to verify token");

        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, account.email);
        assert_eq!(claims.username, account.username);
        assert_eq!(claims.role, Role::Moderator);
        assert!(claims.is_active);
        assert!(claims.is_verified);
        assert_eq!(claims.iss, config.issuer);
        assert_eq!(claims.aud, config.audience);
        assert!(claims.jti.is_some());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = test_config();

        let token = issue_refresh_token(&config, "u-42").unwrap();
        let verified = verify_refresh_token(&config, &token).unwrap();

        assert_eq!(verified.user_id, "u-42");
        assert!(!verified.jti.is_empty());
    }

    #[test]
    fn test_jti_unique_per_issuance() {
        let config = test_config();
        let account = test_account();

        let a = verify_access_token(&config, &issue_access_token(&config, &account).unwrap())
            .unwrap()
            .jti;
        let b = verify_access_token(&config, &issue_access_token(&config, &account).unwrap())
            .unwrap()
            .jti;

        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_token() {
        let config = test_config();
        let result = verify_access_token(&config, "invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = test_config();
        let config2 = AuthConfig {
            secret: "a-completely-different-signing-secret-xyz".to_string(),
            ..Default::default()
        };

        let token = issue_access_token(&config1, &test_account()).unwrap();
        let result = verify_access_token(&config2, &token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_wrong_issuer() {
        let issuing = test_config();
        let verifying = AuthConfig {
            issuer: "someone-else".to_string(),
            ..test_config()
        };

        let token = issue_access_token(&issuing, &test_account()).unwrap();
        let result = verify_access_token(&verifying, &token);
        assert!(matches!(result, Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_wrong_audience() {
        let issuing = test_config();
        let verifying = AuthConfig {
            audience: "other-clients".to_string(),
            ..test_config()
        };

        let token = issue_access_token(&issuing, &test_account()).unwrap();
        let result = verify_access_token(&verifying, &token);
        assert!(matches!(result, Err(JwtError::InvalidAudience)));
    }

    #[test]
    fn test_expired_token() {
        let config = test_config();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Issued 2 hours ago, expired 1 hour ago (beyond validation leeway)
        let claims = AccessClaims {
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            sub: "u-42".to_string(),
            jti: Some("stale".to_string()),
            iat: now - 7200,
            exp: now - 3600,
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            role: Role::User,
            is_active: true,
            is_verified: false,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let result = verify_access_token(&config, &token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_refresh_token_rejected_by_access_path() {
        let config = test_config();
        let refresh = issue_refresh_token(&config, "u-42").unwrap();

        let result = verify_access_token(&config, &refresh);
        assert!(matches!(result, Err(JwtError::WrongTokenType)));
    }

    #[test]
    fn test_access_token_rejected_by_refresh_path() {
        let config = test_config();
        let access = issue_access_token(&config, &test_account()).unwrap();

        let result = verify_refresh_token(&config, &access);
        assert!(matches!(result, Err(JwtError::WrongTokenType)));
    }

    #[test]
    fn test_legacy_token_without_jti_is_accepted() {
        let config = test_config();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Minimal token with no jti claim at all
        let claims = serde_json::json!({
            "iss": config.issuer,
            "aud": config.audience,
            "sub": "legacy-user",
            "iat": now,
            "exp": now + 600,
            "email": "legacy@example.com",
            "username": "legacy",
            "role": "user",
            "is_active": true,
            "is_verified": false,
        });

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let verified = verify_access_token(&config, &token).unwrap();
        assert_eq!(verified.jti, None);
        assert_eq!(verified.sub, "legacy-user");
    }
}
