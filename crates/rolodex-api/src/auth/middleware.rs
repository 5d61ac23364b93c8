//! Authentication middleware
//!
//! Per request: extract the bearer token, verify it, check revocation,
//! confirm the account is active, then attach a [`Principal`] to the
//! request extensions for downstream handlers and policies.
//!
//! The strict variant rejects the request at the first failed step; the
//! optional variant swallows every failure and lets the request continue
//! anonymously.

use super::accounts::AccountError;
use super::jwt::{verify_access_token, AccessClaims, JwtError};
use super::revocation::{is_revoked_fail_open, RevocationError};
use crate::audit::{audit_log, extract_ip_address, extract_user_agent, AuditEvent};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rolodex_core::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

/// Authenticated identity attached to request extensions
///
/// Only constructed from a successfully verified, non-revoked,
/// non-expired token belonging to an active account. Created per request
/// and discarded with it; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Stable account identifier
    pub id: String,
    /// Account email address
    pub email: String,
    /// Account username
    pub username: String,
    /// Privilege role
    #[schema(value_type = String)]
    pub role: Role,
    /// Whether the account may authenticate
    pub is_active: bool,
    /// Whether the email address has been verified
    pub is_verified: bool,
    /// Identifier of the presented token (revocation handle)
    pub jti: Option<String>,
    /// Expiry of the presented token (Unix epoch seconds)
    pub exp: u64,
}

impl From<AccessClaims> for Principal {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            username: claims.username,
            role: claims.role,
            is_active: claims.is_active,
            is_verified: claims.is_verified,
            jti: claims.jti,
            exp: claims.exp,
        }
    }
}

/// Authentication and authorization errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(JwtError),

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Account is deactivated")]
    AccountInactive,

    #[error("Account not found")]
    UnknownAccount,

    #[error("Authentication required")]
    MissingPrincipal,

    #[error("Insufficient role")]
    InsufficientRole,

    #[error("Not the resource owner")]
    NotOwner,

    #[error("Token carries no identifier and cannot be revoked")]
    NotRevocable,

    #[error("Account directory error: {0}")]
    Directory(#[from] AccountError),

    #[error("Revocation store error: {0}")]
    Revocation(#[from] RevocationError),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::ExpiredToken => AuthError::TokenExpired,
            other => AuthError::InvalidToken(other),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AuthError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Missing Authorization header",
            ),
            AuthError::InvalidAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid Authorization header format",
            ),
            // Distinguished so clients can attempt a silent refresh
            // instead of forcing a full re-login
            AuthError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED", "Token has expired")
            }
            AuthError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Invalid token")
            }
            AuthError::TokenRevoked => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Token has been revoked",
            ),
            AuthError::AccountInactive => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Account is deactivated",
            ),
            AuthError::UnknownAccount => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Account not found")
            }
            AuthError::MissingPrincipal => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required",
            ),
            AuthError::InsufficientRole => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Insufficient permissions",
            ),
            AuthError::NotOwner => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied to resource",
            ),
            AuthError::NotRevocable => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                "Token carries no identifier and cannot be revoked",
            ),
            AuthError::Directory(_) | AuthError::Revocation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error",
            ),
        };

        (status, axum::Json(ApiError::new(code, message))).into_response()
    }
}

/// Extract the token from an Authorization header value.
///
/// The value must split into exactly two whitespace-separated parts, the
/// first literally "Bearer". Anything else is a malformed header, not a
/// parse exception.
fn extract_bearer(value: &str) -> Result<&str, AuthError> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Run the full authentication chain for a request, producing a
/// Principal or the first failure.
async fn resolve_principal(state: &AppState, headers: &header::HeaderMap) -> Result<Principal, AuthError> {
    let header_value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = extract_bearer(header_value)?;

    let claims = verify_access_token(&state.config.auth, token)?;

    // Revocation is checked separately from verification; tokens without
    // a jti predate revocation support and are accepted without a check.
    if let Some(jti) = &claims.jti {
        let revoked = is_revoked_fail_open(
            &state.revocation,
            state.config.auth.revocation_timeout(),
            jti,
        )
        .await;
        if revoked {
            return Err(AuthError::TokenRevoked);
        }
    }

    if !claims.is_active {
        return Err(AuthError::AccountInactive);
    }

    Ok(Principal::from(claims))
}

/// Strict authentication middleware.
///
/// Fails the request unless a valid, non-revoked bearer token for an
/// active account is presented. On success attaches a [`Principal`] to
/// the request extensions.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let ip_address = extract_ip_address(request.headers());
    let user_agent = extract_user_agent(request.headers());

    let principal = match resolve_principal(&state, request.headers()).await {
        Ok(principal) => principal,
        Err(e) => {
            audit_log(&AuditEvent::UnauthorizedAccessAttempt {
                reason: e.to_string(),
                ip_address,
                user_agent,
            });
            return Err(e);
        }
    };

    audit_log(&AuditEvent::AuthSuccess {
        user_id: principal.id.clone(),
        role: principal.role.to_string(),
        ip_address,
        user_agent,
    });

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Optional authentication middleware.
///
/// Never fails the request: any error along the chain is swallowed and
/// the request proceeds with no Principal attached. Used for endpoints
/// whose behavior varies by identity but which remain accessible to
/// anonymous callers.
pub async fn optional_authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match resolve_principal(&state, request.headers()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
        }
        Err(e) => {
            tracing::debug!(error = %e, "optional authentication skipped");
        }
    }

    next.run(request).await
}
