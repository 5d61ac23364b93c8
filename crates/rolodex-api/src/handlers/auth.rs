//! Authentication API handlers
//!
//! HTTP surface over the auth service: token refresh, logout, identity
//! introspection, and administrative revocation. Credential verification
//! (login) lives in the upstream identity layer, which calls
//! [`AuthService::issue_session`] once it has authenticated a user.
//!
//! [`AuthService::issue_session`]: crate::auth::AuthService::issue_session

use crate::auth::{AuthError, LogoutRequest, Principal, RefreshRequest, RevokeRequest, TokenPair};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Logout response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Revocation response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeResponse {
    pub message: String,
}

/// Session introspection response for optionally-authenticated callers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Principal>,
}

/// Exchange a refresh token for a new token pair
///
/// Refresh tokens are single-use; the exchanged token is revoked as part
/// of the exchange.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair issued", body = TokenPair),
        (status = 401, description = "Invalid, expired, or revoked refresh token", body = crate::error::ApiError),
    )
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let pair = state.auth_service().refresh(&request.refresh_token).await?;
    Ok(Json(pair))
}

/// Logout current session
///
/// Revokes the presented access token and, if supplied in the body, the
/// session's refresh token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    request_body(content = LogoutRequest, description = "Logout options (optional)"),
    responses(
        (status = 200, description = "Logout successful", body = LogoutResponse),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    request: Option<Json<LogoutRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    state.auth_service().logout(&principal, &request).await?;

    Ok(Json(LogoutResponse {
        message: "Logout successful".to_string(),
    }))
}

/// Get the authenticated principal
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Authenticated principal", body = Principal),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
    )
)]
pub async fn me_handler(Extension(principal): Extension<Principal>) -> Json<Principal> {
    Json(principal)
}

/// Inspect the current session
///
/// Accessible anonymously; reports whether the request carried a usable
/// identity.
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
    )
)]
pub async fn session_handler(principal: Option<Extension<Principal>>) -> Json<SessionResponse> {
    let user = principal.map(|Extension(p)| p);
    Json(SessionResponse {
        authenticated: user.is_some(),
        user,
    })
}

/// Administratively revoke a token
///
/// Admin only. Accepts either an access or a refresh token and
/// blacklists its identifier for the token's remaining lifetime.
#[utoipa::path(
    post,
    path = "/api/v1/auth/revoke",
    tag = "auth",
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "Token revoked", body = RevokeResponse),
        (status = 400, description = "Token cannot be revoked", body = crate::error::ApiError),
        (status = 401, description = "Unauthorized", body = crate::error::ApiError),
        (status = 403, description = "Insufficient role", body = crate::error::ApiError),
    )
)]
pub async fn revoke_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RevokeRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state.auth_service().admin_revoke(&request).await?;

    Ok(Json(RevokeResponse {
        message: "Token revoked".to_string(),
    }))
}
