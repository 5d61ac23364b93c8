//! API route definitions

use crate::auth::{authenticate, optional_authenticate, require_role};
use crate::handlers::auth;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use rolodex_core::Role;
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new().route("/auth/refresh", post(auth::refresh_handler));

    // Anonymous-friendly routes that still resolve identity when present
    let optional_routes = Router::new()
        .route("/auth/session", get(auth::session_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_authenticate,
        ));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/me", get(auth::me_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    // Admin routes (authentication + role gate)
    let admin_routes = Router::new()
        .route("/auth/revoke", post(auth::revoke_handler))
        .route_layer(middleware::from_fn(require_role(Role::Admin)))
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    Router::new()
        .merge(public_routes)
        .merge(optional_routes)
        .merge(protected_routes)
        .merge(admin_routes)
}
