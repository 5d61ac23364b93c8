//! Authorization policy
//!
//! Two independent gate mechanisms over an already-attached [`Principal`]:
//! a hierarchy check ("at least this privileged") and an explicit
//! allow-list check (plain membership, no ordering, no implicit admin
//! bypass). Both refuse to run without a Principal; authorization never
//! substitutes for authentication.

use super::middleware::{AuthError, Principal};
use crate::audit::{audit_log, extract_ip_address, AuditEvent};
use axum::{
    body::Body,
    extract::Request,
    middleware::Next,
    response::Response,
};
use rolodex_core::Role;

/// Type alias for policy middleware futures
type PolicyMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>;

/// Whether `role` satisfies the hierarchy check against `minimum`
fn hierarchy_permits(role: Role, minimum: Role) -> bool {
    role.at_least(minimum)
}

/// Whether `role` satisfies the allow-list check against `allowed`
fn set_permits(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// Middleware factory gating a route on a minimum role.
///
/// Accepts any principal whose role ranks at least as high as `minimum`
/// in the fixed privilege order.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::post, middleware};
/// use rolodex_api::auth::{authenticate, require_role};
/// use rolodex_core::Role;
///
/// let app = Router::new()
///     .route("/auth/revoke", post(revoke_handler))
///     .route_layer(middleware::from_fn(require_role(Role::Admin)))
///     .route_layer(middleware::from_fn_with_state(state, authenticate));
/// ```
pub fn require_role(
    minimum: Role,
) -> impl Fn(Request<Body>, Next) -> PolicyMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let ip_address = extract_ip_address(request.headers());

            let principal = request
                .extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AuthError::MissingPrincipal)?;

            if !hierarchy_permits(principal.role, minimum) {
                audit_log(&AuditEvent::AuthDenied {
                    user_id: principal.id.clone(),
                    role: principal.role.to_string(),
                    required: minimum.to_string(),
                    resource: request.uri().path().to_string(),
                    method: request.method().to_string(),
                    ip_address,
                });

                return Err(AuthError::InsufficientRole);
            }

            Ok(next.run(request).await)
        })
    }
}

/// Middleware factory gating a route on an explicit role allow-list.
///
/// Accepts exactly the listed roles; rank plays no part. Used where an
/// enumerated allow-list is semantically correct and an ordered
/// hierarchy would be wrong (e.g. admin or the designated support role,
/// which are not comparable in rank).
pub fn authorize(
    allowed: &'static [Role],
) -> impl Fn(Request<Body>, Next) -> PolicyMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let ip_address = extract_ip_address(request.headers());

            let principal = request
                .extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AuthError::MissingPrincipal)?;

            if !set_permits(principal.role, allowed) {
                let required = allowed
                    .iter()
                    .map(|r| r.as_str())
                    .collect::<Vec<_>>()
                    .join(",");

                audit_log(&AuditEvent::AuthDenied {
                    user_id: principal.id.clone(),
                    role: principal.role.to_string(),
                    required,
                    resource: request.uri().path().to_string(),
                    method: request.method().to_string(),
                    ip_address,
                });

                return Err(AuthError::InsufficientRole);
            }

            Ok(next.run(request).await)
        })
    }
}

/// Resource-ownership check.
///
/// Accepts the resource owner or an admin. Handlers call this once they
/// have resolved the owning account ID for the resource; where ownership
/// cannot be determined from the URL path alone, resolving it (and
/// calling this) is the business-logic layer's job rather than something
/// the middleware guesses at.
pub fn require_owner(principal: &Principal, resource_owner_id: &str) -> Result<(), AuthError> {
    if principal.role == Role::Admin || principal.id == resource_owner_id {
        Ok(())
    } else {
        Err(AuthError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: "u-1".to_string(),
            email: "a@example.com".to_string(),
            username: "alice".to_string(),
            role,
            is_active: true,
            is_verified: true,
            jti: Some("j-1".to_string()),
            exp: 0,
        }
    }

    #[test]
    fn test_hierarchy_check() {
        assert!(hierarchy_permits(Role::Admin, Role::Moderator));
        assert!(hierarchy_permits(Role::Moderator, Role::Moderator));
        assert!(!hierarchy_permits(Role::Support, Role::Moderator));
        assert!(!hierarchy_permits(Role::User, Role::Moderator));
    }

    #[test]
    fn test_set_check_ignores_rank() {
        let allowed = [Role::Admin, Role::Support];

        assert!(set_permits(Role::Admin, &allowed));
        assert!(set_permits(Role::Support, &allowed));
        // Moderator outranks Support in the hierarchy but is not listed
        assert!(!set_permits(Role::Moderator, &allowed));
        assert!(!set_permits(Role::User, &allowed));
    }

    #[test]
    fn test_owner_check() {
        let alice = principal(Role::User);

        assert!(require_owner(&alice, "u-1").is_ok());
        assert!(matches!(
            require_owner(&alice, "u-2"),
            Err(AuthError::NotOwner)
        ));
    }

    #[test]
    fn test_admin_bypasses_ownership() {
        let admin = principal(Role::Admin);
        assert!(require_owner(&admin, "someone-else").is_ok());
    }
}
