//! Security audit logging for authentication events
//!
//! Provides structured audit logging for authentication and authorization
//! outcomes: successful authentications, denied access, token revocations,
//! and unauthorized access attempts.
//!
//! All audit events are logged at INFO level with the "audit" target,
//! making them easy to filter and route to security monitoring systems.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events for authentication and authorization
///
/// Event names are stable identifiers consumed by log aggregators; the
/// contextual fields (IP address, user agent) are included when available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AuditEvent {
    /// A request authenticated successfully and a principal was attached
    #[serde(rename = "auth.success")]
    AuthSuccess {
        user_id: String,
        role: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// An authenticated principal was refused by an authorization policy
    #[serde(rename = "auth.denied")]
    AuthDenied {
        user_id: String,
        role: String,
        required: String,
        resource: String,
        method: String,
        ip_address: Option<String>,
    },

    /// A token identifier was registered in the revocation store
    #[serde(rename = "auth.revoked")]
    TokenRevoked {
        user_id: String,
        jti: String,
        reason: String,
    },

    /// A request failed authentication (missing, malformed, invalid,
    /// expired, or revoked credentials)
    #[serde(rename = "security.unauthorized_access_attempt")]
    UnauthorizedAccessAttempt {
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },
}

/// Log a security audit event with structured fields
///
/// Events are logged at INFO level with the "audit" target so security
/// teams can route them separately from application logs. The full event
/// is serialized to JSON for aggregator compatibility.
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::AuthSuccess {
            user_id,
            role,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                role = %role,
                ip_address = ?ip_address,
                "Authentication successful"
            );
        }
        AuditEvent::AuthDenied {
            user_id,
            role,
            required,
            resource,
            method,
            ip_address,
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                role = %role,
                required = %required,
                resource = %resource,
                method = %method,
                ip_address = ?ip_address,
                "Access denied"
            );
        }
        AuditEvent::TokenRevoked {
            user_id,
            jti,
            reason,
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                jti = %jti,
                reason = %reason,
                "Token revoked"
            );
        }
        AuditEvent::UnauthorizedAccessAttempt {
            reason, ip_address, ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                reason = %reason,
                ip_address = ?ip_address,
                "Unauthorized access attempt"
            );
        }
    }
}

/// Extract IP address from request headers
///
/// Checks X-Forwarded-For, then X-Real-IP. Connection info is not
/// available at this layer and would need to be passed separately.
pub fn extract_ip_address(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(xff) = headers.get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            // Take the first IP in the chain (client IP)
            if let Some(first_ip) = xff_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

/// Extract user agent from request headers
pub fn extract_user_agent(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|ua| ua.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_event_serialization() {
        let event = AuditEvent::AuthSuccess {
            user_id: "u-1".to_string(),
            role: "moderator".to_string(),
            ip_address: Some("192.168.1.1".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("auth.success"));
        assert!(json.contains("moderator"));
    }

    #[test]
    fn test_unauthorized_attempt_event_name() {
        let event = AuditEvent::UnauthorizedAccessAttempt {
            reason: "Token has been revoked".to_string(),
            ip_address: None,
            user_agent: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("security.unauthorized_access_attempt"));
    }

    #[test]
    fn test_audit_log_does_not_panic() {
        audit_log(&AuditEvent::TokenRevoked {
            user_id: "u-1".to_string(),
            jti: "abc-123".to_string(),
            reason: "logout".to_string(),
        });

        audit_log(&AuditEvent::AuthDenied {
            user_id: "u-2".to_string(),
            role: "user".to_string(),
            required: "admin".to_string(),
            resource: "/api/v1/auth/revoke".to_string(),
            method: "POST".to_string(),
            ip_address: Some("203.0.113.1".to_string()),
        });
    }

    #[test]
    fn test_extract_ip_from_x_forwarded_for() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.1, 198.51.100.1".parse().unwrap(),
        );

        let ip = extract_ip_address(&headers);
        assert_eq!(ip, Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_ip_from_x_real_ip() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("x-real-ip", "203.0.113.1".parse().unwrap());

        let ip = extract_ip_address(&headers);
        assert_eq!(ip, Some("203.0.113.1".to_string()));
    }

    #[test]
    fn test_extract_missing_headers() {
        let headers = axum::http::HeaderMap::new();

        assert_eq!(extract_ip_address(&headers), None);
        assert_eq!(extract_user_agent(&headers), None);
    }
}
