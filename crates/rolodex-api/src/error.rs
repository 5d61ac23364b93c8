//! API error envelope
//!
//! Auth failures carry their own typed errors (`auth::AuthError`); this
//! module defines the JSON body every error response is rendered into at
//! the HTTP boundary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_omitted_when_absent() {
        let json = serde_json::to_string(&ApiError::new("UNAUTHORIZED", "nope")).unwrap();
        assert!(!json.contains("details"));

        let json =
            serde_json::to_string(&ApiError::new("UNAUTHORIZED", "nope").with_details("why"))
                .unwrap();
        assert!(json.contains("\"details\":\"why\""));
    }
}
