//! API Response types
//!
//! Every endpoint answers with the same envelope:
//! ```json
//! { "success": true, "data": { ... } }
//! { "success": false, "error": "Order not found", "message": "..." }
//! ```

use serde::{Deserialize, Serialize};

/// Unified API response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Create a successful response with custom message
    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            message,
            error: Some(error.into()),
        }
    }

    /// Consume the envelope, returning the payload of a successful response
    pub fn into_data(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}
