pub mod admin;
pub mod auth;
pub mod student;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error body: `{"error": <message>}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid credentials")]
    pub error: String,
}

/// Standard informational body: `{"message": <message>}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Logged out successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
