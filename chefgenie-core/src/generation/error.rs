//! Generation error types.

use thiserror::Error;

use crate::models::ValidationError;

/// Markers the generation service uses when it refuses the API key.
const AUTH_MARKERS: [&str; 3] = ["PERMISSION_DENIED", "leaked", "403"];

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Settings were rejected locally; nothing was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service rejected the credentials (403, permission denied, key
    /// reported as leaked)
    #[error("API key rejected: {0}")]
    Auth(String),

    /// Any other failure reported by the service or the transport
    #[error("Generation request failed: {0}")]
    Service(String),

    /// The service answered with text that is not a meal plan
    #[error("Failed to parse generated meal plan: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GenerationError {
    /// Classifies a failed response from the service.
    pub fn from_response(status: u16, body: &str) -> Self {
        if status == 403 || AUTH_MARKERS.iter().any(|m| body.contains(m)) {
            GenerationError::Auth(format!("status {}: {}", status, body.trim()))
        } else {
            GenerationError::Service(format!("status {}: {}", status, body.trim()))
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, GenerationError::Auth(_))
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.status().map(|s| s.as_u16()) == Some(403) {
            GenerationError::Auth(e.to_string())
        } else {
            GenerationError::Service(e.to_string())
        }
    }
}
