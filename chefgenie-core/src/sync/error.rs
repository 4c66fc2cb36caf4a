//! Sync error types.

/// Errors that can occur while reading or writing the household document.
#[derive(Debug)]
pub enum SyncError {
    /// No household code is set
    NoCode,
    /// No document store is configured
    NotConfigured,
    /// Transport failure talking to the store
    Http(String),
    /// The store answered with a non-success status
    Status(u16, String),
    /// The stored document could not be decoded
    Decode(String),
    /// The bundle could not be encoded for the store
    Encode(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::NoCode => write!(f, "No household code set. Connect or generate one first."),
            SyncError::NotConfigured => {
                write!(f, "Sync not configured. Add sync.project_id to config.")
            }
            SyncError::Http(e) => write!(f, "Connection error: {}", e),
            SyncError::Status(code, body) => write!(f, "Store returned {}: {}", code, body),
            SyncError::Decode(e) => write!(f, "Failed to decode household document: {}", e),
            SyncError::Encode(e) => write!(f, "Failed to encode household document: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Http(e.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Decode(e.to_string())
    }
}
