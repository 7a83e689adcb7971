use thiserror::Error;

/// Error types for backend API operations
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The backend answered with an `error` field in the response body.
    #[error("{0}")]
    Backend(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Whether this failure is the bounded-wait elapsing, as opposed to a
    /// server-reported or transport failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }
}
