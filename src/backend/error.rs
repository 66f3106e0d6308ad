//! Error types for backend access

use thiserror::Error;

/// Errors returned by the content, progress and identity services
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend URL or API key missing from the configuration
    #[error("Backend not configured. Set backend_url and api_key in config.json")]
    NotConfigured,

    /// The action needs a signed-in user
    #[error("You need to sign in first")]
    NotSignedIn,

    /// The signed-in user lacks the admin role
    #[error("Admin access required")]
    Forbidden,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The backend returned an error response
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Sign-in rejected
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Sign-up accepted but the account must be confirmed by email
    #[error("Check your inbox to confirm {0}, then sign in")]
    ConfirmationRequired(String),

    /// Failed to access the system keyring
    #[error("Failed to access keyring: {0}")]
    KeyringError(String),

    /// A referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Local file could not be read for upload
    #[error("File error: {0}")]
    IoError(#[from] std::io::Error),
}

impl BackendError {
    /// Whether the user can reasonably retry the same action
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BackendError::RequestError(_) | BackendError::ApiError { status: 500..=599, .. })
    }

    /// Whether the stored session should be dropped
    pub fn requires_reauth(&self) -> bool {
        matches!(self, BackendError::NotSignedIn | BackendError::ApiError { status: 401, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_recoverable() {
        let err = BackendError::ApiError { status: 503, message: "busy".into() };
        assert!(err.is_recoverable());
        let err = BackendError::ApiError { status: 400, message: "bad".into() };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn unauthorized_requires_reauth() {
        let err = BackendError::ApiError { status: 401, message: "JWT expired".into() };
        assert!(err.requires_reauth());
        assert!(!BackendError::Forbidden.requires_reauth());
    }
}
