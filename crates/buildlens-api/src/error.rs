use thiserror::Error;

/// Error taxonomy shared by resolution, transport and the application layer
#[derive(Error, Debug)]
pub enum LensError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid job reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LensError {
    pub fn invalid_reference(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Errors worth another attempt against the same server
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkError(_) | Self::ApiError(_))
    }
}

pub type LensResult<T> = Result<T, LensError>;

impl From<serde_json::Error> for LensError {
    fn from(err: serde_json::Error) -> Self {
        LensError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_reference_echoes_input() {
        let err = LensError::invalid_reference("https://ci/view/All", "no job segment");
        assert_eq!(
            err.to_string(),
            "Invalid job reference 'https://ci/view/All': no job segment"
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(LensError::NetworkError("reset".into()).is_transient());
        assert!(LensError::ApiError("HTTP 502".into()).is_transient());
        assert!(!LensError::NotFound("job".into()).is_transient());
        assert!(!LensError::AuthenticationFailed("401".into()).is_transient());
    }
}
