//! Error taxonomy shared by the auth and api layers

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DynamicsError>;

#[derive(Debug, Error)]
pub enum DynamicsError {
    /// Required configuration or credential value is missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Token acquisition failed (identity provider rejected it, user cancelled, timeout)
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Dynamics answered with a non-success status
    #[error("request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    /// Response body was not JSON, or not the expected shape
    #[error("malformed response: {0}")]
    Decode(String),

    /// Caller input rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// Transport failure talking to Dynamics
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token cache i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// OS credential store refused or failed a read or write
    #[error("credential store error: {0}")]
    SecretStore(#[from] keyring::Error),
}

impl DynamicsError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Status code carried by a request error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_display() {
        let err = DynamicsError::Request {
            status: 404,
            message: "Resource not found".to_string(),
        };
        assert_eq!(err.to_string(), "request failed with status 404: Resource not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = DynamicsError::validation("Account ID must be a valid GUID");
        assert_eq!(err.to_string(), "Account ID must be a valid GUID");
        assert_eq!(err.status(), None);
    }
}
