use thiserror::Error;

/// Failure shape shared by every API module, hook and coordinator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Transport failure; no response was received.
    #[error("{0}")]
    Network(String),

    /// The backend answered with a failure status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// Rejected locally before any request was issued.
    #[error("{0}")]
    Validation(String),

    /// Stored credentials were rejected while restoring a session.
    #[error("{0}")]
    Auth(String),

    /// The response body did not match the expected shape.
    #[error("unexpected response payload: {0}")]
    Decode(String),

    /// Persisted client state could not be read or written.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    /// Human-readable text surfaced to status banners and hook state.
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_backend_message() {
        let err = ClientError::Http {
            status: 404,
            message: "Project not found".to_string(),
        };
        assert_eq!(err.message(), "Project not found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn unauthorized_covers_401_and_403() {
        let err = ClientError::Http {
            status: 401,
            message: "Not authorized".to_string(),
        };
        assert!(err.is_unauthorized());
        assert!(!ClientError::Network("offline".into()).is_unauthorized());
    }

    #[test]
    fn json_errors_become_decode_failures() {
        let err: ClientError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ClientError::Decode(_)));
    }
}
