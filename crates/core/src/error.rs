//! Error taxonomy shared by the HTTP adapter, the typed API and the views.

use serde_json::Value;
use thiserror::Error;

/// Failure reported by the HTTP client adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// The request timed out or the connection could not be established.
    #[error("no response from server: {reason}")]
    NoResponse {
        /// Transport-level description of what went wrong.
        reason: String,
    },
    /// The server answered with a non-2xx status.
    #[error("server returned status {status}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: u16,
        /// Raw response body, possibly empty.
        body: String,
    },
}

impl NetworkError {
    /// Build a [`NetworkError::NoResponse`] from any displayable reason.
    pub fn no_response(reason: impl Into<String>) -> Self {
        Self::NoResponse {
            reason: reason.into(),
        }
    }

    /// True when the server never answered.
    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::NoResponse { .. })
    }

    /// The `message` field of a JSON error body, when the server sent one.
    pub fn server_message(&self) -> Option<String> {
        let Self::HttpStatus { body, .. } = self else {
            return None;
        };
        let value: Value = serde_json::from_str(body).ok()?;
        value
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    }
}

/// Every failure a view can surface to the user.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Client-side form validation failed; nothing was sent.
    #[error("{0}")]
    Validation(String),
    /// The adapter could not complete the request.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// The server answered 2xx with a body of unexpected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// A required precondition (such as being logged in) is not met.
    #[error("{0}")]
    Precondition(String),
    /// Reading or writing local storage failed.
    #[error("local storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ClientError {
    /// Server-provided message when available, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Network(err) => err.server_message().unwrap_or_else(|| fallback.to_string()),
            Self::Validation(message) | Self::Precondition(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// True when the underlying failure is a missing server response.
    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::Network(err) if err.is_no_response())
    }
}

/// Convenience alias for API results.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_server_message_from_json_body() {
        let err = NetworkError::HttpStatus {
            status: 400,
            body: r#"{"message":"Événement complet"}"#.to_string(),
        };
        assert_eq!(err.server_message().as_deref(), Some("Événement complet"));

        let plain = NetworkError::HttpStatus {
            status: 500,
            body: "Internal Server Error".to_string(),
        };
        assert_eq!(plain.server_message(), None);
        assert_eq!(NetworkError::no_response("timeout").server_message(), None);
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = ClientError::from(NetworkError::HttpStatus {
            status: 409,
            body: r#"{"message":"Déjà inscrit"}"#.to_string(),
        });
        assert_eq!(err.user_message("fallback"), "Déjà inscrit");

        let err = ClientError::MalformedResponse("missing events".to_string());
        assert_eq!(err.user_message("fallback"), "fallback");
        assert!(!err.is_no_response());
        assert!(ClientError::from(NetworkError::no_response("refused")).is_no_response());
    }
}
