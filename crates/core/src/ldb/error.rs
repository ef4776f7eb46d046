//! Remote service error types and failure classification.

use std::fmt;

use thiserror::Error;

/// Errors from the LDB remote service client.
#[derive(Debug, Error)]
pub enum LdbError {
    /// HTTP request failed (connection refused, DNS, timeout).
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("remote service error {status}: {message}")]
    Api {
        /// HTTP status code, or 0 when no response was produced.
        status: u16,
        /// Response body or local description.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {message}")]
    Json {
        /// Decoder failure description.
        message: String,
        /// Leading snippet of the offending body, for the log.
        body: Option<String>,
    },

    /// The bearer token was rejected.
    #[error("unauthorized: bearer token rejected")]
    Unauthorized,

    /// Service details not found (expired or invalid id).
    #[error("service not found (expired or invalid id)")]
    ServiceNotFound,
}

/// Coarse classification used when surfacing a failure to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never completed: connectivity, DNS, timeout.
    Network,
    /// The service completed the exchange but reported or produced an error.
    RemoteService,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => f.write_str("network"),
            FailureKind::RemoteService => f.write_str("remote service"),
        }
    }
}

impl LdbError {
    /// Classify this error for user-facing messages.
    pub fn kind(&self) -> FailureKind {
        match self {
            LdbError::Http(_) => FailureKind::Network,
            _ => FailureKind::RemoteService,
        }
    }
}

/// One-line description of a failed operation, suitable for the messages
/// panel: `"{context} ({kind}): {error}"`.
pub fn failure_message(context: &str, err: &LdbError) -> String {
    format!("{context} ({kind}): {err}", kind = err.kind())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = LdbError::ServiceNotFound;
        assert_eq!(err.to_string(), "service not found (expired or invalid id)");

        let err = LdbError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "remote service error 500: Internal Server Error");

        let err = LdbError::Json {
            message: "expected string".into(),
            body: Some("{}".into()),
        };
        assert!(err.to_string().contains("malformed response"));
        assert!(err.to_string().contains("expected string"));
    }

    #[test]
    fn classification() {
        let remote = [
            LdbError::Api {
                status: 503,
                message: String::new(),
            },
            LdbError::Json {
                message: String::new(),
                body: None,
            },
            LdbError::Unauthorized,
            LdbError::ServiceNotFound,
        ];
        for err in remote {
            assert_eq!(err.kind(), FailureKind::RemoteService);
        }
    }

    #[test]
    fn failure_message_includes_kind_and_context() {
        let err = LdbError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(
            failure_message("Board refresh failed", &err),
            "Board refresh failed (remote service): remote service error 503: unavailable"
        );
    }
}
