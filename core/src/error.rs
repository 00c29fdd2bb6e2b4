//! Error types for the Yampi API client.
//!
//! # Design
//! `InvalidTokenType` is a caller bug and is raised synchronously before any
//! state changes. Everything that goes wrong while talking to the API
//! (no response, non-2xx, an auth response missing its fields) is a
//! request-class error; `is_request_error` groups those so callers can
//! handle them uniformly. `NotFound` keeps its own variant because callers
//! frequently branch on it.

use thiserror::Error;

/// Errors returned by the request builder, auth helper and envelope parser.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Token configuration was attempted with an unknown token type.
    #[error("invalid token type `{0}`. Available: bearer, user-token")]
    InvalidTokenType(String),

    /// The HTTP call produced no response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body was not the JSON document the operation expects.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Base URL, merchant alias and route do not form a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// True for failures of the underlying HTTP exchange.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            ApiError::Transport(_)
                | ApiError::NotFound
                | ApiError::HttpError { .. }
                | ApiError::MalformedResponse(_)
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_token_type_lists_available_types() {
        let err = ApiError::InvalidTokenType("basic".to_string());
        assert_eq!(
            err.to_string(),
            "invalid token type `basic`. Available: bearer, user-token"
        );
        assert!(!err.is_request_error());
    }

    #[test]
    fn request_errors_are_grouped() {
        assert!(ApiError::NotFound.is_request_error());
        assert!(ApiError::Transport("refused".into()).is_request_error());
        assert!(ApiError::HttpError { status: 401, body: String::new() }.is_request_error());
        assert!(!ApiError::SerializationError("x".into()).is_request_error());
    }

    #[test]
    fn status_is_exposed() {
        assert_eq!(ApiError::NotFound.status(), Some(404));
        assert_eq!(
            ApiError::HttpError { status: 422, body: String::new() }.status(),
            Some(422)
        );
        assert_eq!(ApiError::Transport("x".into()).status(), None);
    }
}
