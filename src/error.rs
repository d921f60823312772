//! Request-scoped error taxonomy.
//!
//! Every failure here is terminal for the current request and none is
//! fatal to the process. Conversion to a caller-facing response happens
//! exactly once, via [`IntoResponse`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::http::response::json_error;

/// Errors that end a proxied request early.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No `Authorization` header was presented.
    #[error("missing Authorization header")]
    MissingCredential,

    /// The authorization service rejected the credential (or could not
    /// be reached; the two are deliberately not distinguished).
    #[error("credential rejected by authorization service")]
    DeniedCredential,

    /// The request body could not be read or decoded.
    #[error("{0}")]
    MalformedBody(String),

    /// The outbound call to the backend did not complete.
    #[error("{0}")]
    TransportFailure(String),
}

impl ProxyError {
    /// Status code this error surfaces as.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingCredential => StatusCode::UNAUTHORIZED,
            ProxyError::DeniedCredential => StatusCode::FORBIDDEN,
            ProxyError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            // Auth failures carry no body; nothing about the collaborator
            // may leak to the caller.
            ProxyError::MissingCredential | ProxyError::DeniedCredential => {
                self.status().into_response()
            }
            ProxyError::MalformedBody(ref msg) | ProxyError::TransportFailure(ref msg) => {
                json_error(self.status(), msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ProxyError::DeniedCredential.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ProxyError::MalformedBody("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::TransportFailure("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
