//! Error types for the OTP service.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Service error types.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error("{0} not configured")]
    Configuration(&'static str),

    /// `status` is `None` when no response arrived. `body` is kept for logs
    /// only and never reaches the HTTP caller.
    #[error("Failed to {operation} OTP")]
    Transport {
        operation: &'static str,
        status: Option<u16>,
        body: String,
    },

    #[error("Invalid response from AuthKey: {0}")]
    MalformedResponse(String),

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("No OTP request found for this phone")]
    NoPendingRequest,

    #[error("Invalid OTP")]
    RemoteRejection,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}

impl OtpError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            OtpError::Configuration(_)
            | OtpError::Transport { .. }
            | OtpError::MalformedResponse(_)
            | OtpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OtpError::InvalidOtp | OtpError::NoPendingRequest | OtpError::RemoteRejection => {
                StatusCode::BAD_REQUEST
            }
            OtpError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            OtpError::Configuration(_) => "CONFIGURATION_ERROR",
            OtpError::Transport { .. } => "PROVIDER_TRANSPORT_ERROR",
            OtpError::MalformedResponse(_) => "PROVIDER_MALFORMED_RESPONSE",
            OtpError::InvalidOtp | OtpError::RemoteRejection => "INVALID_OTP",
            OtpError::NoPendingRequest => "NO_PENDING_REQUEST",
            OtpError::InvalidRequest(_) => "INVALID_REQUEST",
            OtpError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for OtpError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.to_string(),
            code: self.code().to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl OtpError {
    /// Wrap a client error from a provider call.
    ///
    /// The request URL carries the API key and the code in its query string,
    /// so it is stripped before the error is kept anywhere.
    pub fn transport(operation: &'static str, e: reqwest::Error) -> Self {
        OtpError::Transport {
            operation,
            status: e.status().map(|s| s.as_u16()),
            body: e.without_url().to_string(),
        }
    }
}

impl From<JsonRejection> for OtpError {
    fn from(rejection: JsonRejection) -> Self {
        OtpError::InvalidRequest(rejection.body_text())
    }
}
