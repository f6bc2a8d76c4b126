//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to register a user and send them an OTP.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,

    /// Must be a syntactically valid address
    pub email: String,

    pub phone: String,
}

/// Response after the provider accepted the OTP.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub phone: String,

    /// Decoded provider payload, passed through untouched
    pub api_response: Value,
}

/// Request to verify a submitted OTP.
#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub phone: String,
    pub otp: String,
}

/// Plain message response used by verification and liveness.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
