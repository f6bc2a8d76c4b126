//! HTTP request handlers.

use super::types::{MessageResponse, RegisterRequest, RegisterResponse, VerifyOtpRequest};
use super::AppState;
use crate::error::OtpError;
use crate::otp::generate_otp;
use crate::store::{mask_phone, Lookup};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use email_address::EmailAddress;
use tracing::{debug, info, warn};

const VERIFIED_MESSAGE: &str = "OTP verified successfully!";

/// Liveness endpoint.
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("AuthKey OTP service running"))
}

/// Generate an OTP for the phone and have the provider deliver it.
///
/// The code is stored before the send, so a failed send leaves it in place
/// and a later verification against it still works.
pub async fn register_user(
    State(state): State<AppState>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, OtpError> {
    let Json(request) = request?;

    if !EmailAddress::is_valid(&request.email) {
        return Err(OtpError::InvalidRequest(format!(
            "invalid email address: {}",
            request.email
        )));
    }

    let phone = request.phone;
    info!(phone = %mask_phone(&phone), "Registration request received");
    debug!(full_name = %request.full_name, email = %request.email, "Registrant details");

    let otp = generate_otp();
    state.store.write().await.insert_otp(&phone, otp.clone());

    let sent = state.provider.send_otp(&phone, &otp).await.map_err(|e| {
        warn!(phone = %mask_phone(&phone), error = %e, "OTP delivery failed");
        e
    })?;

    let mut store = state.store.write().await;
    store.insert_transaction(&phone, sent.log_id);
    debug!(
        pending_otps = store.otp_count(),
        pending_transactions = store.transaction_count(),
        "Registration store updated"
    );
    drop(store);

    info!(phone = %mask_phone(&phone), "OTP sent");

    Ok(Json(RegisterResponse {
        message: "OTP sent successfully".to_string(),
        phone,
        api_response: sent.payload,
    }))
}

/// Verify a submitted OTP.
///
/// A locally stored code is checked first. Only when none exists is the
/// provider asked, using the transaction recorded at registration.
pub async fn verify_otp(
    State(state): State<AppState>,
    request: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, OtpError> {
    let Json(request) = request?;
    let phone = request.phone;
    info!(phone = %mask_phone(&phone), "Verification request received");

    let mut store = state.store.write().await;

    match store.lookup(&phone) {
        Lookup::Local(code) => {
            if code != request.otp {
                warn!(phone = %mask_phone(&phone), "Invalid OTP submitted");
                return Err(OtpError::InvalidOtp);
            }

            store.clear(&phone);
            info!(phone = %mask_phone(&phone), "OTP verified locally");
            Ok(Json(MessageResponse::new(VERIFIED_MESSAGE)))
        }
        Lookup::Remote(log_id) => {
            // Never hold the store across the provider call
            drop(store);

            state.provider.verify_otp(&request.otp, &log_id).await?;

            if !state
                .store
                .write()
                .await
                .remove_transaction_if(&phone, &log_id)
            {
                debug!(phone = %mask_phone(&phone), "Transaction replaced during verification");
            }

            info!(phone = %mask_phone(&phone), "OTP verified by provider");
            Ok(Json(MessageResponse::new(VERIFIED_MESSAGE)))
        }
        Lookup::Missing => {
            warn!(phone = %mask_phone(&phone), "No pending OTP request");
            Err(OtpError::NoPendingRequest)
        }
    }
}
