//! Pending OTP and provider transaction records, keyed by phone number.

mod memory;

pub use memory::{Lookup, RegistrationStore};

use chrono::{DateTime, Utc};

/// A locally issued code awaiting verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    /// The 6-digit code sent to the phone
    pub code: String,

    /// When the code was issued
    pub issued_at: DateTime<Utc>,
}

/// A provider send operation that can be verified remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Provider-issued `LogID`
    pub log_id: String,

    /// When the provider accepted the send
    pub issued_at: DateTime<Utc>,
}

/// Mask a phone number for log output, keeping the last four digits.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }

    let visible = chars.len() - 4;
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i < visible && c.is_ascii_digit() { '*' } else { *c })
        .collect()
}
