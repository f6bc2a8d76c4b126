//! One-time passcode generation.

use rand::Rng;

/// Smallest code that can be issued.
pub const OTP_MIN: u32 = 100_000;

/// Largest code that can be issued.
pub const OTP_MAX: u32 = 999_999;

/// Generate a 6-digit numeric code, uniform over `OTP_MIN..=OTP_MAX`.
///
/// Draws from the thread-local generator, which is a CSPRNG reseeded from
/// the operating system.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX).to_string()
}
