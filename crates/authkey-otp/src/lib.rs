//! AuthKey OTP service - phone registration with SMS one-time passcodes.
//!
//! The service:
//! - Generates a 6-digit code per registration and delivers it through AuthKey
//! - Keeps the code and the provider `LogID` in memory, keyed by phone
//! - Verifies submitted codes locally, falling back to AuthKey's verify API

pub mod api;
pub mod config;
pub mod error;
pub mod otp;
pub mod provider;
pub mod store;

pub use config::Config;
pub use error::OtpError;
pub use provider::AuthKeyClient;
pub use store::{Lookup, RegistrationStore};
