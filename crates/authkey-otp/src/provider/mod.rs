//! AuthKey SMS provider gateway.

mod client;

pub use client::{AuthKeyClient, Credentials, SendOtpResponse};
