//! Configuration for the OTP service.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Service configuration.
///
/// Provider credentials are read from flat variables (`AUTHKEY`, `SID`,
/// `COUNTRY_CODE`); everything else is nested with a `__` separator,
/// e.g. `SERVER__PORT`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// AuthKey API key
    #[serde(default)]
    pub authkey: Option<SecretString>,

    /// 2FA template / sender identifier
    #[serde(default)]
    pub sid: Option<String>,

    /// Country code sent with every OTP request
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Provider endpoint configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// OTP policy configuration
    #[serde(default)]
    pub otp: OtpConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Send-OTP endpoint
    #[serde(default = "default_send_url")]
    pub send_url: String,

    /// Verify-OTP endpoint
    #[serde(default = "default_verify_url")]
    pub verify_url: String,

    /// Outbound request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtpConfig {
    /// Lifetime of pending records. Unset means they never expire.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            send_url: default_send_url(),
            verify_url: default_verify_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_country_code() -> String {
    "91".into()
}

fn default_send_url() -> String {
    "https://api.authkey.io/request".into()
}

fn default_verify_url() -> String {
    "https://console.authkey.io/api/2fa_verify.php".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".into()
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl OtpConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
