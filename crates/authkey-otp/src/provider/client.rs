//! AuthKey HTTP client for sending and verifying OTPs.

use crate::config::Config;
use crate::error::OtpError;
use crate::store::mask_phone;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Provider credentials attached to every request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub authkey: Option<SecretString>,
    pub sid: Option<String>,
    pub country_code: String,
}

/// Result of a successful send.
#[derive(Debug, Clone)]
pub struct SendOtpResponse {
    /// Provider transaction identifier used for remote verification
    pub log_id: String,

    /// Full decoded provider payload
    pub payload: Value,
}

/// AuthKey client.
///
/// The API key is stored using `SecretString` so it never ends up in debug
/// output or spans.
#[derive(Clone)]
pub struct AuthKeyClient {
    client: Client,
    send_url: String,
    verify_url: String,
    credentials: Credentials,
}

impl AuthKeyClient {
    /// Create a new AuthKey client.
    pub fn new(
        credentials: Credentials,
        send_url: impl Into<String>,
        verify_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, OtpError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OtpError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            send_url: send_url.into(),
            verify_url: verify_url.into(),
            credentials,
        })
    }

    /// Create a client from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, OtpError> {
        let credentials = Credentials {
            authkey: config.authkey.clone(),
            sid: config.sid.clone(),
            country_code: config.country_code.clone(),
        };

        Self::new(
            credentials,
            &config.provider.send_url,
            &config.provider.verify_url,
            config.provider.timeout(),
        )
    }

    fn authkey(&self) -> Result<&str, OtpError> {
        self.credentials
            .authkey
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .ok_or(OtpError::Configuration("AUTHKEY"))
    }

    /// Ask the provider to deliver `otp` to `phone` by SMS.
    ///
    /// The response must be JSON carrying a `LogID`.
    #[instrument(skip_all, fields(phone = %mask_phone(phone)))]
    pub async fn send_otp(&self, phone: &str, otp: &str) -> Result<SendOtpResponse, OtpError> {
        let sid = self
            .credentials
            .sid
            .as_deref()
            .ok_or(OtpError::Configuration("2FA Template SID"))?;
        let authkey = self.authkey()?;

        debug!(url = %self.send_url, "Sending OTP request");

        let response = self
            .client
            .get(&self.send_url)
            .query(&[
                ("authkey", authkey),
                ("mobile", phone),
                ("country_code", self.credentials.country_code.as_str()),
                ("sid", sid),
                ("otp", otp),
            ])
            .send()
            .await
            .map_err(|e| request_failed("send", e))?;

        let body = read_body(response, "send").await?;
        let payload = parse_json(body.as_str(), "send")?;

        let log_id = match payload.get("LogID") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                warn!(body = %body, "Provider response missing LogID");
                return Err(OtpError::MalformedResponse(body));
            }
        };

        debug!(log_id = %log_id, "OTP accepted by provider");
        Ok(SendOtpResponse { log_id, payload })
    }

    /// Ask the provider whether `otp` matches the send identified by `log_id`.
    #[instrument(skip_all, fields(log_id = %log_id))]
    pub async fn verify_otp(&self, otp: &str, log_id: &str) -> Result<(), OtpError> {
        let authkey = self.authkey()?;

        debug!(url = %self.verify_url, "Sending verification request");

        let response = self
            .client
            .get(&self.verify_url)
            .query(&[
                ("authkey", authkey),
                ("channel", "SMS"),
                ("otp", otp),
                ("logid", log_id),
            ])
            .send()
            .await
            .map_err(|e| request_failed("verify", e))?;

        let body = read_body(response, "verify").await?;
        let payload = parse_json(body.as_str(), "verify")?;

        if payload.get("status") == Some(&Value::Bool(true)) {
            debug!("Provider confirmed OTP");
            Ok(())
        } else {
            debug!(body = %payload, "Provider rejected OTP");
            Err(OtpError::RemoteRejection)
        }
    }
}

fn request_failed(operation: &'static str, e: reqwest::Error) -> OtpError {
    let err = OtpError::transport(operation, e);
    if let OtpError::Transport { body, .. } = &err {
        warn!(error = %body, operation, "Provider unreachable");
    }
    err
}

/// Require a success status and return the raw body text.
async fn read_body(response: Response, operation: &'static str) -> Result<String, OtpError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        let mut err = request_failed(operation, e);
        if let OtpError::Transport { status: s, .. } = &mut err {
            s.get_or_insert(status.as_u16());
        }
        err
    })?;

    if !status.is_success() {
        warn!(%status, body = %body, operation, "Provider request failed");
        return Err(OtpError::Transport {
            operation,
            status: Some(status.as_u16()),
            body,
        });
    }

    Ok(body)
}

fn parse_json(body: &str, operation: &str) -> Result<Value, OtpError> {
    serde_json::from_str(body).map_err(|_| {
        warn!(body = %body, operation, "Provider returned non-JSON body");
        OtpError::MalformedResponse(body.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            authkey: Some(SecretString::new("test-key".into())),
            sid: Some("1234".into()),
            country_code: "91".into(),
        }
    }

    fn create_test_client(mock_server: &MockServer, credentials: Credentials) -> AuthKeyClient {
        AuthKeyClient::new(
            credentials,
            format!("{}/request", mock_server.uri()),
            format!("{}/api/2fa_verify.php", mock_server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_otp_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/request"))
            .and(query_param("authkey", "test-key"))
            .and(query_param("mobile", "+911234567890"))
            .and(query_param("country_code", "91"))
            .and(query_param("sid", "1234"))
            .and(query_param("otp", "482193"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"LogID": "abc123", "Message": "Submitted"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let result = client.send_otp("+911234567890", "482193").await.unwrap();

        assert_eq!(result.log_id, "abc123");
        assert_eq!(result.payload["Message"], "Submitted");
    }

    #[tokio::test]
    async fn test_send_otp_numeric_log_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/request"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"LogID": 987})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let result = client.send_otp("+911234567890", "482193").await.unwrap();

        assert_eq!(result.log_id, "987");
    }

    #[tokio::test]
    async fn test_send_otp_without_sid() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut creds = credentials();
        creds.sid = None;
        let client = create_test_client(&mock_server, creds);

        let err = client.send_otp("+911234567890", "482193").await.unwrap_err();
        assert!(matches!(err, OtpError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_send_otp_without_authkey() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut creds = credentials();
        creds.authkey = None;
        let client = create_test_client(&mock_server, creds);

        let err = client.send_otp("+911234567890", "482193").await.unwrap_err();
        assert!(matches!(err, OtpError::Configuration("AUTHKEY")));
    }

    #[tokio::test]
    async fn test_verify_otp_without_authkey() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut creds = credentials();
        creds.authkey = None;
        let client = create_test_client(&mock_server, creds);

        let err = client.verify_otp("482193", "abc123").await.unwrap_err();
        assert!(matches!(err, OtpError::Configuration("AUTHKEY")));
    }

    #[tokio::test]
    async fn test_send_otp_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/request"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let err = client.send_otp("+911234567890", "482193").await.unwrap_err();

        match err {
            OtpError::Transport { status, body, .. } => {
                assert_eq!(status, Some(503));
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_otp_non_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/request"))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let err = client.send_otp("+911234567890", "482193").await.unwrap_err();

        assert!(matches!(err, OtpError::MalformedResponse(body) if body == "OK"));
    }

    #[tokio::test]
    async fn test_send_otp_missing_log_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/request"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"Message": "Invalid sid"})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let err = client.send_otp("+911234567890", "482193").await.unwrap_err();

        assert!(matches!(err, OtpError::MalformedResponse(body) if body.contains("Invalid sid")));
    }

    #[tokio::test]
    async fn test_verify_otp_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2fa_verify.php"))
            .and(query_param("authkey", "test-key"))
            .and(query_param("channel", "SMS"))
            .and(query_param("otp", "482193"))
            .and(query_param("logid", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        assert!(client.verify_otp("482193", "abc123").await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_otp_rejected() {
        let mock_server = MockServer::start().await;

        // Only a literal boolean true counts
        Mock::given(method("GET"))
            .and(path("/api/2fa_verify.php"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "true"})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let err = client.verify_otp("000000", "abc123").await.unwrap_err();

        assert!(matches!(err, OtpError::RemoteRejection));
    }

    #[tokio::test]
    async fn test_verify_otp_http_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2fa_verify.php"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let err = client.verify_otp("482193", "abc123").await.unwrap_err();

        assert!(matches!(err, OtpError::Transport { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn test_verify_otp_non_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/2fa_verify.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server, credentials());
        let err = client.verify_otp("482193", "abc123").await.unwrap_err();

        assert!(matches!(err, OtpError::MalformedResponse(_)));
    }

    /// Serve one response whose body ends before its declared length.
    async fn truncated_body_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"LogID\"",
                    )
                    .await;
            }
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_send_otp_body_read_failure() {
        let base = truncated_body_server().await;
        let client = AuthKeyClient::new(
            credentials(),
            format!("{}/request", base),
            format!("{}/api/2fa_verify.php", base),
            Duration::from_secs(5),
        )
        .unwrap();

        let err = client.send_otp("+911234567890", "482193").await.unwrap_err();

        match err {
            OtpError::Transport { status, body, .. } => {
                assert_eq!(status, Some(200));
                assert!(!body.contains("test-key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
