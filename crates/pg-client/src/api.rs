//! Transport layer for the detection API.
//!
//! [`ApiTransport`] is the seam between the stores and the network: every
//! method takes its bearer token explicitly, so callers work identically
//! with or without a session and tests can substitute in-memory fakes.
//! [`HttpApi`] is the production implementation.

use crate::models::{LoginResponse, ProfileResponse, ScanReport, User};
use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use serde_json::json;

/// Fallback shown when login fails without a server-reported message.
pub const LOGIN_FALLBACK: &str = "Login failed";
/// Fallback shown when registration fails without a server-reported message.
pub const REGISTER_FALLBACK: &str = "Registration failed";
/// Fallback shown when a scan fails without a server-reported message.
pub const SCAN_FALLBACK: &str = "Failed to scan URL. Please try again.";

/// The detection API, one method per endpoint.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// POST `/api/login` with `{username, password}`.
    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse>;

    /// POST `/api/register` with `{username, email, password}`. The success
    /// body carries nothing the client uses.
    async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<()>;

    /// GET `/api/user/profile` with a required bearer token. Any non-2xx
    /// response means the token is no longer a valid session.
    async fn profile(&self, token: &str) -> ClientResult<User>;

    /// POST `/api/scan` with `{url}`; the bearer token is optional and
    /// anonymous scans are a supported path.
    async fn scan(&self, url: &str, token: Option<&str>) -> ClientResult<ScanReport>;
}

/// Which key the endpoint reports its error text under. The backend uses
/// `error` for login and scan but `message` for register; the mismatch is
/// part of the wire contract and is preserved rather than unified.
#[derive(Clone, Copy)]
enum ErrorField {
    Error,
    Message,
}

impl ErrorField {
    fn key(self) -> &'static str {
        match self {
            ErrorField::Error => "error",
            ErrorField::Message => "message",
        }
    }
}

fn message_in(body: &serde_json::Value, field: ErrorField) -> Option<String> {
    body.get(field.key())?.as_str().map(str::to_owned)
}

/// reqwest-backed [`ApiTransport`].
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Extract the endpoint's error text from a non-2xx response, falling
    /// back when the body is missing, malformed, or lacks the field.
    async fn server_error(
        resp: reqwest::Response,
        field: ErrorField,
        fallback: &str,
    ) -> ClientError {
        let msg = match resp.json::<serde_json::Value>().await {
            Ok(body) => message_in(&body, field),
            Err(_) => None,
        };
        ClientError::Api(msg.unwrap_or_else(|| fallback.to_string()))
    }
}

#[async_trait]
impl ApiTransport for HttpApi {
    async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        let resp = self
            .http
            .post(self.endpoint("/api/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(Self::server_error(resp, ErrorField::Error, LOGIN_FALLBACK).await)
        }
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> ClientResult<()> {
        let resp = self
            .http
            .post(self.endpoint("/api/register"))
            .json(&json!({ "username": username, "email": email, "password": password }))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::server_error(resp, ErrorField::Message, REGISTER_FALLBACK).await)
        }
    }

    async fn profile(&self, token: &str) -> ClientResult<User> {
        let resp = self
            .http
            .get(self.endpoint("/api/user/profile"))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?;

        let profile: ProfileResponse = resp.json().await?;
        Ok(profile.user)
    }

    async fn scan(&self, url: &str, token: Option<&str>) -> ClientResult<ScanReport> {
        let mut req = self
            .http
            .post(self.endpoint("/api/scan"))
            .json(&json!({ "url": url }));

        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;

        if resp.status().is_success() {
            Ok(resp.json().await?)
        } else {
            Err(Self::server_error(resp, ErrorField::Error, SCAN_FALLBACK).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_in_honors_field_per_endpoint() {
        let body = json!({ "error": "Invalid username or password" });
        assert_eq!(
            message_in(&body, ErrorField::Error).as_deref(),
            Some("Invalid username or password")
        );
        assert_eq!(message_in(&body, ErrorField::Message), None);

        let body = json!({ "message": "Username already exists" });
        assert_eq!(
            message_in(&body, ErrorField::Message).as_deref(),
            Some("Username already exists")
        );
        assert_eq!(message_in(&body, ErrorField::Error), None);
    }

    #[test]
    fn test_message_in_ignores_non_string_fields() {
        let body = json!({ "error": { "code": 42 } });
        assert_eq!(message_in(&body, ErrorField::Error), None);
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ClientConfig {
            api_base_url: "http://localhost:5000/".to_string(),
            ..ClientConfig::default()
        };
        let api = HttpApi::new(&config).unwrap();
        assert_eq!(api.endpoint("/api/scan"), "http://localhost:5000/api/scan");
    }
}
