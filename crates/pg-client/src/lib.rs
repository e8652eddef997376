//! PhishGuard Client Core
//!
//! This crate provides the client-side core of the PhishGuard phishing-URL
//! detection service: the session store (token + current user identity),
//! the single-flight scan workflow, and the typed transport for the
//! detection API. The detection model itself runs server-side; this crate
//! only speaks its HTTP contract.

pub mod api;
pub mod models;
pub mod scan;
pub mod session;

use std::path::PathBuf;
use thiserror::Error;

pub use api::{ApiTransport, HttpApi};
pub use models::{RiskBucket, ScanReport, User};
pub use scan::{ScanState, ScanWorkflow, SubmitOutcome};
pub use session::{AuthFailure, Session, SessionStore};

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error message reported by the server, already extracted from the
    /// endpoint's error payload.
    #[error("{0}")]
    Api(String),
}

impl ClientError {
    /// Fold any failure into a single user-displayable string: the server's
    /// own message when one was reported, the operation's fallback for
    /// transport and payload failures.
    pub fn user_message(self, fallback: &str) -> String {
        match self {
            ClientError::Api(msg) => msg,
            _ => fallback.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the detection API
    pub api_base_url: String,
    /// File holding the persisted bearer token (plain string)
    pub token_path: PathBuf,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: std::env::var("PHISHGUARD_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            token_path: std::env::var("PHISHGUARD_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/token")),
            timeout_secs: 30,
            user_agent: "PhishGuard/0.1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ClientError::Api("Username already exists".to_string());
        assert_eq!(err.user_message("Login failed"), "Username already exists");
    }

    #[test]
    fn test_user_message_falls_back_on_io() {
        let err = ClientError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }
}
