//! Scan workflow: drives one URL scan at a time.
//!
//! States move `Idle -> Scanning -> (Succeeded | Failed) -> Idle` on reset
//! or the next submission. Overlapping submissions supersede each other:
//! every submission takes a fresh sequence number and a settling response
//! is applied only while its number is still the newest issued, so "submit
//! A, then B before A settles" always leaves B's terminal state no matter
//! which response arrives first.

use crate::api::{ApiTransport, SCAN_FALLBACK};
use crate::models::ScanReport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Validation message for an empty submission. Resolved locally; no network
/// call is made.
pub const EMPTY_URL_MESSAGE: &str = "Please enter a URL to scan";

/// Observable workflow state. At most one result is live at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanState {
    Idle,
    Scanning,
    Succeeded(ScanReport),
    Failed(String),
}

/// What a single `submit` call resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The scan completed and its report is the live result.
    Completed(ScanReport),
    /// Rejected locally before any network call.
    Rejected(String),
    /// The request failed; the message is user-displayable.
    Failed(String),
    /// A newer submission was issued while this one was in flight; its
    /// response was discarded.
    Superseded,
}

/// Prepend the default scheme unless one is already present. The default is
/// exactly `http://`; the backend upgrades or probes as it sees fit.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

pub struct ScanWorkflow {
    api: Arc<dyn ApiTransport>,
    state: Mutex<ScanState>,
    seq: AtomicU64,
}

impl ScanWorkflow {
    pub fn new(api: Arc<dyn ApiTransport>) -> Self {
        Self {
            api,
            state: Mutex::new(ScanState::Idle),
            seq: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ScanState {
        self.state.lock().unwrap().clone()
    }

    /// Submit a URL for scanning.
    ///
    /// The raw input is trimmed and scheme-normalized; an empty input fails
    /// locally without a network call. The bearer token is attached iff the
    /// caller passes one — anonymous scans are a supported path, not a
    /// degraded one.
    pub async fn submit(&self, raw_url: &str, token: Option<&str>) -> SubmitOutcome {
        let trimmed = raw_url.trim();
        if trimmed.is_empty() {
            let message = EMPTY_URL_MESSAGE.to_string();
            *self.state.lock().unwrap() = ScanState::Failed(message.clone());
            return SubmitOutcome::Rejected(message);
        }

        let url = normalize_url(trimmed);
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        *self.state.lock().unwrap() = ScanState::Scanning;
        debug!("scanning {url} (request {seq})");

        let result = self.api.scan(&url, token).await;

        let mut state = self.state.lock().unwrap();
        if self.seq.load(Ordering::SeqCst) != seq {
            debug!("scan response for request {seq} superseded, discarding");
            return SubmitOutcome::Superseded;
        }

        match result {
            Ok(report) => {
                *state = ScanState::Succeeded(report.clone());
                SubmitOutcome::Completed(report)
            }
            Err(err) => {
                let message = err.user_message(SCAN_FALLBACK);
                *state = ScanState::Failed(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Return to `Idle`, discarding any result or error. In-flight
    /// responses are invalidated, so the workflow is observationally a
    /// fresh one.
    pub fn reset(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = ScanState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoginResponse, User};
    use crate::{ClientError, ClientResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn report_for(url: &str) -> ScanReport {
        ScanReport {
            url: url.to_string(),
            is_phishing: false,
            risk_level: "Low".to_string(),
            confidence: 0.97,
            confidence_percentage: Some(97.0),
            features: Some(serde_json::Map::new()),
        }
    }

    /// Transport fake whose scans can be parked on per-host gates so tests
    /// control response ordering.
    #[derive(Default)]
    struct GatedApi {
        scan_calls: AtomicUsize,
        gates: HashMap<String, Notify>,
        entered: Notify,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl ApiTransport for GatedApi {
        async fn login(&self, _: &str, _: &str) -> ClientResult<LoginResponse> {
            Err(ClientError::Api("not under test".to_string()))
        }

        async fn register(&self, _: &str, _: &str, _: &str) -> ClientResult<()> {
            Err(ClientError::Api("not under test".to_string()))
        }

        async fn profile(&self, _: &str) -> ClientResult<User> {
            Err(ClientError::Api("not under test".to_string()))
        }

        async fn scan(&self, url: &str, _: Option<&str>) -> ClientResult<ScanReport> {
            self.scan_calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            if let Some(gate) = self.gates.get(url) {
                gate.notified().await;
            }
            match &self.fail_with {
                Some(msg) => Err(ClientError::Api(msg.clone())),
                None => Ok(report_for(url)),
            }
        }
    }

    #[test]
    fn test_normalize_prepends_default_scheme() {
        assert_eq!(normalize_url("example.com"), "http://example.com");
        assert_eq!(normalize_url("https://x.com"), "https://x.com");
        assert_eq!(normalize_url("  http://x.com  "), "http://x.com");
        assert_eq!(normalize_url("ftp.example.com"), "http://ftp.example.com");
    }

    #[tokio::test]
    async fn test_empty_submit_rejected_without_network() {
        let api = Arc::new(GatedApi::default());
        let workflow = ScanWorkflow::new(api.clone());

        for input in ["", "   "] {
            let outcome = workflow.submit(input, None).await;
            assert_eq!(outcome, SubmitOutcome::Rejected(EMPTY_URL_MESSAGE.to_string()));
            assert_eq!(workflow.state(), ScanState::Failed(EMPTY_URL_MESSAGE.to_string()));
        }
        assert_eq!(api.scan_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_scan_holds_report() {
        let api = Arc::new(GatedApi::default());
        let workflow = ScanWorkflow::new(api);

        let outcome = workflow.submit("example.com", None).await;
        let report = match outcome {
            SubmitOutcome::Completed(report) => report,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(report.url, "http://example.com");
        assert_eq!(workflow.state(), ScanState::Succeeded(report));
    }

    #[tokio::test]
    async fn test_failed_scan_surfaces_server_message() {
        let api = Arc::new(GatedApi {
            fail_with: Some("URL is required".to_string()),
            ..GatedApi::default()
        });
        let workflow = ScanWorkflow::new(api);

        let outcome = workflow.submit("example.com", None).await;
        assert_eq!(outcome, SubmitOutcome::Failed("URL is required".to_string()));
        assert_eq!(workflow.state(), ScanState::Failed("URL is required".to_string()));
    }

    #[tokio::test]
    async fn test_newer_submission_wins_regardless_of_arrival_order() {
        let mut gates = HashMap::new();
        gates.insert("http://slow.example".to_string(), Notify::new());
        let api = Arc::new(GatedApi {
            gates,
            ..GatedApi::default()
        });
        let workflow = Arc::new(ScanWorkflow::new(api.clone()));

        let first = {
            let workflow = workflow.clone();
            tokio::spawn(async move { workflow.submit("slow.example", None).await })
        };
        // Wait until the first request is actually parked in the transport.
        api.entered.notified().await;

        let second = workflow.submit("fast.example", None).await;
        assert!(matches!(second, SubmitOutcome::Completed(_)));

        // Release the stale response; it must not clobber the newer result.
        api.gates["http://slow.example"].notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Superseded);

        match workflow.state() {
            ScanState::Succeeded(report) => assert_eq!(report.url, "http://fast.example"),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_matches_fresh_workflow() {
        let api = Arc::new(GatedApi::default());
        let workflow = ScanWorkflow::new(api.clone());

        workflow.submit("example.com", None).await;
        assert!(matches!(workflow.state(), ScanState::Succeeded(_)));

        workflow.reset();
        assert_eq!(workflow.state(), ScanState::Idle);
        assert_eq!(workflow.state(), ScanWorkflow::new(api).state());
    }
}
