//! Wire types for the detection API and the risk-bucket display mapping.

use serde::{Deserialize, Serialize};

/// Account identity as the profile and login endpoints report it.
///
/// `is_admin` gates admin-only display surfaces and nothing else; the server
/// authorizes admin endpoints independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Successful `/api/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Successful `/api/user/profile` body.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}

/// Scan verdict returned by `/api/scan`.
///
/// The backend is inconsistent about which confidence field it returns:
/// some paths send a ready-made `confidence_percentage`, others only the
/// 0..1 `confidence`. Both are kept and reconciled in
/// [`ScanReport::confidence_percent`]. `features` is opaque here; display
/// layers show at most [`MAX_FEATURES_SHOWN`] entries of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub url: String,
    pub is_phishing: bool,
    pub risk_level: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Maximum number of feature entries a display layer renders.
pub const MAX_FEATURES_SHOWN: usize = 9;

impl ScanReport {
    /// Confidence as a percentage: the server's `confidence_percentage`
    /// verbatim when present, otherwise `confidence * 100`.
    pub fn confidence_percent(&self) -> f64 {
        self.confidence_percentage
            .unwrap_or(self.confidence * 100.0)
    }

    pub fn risk_bucket(&self) -> RiskBucket {
        RiskBucket::from_percent(self.confidence_percent())
    }
}

/// Display category derived from a confidence percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskBucket {
    Safe,
    Caution,
    Danger,
}

impl RiskBucket {
    /// Fixed product thresholds: above 85 is safe, above 50 is caution,
    /// everything else is danger. Both boundaries are exclusive-high.
    pub fn from_percent(percent: f64) -> Self {
        if percent > 85.0 {
            RiskBucket::Safe
        } else if percent > 50.0 {
            RiskBucket::Caution
        } else {
            RiskBucket::Danger
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBucket::Safe => "SAFE",
            RiskBucket::Caution => "CAUTION",
            RiskBucket::Danger => "DANGER",
        }
    }
}

impl std::fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
