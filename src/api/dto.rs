//! JSON request and response bodies.

use crate::registry::{AuthOutcome, LicenseKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /api/authenticate` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthenticateRequest {
    /// License key string.
    #[serde(default)]
    pub key: Option<String>,
    /// Caller's hardware id.
    #[serde(default)]
    pub hwid: Option<String>,
}

/// `POST /api/authenticate` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticateResponse {
    /// Whether access is granted.
    pub success: bool,
    /// Human-readable reason.
    pub message: String,
    /// Machine-readable verdict.
    pub code: String,
}

impl From<AuthOutcome> for AuthenticateResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            success: outcome.success(),
            message: outcome.message().to_string(),
            code: outcome.code().to_string(),
        }
    }
}

/// `POST /api/admin/login` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Admin shared secret.
    #[serde(default)]
    pub password: Option<String>,
}

/// `POST /api/admin/keys` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateKeyRequest {
    /// Key string to create.
    #[serde(default)]
    pub key: Option<String>,
    /// `"lifetime"` or a day count, as string or number.
    #[serde(default)]
    pub expires_in: Option<Value>,
    /// Optional note.
    #[serde(default)]
    pub description: Option<String>,
}

/// Bare `{success: true}` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always true.
    pub success: bool,
}

impl SuccessResponse {
    /// The success reply.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// `GET /api/admin/keys` reply.
#[derive(Debug, Clone, Serialize)]
pub struct KeyListResponse {
    /// Always true.
    pub success: bool,
    /// Keys, newest first.
    pub keys: Vec<LicenseKey>,
}

/// Reply carrying one key record.
#[derive(Debug, Clone, Serialize)]
pub struct KeyResponse {
    /// Always true.
    pub success: bool,
    /// The affected key.
    pub key: LicenseKey,
}

/// Failure reply for any non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// What went wrong.
    pub message: String,
}

/// `GET /api/health` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` while the server is up.
    pub status: String,
}
