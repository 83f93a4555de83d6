//! License key records.

use crate::policy::expiry::Expiry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a key.
///
/// Only `Active` keys can authenticate. `Expired` and `Banned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// Usable.
    Active,
    /// Expiry was detected during authentication.
    Expired,
    /// Disabled by an administrator.
    Banned,
}

impl KeyStatus {
    /// Stored text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            "banned" => Ok(Self::Banned),
            other => Err(format!("unknown key status: {other}")),
        }
    }
}

/// A persisted license key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LicenseKey {
    /// Storage-assigned identity.
    pub id: i64,

    /// The key string clients present. Unique, case-sensitive.
    pub key: String,

    /// Current lifecycle status.
    pub status: KeyStatus,

    /// Hardware id fixed by the first successful authentication.
    pub hwid: Option<String>,

    /// Successful authentications so far.
    pub uses: u64,

    /// When the key stops authenticating.
    pub expires_at: Expiry,

    /// Free-text note set at creation.
    pub description: Option<String>,

    /// When the key was created.
    pub created_at: DateTime<Utc>,
}

impl LicenseKey {
    /// The hardware id this key is bound to, if any.
    ///
    /// An empty stored hwid counts as unbound.
    pub fn bound_hwid(&self) -> Option<&str> {
        self.hwid.as_deref().filter(|h| !h.is_empty())
    }
}

/// Fields supplied when inserting a key; storage assigns the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLicenseKey {
    /// The key string.
    pub key: String,
    /// Resolved expiry.
    pub expires_at: Expiry,
    /// Optional note.
    pub description: Option<String>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(hwid: Option<&str>) -> LicenseKey {
        LicenseKey {
            id: 1,
            key: "ABC-123".to_string(),
            status: KeyStatus::Active,
            hwid: hwid.map(String::from),
            uses: 0,
            expires_at: Expiry::Never,
            description: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [KeyStatus::Active, KeyStatus::Expired, KeyStatus::Banned] {
            assert_eq!(status.as_str().parse::<KeyStatus>().unwrap(), status);
        }
        assert!("revoked".parse::<KeyStatus>().is_err());
    }

    #[test]
    fn test_bound_hwid_ignores_empty() {
        assert_eq!(record(None).bound_hwid(), None);
        assert_eq!(record(Some("")).bound_hwid(), None);
        assert_eq!(record(Some("PC1")).bound_hwid(), Some("PC1"));
    }

    #[test]
    fn test_serializes_for_admin_listing() {
        let json = serde_json::to_value(record(Some("PC1"))).unwrap();
        assert_eq!(json["key"], "ABC-123");
        assert_eq!(json["status"], "active");
        assert_eq!(json["hwid"], "PC1");
        assert_eq!(json["uses"], 0);
        assert!(json["expires_at"].is_null());
        assert_eq!(json["created_at"], "2025-01-15T12:00:00Z");
    }
}
