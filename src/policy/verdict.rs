//! Authentication decision for a single attempt.
//!
//! This module decides, without touching storage, what an authentication
//! attempt should do to a key:
//! 1. Status must be active
//! 2. Expiry must not have passed
//! 3. An unbound key binds to the caller's hwid
//! 4. A bound key requires the same hwid
//!
//! Checks run in that order and the first one that applies wins.

use crate::registry::{AuthOutcome, KeyStatus, LicenseKey};
use chrono::{DateTime, Utc};

/// What the registry must do for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Refuse without touching the record.
    Deny(AuthOutcome),
    /// Mark the key expired, then refuse with [`AuthOutcome::KeyExpired`].
    Expire,
    /// Bind the hwid and count a use ([`AuthOutcome::HwidBound`]).
    Bind,
    /// Count a use ([`AuthOutcome::Authenticated`]).
    Use,
}

/// Normalize a caller-supplied hwid: empty counts as absent.
pub fn normalize_hwid(hwid: Option<&str>) -> Option<&str> {
    hwid.filter(|h| !h.is_empty())
}

/// Decide what an authentication attempt against `record` does.
///
/// # Arguments
/// * `record` - The key as currently stored
/// * `hwid` - Hardware id supplied by the caller (already normalized)
/// * `now` - Evaluation time
pub fn evaluate(record: &LicenseKey, hwid: Option<&str>, now: DateTime<Utc>) -> Verdict {
    if record.status != KeyStatus::Active {
        return Verdict::Deny(AuthOutcome::KeyInactive);
    }

    if record.expires_at.is_past(now) {
        return Verdict::Expire;
    }

    match record.bound_hwid() {
        None => Verdict::Bind,
        Some(bound) => match_bound(bound, hwid),
    }
}

/// Decide an attempt against a key already bound to `bound`.
pub fn match_bound(bound: &str, hwid: Option<&str>) -> Verdict {
    if hwid == Some(bound) {
        Verdict::Use
    } else {
        Verdict::Deny(AuthOutcome::HwidMismatch)
    }
}
