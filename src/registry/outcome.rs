//! Authentication verdicts.

use serde::Serialize;

/// Result of one authentication attempt.
///
/// These are normal outcomes, not errors: a denied key is still a
/// successfully handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
    /// No key with that string exists.
    InvalidKey,
    /// Key is expired or banned.
    KeyInactive,
    /// Key was active but its expiry has passed; now marked expired.
    KeyExpired,
    /// First successful use; the hwid is now bound.
    HwidBound,
    /// Key is bound to a different hwid.
    HwidMismatch,
    /// Hwid matches the bound one.
    Authenticated,
}

impl AuthOutcome {
    /// Whether the client should be let in.
    pub fn success(self) -> bool {
        matches!(self, Self::HwidBound | Self::Authenticated)
    }

    /// Human-readable reason.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidKey => "Invalid key",
            Self::KeyInactive => "Key expired or banned",
            Self::KeyExpired => "Key expired",
            Self::HwidBound => "HWID bound successfully",
            Self::HwidMismatch => "HWID mismatch (key in use on another PC)",
            Self::Authenticated => "Authenticated successfully",
        }
    }

    /// Machine-readable code, identical to the serialized form.
    pub fn code(self) -> &'static str {
        match self {
            Self::InvalidKey => "invalid_key",
            Self::KeyInactive => "key_inactive",
            Self::KeyExpired => "key_expired",
            Self::HwidBound => "hwid_bound",
            Self::HwidMismatch => "hwid_mismatch",
            Self::Authenticated => "authenticated",
        }
    }
}
