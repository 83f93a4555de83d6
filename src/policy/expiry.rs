//! Key lifetime input parsing and the stored expiry value.
//!
//! Admins send `expires_in` as either the token `"lifetime"` or a day count.
//! The day count is read leniently: the leading integer of the text is used
//! (`"30"`, `"30 days"`, `" -1"`), and text without one is kept as
//! [`ExpiresIn::Invalid`] rather than rejected. An invalid expiry is stored
//! and listed but never counts as past.

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Token that marks a key as never expiring.
pub const LIFETIME_TOKEN: &str = "lifetime";

/// Requested lifetime of a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiresIn {
    /// Key never expires.
    Lifetime,
    /// Key expires this many days after creation (may be negative).
    Days(i64),
    /// Input had no usable day count.
    Invalid,
}

impl ExpiresIn {
    /// Parse the textual form of `expires_in`.
    pub fn parse(raw: &str) -> Self {
        if raw == LIFETIME_TOKEN {
            return Self::Lifetime;
        }
        parse_leading_int(raw).map_or(Self::Invalid, Self::Days)
    }

    /// Interpret the raw JSON value of `expires_in`.
    ///
    /// Strings and numbers are read through [`ExpiresIn::parse`]; an absent
    /// field or any other JSON type is [`ExpiresIn::Invalid`].
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::parse(s),
            Some(Value::Number(n)) => Self::parse(&n.to_string()),
            _ => Self::Invalid,
        }
    }

    /// Turn the request into an absolute expiry relative to `now`.
    ///
    /// The instant is clamped to years 0000 through 9999, so a huge negative
    /// day count still lies in the past and a huge positive one stays in the
    /// future.
    pub fn resolve(self, now: DateTime<Utc>) -> Expiry {
        match self {
            Self::Lifetime => Expiry::Never,
            Self::Invalid => Expiry::Invalid,
            Self::Days(days) => {
                let (earliest, latest) = (Expiry::earliest(), Expiry::latest());
                let target = Duration::try_days(days).and_then(|d| now.checked_add_signed(d));
                let at = match target {
                    Some(at) => at.clamp(earliest, latest),
                    None if days < 0 => earliest,
                    None => latest,
                };
                Expiry::At(at)
            }
        }
    }
}

/// Expiry as persisted on a license key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Lifetime key.
    Never,
    /// Expires at this instant.
    At(DateTime<Utc>),
    /// Created from an unusable `expires_in`; never expires.
    Invalid,
}

impl Expiry {
    /// Text stored for [`Expiry::Invalid`] and shown in listings.
    pub const INVALID_SENTINEL: &'static str = "invalid";

    /// Start of year 0000, the earliest storable expiry.
    pub fn earliest() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(-62_167_219_200, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Last microsecond of year 9999, the latest storable expiry.
    pub fn latest() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(253_402_300_799, 999_999_000)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Whether the expiry lies strictly before `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::At(at) => *at < now,
            Self::Never | Self::Invalid => false,
        }
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Never => serializer.serialize_none(),
            Self::At(at) => at.serialize(serializer),
            Self::Invalid => serializer.serialize_str(Self::INVALID_SENTINEL),
        }
    }
}

/// Leading-integer parse: optional whitespace, optional sign, then decimal
/// digits (or `0x` hex digits). Trailing text is ignored.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, s) = match s.get(..2) {
        Some("0x") | Some("0X") => (16, &s[2..]),
        _ => (10, s),
    };

    let digits_end = s
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map_or(s.len(), |(i, _)| i);
    if digits_end == 0 {
        return None;
    }

    let magnitude = i64::from_str_radix(&s[..digits_end], radix).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
