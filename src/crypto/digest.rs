//! SHA-256 key fingerprints for log output.

use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 12;

/// Short SHA-256 fingerprint of a license key.
///
/// Logs carry this instead of the raw key so a log leak does not leak
/// usable keys.
pub fn key_fingerprint(license_key: &str) -> String {
    let hash = Sha256::digest(license_key.as_bytes());
    let mut hex = hex::encode(hash);
    hex.truncate(FINGERPRINT_LEN);
    hex
}
