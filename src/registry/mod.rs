//! Key Registry - the main public API for Keywarden.
//!
//! The `KeyRegistry` owns every mutation of a license key:
//! - Client authentication (hwid binding, use counting, lazy expiry)
//! - Admin create, list, delete and ban
//!
//! Expiry is detected on read: nothing sweeps keys in the background.

pub mod models;
pub mod outcome;

pub use models::{KeyStatus, LicenseKey, NewLicenseKey};
pub use outcome::AuthOutcome;

use crate::clock::{Clock, SystemClock};
use crate::crypto::digest::key_fingerprint;
use crate::policy::expiry::ExpiresIn;
use crate::policy::verdict::{evaluate, match_bound, normalize_hwid, Verdict};
use crate::store::KeyStore;
use crate::KeywardenError;
use std::sync::Arc;
use tracing::{debug, info};

/// License key registry over an injected store.
///
/// Create one instance per process and share it; it is cheap to clone.
#[derive(Clone)]
pub struct KeyRegistry {
    store: Arc<dyn KeyStore>,
    clock: Arc<dyn Clock>,
}

impl KeyRegistry {
    /// Create a registry over `store` using the system clock.
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a registry with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_clock(store: Arc<dyn KeyStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(store, clock)
    }

    fn with_clock(store: Arc<dyn KeyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Authenticate a client's key and hardware id.
    ///
    /// Checks run in a fixed order and the first that applies decides:
    /// 1. Unknown key → `InvalidKey`
    /// 2. Not active → `KeyInactive`
    /// 3. Expiry passed → key marked expired, `KeyExpired`
    /// 4. Unbound → hwid bound, use counted, `HwidBound`
    /// 5. Bound to another hwid → `HwidMismatch`
    /// 6. Otherwise → use counted, `Authenticated`
    ///
    /// # Errors
    /// - `MissingField` - `key` is empty
    /// - `Storage` - the store failed
    pub fn authenticate(
        &self,
        key: &str,
        hwid: Option<&str>,
    ) -> Result<AuthOutcome, KeywardenError> {
        if key.is_empty() {
            return Err(KeywardenError::MissingField { field: "key" });
        }

        let hwid = normalize_hwid(hwid);
        let fingerprint = key_fingerprint(key);

        let Some(record) = self.store.find_by_key(key)? else {
            debug!(key = %fingerprint, "authentication for unknown key");
            return Ok(AuthOutcome::InvalidKey);
        };

        let verdict = evaluate(&record, hwid, self.clock.now_utc());
        let outcome = self.apply(&record, hwid, verdict)?;

        debug!(
            key = %fingerprint,
            id = record.id,
            outcome = outcome.code(),
            "authentication evaluated"
        );
        Ok(outcome)
    }

    /// Carry out a verdict against the store.
    fn apply(
        &self,
        record: &LicenseKey,
        hwid: Option<&str>,
        verdict: Verdict,
    ) -> Result<AuthOutcome, KeywardenError> {
        match verdict {
            Verdict::Deny(outcome) => Ok(outcome),
            Verdict::Expire => {
                if self
                    .store
                    .transition_from_active(record.id, KeyStatus::Expired)?
                {
                    info!(id = record.id, "license key expired");
                }
                Ok(AuthOutcome::KeyExpired)
            }
            Verdict::Bind => {
                if self.store.bind_hwid(record.id, hwid)? {
                    info!(id = record.id, "license key bound to hardware id");
                    return Ok(AuthOutcome::HwidBound);
                }
                self.after_lost_bind(record.id, hwid)
            }
            Verdict::Use => self.count_use(record.id),
        }
    }

    /// Another request changed the key between our read and our bind.
    /// A key banned or expired meanwhile is inactive; otherwise judge this
    /// attempt against the winner's hwid.
    fn after_lost_bind(
        &self,
        id: i64,
        hwid: Option<&str>,
    ) -> Result<AuthOutcome, KeywardenError> {
        let Some(current) = self.store.find_by_id(id)? else {
            return Ok(AuthOutcome::InvalidKey);
        };
        if current.status != KeyStatus::Active {
            debug!(id, status = %current.status, "key left active state during bind");
            return Ok(AuthOutcome::KeyInactive);
        }
        let Some(bound) = current.bound_hwid() else {
            return Ok(AuthOutcome::InvalidKey);
        };

        debug!(id, "lost concurrent hwid bind, comparing against bound hwid");
        match match_bound(bound, hwid) {
            Verdict::Use => self.count_use(id),
            Verdict::Deny(outcome) => Ok(outcome),
            Verdict::Expire | Verdict::Bind => Ok(AuthOutcome::HwidMismatch),
        }
    }

    fn count_use(&self, id: i64) -> Result<AuthOutcome, KeywardenError> {
        if self.store.record_use(id)? {
            return Ok(AuthOutcome::Authenticated);
        }
        // Deleted, banned or expired between lookup and update.
        match self.store.find_by_id(id)? {
            Some(_) => Ok(AuthOutcome::KeyInactive),
            None => Ok(AuthOutcome::InvalidKey),
        }
    }

    /// Create a new key.
    ///
    /// # Arguments
    /// * `key` - The key string (any non-empty text)
    /// * `expires_in` - Lifetime, a day count, or an unusable value
    /// * `description` - Optional note
    ///
    /// # Errors
    /// - `MissingField` - `key` is empty
    /// - `DuplicateKey` - the key string already exists (nothing is written)
    /// - `Storage` - the store failed
    pub fn create(
        &self,
        key: &str,
        expires_in: ExpiresIn,
        description: Option<String>,
    ) -> Result<LicenseKey, KeywardenError> {
        if key.is_empty() {
            return Err(KeywardenError::MissingField { field: "key" });
        }

        let now = self.clock.now_utc();
        let created = self.store.insert(&NewLicenseKey {
            key: key.to_string(),
            expires_at: expires_in.resolve(now),
            description,
            created_at: now,
        })?;

        info!(
            id = created.id,
            key = %key_fingerprint(key),
            expires_in = ?expires_in,
            "license key created"
        );
        Ok(created)
    }

    /// All keys, most recently created first.
    pub fn list(&self) -> Result<Vec<LicenseKey>, KeywardenError> {
        self.store.list_newest_first()
    }

    /// Delete a key by id. Deleting an unknown id succeeds.
    pub fn delete(&self, id: i64) -> Result<(), KeywardenError> {
        if self.store.delete(id)? {
            info!(id, "license key deleted");
        } else {
            debug!(id, "delete of unknown license key id");
        }
        Ok(())
    }

    /// Ban an active key.
    ///
    /// # Errors
    /// - `KeyNotFound` - no key has this id
    /// - `InvalidTransition` - the key is already expired or banned
    /// - `Storage` - the store failed
    pub fn ban(&self, id: i64) -> Result<LicenseKey, KeywardenError> {
        if !self.store.transition_from_active(id, KeyStatus::Banned)? {
            let current = self
                .store
                .find_by_id(id)?
                .ok_or(KeywardenError::KeyNotFound { id })?;
            return Err(KeywardenError::InvalidTransition {
                from: current.status,
            });
        }

        info!(id, "license key banned");
        self.store
            .find_by_id(id)?
            .ok_or(KeywardenError::KeyNotFound { id })
    }
}

impl std::fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRegistry").finish_non_exhaustive()
    }
}
