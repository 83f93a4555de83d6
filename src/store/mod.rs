//! Persistent key storage.
//!
//! The registry only talks to storage through [`KeyStore`], so each test can
//! hand it an isolated instance.

pub mod sqlite;

use crate::registry::{KeyStatus, LicenseKey, NewLicenseKey};
use crate::KeywardenError;

pub use sqlite::SqliteStore;

/// Storage operations the key registry relies on.
///
/// Mutations that guard a state transition are compare-and-set: they only
/// apply when the row is still in the expected state and report whether
/// they did.
pub trait KeyStore: Send + Sync {
    /// Insert a new key. Fails with `DuplicateKey` if the string exists.
    fn insert(&self, new_key: &NewLicenseKey) -> Result<LicenseKey, KeywardenError>;

    /// Look up a key by exact string.
    fn find_by_key(&self, key: &str) -> Result<Option<LicenseKey>, KeywardenError>;

    /// Look up a key by id.
    fn find_by_id(&self, id: i64) -> Result<Option<LicenseKey>, KeywardenError>;

    /// All keys, most recently created first.
    fn list_newest_first(&self) -> Result<Vec<LicenseKey>, KeywardenError>;

    /// Remove a key. Returns whether a row was deleted.
    fn delete(&self, id: i64) -> Result<bool, KeywardenError>;

    /// Move an active key to `status`. Returns false if it was not active.
    fn transition_from_active(&self, id: i64, status: KeyStatus)
        -> Result<bool, KeywardenError>;

    /// Bind an unbound active key to `hwid` and count one use.
    ///
    /// Returns false if the key is already bound, no longer active, or gone.
    fn bind_hwid(&self, id: i64, hwid: Option<&str>) -> Result<bool, KeywardenError>;

    /// Count one use of an active key. Returns false if it is inactive or gone.
    fn record_use(&self, id: i64) -> Result<bool, KeywardenError>;
}
