//! SQLite-backed key store.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with
//! microseconds, so ordering by the text column is chronological.

use crate::policy::expiry::Expiry;
use crate::registry::{KeyStatus, LicenseKey, NewLicenseKey};
use crate::store::KeyStore;
use crate::KeywardenError;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SELECT_COLUMNS: &str =
    "SELECT id, key, status, hwid, uses, expires_at, description, created_at FROM keys";

/// Key store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KeywardenError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| KeywardenError::Storage(format!("failed to open key store: {e}")))?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> Result<Self, KeywardenError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            KeywardenError::Storage(format!("failed to open in-memory key store: {e}"))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, KeywardenError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), KeywardenError> {
        self.conn()?
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS keys (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    key TEXT UNIQUE NOT NULL,
                    status TEXT NOT NULL DEFAULT 'active',
                    hwid TEXT,
                    uses INTEGER NOT NULL DEFAULT 0,
                    expires_at TEXT,
                    description TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS keys_created_at ON keys (created_at);
                ",
            )
            .map_err(|e| KeywardenError::Storage(format!("failed to init key schema: {e}")))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, KeywardenError> {
        self.conn
            .lock()
            .map_err(|_| KeywardenError::Storage("key store lock poisoned".to_string()))
    }

    fn query_one(
        conn: &Connection,
        filter: &str,
        param: &dyn rusqlite::ToSql,
    ) -> Result<Option<LicenseKey>, KeywardenError> {
        let sql = format!("{SELECT_COLUMNS} WHERE {filter}");
        let raw = conn
            .query_row(&sql, [param], RawKey::from_row)
            .optional()
            .map_err(|e| KeywardenError::Storage(format!("failed to query key: {e}")))?;
        raw.map(RawKey::into_license_key).transpose()
    }
}

impl KeyStore for SqliteStore {
    fn insert(&self, new_key: &NewLicenseKey) -> Result<LicenseKey, KeywardenError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO keys (key, expires_at, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                new_key.key,
                expiry_to_column(&new_key.expires_at),
                new_key.description,
                format_timestamp(&new_key.created_at),
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(KeywardenError::DuplicateKey {
                    key: new_key.key.clone(),
                });
            }
            Err(e) => {
                return Err(KeywardenError::Storage(format!("failed to insert key: {e}")));
            }
        }

        let id = conn.last_insert_rowid();
        Self::query_one(&conn, "id = ?1", &id)?.ok_or_else(|| {
            KeywardenError::Storage(format!("inserted key {id} could not be read back"))
        })
    }

    fn find_by_key(&self, key: &str) -> Result<Option<LicenseKey>, KeywardenError> {
        let conn = self.conn()?;
        Self::query_one(&conn, "key = ?1", &key)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<LicenseKey>, KeywardenError> {
        let conn = self.conn()?;
        Self::query_one(&conn, "id = ?1", &id)
    }

    fn list_newest_first(&self) -> Result<Vec<LicenseKey>, KeywardenError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"
            ))
            .map_err(|e| KeywardenError::Storage(format!("failed to prepare key listing: {e}")))?;

        let rows = stmt
            .query_map([], RawKey::from_row)
            .map_err(|e| KeywardenError::Storage(format!("failed to list keys: {e}")))?;

        let mut keys = Vec::new();
        for row in rows {
            let raw =
                row.map_err(|e| KeywardenError::Storage(format!("failed to read key row: {e}")))?;
            keys.push(raw.into_license_key()?);
        }
        Ok(keys)
    }

    fn delete(&self, id: i64) -> Result<bool, KeywardenError> {
        let changed = self
            .conn()?
            .execute("DELETE FROM keys WHERE id = ?1", params![id])
            .map_err(|e| KeywardenError::Storage(format!("failed to delete key: {e}")))?;
        Ok(changed > 0)
    }

    fn transition_from_active(
        &self,
        id: i64,
        status: KeyStatus,
    ) -> Result<bool, KeywardenError> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE keys SET status = ?1 WHERE id = ?2 AND status = 'active'",
                params![status.as_str(), id],
            )
            .map_err(|e| KeywardenError::Storage(format!("failed to update key status: {e}")))?;
        Ok(changed > 0)
    }

    fn bind_hwid(&self, id: i64, hwid: Option<&str>) -> Result<bool, KeywardenError> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE keys SET hwid = ?1, uses = uses + 1
                 WHERE id = ?2 AND status = 'active' AND (hwid IS NULL OR hwid = '')",
                params![hwid, id],
            )
            .map_err(|e| KeywardenError::Storage(format!("failed to bind hwid: {e}")))?;
        Ok(changed > 0)
    }

    fn record_use(&self, id: i64) -> Result<bool, KeywardenError> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE keys SET uses = uses + 1 WHERE id = ?1 AND status = 'active'",
                params![id],
            )
            .map_err(|e| KeywardenError::Storage(format!("failed to record use: {e}")))?;
        Ok(changed > 0)
    }
}

/// Row as stored, before text columns are parsed.
struct RawKey {
    id: i64,
    key: String,
    status: String,
    hwid: Option<String>,
    uses: i64,
    expires_at: Option<String>,
    description: Option<String>,
    created_at: String,
}

impl RawKey {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            key: row.get(1)?,
            status: row.get(2)?,
            hwid: row.get(3)?,
            uses: row.get(4)?,
            expires_at: row.get(5)?,
            description: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_license_key(self) -> Result<LicenseKey, KeywardenError> {
        let status = self
            .status
            .parse::<KeyStatus>()
            .map_err(|e| KeywardenError::Storage(format!("key {}: {e}", self.id)))?;
        let created_at = parse_timestamp(&self.created_at).ok_or_else(|| {
            KeywardenError::Storage(format!(
                "key {}: bad created_at {:?}",
                self.id, self.created_at
            ))
        })?;

        Ok(LicenseKey {
            id: self.id,
            key: self.key,
            status,
            hwid: self.hwid,
            uses: u64::try_from(self.uses).unwrap_or(0),
            expires_at: expiry_from_column(self.expires_at.as_deref()),
            description: self.description,
            created_at,
        })
    }
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn expiry_to_column(expiry: &Expiry) -> Option<String> {
    match expiry {
        Expiry::Never => None,
        Expiry::At(at) => Some(format_timestamp(at)),
        Expiry::Invalid => Some(Expiry::INVALID_SENTINEL.to_string()),
    }
}

fn expiry_from_column(raw: Option<&str>) -> Expiry {
    match raw {
        None => Expiry::Never,
        Some(text) => parse_timestamp(text).map_or(Expiry::Invalid, Expiry::At),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn new_key(key: &str, created_at: DateTime<Utc>) -> NewLicenseKey {
        NewLicenseKey {
            key: key.to_string(),
            expires_at: Expiry::Never,
            description: Some("test".to_string()),
            created_at,
        }
    }

    #[test]
    fn test_insert_assigns_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&new_key("ABC-123", t0())).unwrap();

        assert!(key.id > 0);
        assert_eq!(key.key, "ABC-123");
        assert_eq!(key.status, KeyStatus::Active);
        assert_eq!(key.hwid, None);
        assert_eq!(key.uses, 0);
        assert_eq!(key.expires_at, Expiry::Never);
        assert_eq!(key.description.as_deref(), Some("test"));
        assert_eq!(key.created_at, t0());
    }

    #[test]
    fn test_duplicate_insert_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&new_key("ABC-123", t0())).unwrap();

        let result = store.insert(&new_key("ABC-123", t0()));
        assert!(matches!(result, Err(KeywardenError::DuplicateKey { key }) if key == "ABC-123"));
        assert_eq!(store.list_newest_first().unwrap().len(), 1);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&new_key("abc", t0())).unwrap();
        store.insert(&new_key("ABC", t0())).unwrap();

        assert!(store.find_by_key("Abc").unwrap().is_none());
        assert_eq!(store.find_by_key("ABC").unwrap().unwrap().key, "ABC");
    }

    #[test]
    fn test_expiry_columns_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let at = t0() + Duration::days(30);

        let mut timed = new_key("TIMED", t0());
        timed.expires_at = Expiry::At(at);
        let mut broken = new_key("BROKEN", t0());
        broken.expires_at = Expiry::Invalid;

        assert_eq!(store.insert(&timed).unwrap().expires_at, Expiry::At(at));
        assert_eq!(store.insert(&broken).unwrap().expires_at, Expiry::Invalid);
    }

    #[test]
    fn test_expiry_bounds_survive_storage() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut ancient = new_key("ANCIENT", t0());
        ancient.expires_at = Expiry::At(Expiry::earliest());
        let mut distant = new_key("DISTANT", t0());
        distant.expires_at = Expiry::At(Expiry::latest());

        assert_eq!(
            store.insert(&ancient).unwrap().expires_at,
            Expiry::At(Expiry::earliest())
        );
        assert_eq!(
            store.insert(&distant).unwrap().expires_at,
            Expiry::At(Expiry::latest())
        );
    }

    #[test]
    fn test_list_orders_newest_first_with_id_tiebreak() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&new_key("old", t0())).unwrap();
        store
            .insert(&new_key("new", t0() + Duration::milliseconds(1)))
            .unwrap();
        store.insert(&new_key("tie-a", t0())).unwrap();

        let order: Vec<_> = store
            .list_newest_first()
            .unwrap()
            .into_iter()
            .map(|k| k.key)
            .collect();
        assert_eq!(order, vec!["new", "tie-a", "old"]);
    }

    #[test]
    fn test_bind_only_applies_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&new_key("K", t0())).unwrap();

        assert!(store.bind_hwid(key.id, Some("PC1")).unwrap());
        assert!(!store.bind_hwid(key.id, Some("PC2")).unwrap());

        let stored = store.find_by_id(key.id).unwrap().unwrap();
        assert_eq!(stored.hwid.as_deref(), Some("PC1"));
        assert_eq!(stored.uses, 1);
    }

    #[test]
    fn test_bind_and_use_refuse_inactive_keys() {
        let store = SqliteStore::open_in_memory().unwrap();
        let unbound = store.insert(&new_key("UNBOUND", t0())).unwrap();
        let bound = store.insert(&new_key("BOUND", t0())).unwrap();
        assert!(store.bind_hwid(bound.id, Some("PC1")).unwrap());

        assert!(store
            .transition_from_active(unbound.id, KeyStatus::Banned)
            .unwrap());
        assert!(store
            .transition_from_active(bound.id, KeyStatus::Expired)
            .unwrap());

        assert!(!store.bind_hwid(unbound.id, Some("PC1")).unwrap());
        assert!(!store.record_use(bound.id).unwrap());

        let unbound = store.find_by_id(unbound.id).unwrap().unwrap();
        assert_eq!(unbound.hwid, None);
        assert_eq!(unbound.uses, 0);
        assert_eq!(store.find_by_id(bound.id).unwrap().unwrap().uses, 1);
    }

    #[test]
    fn test_bind_without_hwid_leaves_key_unbound() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&new_key("K", t0())).unwrap();

        assert!(store.bind_hwid(key.id, None).unwrap());
        assert!(store.bind_hwid(key.id, Some("PC1")).unwrap());

        let stored = store.find_by_id(key.id).unwrap().unwrap();
        assert_eq!(stored.hwid.as_deref(), Some("PC1"));
        assert_eq!(stored.uses, 2);
    }

    #[test]
    fn test_transition_only_from_active() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&new_key("K", t0())).unwrap();

        assert!(store
            .transition_from_active(key.id, KeyStatus::Expired)
            .unwrap());
        assert!(!store
            .transition_from_active(key.id, KeyStatus::Banned)
            .unwrap());
        assert_eq!(
            store.find_by_id(key.id).unwrap().unwrap().status,
            KeyStatus::Expired
        );
    }

    #[test]
    fn test_record_use_and_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let key = store.insert(&new_key("K", t0())).unwrap();

        assert!(store.record_use(key.id).unwrap());
        assert!(store.delete(key.id).unwrap());
        assert!(!store.delete(key.id).unwrap());
        assert!(!store.record_use(key.id).unwrap());
        assert!(store.find_by_id(key.id).unwrap().is_none());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("keys.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            let key = store.insert(&new_key("PERSIST", t0())).unwrap();
            store.bind_hwid(key.id, Some("PC1")).unwrap();
        }

        {
            let store = SqliteStore::open(&path).unwrap();
            let key = store.find_by_key("PERSIST").unwrap().unwrap();
            assert_eq!(key.hwid.as_deref(), Some("PC1"));
            assert_eq!(key.uses, 1);
        }
    }
}
