//! # Keywarden
//!
//! **License key validation server with hardware-id binding.**
//!
//! Clients send a license key and a hardware id (HWID) and get back a
//! verdict. The first successful use binds the key to that HWID for good.
//! An admin manages keys (create, list, delete, ban) behind a shared
//! password.
//!
//! ## Key lifecycle
//!
//! - **Created** by an admin, active, unbound, zero uses
//! - **First bind**: first successful authentication fixes the HWID
//! - **Lazy expiry**: a timed key is marked expired the next time it is
//!   presented after its expiry, never by a background sweep
//! - **Banned** by an admin; expired and banned are terminal
//!
//! ## Quickstart
//!
//! ```no_run
//! use keywarden::{ExpiresIn, KeyRegistry, SqliteStore};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), keywarden::KeywardenError> {
//!     let store = Arc::new(SqliteStore::open("database.db")?);
//!     let registry = KeyRegistry::new(store);
//!
//!     registry.create("ABC-123", ExpiresIn::parse("30"), None)?;
//!     let outcome = registry.authenticate("ABC-123", Some("PC1"))?;
//!
//!     println!("{} ({})", outcome.message(), outcome.success());
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency
//!
//! HWID binding and expiry are compare-and-set updates in storage. When two
//! first uses race, exactly one gets `hwid_bound`; the other is judged
//! against the winning HWID.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Policy layer
pub mod policy;

// Storage layer
pub mod store;

// Registry (main public API)
pub mod registry;

// HTTP layer
pub mod api;

// Logging
pub mod telemetry;

// Re-exports for public API
pub use api::{build_router, AppState};
pub use clock::{Clock, SystemClock};
pub use config::ServerConfig;
pub use errors::KeywardenError;
pub use policy::expiry::{ExpiresIn, Expiry};
pub use registry::{AuthOutcome, KeyRegistry, KeyStatus, LicenseKey};
pub use store::{KeyStore, SqliteStore};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
