//! Key lifecycle rules, independent of storage.

pub mod expiry;
pub mod verdict;
