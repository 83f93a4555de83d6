//! Hashing primitives for secrets and log-safe key fingerprints.

pub mod digest;
pub mod secret;
