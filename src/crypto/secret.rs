//! Admin shared-secret verification.

use crate::KeywardenError;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// The admin password, kept only as a SHA-256 digest.
///
/// Candidates are hashed to the same fixed length and compared in constant
/// time, so neither content nor length leaks through timing.
#[derive(Clone)]
pub struct AdminSecret {
    digest: [u8; 32],
}

impl AdminSecret {
    /// Wrap the configured password.
    pub fn new(password: &str) -> Self {
        Self {
            digest: Sha256::digest(password.as_bytes()).into(),
        }
    }

    /// Check a login attempt. An absent password never matches.
    pub fn verify(&self, candidate: Option<&str>) -> Result<(), KeywardenError> {
        let Some(candidate) = candidate else {
            return Err(KeywardenError::Unauthorized);
        };

        let candidate_digest: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        if bool::from(self.digest[..].ct_eq(&candidate_digest[..])) {
            Ok(())
        } else {
            Err(KeywardenError::Unauthorized)
        }
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_password_verifies() {
        let secret = AdminSecret::new("admin123456");
        assert!(secret.verify(Some("admin123456")).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let secret = AdminSecret::new("admin123456");
        assert!(matches!(
            secret.verify(Some("admin12345")),
            Err(KeywardenError::Unauthorized)
        ));
        assert!(matches!(
            secret.verify(Some("")),
            Err(KeywardenError::Unauthorized)
        ));
    }

    #[test]
    fn test_absent_password_rejected() {
        let secret = AdminSecret::new("admin123456");
        assert!(matches!(secret.verify(None), Err(KeywardenError::Unauthorized)));
    }

    #[test]
    fn test_debug_does_not_leak() {
        let secret = AdminSecret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "AdminSecret(..)");
    }
}
