//! Password hashing and verification using bcrypt
//!
//! Digests use the modular-crypt `$2b$<cost>$<salt><hash>` form, so the
//! cost and the per-call random salt travel inside the stored string.

use crate::core::error::{GateError, Result};

/// bcrypt ignores input past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hashing seam used by the auth service
pub trait CredentialHasher: Send + Sync {
    /// Hash a password with a fresh random salt
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a password against a stored digest
    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// Salted, deliberately slow password hasher
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl CredentialHasher for PasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| GateError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// A malformed digest counts as a mismatch. The digest comparison inside
    /// bcrypt is constant-time. Input past 72 bytes is truncated by bcrypt
    /// before hashing.
    fn verify(&self, password: &str, digest: &str) -> bool {
        match bcrypt::verify(password, digest) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password digest could not be parsed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_and_verify() {
        let digest = hasher().hash("s3cr3t!").unwrap();
        assert!(hasher().verify("s3cr3t!", &digest));
        assert!(!hasher().verify("wrong", &digest));
    }

    #[test]
    fn test_digest_is_self_describing() {
        let digest = hasher().hash("s3cr3t!").unwrap();
        assert!(digest.starts_with("$2b$04$"));
        assert_ne!(digest, "s3cr3t!");
    }

    #[test]
    fn test_malformed_digest_is_mismatch() {
        assert!(!hasher().verify("s3cr3t!", ""));
        assert!(!hasher().verify("s3cr3t!", "not-a-digest"));
        assert!(!hasher().verify("s3cr3t!", "$2b$04$tooshort"));
    }

    #[test]
    fn test_invalid_cost_is_internal_error() {
        let result = PasswordHasher::new(2).hash("s3cr3t!");
        assert!(matches!(result, Err(GateError::Internal(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_salts_differ_and_both_verify(password in "[ -~]{1,40}") {
            let first = hasher().hash(&password).unwrap();
            let second = hasher().hash(&password).unwrap();

            prop_assert_ne!(&first, &second);
            prop_assert!(hasher().verify(&password, &first));
            prop_assert!(hasher().verify(&password, &second));
        }
    }
}
