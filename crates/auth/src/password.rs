//! Password hashing primitive.

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordHashError(String);

impl PasswordHashError {
    fn from_phc(e: argon2::password_hash::Error) -> Self {
        Self(e.to_string())
    }
}

pub trait PasswordHasher: Send + Sync {
    /// Encode a password for storage.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a password against an encoded hash. Malformed hashes never verify.
    fn verify(&self, password: &str, encoded: &str) -> bool;
}

/// Argon2id producing PHC strings:
/// `$argon2id$v=19$m=<KiB>,t=<iterations>,p=<lanes>$<salt>$<hash>`.
///
/// The cost parameters only apply to new hashes; verification reads them from
/// the encoded string.
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Argon2PasswordHasher {
    pub fn with_cost(memory_kib: u32, iterations: u32, lanes: u32) -> Result<Self, PasswordHashError> {
        let params = Params::new(memory_kib, iterations, lanes, None)
            .map_err(|e| PasswordHashError(e.to_string()))?;
        Ok(Self { params })
    }

    /// Reject anything that is not a PHC string this hasher can verify.
    pub fn check_encoded(encoded: &str) -> Result<(), PasswordHashError> {
        let parsed = PasswordHash::new(encoded).map_err(PasswordHashError::from_phc)?;
        Algorithm::try_from(parsed.algorithm).map_err(|e| PasswordHashError(e.to_string()))?;
        Params::try_from(&parsed).map_err(PasswordHashError::from_phc)?;
        Ok(())
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt: [u8; 16] = rand::random();
        let salt = SaltString::encode_b64(&salt).map_err(PasswordHashError::from_phc)?;
        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(PasswordHashError::from_phc)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, encoded: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(encoded) else {
            return false;
        };
        self.argon2().verify_password(password.as_bytes(), &parsed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::with_cost(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let h = hasher();
        let encoded = h.hash("password123").unwrap();
        assert!(encoded.starts_with("$argon2id$v=19$m=8,t=1,p=1$"), "{encoded}");
        assert!(h.verify("password123", &encoded));
        assert!(!h.verify("password124", &encoded));
        assert!(Argon2PasswordHasher::check_encoded(&encoded).is_ok());
    }

    #[test]
    fn salts_differ() {
        let h = hasher();
        assert_ne!(h.hash("same").unwrap(), h.hash("same").unwrap());
    }

    #[test]
    fn verification_uses_the_cost_in_the_hash() {
        let encoded = hasher().hash("pw").unwrap();
        let other = Argon2PasswordHasher::with_cost(16, 2, 1).unwrap();
        assert!(other.verify("pw", &encoded));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        let h = hasher();
        for bad in [
            "",
            "password123",
            "sha256$1$00$00",
            "$argon2id$v=19$m=8,t=1,p=1$",
            "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$!!",
        ] {
            assert!(!h.verify("password123", bad), "{bad}");
            assert!(Argon2PasswordHasher::check_encoded(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn invalid_cost_is_rejected() {
        assert!(Argon2PasswordHasher::with_cost(0, 0, 0).is_err());
    }
}
