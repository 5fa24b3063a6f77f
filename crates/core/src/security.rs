//! Password hashing. Only Argon2id survives the transform: JWT signing,
//! TOTP, and AES-GCM encryption-at-rest have no counterpart in this
//! platform's Auth Service (§4.5 — opaque session tokens, no 2FA, no
//! data-at-rest encryption requirement).

use crate::config::SecurityConfig;
use crate::error::{Error, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| Error::internal(format!("invalid argon2 parameters: {e}")))?;

        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

        Ok(Self { argon2 })
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::internal(format!("failed to hash password: {e}")))?;

        Ok(hash.to_string())
    }

    /// Constant-time comparison, per §4.5 step 2 ("constant-time adaptive-hash
    /// comparison"). A malformed stored hash is treated as an internal error,
    /// not a verification failure.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| Error::internal(format!("invalid password hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::internal(format!("password verification error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SecurityConfig {
        SecurityConfig {
            session_signing_key: "a".repeat(32),
            argon2_memory_cost: 19456,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
            session_idle_timeout_hours: 8,
            session_absolute_ttl_days: 30,
        }
    }

    #[test]
    fn hash_then_verify_round_trips() {
        let hasher = PasswordHasher::new(&test_config()).unwrap();
        let password = "SecurePassword123!";

        let hash = hasher.hash_password(password).unwrap();
        assert!(!hash.is_empty());
        assert_ne!(hash, password);

        assert!(hasher.verify_password(password, &hash).unwrap());
        assert!(!hasher.verify_password("WrongPassword1!", &hash).unwrap());
    }
}
