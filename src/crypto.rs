//! Cryptographic logics.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use validator::{ValidationError, ValidationErrors};

use crate::config::Argon2 as ArgonConfig;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

impl From<CryptoError> for crate::error::ServerError {
    fn from(err: CryptoError) -> Self {
        Self::Internal {
            details: "cryptographic operation failed".into(),
            source: Some(Box::new(err)),
        }
    }
}

/// Password manager that uses Argon2id and PHC string format for hashing and
/// verification.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2 {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id with a freshly generated random salt.
    ///
    /// The salt is embedded in the returned PHC string, so the same plaintext
    /// produces a different digest on every call.
    pub fn hash_password(&self, password: impl AsRef<[u8]>) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn invalid_password() -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add(
            "password",
            ValidationError::new("invalid_password")
                .with_message("Invalid credentials.".into()),
        );
        errors
    }

    /// Verify password against a PHC string.
    ///
    /// A malformed digest fails closed: it is indistinguishable from a wrong
    /// password for the caller.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: impl ToString,
    ) -> std::result::Result<(), ValidationErrors> {
        let phc_hash = phc_hash.to_string();

        let parsed = PasswordHash::new(&phc_hash)
            .map_err(|_| Self::invalid_password())?;

        self.argon2()
            .verify_password(password.as_ref(), &parsed)
            .map_err(|_| Self::invalid_password())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> ArgonConfig {
        ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let pwd = PasswordManager::new(Some(fast_config())).unwrap();

        let digest = pwd.hash_password("secret").unwrap();
        assert!(pwd.verify_password("secret", &digest).is_ok());
        assert!(pwd.verify_password("not-the-secret", &digest).is_err());
    }

    #[test]
    fn test_fresh_salt_per_call() {
        let pwd = PasswordManager::new(Some(fast_config())).unwrap();

        let first = pwd.hash_password("secret").unwrap();
        let second = pwd.hash_password("secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_digest_fails_closed() {
        let pwd = PasswordManager::new(Some(fast_config())).unwrap();

        assert!(pwd.verify_password("secret", "not-a-phc-string").is_err());
        assert!(pwd.verify_password("secret", "").is_err());
    }
}
