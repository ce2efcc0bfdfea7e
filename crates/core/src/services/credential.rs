//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use aspirez_common::{AppError, AppResult, config::PasswordConfig};

/// Salted one-way password hashing with Argon2id.
///
/// Hashes are PHC strings, so parameters travel with each hash and a
/// parameter change does not invalidate stored passwords.
#[derive(Clone)]
pub struct CredentialStore {
    params: Params,
    pepper: Option<Vec<u8>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("params", &self.params)
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialStore {
    /// Build a credential store from configuration.
    pub fn new(config: &PasswordConfig) -> AppResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AppError::HashingError(format!("invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            params,
            pepper: config
                .pepper
                .as_ref()
                .filter(|p| !p.is_empty())
                .map(|p| p.as_bytes().to_vec()),
        })
    }

    fn hasher(&self) -> AppResult<Argon2<'_>> {
        match &self.pepper {
            Some(secret) => Argon2::new_with_secret(
                secret,
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )
            .map_err(|e| AppError::HashingError(format!("unusable pepper: {e}"))),
            None => Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )),
        }
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.hasher()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::HashingError(e.to_string()))
    }

    /// Check a plaintext password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. Only a stored value that is not a valid
    /// PHC string is an error.
    pub fn verify(&self, plaintext: &str, hashed: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hashed)
            .map_err(|e| AppError::ComparisonError(format!("malformed stored hash: {e}")))?;

        match self.hasher()?.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::ComparisonError(e.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fast_config() -> PasswordConfig {
        PasswordConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
            pepper: None,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let store = CredentialStore::new(&fast_config()).unwrap();
        let hash = store.hash("Secr3t@pass").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(store.verify("Secr3t@pass", &hash).unwrap());
        assert!(!store.verify("Wrong@pass1", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let store = CredentialStore::new(&fast_config()).unwrap();
        let first = store.hash("Secr3t@pass").unwrap();
        let second = store.hash("Secr3t@pass").unwrap();

        assert_ne!(first, second);
        assert!(store.verify("Secr3t@pass", &second).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_comparison_error() {
        let store = CredentialStore::new(&fast_config()).unwrap();
        let result = store.verify("Secr3t@pass", "not-a-phc-string");

        assert!(matches!(result, Err(AppError::ComparisonError(_))));
    }

    #[test]
    fn test_invalid_params_are_hashing_error() {
        let config = PasswordConfig {
            memory_kib: 1,
            iterations: 0,
            ..fast_config()
        };

        assert!(matches!(
            CredentialStore::new(&config),
            Err(AppError::HashingError(_))
        ));
    }

    #[test]
    fn test_pepper_changes_outcome() {
        let peppered = CredentialStore::new(&PasswordConfig {
            pepper: Some("server-secret".to_string()),
            ..fast_config()
        })
        .unwrap();
        let plain = CredentialStore::new(&fast_config()).unwrap();

        let hash = peppered.hash("Secr3t@pass").unwrap();
        assert!(peppered.verify("Secr3t@pass", &hash).unwrap());
        assert!(!plain.verify("Secr3t@pass", &hash).unwrap());
    }
}
