//! ID and one-time token generation.

use rand::{Rng, distributions::Alphanumeric};
use ulid::Ulid;
use uuid::Uuid;

/// Length of verification and password-reset OTPs.
pub const OTP_LENGTH: usize = 20;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable and render as 26 characters.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a one-time token for email verification or password reset.
    ///
    /// Drawn from the thread-local CSPRNG, [`OTP_LENGTH`] ASCII alphanumerics.
    #[must_use]
    pub fn generate_otp(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(OTP_LENGTH)
            .map(char::from)
            .collect()
    }

    /// Generate a random unique token identifier.
    #[must_use]
    pub fn generate_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Returns whether `id` has the shape of an ID produced by [`IdGenerator::generate`].
///
/// Stored IDs are lowercase, so uppercase spellings are rejected.
#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    id.len() == 26
        && !id.bytes().any(|b| b.is_ascii_uppercase())
        && Ulid::from_string(id).is_ok()
}

/// Returns whether `otp` has the shape of an OTP produced by [`IdGenerator::generate_otp`].
#[must_use]
pub fn is_valid_otp(otp: &str) -> bool {
    otp.len() == OTP_LENGTH && otp.chars().all(|c| c.is_ascii_alphanumeric())
}
