//! Session issuance.
//!
//! Logging in yields a signed JWT. Tokens carry only the user id, username
//! and timing claims; never the password hash or account status.

use std::sync::Arc;

use aspirez_common::{AppError, AppResult, IdGenerator, config::AuthConfig};
use aspirez_db::{entities::user::UserStatus, repositories::UserRepository};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use super::{account::normalize_email, credential::CredentialStore};

/// Upper bound on the configured token lifetime (one year).
const MAX_TOKEN_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: user ID.
    pub sub: String,
    pub username: String,
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

/// Signs and verifies session tokens.
pub trait TokenSigner: Send + Sync {
    /// Sign `claims` into a compact token.
    fn sign(&self, claims: &SessionClaims) -> AppResult<String>;

    /// Check signature, issuer and expiry, returning the claims.
    ///
    /// Fails with [`AppError::TokenExpired`] or [`AppError::TokenInvalid`].
    fn verify(&self, token: &str) -> AppResult<SessionClaims>;
}

/// Type alias for a shared token signer.
pub type TokenSignerRef = Arc<dyn TokenSigner>;

/// HS256 signer backed by `jsonwebtoken`.
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtSigner {
    /// Build a signer from the configured secret and issuer.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::Config("auth.jwt_secret must not be empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &SessionClaims) -> AppResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("JWT encode: {e}")))
    }

    fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::TokenInvalid(e.to_string()),
            })
    }
}

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: String,
    pub username: String,
}

/// Session service: authenticates credentials and issues tokens.
#[derive(Clone)]
pub struct SessionService {
    user_repo: UserRepository,
    credentials: CredentialStore,
    signer: TokenSignerRef,
    id_gen: IdGenerator,
    issuer: String,
    lifetime: Duration,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        credentials: CredentialStore,
        signer: TokenSignerRef,
        id_gen: IdGenerator,
        config: &AuthConfig,
    ) -> Self {
        Self {
            user_repo,
            credentials,
            signer,
            id_gen,
            issuer: config.issuer.clone(),
            lifetime: Duration::seconds(
                i64::try_from(config.token_lifetime_secs.min(MAX_TOKEN_LIFETIME_SECS))
                    .unwrap_or_default(),
            ),
        }
    }

    /// Check credentials and issue a session token.
    ///
    /// Checks run in a fixed order: unknown email, wrong password, banned,
    /// then unverified.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<IssuedSession> {
        let email = normalize_email(email);
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::AccountNotFound(email))?;

        if !self.credentials.verify(password, &user.password)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        match user.status {
            UserStatus::Banned => return Err(AppError::AccountBanned),
            UserStatus::Temporary => return Err(AppError::RegistrationIncomplete),
            UserStatus::Permanent => {}
        }

        let issued_at = Utc::now();
        let expires_at = issued_at + self.lifetime;
        let claims = SessionClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: self.id_gen.generate_token(),
        };

        let token = self.signer.sign(&claims)?;
        tracing::info!(user_id = %user.id, "Session issued");

        Ok(IssuedSession {
            token,
            expires_at,
            user_id: user.id,
            username: user.username,
        })
    }

    /// Verify a session token and return its claims.
    pub fn verify_token(&self, token: &str) -> AppResult<SessionClaims> {
        self.signer.verify(token)
    }
}
