//! Account lifecycle service.
//!
//! Owns every write to a user's status, OTP and password fields:
//!
//! ```text
//! TEMPORARY --verify--> PERMANENT
//!     any   --ban (moderation)--> BANNED (terminal)
//! ```
//!
//! Status-changing writes are conditional updates filtered on the state
//! they expect, so racing requests cannot both succeed.

use std::borrow::Cow;

use aspirez_common::{AppError, AppResult, IdGenerator, is_valid_id, is_valid_otp};
use aspirez_db::{
    entities::user::{self, UserRole, UserStatus},
    repositories::UserRepository,
};
use chrono::{DateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{
    credential::CredentialStore,
    email::{EmailKind, EmailSenderRef},
};

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 20;
const USERNAME_MIN_LEN: usize = 3;

/// Account service for business logic.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    credentials: CredentialStore,
    email: EmailSenderRef,
    id_gen: IdGenerator,
}

/// Input for creating a new account.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountInput {
    #[serde(alias = "firstname")]
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,

    #[serde(alias = "lastname")]
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,

    #[validate(email, length(max = 256))]
    pub email: String,

    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(custom(function = "validate_password"))]
    pub password: String,

    #[validate(length(min = 1, max = 32))]
    pub phone: String,

    #[validate(length(min = 1, max = 256))]
    pub college: String,

    #[serde(default, alias = "profilepic")]
    #[validate(url, length(max = 1024))]
    pub avatar_url: Option<String>,

    #[serde(default)]
    #[validate(length(max = 32))]
    pub interests: Vec<String>,
}

/// Public view of an account. Never carries the password hash or OTPs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub status: UserStatus,
    pub role: UserRole,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&user::Model> for AccountSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            avatar_url: user.avatar_url.clone(),
            status: user.status,
            role: user.role,
            interests: user.interest_list(),
            created_at: user.created_at.with_timezone(&Utc),
        }
    }
}

/// Result of a successful signup.
///
/// `verification_otp` is only meant for tests and internal callers; the
/// HTTP layer must not echo it back.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    pub account: AccountSummary,
    pub verification_otp: String,
}

/// Whether an account may take part in social operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountActivity {
    NotFound,
    Active,
    Unverified,
    Banned,
}

impl From<UserStatus> for AccountActivity {
    fn from(status: UserStatus) -> Self {
        match status {
            UserStatus::Temporary => Self::Unverified,
            UserStatus::Permanent => Self::Active,
            UserStatus::Banned => Self::Banned,
        }
    }
}

/// Classify `user_id`. Shared with the connection service, which only reads accounts.
pub(crate) async fn account_activity(
    user_repo: &UserRepository,
    user_id: &str,
) -> AppResult<AccountActivity> {
    if !is_valid_id(user_id) {
        return Err(AppError::InvalidId(user_id.to_string()));
    }

    Ok(user_repo
        .find_by_id(user_id)
        .await?
        .map_or(AccountActivity::NotFound, |u| u.status.into()))
}

/// Trim and lowercase an email address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Username rule: at least three characters, `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < USERNAME_MIN_LEN || username.len() > 64 {
        return Err(invalid(
            "username_length",
            "username must be between 3 and 64 characters",
        ));
    }

    let mut chars = username.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !starts_well || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(invalid(
            "username_format",
            "username may contain letters, digits and underscores and must not start with a digit",
        ));
    }

    Ok(())
}

/// Password rule: 8 to 20 characters without whitespace, with at least one
/// letter, one digit and one ASCII symbol.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(invalid(
            "password_length",
            "password must be between 8 and 20 characters",
        ));
    }

    if password.chars().any(char::is_whitespace)
        || !password.chars().any(|c| c.is_ascii_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
        || !password.chars().any(|c| c.is_ascii_punctuation())
    {
        return Err(invalid(
            "password_strength",
            "password needs a letter, a digit and a symbol, and no spaces",
        ));
    }

    Ok(())
}

fn rule_violation(err: ValidationError) -> AppError {
    AppError::Validation(
        err.message
            .map_or_else(|| err.code.to_string(), |m| m.to_string()),
    )
}

fn check_password(password: &str) -> AppResult<()> {
    validate_password(password).map_err(rule_violation)
}

fn check_otp(otp: &str) -> AppResult<()> {
    if is_valid_otp(otp) {
        Ok(())
    } else {
        Err(AppError::Validation("malformed one-time token".to_string()))
    }
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        credentials: CredentialStore,
        email: EmailSenderRef,
        id_gen: IdGenerator,
    ) -> Self {
        Self {
            user_repo,
            credentials,
            email,
            id_gen,
        }
    }

    /// Register a new, unverified account and send its verification email.
    ///
    /// The duplicate lookups are a fast path; the unique indexes decide
    /// races. If the email cannot be dispatched the account stays
    /// TEMPORARY and the error is returned, so the caller can resend.
    pub async fn create_account(&self, mut input: CreateAccountInput) -> AppResult<SignupOutcome> {
        input.email = normalize_email(&input.email);
        input.validate()?;

        let email = input.email.clone();

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail(email));
        }
        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateUsername(input.username));
        }

        let password_hash = self.credentials.hash(&input.password)?;
        let otp = self.id_gen.generate_otp();

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            email: Set(email.clone()),
            username: Set(input.username),
            password: Set(password_hash),
            phone: Set(input.phone),
            college: Set(input.college),
            avatar_url: Set(input.avatar_url),
            status: Set(UserStatus::Temporary),
            role: Set(UserRole::Regular),
            interests: Set(serde_json::json!(input.interests)),
            verification_otp: Set(Some(otp.clone())),
            reset_otp: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.user_repo.create(model).await?;
        tracing::info!(user_id = %created.id, username = %created.username, "Account created");

        self.dispatch(EmailKind::Verification, &email, &otp).await?;

        Ok(SignupOutcome {
            account: AccountSummary::from(&created),
            verification_otp: otp,
        })
    }

    /// Consume a verification OTP, promoting the account to PERMANENT.
    pub async fn verify_account(&self, otp: &str) -> AppResult<AccountSummary> {
        check_otp(otp)?;

        let user = self
            .user_repo
            .find_by_verification_otp(otp)
            .await?
            .ok_or(AppError::OtpNotFound)?;

        match user.status {
            UserStatus::Banned => return Err(AppError::AccountBanned),
            UserStatus::Permanent => return Err(AppError::AlreadyVerified),
            UserStatus::Temporary => {}
        }

        if self.user_repo.mark_verified(&user.id, otp).await? == 0 {
            // Another request consumed the token first.
            return Err(AppError::OtpNotFound);
        }

        tracing::info!(user_id = %user.id, "Account verified");

        let mut summary = AccountSummary::from(&user);
        summary.status = UserStatus::Permanent;
        Ok(summary)
    }

    /// Issue a new verification OTP for an unverified account and resend the email.
    ///
    /// The previous OTP stops working.
    pub async fn resend_verification(&self, email: &str) -> AppResult<String> {
        let email = normalize_email(email);
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(email.clone()))?;

        match user.status {
            UserStatus::Banned => return Err(AppError::AccountBanned),
            UserStatus::Permanent => return Err(AppError::AlreadyVerified),
            UserStatus::Temporary => {}
        }

        let otp = self.id_gen.generate_otp();
        if self.user_repo.set_verification_otp(&user.id, &otp).await? == 0 {
            return Err(AppError::AlreadyVerified);
        }

        tracing::info!(user_id = %user.id, "Verification token reissued");
        self.dispatch(EmailKind::Verification, &email, &otp).await?;

        Ok(otp)
    }

    /// Store a fresh reset OTP and send the password-reset email.
    ///
    /// Returns the OTP for tests and internal callers. Status is unchanged.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<String> {
        let email = normalize_email(email);
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(email.clone()))?;

        if user.status == UserStatus::Banned {
            return Err(AppError::AccountBanned);
        }

        let otp = self.id_gen.generate_otp();
        if self.user_repo.set_reset_otp(&user.id, &otp).await? == 0 {
            return Err(AppError::AccountBanned);
        }

        tracing::info!(user_id = %user.id, "Password reset requested");
        self.dispatch(EmailKind::PasswordReset, &email, &otp).await?;

        Ok(otp)
    }

    /// Set a new password using a reset OTP, consuming the OTP.
    pub async fn consume_password_reset(&self, otp: &str, new_password: &str) -> AppResult<()> {
        check_otp(otp)?;
        check_password(new_password)?;

        let user = self
            .user_repo
            .find_by_reset_otp(otp)
            .await?
            .ok_or(AppError::OtpNotFound)?;

        if self.credentials.verify(new_password, &user.password)? {
            return Err(AppError::SamePassword);
        }

        let password_hash = self.credentials.hash(new_password)?;
        if self
            .user_repo
            .consume_reset_otp(&user.id, otp, &password_hash)
            .await?
            == 0
        {
            return Err(AppError::OtpNotFound);
        }

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Change the password of an authenticated user.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        if !is_valid_id(user_id) {
            return Err(AppError::InvalidId(user_id.to_string()));
        }
        if new_password == old_password {
            return Err(AppError::SamePassword);
        }
        check_password(new_password)?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(user_id.to_string()))?;

        if !self.credentials.verify(old_password, &user.password)? {
            return Err(AppError::InvalidCredentials);
        }

        let password_hash = self.credentials.hash(new_password)?;
        // Guarded on the hash we just checked against.
        if self
            .user_repo
            .update_password(&user.id, &user.password, &password_hash)
            .await?
            == 0
        {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Classify an account for the connection graph.
    pub async fn is_active(&self, user_id: &str) -> AppResult<AccountActivity> {
        account_activity(&self.user_repo, user_id).await
    }

    /// Whether `username` is well-formed and not yet taken.
    pub async fn is_username_available(&self, username: &str) -> AppResult<bool> {
        validate_username(username).map_err(rule_violation)?;

        Ok(self.user_repo.find_by_username(username).await?.is_none())
    }

    async fn dispatch(&self, kind: EmailKind, recipient: &str, token: &str) -> AppResult<()> {
        self.email
            .send(kind, recipient, token)
            .await
            .inspect_err(|e| {
                tracing::warn!(kind = %kind, recipient = %recipient, error = %e, "Email dispatch failed");
            })
    }
}
