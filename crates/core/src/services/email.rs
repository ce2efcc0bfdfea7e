//! Outgoing account emails.
//!
//! Transport is pluggable through [`EmailSender`]. The bundled
//! [`LoggingEmailSender`] renders the message and writes it to the log.

use async_trait::async_trait;
use aspirez_common::{AppResult, config::EmailConfig};
use std::sync::Arc;

/// Kind of account email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    /// Link carrying the verification OTP.
    Verification,
    /// Link carrying the password-reset OTP.
    PasswordReset,
}

impl std::fmt::Display for EmailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verification => write!(f, "verification"),
            Self::PasswordReset => write!(f, "password_reset"),
        }
    }
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

impl EmailMessage {
    /// Render the message for `kind`, embedding `token` in a link to the web app.
    #[must_use]
    pub fn render(config: &EmailConfig, kind: EmailKind, recipient: &str, token: &str) -> Self {
        let app_url = config.app_url.trim_end_matches('/');
        let (subject, text_body) = match kind {
            EmailKind::Verification => (
                "Email Verification".to_string(),
                format!(
                    "Hi there,\n\nPlease follow the link below to verify your email:\n\
                     {app_url}/verify/{token}\n\nThanks"
                ),
            ),
            EmailKind::PasswordReset => (
                "Password Reset".to_string(),
                format!(
                    "Hi there,\n\nA password reset was requested for your account.\n\
                     Follow the link below to choose a new password:\n\
                     {app_url}/reset-password/{token}\n\n\
                     If you did not request this, you can ignore this email."
                ),
            ),
        };

        Self {
            from: config.from_address.clone(),
            to: recipient.to_string(),
            subject,
            text_body,
        }
    }
}

/// Trait for sending account emails.
///
/// Failures must be reported as [`aspirez_common::AppError::EmailDelivery`].
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email of `kind` carrying `token` to `recipient`.
    async fn send(&self, kind: EmailKind, recipient: &str, token: &str) -> AppResult<()>;
}

/// Type alias for a shared email sender.
pub type EmailSenderRef = Arc<dyn EmailSender>;

/// Sender that renders messages and logs them instead of delivering.
#[derive(Debug, Clone)]
pub struct LoggingEmailSender {
    config: EmailConfig,
}

impl LoggingEmailSender {
    #[must_use]
    pub const fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, kind: EmailKind, recipient: &str, token: &str) -> AppResult<()> {
        let message = EmailMessage::render(&self.config, kind, recipient, token);
        tracing::info!(
            kind = %kind,
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "Email rendered"
        );
        tracing::debug!(body = %message.text_body, "Email body");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            from_address: "noreply@aspirez.example".to_string(),
            app_url: "http://localhost:3000/".to_string(),
        }
    }

    #[test]
    fn test_render_verification_link() {
        let message = EmailMessage::render(
            &config(),
            EmailKind::Verification,
            "ada@example.com",
            "AbCdEfGhIjKlMnOpQrSt",
        );

        assert_eq!(message.subject, "Email Verification");
        assert_eq!(message.to, "ada@example.com");
        assert!(
            message
                .text_body
                .contains("http://localhost:3000/verify/AbCdEfGhIjKlMnOpQrSt")
        );
    }

    #[test]
    fn test_render_reset_link() {
        let message = EmailMessage::render(
            &config(),
            EmailKind::PasswordReset,
            "ada@example.com",
            "AbCdEfGhIjKlMnOpQrSt",
        );

        assert_eq!(message.subject, "Password Reset");
        assert!(
            message
                .text_body
                .contains("http://localhost:3000/reset-password/AbCdEfGhIjKlMnOpQrSt")
        );
    }

    #[tokio::test]
    async fn test_logging_sender_succeeds() {
        let sender = LoggingEmailSender::new(config());
        let result = sender
            .send(EmailKind::Verification, "ada@example.com", "token")
            .await;
        assert!(result.is_ok());
    }
}
