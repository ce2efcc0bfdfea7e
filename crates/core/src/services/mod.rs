//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod connection;
pub mod credential;
pub mod email;
pub mod session;

pub use account::{
    AccountActivity, AccountService, AccountSummary, CreateAccountInput, SignupOutcome,
    normalize_email, validate_password, validate_username,
};
pub use connection::{ConnectionService, UserSummary};
pub use credential::CredentialStore;
pub use email::{EmailKind, EmailMessage, EmailSender, EmailSenderRef, LoggingEmailSender};
pub use session::{
    IssuedSession, JwtSigner, SessionClaims, SessionService, TokenSigner, TokenSignerRef,
};
