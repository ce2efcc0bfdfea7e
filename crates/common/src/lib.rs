//! Common utilities and shared types for aspirez-rs.
//!
//! This crate provides foundational components used across all aspirez-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: The closed error enumeration [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID identifiers and one-time tokens via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use aspirez_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let otp = id_gen.generate_otp();
//!     println!("{} issued {}", config.auth.issuer, otp);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind};
pub use id::{IdGenerator, OTP_LENGTH, is_valid_id, is_valid_otp};
