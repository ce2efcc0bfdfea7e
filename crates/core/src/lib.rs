//! Core business logic for aspirez-rs.
//!
//! Account lifecycle, credential hashing, the follow graph and session
//! issuance. Every operation returns [`aspirez_common::AppResult`]; HTTP
//! status mapping happens in the API crate.

pub mod services;

pub use services::*;
