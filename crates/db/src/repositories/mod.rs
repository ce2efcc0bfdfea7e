//! Repositories over the persistent store.
//!
//! Every store call goes through [`bounded`], so a slow or unreachable
//! database surfaces as [`AppError::StoreUnavailable`] rather than a hang.

mod connection;
mod user;

pub use connection::ConnectionRepository;
pub use user::UserRepository;

use std::{future::Future, time::Duration};

use aspirez_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Timeout applied when a repository is built without an explicit one.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

const UNIQUE_VIOLATION_MESSAGE: &str = "duplicate key value violates unique constraint";

/// Run a store future under `limit`.
///
/// The outer error is the timeout; the inner result is left untouched so
/// callers can inspect constraint violations before mapping.
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> Result<Result<T, DbErr>, AppError>
where
    F: Future<Output = Result<T, DbErr>>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        tracing::warn!(timeout_ms = limit.as_millis(), "Store operation timed out");
        AppError::StoreUnavailable(format!(
            "operation exceeded {}ms",
            limit.as_millis()
        ))
    })
}

/// Like [`bounded`], with the store error mapped through [`db_error`].
pub(crate) async fn run<T, F>(limit: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, DbErr>>,
{
    bounded(limit, fut).await?.map_err(db_error)
}

/// Map a store error onto the application taxonomy.
///
/// Pool exhaustion and lost connections are transient; everything else is
/// reported as a database error.
pub(crate) fn db_error(err: DbErr) -> AppError {
    match err {
        DbErr::ConnectionAcquire(e) => AppError::StoreUnavailable(e.to_string()),
        DbErr::Conn(e) => AppError::StoreUnavailable(e.to_string()),
        other => AppError::Database(other.to_string()),
    }
}

/// Returns the violation message if `err` is a unique constraint violation.
pub(crate) fn unique_violation(err: &DbErr) -> Option<String> {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return Some(detail);
    }

    let message = err.to_string();
    message
        .contains(UNIQUE_VIOLATION_MESSAGE)
        .then_some(message)
}
