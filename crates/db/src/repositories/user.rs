//! User repository.

use std::{sync::Arc, time::Duration};

use super::{DEFAULT_OPERATION_TIMEOUT, bounded, db_error, run, unique_violation};
use crate::entities::{
    User,
    user::{self, UserStatus},
};
use aspirez_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    UpdateResult, sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
    timeout: Duration,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Bound every store call by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        run(self.timeout, User::find_by_id(id).one(self.db.as_ref())).await
    }

    /// Find users by IDs. Order of the result is unspecified.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        run(
            self.timeout,
            User::find()
                .filter(user::Column::Id.is_in(ids.to_vec()))
                .all(self.db.as_ref()),
        )
        .await
    }

    /// Find a user by (already normalized) email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        run(
            self.timeout,
            User::find()
                .filter(user::Column::Email.eq(email))
                .one(self.db.as_ref()),
        )
        .await
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        run(
            self.timeout,
            User::find()
                .filter(user::Column::Username.eq(username))
                .one(self.db.as_ref()),
        )
        .await
    }

    /// Find the user holding a pending verification OTP.
    pub async fn find_by_verification_otp(&self, otp: &str) -> AppResult<Option<user::Model>> {
        run(
            self.timeout,
            User::find()
                .filter(user::Column::VerificationOtp.eq(otp))
                .one(self.db.as_ref()),
        )
        .await
    }

    /// Find the user holding a pending password-reset OTP.
    pub async fn find_by_reset_otp(&self, otp: &str) -> AppResult<Option<user::Model>> {
        run(
            self.timeout,
            User::find()
                .filter(user::Column::ResetOtp.eq(otp))
                .one(self.db.as_ref()),
        )
        .await
    }

    /// Insert a new user.
    ///
    /// Violations of the email and username indexes are reported as
    /// [`AppError::DuplicateEmail`] and [`AppError::DuplicateUsername`],
    /// which is what makes concurrent signups with the same email safe. Any
    /// other violation is a database error.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        let email = active_string(&model.email);
        let username = active_string(&model.username);

        match bounded(self.timeout, model.insert(self.db.as_ref())).await? {
            Ok(created) => Ok(created),
            Err(err) => match unique_violation(&err) {
                Some(detail) if detail.contains("username") => {
                    Err(AppError::DuplicateUsername(username))
                }
                Some(detail) if detail.contains("email") => Err(AppError::DuplicateEmail(email)),
                _ => Err(db_error(err)),
            },
        }
    }

    /// Promote a temporary account holding `otp` to permanent, clearing the OTP.
    ///
    /// Returns the number of rows changed; zero means the OTP was already
    /// consumed or the account is no longer temporary.
    pub async fn mark_verified(&self, id: &str, otp: &str) -> AppResult<u64> {
        let result: UpdateResult = run(
            self.timeout,
            User::update_many()
                .col_expr(user::Column::Status, Expr::value(UserStatus::Permanent))
                .col_expr(
                    user::Column::VerificationOtp,
                    Expr::value(Option::<String>::None),
                )
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(user::Column::Id.eq(id))
                .filter(user::Column::VerificationOtp.eq(otp))
                .filter(user::Column::Status.eq(UserStatus::Temporary))
                .exec(self.db.as_ref()),
        )
        .await?;

        Ok(result.rows_affected)
    }

    /// Replace the verification OTP of a temporary account.
    pub async fn set_verification_otp(&self, id: &str, otp: &str) -> AppResult<u64> {
        let result: UpdateResult = run(
            self.timeout,
            User::update_many()
                .col_expr(user::Column::VerificationOtp, Expr::value(otp))
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(user::Column::Id.eq(id))
                .filter(user::Column::Status.eq(UserStatus::Temporary))
                .exec(self.db.as_ref()),
        )
        .await?;

        Ok(result.rows_affected)
    }

    /// Store a fresh password-reset OTP for a non-banned account.
    pub async fn set_reset_otp(&self, id: &str, otp: &str) -> AppResult<u64> {
        let result: UpdateResult = run(
            self.timeout,
            User::update_many()
                .col_expr(user::Column::ResetOtp, Expr::value(otp))
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(user::Column::Id.eq(id))
                .filter(user::Column::Status.ne(UserStatus::Banned))
                .exec(self.db.as_ref()),
        )
        .await?;

        Ok(result.rows_affected)
    }

    /// Store `password_hash` and clear the reset OTP, if `otp` is still pending.
    pub async fn consume_reset_otp(
        &self,
        id: &str,
        otp: &str,
        password_hash: &str,
    ) -> AppResult<u64> {
        let result: UpdateResult = run(
            self.timeout,
            User::update_many()
                .col_expr(user::Column::Password, Expr::value(password_hash))
                .col_expr(user::Column::ResetOtp, Expr::value(Option::<String>::None))
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(user::Column::Id.eq(id))
                .filter(user::Column::ResetOtp.eq(otp))
                .exec(self.db.as_ref()),
        )
        .await?;

        Ok(result.rows_affected)
    }

    /// Replace the password hash, only if it still equals `current_hash`.
    pub async fn update_password(
        &self,
        id: &str,
        current_hash: &str,
        password_hash: &str,
    ) -> AppResult<u64> {
        let result: UpdateResult = run(
            self.timeout,
            User::update_many()
                .col_expr(user::Column::Password, Expr::value(password_hash))
                .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(user::Column::Id.eq(id))
                .filter(user::Column::Password.eq(current_hash))
                .exec(self.db.as_ref()),
        )
        .await?;

        Ok(result.rows_affected)
    }
}

fn active_string(value: &ActiveValue<String>) -> String {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => v.clone(),
        ActiveValue::NotSet => String::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr, Set};
    use serde_json::json;

    fn create_test_user(id: &str, username: &str, status: UserStatus) -> user::Model {
        user::Model {
            id: id.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            phone: "5550100".to_string(),
            college: "Analytical College".to_string(),
            avatar_url: None,
            status,
            role: UserRole::Regular,
            interests: json!(["math", "engines"]),
            verification_otp: Some("AbCdEfGhIjKlMnOpQrSt".to_string()),
            reset_otp: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn active_model(user: &user::Model) -> user::ActiveModel {
        user::ActiveModel {
            id: Set(user.id.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            email: Set(user.email.clone()),
            username: Set(user.username.clone()),
            password: Set(user.password.clone()),
            phone: Set(user.phone.clone()),
            college: Set(user.college.clone()),
            avatar_url: Set(None),
            status: Set(user.status),
            role: Set(user.role),
            interests: Set(user.interests.clone()),
            verification_otp: Set(user.verification_otp.clone()),
            reset_otp: Set(None),
            created_at: Set(user.created_at),
            updated_at: Set(None),
        }
    }

    fn exec_rows(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user("user1", "ada", UserStatus::Permanent);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let found = repo.find_by_id("user1").await.unwrap().unwrap();

        assert_eq!(found.id, "user1");
        assert_eq!(found.username, "ada");
        assert_eq!(found.interest_list(), vec!["math", "engines"]);
    }

    #[tokio::test]
    async fn test_find_by_email_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_email("nobody@example.com").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_store() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_create_user() {
        let user = create_test_user("user1", "ada", UserStatus::Temporary);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let created = repo.create(active_model(&user)).await.unwrap();

        assert_eq!(created.id, "user1");
        assert_eq!(created.status, UserStatus::Temporary);
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let user = create_test_user("user1", "ada", UserStatus::Temporary);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "duplicate key value violates unique constraint \"idx_user_email\"".into(),
                ))])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let err = repo.create(active_model(&user)).await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateEmail(email) if email == "ada@example.com"));
    }

    #[tokio::test]
    async fn test_create_duplicate_username() {
        let user = create_test_user("user1", "ada", UserStatus::Temporary);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "duplicate key value violates unique constraint \"idx_user_username\"".into(),
                ))])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let err = repo.create(active_model(&user)).await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateUsername(name) if name == "ada"));
    }

    #[tokio::test]
    async fn test_create_otp_collision_is_database() {
        let user = create_test_user("user1", "ada", UserStatus::Temporary);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "duplicate key value violates unique constraint \"idx_user_verification_otp\""
                        .into(),
                ))])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let err = repo.create(active_model(&user)).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_create_other_error_is_database() {
        let user = create_test_user("user1", "ada", UserStatus::Temporary);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                    "value too long for type character varying(64)".into(),
                ))])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let err = repo.create(active_model(&user)).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_mark_verified_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_rows(1), exec_rows(0)])
                .into_connection(),
        );

        let repo = UserRepository::new(db);

        assert_eq!(
            repo.mark_verified("user1", "AbCdEfGhIjKlMnOpQrSt")
                .await
                .unwrap(),
            1
        );
        // Second consumer of the same OTP matches nothing.
        assert_eq!(
            repo.mark_verified("user1", "AbCdEfGhIjKlMnOpQrSt")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_consume_reset_otp() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_rows(1)])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let rows = repo
            .consume_reset_otp("user1", "AbCdEfGhIjKlMnOpQrSt", "$argon2id$new")
            .await
            .unwrap();

        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_update_failure_is_reported() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_errors([DbErr::Conn(RuntimeErr::Internal(
                    "connection refused".into(),
                ))])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let err = repo
            .update_password("user1", "$argon2id$old", "$argon2id$new")
            .await
            .unwrap_err();

        assert!(err.is_transient());
    }
}
