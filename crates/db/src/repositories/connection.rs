//! Connection repository.

use std::{sync::Arc, time::Duration};

use super::{DEFAULT_OPERATION_TIMEOUT, bounded, db_error, run, unique_violation};
use crate::entities::{
    Connection,
    connection::{self, ConnectionState},
};
use aspirez_common::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select, UpdateResult, sea_query::Expr,
};

/// Connection repository for database operations.
#[derive(Clone)]
pub struct ConnectionRepository {
    db: Arc<DatabaseConnection>,
    timeout: Duration,
}

/// Restrict a query to active edges.
fn active() -> Select<Connection> {
    Connection::find()
        .filter(connection::Column::UnfollowState.is_null())
        .filter(connection::Column::BlockState.eq(ConnectionState::Allowed))
}

impl ConnectionRepository {
    /// Create a new connection repository.
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

    /// Find the active edge from `follower_id` to `followee_id`, if any.
    pub async fn find_active_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<connection::Model>> {
        run(
            self.timeout,
            active()
                .filter(connection::Column::FollowerId.eq(follower_id))
                .filter(connection::Column::FolloweeId.eq(followee_id))
                .one(self.db.as_ref()),
        )
        .await
    }

    /// Insert a new edge.
    ///
    /// A violation of the active-pair index means another request created
    /// the same edge first, reported as [`AppError::AlreadyFollowing`].
    pub async fn create(&self, model: connection::ActiveModel) -> AppResult<connection::Model> {
        match bounded(self.timeout, model.insert(self.db.as_ref())).await? {
            Ok(created) => Ok(created),
            Err(err) if unique_violation(&err).is_some() => Err(AppError::AlreadyFollowing),
            Err(err) => Err(db_error(err)),
        }
    }

    /// Mark the active edge between the pair as unfollowed.
    ///
    /// Returns the number of rows changed; zero means there was no active edge.
    pub async fn mark_unfollowed(&self, follower_id: &str, followee_id: &str) -> AppResult<u64> {
        let result: UpdateResult = run(
            self.timeout,
            Connection::update_many()
                .col_expr(
                    connection::Column::UnfollowState,
                    Expr::value(ConnectionState::Blocked),
                )
                .col_expr(connection::Column::UnfollowedAt, Expr::value(Utc::now()))
                .filter(connection::Column::FollowerId.eq(follower_id))
                .filter(connection::Column::FolloweeId.eq(followee_id))
                .filter(connection::Column::UnfollowState.is_null())
                .filter(connection::Column::BlockState.eq(ConnectionState::Allowed))
                .exec(self.db.as_ref()),
        )
        .await?;

        Ok(result.rows_affected)
    }

    /// Active edges going out of `user_id`, oldest first.
    pub async fn find_active_by_follower(&self, user_id: &str) -> AppResult<Vec<connection::Model>> {
        run(
            self.timeout,
            active()
                .filter(connection::Column::FollowerId.eq(user_id))
                .order_by_asc(connection::Column::CreatedAt)
                .order_by_asc(connection::Column::Id)
                .all(self.db.as_ref()),
        )
        .await
    }

    /// Active edges coming into `user_id`, oldest first.
    pub async fn find_active_by_followee(&self, user_id: &str) -> AppResult<Vec<connection::Model>> {
        run(
            self.timeout,
            active()
                .filter(connection::Column::FolloweeId.eq(user_id))
                .order_by_asc(connection::Column::CreatedAt)
                .order_by_asc(connection::Column::Id)
                .all(self.db.as_ref()),
        )
        .await
    }
}
