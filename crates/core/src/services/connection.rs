//! Connection graph service.

use std::collections::HashMap;

use aspirez_common::{AppError, AppResult, IdGenerator, is_valid_id};
use aspirez_db::{
    entities::{
        connection::{self, ConnectionState},
        user,
    },
    repositories::{ConnectionRepository, UserRepository},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Serialize;

use super::account::{AccountActivity, account_activity};

/// Connection graph service for business logic.
///
/// Sole writer of connection rows. Accounts are only read, to check that
/// both ends of an edge are active.
#[derive(Clone)]
pub struct ConnectionService {
    connection_repo: ConnectionRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// A user as shown in follower/followee lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.display_name(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

impl ConnectionService {
    /// Create a new connection service.
    #[must_use]
    pub const fn new(
        connection_repo: ConnectionRepository,
        user_repo: UserRepository,
        id_gen: IdGenerator,
    ) -> Self {
        Self {
            connection_repo,
            user_repo,
            id_gen,
        }
    }

    /// Follow `followee_id`. Returns the follower's followees afterwards.
    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> AppResult<Vec<UserSummary>> {
        self.check_participants(follower_id, followee_id).await?;

        // Fast path only; the active-pair index settles concurrent follows.
        if self
            .connection_repo
            .find_active_pair(follower_id, followee_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyFollowing);
        }

        let model = connection::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(followee_id.to_string()),
            created_at: Set(Utc::now().into()),
            block_state: Set(ConnectionState::Allowed),
            blocked_at: Set(None),
            unfollow_state: Set(None),
            unfollowed_at: Set(None),
        };
        self.connection_repo.create(model).await?;

        tracing::info!(follower_id = %follower_id, followee_id = %followee_id, "Followed");

        self.list_followees(follower_id).await
    }

    /// Unfollow `followee_id`. Returns the follower's followees afterwards.
    pub async fn unfollow(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Vec<UserSummary>> {
        self.check_participants(follower_id, followee_id).await?;

        if self
            .connection_repo
            .mark_unfollowed(follower_id, followee_id)
            .await?
            == 0
        {
            return Err(AppError::NotFollowing);
        }

        tracing::info!(follower_id = %follower_id, followee_id = %followee_id, "Unfollowed");

        self.list_followees(follower_id).await
    }

    /// Users following `user_id`, oldest edge first.
    pub async fn list_followers(&self, user_id: &str) -> AppResult<Vec<UserSummary>> {
        if !is_valid_id(user_id) {
            return Err(AppError::InvalidId(user_id.to_string()));
        }

        let edges = self.connection_repo.find_active_by_followee(user_id).await?;
        self.summarize(edges.into_iter().map(|e| e.follower_id).collect())
            .await
    }

    /// Users `user_id` follows, oldest edge first.
    pub async fn list_followees(&self, user_id: &str) -> AppResult<Vec<UserSummary>> {
        if !is_valid_id(user_id) {
            return Err(AppError::InvalidId(user_id.to_string()));
        }

        let edges = self.connection_repo.find_active_by_follower(user_id).await?;
        self.summarize(edges.into_iter().map(|e| e.followee_id).collect())
            .await
    }

    /// Self-edges are rejected before any store access; then both ends must be active.
    async fn check_participants(&self, follower_id: &str, followee_id: &str) -> AppResult<()> {
        if follower_id == followee_id {
            return Err(AppError::SelfFollow);
        }

        match account_activity(&self.user_repo, follower_id).await? {
            AccountActivity::Active => {}
            other => {
                return Err(AppError::InactiveFollower(
                    format!("{other:?}").to_lowercase(),
                ));
            }
        }

        match account_activity(&self.user_repo, followee_id).await? {
            AccountActivity::Active => Ok(()),
            other => Err(AppError::InactiveFollowee(
                format!("{other:?}").to_lowercase(),
            )),
        }
    }

    /// Resolve ids to summaries, keeping `ids` order. Ids without a user are skipped.
    async fn summarize(&self, ids: Vec<String>) -> AppResult<Vec<UserSummary>> {
        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(ids
            .iter()
            .filter_map(|id| users.get(id).map(UserSummary::from))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use aspirez_db::entities::user::{UserRole, UserStatus};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, RuntimeErr};
    use serde_json::json;
    use std::sync::Arc;

    const ALICE: &str = "01hzx3k7q9v2m4n6p8r0s2t4v6";
    const BOB: &str = "01hzx3k7q9v2m4n6p8r0s2t4v7";
    const CAROL: &str = "01hzx3k7q9v2m4n6p8r0s2t4v8";

    fn create_test_user(id: &str, username: &str, status: UserStatus) -> user::Model {
        user::Model {
            id: id.to_string(),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            password: "$argon2id$stored".to_string(),
            phone: "5550100".to_string(),
            college: "Test College".to_string(),
            avatar_url: None,
            status,
            role: UserRole::Regular,
            interests: json!([]),
            verification_otp: None,
            reset_otp: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_connection(id: &str, follower_id: &str, followee_id: &str) -> connection::Model {
        connection::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
            block_state: ConnectionState::Allowed,
            blocked_at: None,
            unfollow_state: None,
            unfollowed_at: None,
        }
    }

    /// Connection rows and user rows are served by separate mock connections.
    fn service(connections: MockDatabase, users: MockDatabase) -> ConnectionService {
        ConnectionService::new(
            ConnectionRepository::new(Arc::new(connections.into_connection())),
            UserRepository::new(Arc::new(users.into_connection())),
            IdGenerator::new(),
        )
    }

    #[tokio::test]
    async fn test_follow_self_fails_without_store_access() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let err = service.follow(ALICE, ALICE).await.unwrap_err();
        assert!(matches!(err, AppError::SelfFollow));

        // Even malformed ids hit the self check first.
        let err = service.follow("x", "x").await.unwrap_err();
        assert!(matches!(err, AppError::SelfFollow));
    }

    #[tokio::test]
    async fn test_follow_success_returns_followees() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let bob = create_test_user(BOB, "bob", UserStatus::Permanent);
        let edge = create_test_connection("c1", ALICE, BOB);

        let connections = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<connection::Model>::new()])
            .append_query_results([[edge.clone()]])
            .append_query_results([[edge]]);
        let users = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice]])
            .append_query_results([[bob.clone()]])
            .append_query_results([[bob]]);

        let followees = service(connections, users).follow(ALICE, BOB).await.unwrap();

        assert_eq!(followees.len(), 1);
        assert_eq!(followees[0].id, BOB);
        assert_eq!(followees[0].name, "bob Tester");
    }

    #[tokio::test]
    async fn test_follow_inactive_followee() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let bob = create_test_user(BOB, "bob", UserStatus::Banned);

        let users = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice]])
            .append_query_results([[bob]]);

        let err = service(MockDatabase::new(DatabaseBackend::Postgres), users)
            .follow(ALICE, BOB)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InactiveFollowee(_)));
    }

    #[tokio::test]
    async fn test_follow_unverified_follower() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Temporary);
        let users = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[alice]]);

        let err = service(MockDatabase::new(DatabaseBackend::Postgres), users)
            .follow(ALICE, BOB)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InactiveFollower(_)));
    }

    #[tokio::test]
    async fn test_follow_malformed_followee_id() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let users = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[alice]]);

        let err = service(MockDatabase::new(DatabaseBackend::Postgres), users)
            .follow(ALICE, "64b7f0c2e4b0a1a2b3c4d5e6")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_follow_existing_edge() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let bob = create_test_user(BOB, "bob", UserStatus::Permanent);

        let connections = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_connection("c1", ALICE, BOB)]]);
        let users = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice]])
            .append_query_results([[bob]]);

        let err = service(connections, users)
            .follow(ALICE, BOB)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyFollowing));
    }

    #[tokio::test]
    async fn test_follow_lost_race_is_already_following() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let bob = create_test_user(BOB, "bob", UserStatus::Permanent);

        let connections = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<connection::Model>::new()])
            .append_query_errors([DbErr::Query(RuntimeErr::Internal(
                "duplicate key value violates unique constraint \"idx_connection_active_pair\""
                    .into(),
            ))]);
        let users = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice]])
            .append_query_results([[bob]]);

        let err = service(connections, users)
            .follow(ALICE, BOB)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AlreadyFollowing));
    }

    #[tokio::test]
    async fn test_unfollow_without_edge() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let bob = create_test_user(BOB, "bob", UserStatus::Permanent);

        let connections =
            MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }]);
        let users = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice]])
            .append_query_results([[bob]]);

        let err = service(connections, users)
            .unfollow(ALICE, BOB)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFollowing));
    }

    #[tokio::test]
    async fn test_unfollow_success() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let bob = create_test_user(BOB, "bob", UserStatus::Permanent);

        let connections = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([Vec::<connection::Model>::new()]);
        let users = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice]])
            .append_query_results([[bob]]);

        let followees = service(connections, users).unfollow(ALICE, BOB).await.unwrap();
        assert!(followees.is_empty());
    }

    #[tokio::test]
    async fn test_refollow_after_unfollow() {
        let alice = create_test_user(ALICE, "alice", UserStatus::Permanent);
        let bob = create_test_user(BOB, "bob", UserStatus::Permanent);
        let first = create_test_connection("c1", ALICE, BOB);
        let second = create_test_connection("c2", ALICE, BOB);

        let connections = MockDatabase::new(DatabaseBackend::Postgres)
            // follow
            .append_query_results([Vec::<connection::Model>::new()])
            .append_query_results([[first.clone()]])
            .append_query_results([[first]])
            // unfollow
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .append_query_results([Vec::<connection::Model>::new()])
            // follow again
            .append_query_results([Vec::<connection::Model>::new()])
            .append_query_results([[second.clone()]])
            .append_query_results([[second]]);
        let users = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[alice.clone()]])
            .append_query_results([[bob.clone()]])
            .append_query_results([[bob.clone()]])
            .append_query_results([[alice.clone()]])
            .append_query_results([[bob.clone()]])
            .append_query_results([[alice]])
            .append_query_results([[bob.clone()]])
            .append_query_results([[bob]]);

        let service = service(connections, users);

        assert_eq!(service.follow(ALICE, BOB).await.unwrap().len(), 1);
        assert!(service.unfollow(ALICE, BOB).await.unwrap().is_empty());

        let followees = service.follow(ALICE, BOB).await.unwrap();
        assert_eq!(followees.len(), 1);
        assert_eq!(followees[0].id, BOB);
    }

    #[tokio::test]
    async fn test_list_followers_keeps_edge_order() {
        let connections = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_connection("c1", CAROL, ALICE),
            create_test_connection("c2", BOB, ALICE),
        ]]);
        // Store returns users in a different order than the edges.
        let users = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[
            create_test_user(BOB, "bob", UserStatus::Permanent),
            create_test_user(CAROL, "carol", UserStatus::Permanent),
        ]]);

        let followers = service(connections, users)
            .list_followers(ALICE)
            .await
            .unwrap();

        let names: Vec<_> = followers.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["carol", "bob"]);
    }

    #[tokio::test]
    async fn test_list_followees_empty() {
        let connections = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<connection::Model>::new()]);

        let followees = service(connections, MockDatabase::new(DatabaseBackend::Postgres))
            .list_followees(ALICE)
            .await
            .unwrap();

        assert!(followees.is_empty());
    }
}
