//! Connection entity (directed follow edges between users).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allowed/blocked flag used for both the block and unfollow markers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[sea_orm(string_value = "allowed")]
    #[default]
    Allowed,
    #[sea_orm(string_value = "blocked")]
    Blocked,
}

/// A follow edge.
///
/// An edge is active while `unfollow_state` is NULL and `block_state` is
/// `Allowed`. Unfollowing stamps the row instead of deleting it, so a pair
/// may own many historical rows but at most one active one.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "connection")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who is following
    pub follower_id: String,

    /// The user being followed
    pub followee_id: String,

    pub created_at: DateTimeWithTimeZone,

    pub block_state: ConnectionState,

    #[sea_orm(nullable)]
    pub blocked_at: Option<DateTimeWithTimeZone>,

    #[sea_orm(nullable)]
    pub unfollow_state: Option<ConnectionState>,

    #[sea_orm(nullable)]
    pub unfollowed_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether this edge currently counts as a follow.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.unfollow_state.is_none() && self.block_state == ConnectionState::Allowed
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FollowerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Follower,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::FolloweeId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Followee,
}

impl ActiveModelBehavior for ActiveModel {}
