//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account lifecycle status.
///
/// `Temporary` accounts become `Permanent` once their email is verified.
/// `Banned` is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[sea_orm(string_value = "temporary")]
    #[default]
    Temporary,
    #[sea_orm(string_value = "permanent")]
    Permanent,
    #[sea_orm(string_value = "banned")]
    Banned,
}

/// Account role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "regular")]
    #[default]
    Regular,
    #[sea_orm(string_value = "superadmin")]
    Superadmin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub first_name: String,

    pub last_name: String,

    /// Trimmed and lowercased before storage.
    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    /// Argon2id PHC string.
    #[serde(skip_serializing)]
    pub password: String,

    pub phone: String,

    pub college: String,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    pub status: UserStatus,

    pub role: UserRole,

    /// Ordered list of interest tags.
    #[sea_orm(column_type = "JsonBinary")]
    pub interests: Json,

    /// Pending email verification token; cleared once consumed.
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub verification_otp: Option<String>,

    /// Pending password reset token; cleared once consumed.
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub reset_otp: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Display name built from first and last name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Interest tags in stored order. Non-string entries are skipped.
    #[must_use]
    pub fn interest_list(&self) -> Vec<String> {
        self.interests
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
