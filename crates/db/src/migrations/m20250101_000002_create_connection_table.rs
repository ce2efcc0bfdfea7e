//! Create connection table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Connection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Connection::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Connection::FollowerId).string_len(32).not_null())
                    .col(ColumnDef::new(Connection::FolloweeId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Connection::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Connection::BlockState)
                            .string_len(16)
                            .not_null()
                            .default("allowed"),
                    )
                    .col(ColumnDef::new(Connection::BlockedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Connection::UnfollowState).string_len(16))
                    .col(ColumnDef::new(Connection::UnfollowedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_follower")
                            .from(Connection::Table, Connection::FollowerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_connection_followee")
                            .from(Connection::Table, Connection::FolloweeId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE "connection"
                ADD CONSTRAINT chk_connection_not_self
                CHECK (follower_id <> followee_id);
                "#,
            )
            .await?;

        // At most one active edge per ordered pair. Historical (unfollowed or
        // blocked) rows are outside the predicate and may repeat.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_connection_active_pair
                ON "connection" (follower_id, followee_id)
                WHERE unfollow_state IS NULL AND block_state = 'allowed';
                "#,
            )
            .await?;

        // Index: followee_id (for listing followers)
        manager
            .create_index(
                Index::create()
                    .name("idx_connection_followee_id")
                    .table(Connection::Table)
                    .col(Connection::FolloweeId)
                    .col(Connection::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: follower_id (for listing followees)
        manager
            .create_index(
                Index::create()
                    .name("idx_connection_follower_id")
                    .table(Connection::Table)
                    .col(Connection::FollowerId)
                    .col(Connection::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Connection::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Connection {
    Table,
    Id,
    FollowerId,
    FolloweeId,
    CreatedAt,
    BlockState,
    BlockedAt,
    UnfollowState,
    UnfollowedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
