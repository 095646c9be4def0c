use sea_orm_migration::{prelude::*, schema::*};

use super::m20261001_000003_create_game_server_table::GameServer;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Schedule::Table)
                    .if_not_exists()
                    .col(pk_auto(Schedule::Id))
                    .col(integer(Schedule::ServerId))
                    .col(string(Schedule::OwnerId))
                    .col(string(Schedule::Action))
                    .col(string(Schedule::CronExpression))
                    .col(string(Schedule::Timezone).default("UTC"))
                    .col(boolean(Schedule::Enabled).default(true))
                    .col(timestamp_null(Schedule::NextRun))
                    .col(timestamp_null(Schedule::LastRun))
                    .col(
                        timestamp(Schedule::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_server_id")
                            .from(Schedule::Table, Schedule::ServerId)
                            .to(GameServer::Table, GameServer::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_enabled_next_run")
                    .table(Schedule::Table)
                    .col(Schedule::Enabled)
                    .col(Schedule::NextRun)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schedule::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Schedule {
    Table,
    Id,
    ServerId,
    OwnerId,
    Action,
    CronExpression,
    Timezone,
    Enabled,
    NextRun,
    LastRun,
    CreatedAt,
}
