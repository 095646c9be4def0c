use sea_orm_migration::{prelude::*, schema::*};

use super::m20261001_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameServer::Table)
                    .if_not_exists()
                    .col(pk_auto(GameServer::Id))
                    .col(string(GameServer::OwnerId))
                    .col(string_null(GameServer::GuildId))
                    .col(string(GameServer::Name))
                    .col(string(GameServer::GameType))
                    .col(string(GameServer::Status))
                    .col(big_integer(GameServer::CostPerHour))
                    .col(string_null(GameServer::ExternalId))
                    .col(string_null(GameServer::Address))
                    .col(integer_null(GameServer::Port))
                    .col(boolean(GameServer::IsPublic).default(false))
                    .col(text_null(GameServer::ErrorMessage))
                    .col(
                        timestamp(GameServer::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .col(timestamp_null(GameServer::StoppedAt))
                    .col(timestamp(GameServer::LastBilledAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_server_owner_id")
                            .from(GameServer::Table, GameServer::OwnerId)
                            .to(User::Table, User::DiscordId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_server_owner_name")
                    .table(GameServer::Table)
                    .col(GameServer::OwnerId)
                    .col(GameServer::Name)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameServer::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum GameServer {
    Table,
    Id,
    OwnerId,
    GuildId,
    Name,
    GameType,
    Status,
    CostPerHour,
    ExternalId,
    Address,
    Port,
    IsPublic,
    ErrorMessage,
    CreatedAt,
    StoppedAt,
    LastBilledAt,
}
