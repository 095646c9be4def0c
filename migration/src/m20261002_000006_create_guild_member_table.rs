use sea_orm_migration::{prelude::*, schema::*};

use super::m20261002_000005_create_guild_table::Guild;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GuildMember::Table)
                    .if_not_exists()
                    .col(pk_auto(GuildMember::Id))
                    .col(string(GuildMember::GuildId))
                    .col(string(GuildMember::UserId))
                    .col(big_integer(GuildMember::TotalDeposits).default(0))
                    .col(
                        timestamp(GuildMember::JoinedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_guild_member_guild_id")
                            .from(GuildMember::Table, GuildMember::GuildId)
                            .to(Guild::Table, Guild::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_guild_member_guild_user")
                    .table(GuildMember::Table)
                    .col(GuildMember::GuildId)
                    .col(GuildMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GuildMember::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum GuildMember {
    Table,
    Id,
    GuildId,
    UserId,
    TotalDeposits,
    JoinedAt,
}
