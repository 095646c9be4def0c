use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdminRole::Table)
                    .if_not_exists()
                    .col(pk_auto(AdminRole::Id))
                    .col(string(AdminRole::GuildId))
                    .col(string(AdminRole::RoleId))
                    .col(string(AdminRole::Level))
                    .col(
                        timestamp(AdminRole::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_admin_role_guild_role")
                    .table(AdminRole::Table)
                    .col(AdminRole::GuildId)
                    .col(AdminRole::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminRole::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AdminRole {
    Table,
    Id,
    GuildId,
    RoleId,
    Level,
    CreatedAt,
}
