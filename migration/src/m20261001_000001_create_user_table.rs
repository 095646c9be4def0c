use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(string(User::DiscordId).primary_key())
                    .col(big_integer(User::Balance).default(0))
                    .col(string(User::Tier).default("free"))
                    .col(boolean(User::Admin).default(false))
                    .col(timestamp_null(User::LastDaily))
                    .col(timestamp_null(User::LastWork))
                    .col(timestamp_null(User::LastAdReward))
                    .col(
                        timestamp(User::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    DiscordId,
    Balance,
    Tier,
    Admin,
    LastDaily,
    LastWork,
    LastAdReward,
    CreatedAt,
}
