use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Guild::Table)
                    .if_not_exists()
                    .col(string(Guild::Id).primary_key())
                    .col(string(Guild::DisplayName))
                    .col(string(Guild::OwnerId))
                    .col(big_integer(Guild::Balance).default(0))
                    .col(big_integer(Guild::TotalDeposits).default(0))
                    .col(big_integer(Guild::TotalSpent).default(0))
                    .col(integer(Guild::MemberCount).default(0))
                    .col(
                        timestamp(Guild::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Guild::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Guild {
    Table,
    Id,
    DisplayName,
    OwnerId,
    Balance,
    TotalDeposits,
    TotalSpent,
    MemberCount,
    CreatedAt,
}
