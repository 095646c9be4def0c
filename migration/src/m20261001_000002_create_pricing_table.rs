use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pricing::Table)
                    .if_not_exists()
                    .col(string(Pricing::GameType).primary_key())
                    .col(string(Pricing::DisplayName))
                    .col(text(Pricing::Description))
                    .col(big_integer(Pricing::CostPerHour))
                    .col(big_integer(Pricing::MinCredits).default(0))
                    .col(boolean(Pricing::IsActive).default(true))
                    .col(
                        timestamp(Pricing::UpdatedAt)
                            .default(Expr::current_timestamp())
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pricing::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Pricing {
    Table,
    GameType,
    DisplayName,
    Description,
    CostPerHour,
    MinCredits,
    IsActive,
    UpdatedAt,
}
