use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub discord_id: String,
    pub balance: i64,
    pub tier: String,
    pub admin: bool,
    pub last_daily: Option<DateTimeUtc>,
    pub last_work: Option<DateTimeUtc>,
    pub last_ad_reward: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
