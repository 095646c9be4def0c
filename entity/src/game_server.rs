use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "game_server")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub owner_id: String,
    pub guild_id: Option<String>,
    pub name: String,
    pub game_type: String,
    pub status: String,
    pub cost_per_hour: i64,
    pub external_id: Option<String>,
    pub address: Option<String>,
    pub port: Option<i32>,
    pub is_public: bool,
    pub error_message: Option<String>,
    pub created_at: DateTimeUtc,
    pub stopped_at: Option<DateTimeUtc>,
    pub last_billed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::schedule::Entity")]
    Schedule,
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedule.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
