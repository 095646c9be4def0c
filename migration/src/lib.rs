pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_user_table;
mod m20261001_000002_create_pricing_table;
mod m20261001_000003_create_game_server_table;
mod m20261001_000004_create_schedule_table;
mod m20261002_000005_create_guild_table;
mod m20261002_000006_create_guild_member_table;
mod m20261003_000007_create_admin_role_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_user_table::Migration),
            Box::new(m20261001_000002_create_pricing_table::Migration),
            Box::new(m20261001_000003_create_game_server_table::Migration),
            Box::new(m20261001_000004_create_schedule_table::Migration),
            Box::new(m20261002_000005_create_guild_table::Migration),
            Box::new(m20261002_000006_create_guild_member_table::Migration),
            Box::new(m20261003_000007_create_admin_role_table::Migration),
        ]
    }
}
