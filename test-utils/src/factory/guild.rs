//! Guild factory for creating test treasuries.

use crate::factory::helpers::next_id;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating guild treasuries.
///
/// Building a guild also inserts the owner as the first member, keeping
/// `member_count` consistent with the member table.
///
/// # Example
///
/// ```rust,ignore
/// let guild = GuildFactory::new(&db, &owner.discord_id)
///     .id("g1")
///     .balance(500)
///     .build()
///     .await?;
/// ```
pub struct GuildFactory<'a> {
    db: &'a DatabaseConnection,
    id: String,
    display_name: String,
    owner_id: String,
    balance: i64,
}

impl<'a> GuildFactory<'a> {
    /// Creates a new GuildFactory with default values.
    ///
    /// Defaults:
    /// - id: `"guild-{id}"`
    /// - display_name: `"Guild {id}"`
    /// - balance: `0` (recorded as deposited by the owner when non-zero)
    pub fn new(db: &'a DatabaseConnection, owner_id: impl Into<String>) -> Self {
        let id = next_id();
        Self {
            db,
            id: format!("guild-{}", id),
            display_name: format!("Guild {}", id),
            owner_id: owner_id.into(),
            balance: 0,
        }
    }

    /// Sets the guild ID.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the display name.
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the starting balance, attributed to the owner's deposits.
    pub fn balance(mut self, balance: i64) -> Self {
        self.balance = balance;
        self
    }

    /// Builds and inserts the guild and its owner membership.
    pub async fn build(self) -> Result<entity::guild::Model, DbErr> {
        let now = Utc::now();
        let guild = entity::guild::ActiveModel {
            id: ActiveValue::Set(self.id),
            display_name: ActiveValue::Set(self.display_name),
            owner_id: ActiveValue::Set(self.owner_id.clone()),
            balance: ActiveValue::Set(self.balance),
            total_deposits: ActiveValue::Set(self.balance),
            total_spent: ActiveValue::Set(0),
            member_count: ActiveValue::Set(1),
            created_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await?;

        entity::guild_member::ActiveModel {
            id: ActiveValue::NotSet,
            guild_id: ActiveValue::Set(guild.id.clone()),
            user_id: ActiveValue::Set(self.owner_id),
            total_deposits: ActiveValue::Set(self.balance),
            joined_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await?;

        Ok(guild)
    }
}

/// Creates a guild owned by the given user with default values.
pub async fn create_guild(
    db: &DatabaseConnection,
    owner_id: impl Into<String>,
) -> Result<entity::guild::Model, DbErr> {
    GuildFactory::new(db, owner_id).build().await
}
