//! User factory for creating test ledger accounts.
//!
//! This module provides factory methods for creating user entities with sensible
//! defaults, reducing boilerplate in tests. The factory supports customization
//! through a builder pattern.

use crate::factory::helpers::next_id;
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating test users with customizable fields.
///
/// # Example
///
/// ```rust,ignore
/// use test_utils::factory::user::UserFactory;
///
/// let user = UserFactory::new(&db)
///     .discord_id("123456789")
///     .balance(250)
///     .tier("premium")
///     .build()
///     .await?;
/// ```
pub struct UserFactory<'a> {
    db: &'a DatabaseConnection,
    discord_id: String,
    balance: i64,
    tier: String,
    admin: bool,
    last_daily: Option<DateTime<Utc>>,
    last_work: Option<DateTime<Utc>>,
}

impl<'a> UserFactory<'a> {
    /// Creates a new UserFactory with default values.
    ///
    /// Defaults:
    /// - discord_id: auto-incremented numeric string
    /// - balance: `0`
    /// - tier: `"free"`
    /// - admin: `false`
    /// - last_daily / last_work: `None` (never claimed)
    pub fn new(db: &'a DatabaseConnection) -> Self {
        let id = next_id();
        Self {
            db,
            discord_id: id.to_string(),
            balance: 0,
            tier: "free".to_string(),
            admin: false,
            last_daily: None,
            last_work: None,
        }
    }

    /// Sets the Discord ID for the user.
    pub fn discord_id(mut self, discord_id: impl Into<String>) -> Self {
        self.discord_id = discord_id.into();
        self
    }

    /// Sets the starting credit balance.
    pub fn balance(mut self, balance: i64) -> Self {
        self.balance = balance;
        self
    }

    /// Sets the account tier (`"free"` or `"premium"`).
    pub fn tier(mut self, tier: impl Into<String>) -> Self {
        self.tier = tier.into();
        self
    }

    /// Sets the platform admin flag.
    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    /// Sets the last daily claim timestamp.
    pub fn last_daily(mut self, last_daily: Option<DateTime<Utc>>) -> Self {
        self.last_daily = last_daily;
        self
    }

    /// Sets the last work claim timestamp.
    pub fn last_work(mut self, last_work: Option<DateTime<Utc>>) -> Self {
        self.last_work = last_work;
        self
    }

    /// Builds and inserts the user entity into the database.
    ///
    /// # Returns
    /// - `Ok(entity::user::Model)` - Created user entity
    /// - `Err(DbErr)` - Database error during insert
    pub async fn build(self) -> Result<entity::user::Model, DbErr> {
        entity::user::ActiveModel {
            discord_id: ActiveValue::Set(self.discord_id),
            balance: ActiveValue::Set(self.balance),
            tier: ActiveValue::Set(self.tier),
            admin: ActiveValue::Set(self.admin),
            last_daily: ActiveValue::Set(self.last_daily),
            last_work: ActiveValue::Set(self.last_work),
            last_ad_reward: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }
}

/// Creates a user with default values.
///
/// Shorthand for `UserFactory::new(db).build().await`.
pub async fn create_user(db: &DatabaseConnection) -> Result<entity::user::Model, DbErr> {
    UserFactory::new(db).build().await
}

/// Creates a user with the given starting balance.
///
/// Shorthand for `UserFactory::new(db).balance(balance).build().await`.
pub async fn create_user_with_balance(
    db: &DatabaseConnection,
    balance: i64,
) -> Result<entity::user::Model, DbErr> {
    UserFactory::new(db).balance(balance).build().await
}
