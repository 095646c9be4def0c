//! Pricing factory for creating test game type entries.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Factory for creating pricing entries with customizable fields.
///
/// # Example
///
/// ```rust,ignore
/// let pricing = PricingFactory::new(&db, "minecraft")
///     .cost_per_hour(5)
///     .min_credits(10)
///     .build()
///     .await?;
/// ```
pub struct PricingFactory<'a> {
    db: &'a DatabaseConnection,
    game_type: String,
    display_name: String,
    cost_per_hour: i64,
    min_credits: i64,
    is_active: bool,
}

impl<'a> PricingFactory<'a> {
    /// Creates a new PricingFactory with default values.
    ///
    /// Defaults:
    /// - display_name: the game type
    /// - cost_per_hour: `5`
    /// - min_credits: `0`
    /// - is_active: `true`
    pub fn new(db: &'a DatabaseConnection, game_type: impl Into<String>) -> Self {
        let game_type = game_type.into();
        Self {
            db,
            display_name: game_type.clone(),
            game_type,
            cost_per_hour: 5,
            min_credits: 0,
            is_active: true,
        }
    }

    /// Sets the hourly cost.
    pub fn cost_per_hour(mut self, cost_per_hour: i64) -> Self {
        self.cost_per_hour = cost_per_hour;
        self
    }

    /// Sets the minimum balance required to create a server.
    pub fn min_credits(mut self, min_credits: i64) -> Self {
        self.min_credits = min_credits;
        self
    }

    /// Sets whether the game type accepts new servers.
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Builds and inserts the pricing entity into the database.
    pub async fn build(self) -> Result<entity::pricing::Model, DbErr> {
        entity::pricing::ActiveModel {
            game_type: ActiveValue::Set(self.game_type),
            display_name: ActiveValue::Set(self.display_name),
            description: ActiveValue::Set("Test game".to_string()),
            cost_per_hour: ActiveValue::Set(self.cost_per_hour),
            min_credits: ActiveValue::Set(self.min_credits),
            is_active: ActiveValue::Set(self.is_active),
            updated_at: ActiveValue::Set(Utc::now()),
        }
        .insert(self.db)
        .await
    }
}

/// Creates an active pricing entry with the given hourly cost.
pub async fn create_pricing(
    db: &DatabaseConnection,
    game_type: impl Into<String>,
    cost_per_hour: i64,
) -> Result<entity::pricing::Model, DbErr> {
    PricingFactory::new(db, game_type)
        .cost_per_hour(cost_per_hour)
        .build()
        .await
}
