//! Pricing catalog repository.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::server::{
    error::AppError,
    model::pricing::{AddGameTypeParam, PricingEntry},
};

pub struct PricingRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> PricingRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Finds an entry by its normalized game type, active or not.
    pub async fn find(&self, game_type: &str) -> Result<Option<PricingEntry>, AppError> {
        let entity = entity::prelude::Pricing::find_by_id(game_type.to_string())
            .one(self.db)
            .await?;

        Ok(entity.map(PricingEntry::from_entity))
    }

    /// Lists entries ordered by game type.
    ///
    /// # Arguments
    /// - `active_only` - Skip disabled game types
    pub async fn list(&self, active_only: bool) -> Result<Vec<PricingEntry>, AppError> {
        let mut query = entity::prelude::Pricing::find();
        if active_only {
            query = query.filter(entity::pricing::Column::IsActive.eq(true));
        }

        let entities = query
            .order_by_asc(entity::pricing::Column::GameType)
            .all(self.db)
            .await?;

        Ok(entities.into_iter().map(PricingEntry::from_entity).collect())
    }

    pub async fn count(&self) -> Result<u64, AppError> {
        Ok(entity::prelude::Pricing::find().count(self.db).await?)
    }

    /// Inserts an active entry. `param.game_type` must already be normalized.
    pub async fn insert(
        &self,
        param: AddGameTypeParam,
        now: DateTime<Utc>,
    ) -> Result<PricingEntry, AppError> {
        let entity = entity::pricing::ActiveModel {
            game_type: ActiveValue::Set(param.game_type),
            display_name: ActiveValue::Set(param.display_name),
            description: ActiveValue::Set(param.description),
            cost_per_hour: ActiveValue::Set(param.cost_per_hour),
            min_credits: ActiveValue::Set(param.min_credits),
            is_active: ActiveValue::Set(true),
            updated_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await?;

        Ok(PricingEntry::from_entity(entity))
    }

    /// Updates the hourly cost and minimum balance of a game type.
    ///
    /// # Returns
    /// - `Ok(true)` - Entry updated
    /// - `Ok(false)` - Unknown game type
    pub async fn update_price(
        &self,
        game_type: &str,
        cost_per_hour: i64,
        min_credits: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = entity::prelude::Pricing::update_many()
            .col_expr(entity::pricing::Column::CostPerHour, Expr::value(cost_per_hour))
            .col_expr(entity::pricing::Column::MinCredits, Expr::value(min_credits))
            .col_expr(entity::pricing::Column::UpdatedAt, Expr::value(now))
            .filter(entity::pricing::Column::GameType.eq(game_type))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Sets whether new servers of a game type can be created.
    pub async fn set_active(
        &self,
        game_type: &str,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = entity::prelude::Pricing::update_many()
            .col_expr(entity::pricing::Column::IsActive, Expr::value(is_active))
            .col_expr(entity::pricing::Column::UpdatedAt, Expr::value(now))
            .filter(entity::pricing::Column::GameType.eq(game_type))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
