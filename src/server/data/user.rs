//! User account repository.
//!
//! Provides the `UserRepository` holding every balance and cooldown mutation of the credit
//! ledger. Each mutation is a single guarded `UPDATE` whose affected row count decides
//! whether the operation applied, so concurrent callers can never both spend the same
//! credits.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, ExprTrait},
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    QueryFilter,
};

use crate::server::{
    data::is_unique_violation,
    error::AppError,
    model::user::{Account, RewardKind, Tier},
};

/// Repository providing database operations for user accounts.
pub struct UserRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> UserRepository<'a, C> {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// - `db` - Database connection or open transaction
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Finds an account by Discord ID.
    ///
    /// # Returns
    /// - `Ok(Some(Account))` - Account found
    /// - `Ok(None)` - No account exists for the user yet
    /// - `Err(AppError)` - Database error or corrupt stored value
    pub async fn find(&self, user_id: u64) -> Result<Option<Account>, AppError> {
        let entity = entity::prelude::User::find_by_id(user_id.to_string())
            .one(self.db)
            .await?;

        entity.map(Account::from_entity).transpose()
    }

    /// Returns the account for a user, creating an empty free-tier account if missing.
    ///
    /// A concurrent creation of the same account is tolerated: the unique violation from
    /// the losing insert is swallowed and the winner's row is returned.
    ///
    /// # Arguments
    /// - `user_id` - Discord ID of the user
    /// - `now` - Creation timestamp used for a new account
    ///
    /// # Returns
    /// - `Ok(Account)` - Existing or newly created account
    /// - `Err(AppError)` - Database error
    pub async fn get_or_create(&self, user_id: u64, now: DateTime<Utc>) -> Result<Account, AppError> {
        if let Some(account) = self.find(user_id).await? {
            return Ok(account);
        }

        let inserted = entity::user::ActiveModel {
            discord_id: ActiveValue::Set(user_id.to_string()),
            balance: ActiveValue::Set(0),
            tier: ActiveValue::Set(Tier::Free.as_str().to_string()),
            admin: ActiveValue::Set(false),
            last_daily: ActiveValue::Set(None),
            last_work: ActiveValue::Set(None),
            last_ad_reward: ActiveValue::Set(None),
            created_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await;

        match inserted {
            Ok(entity) => Account::from_entity(entity),
            Err(err) if is_unique_violation(&err) => self
                .find(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Account {} not found", user_id))),
            Err(err) => Err(err.into()),
        }
    }

    /// Adds `delta` to the balance unless the result would be negative.
    ///
    /// The check and the write are the same statement: the row is only updated when
    /// `balance + delta >= 0`.
    ///
    /// # Returns
    /// - `Ok(true)` - Balance updated
    /// - `Ok(false)` - Account missing or balance would go negative; nothing changed
    /// - `Err(AppError)` - Database error
    pub async fn adjust_balance(&self, user_id: u64, delta: i64) -> Result<bool, AppError> {
        // i64::MIN has no negation and no balance can cover it.
        let Some(floor) = delta.checked_neg() else {
            return Ok(false);
        };

        let result = entity::prelude::User::update_many()
            .col_expr(
                entity::user::Column::Balance,
                Expr::col(entity::user::Column::Balance).add(delta),
            )
            .filter(entity::user::Column::DiscordId.eq(user_id.to_string()))
            .filter(entity::user::Column::Balance.gte(floor))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Credits a reward and stamps its claim time if the cooldown has elapsed.
    ///
    /// Eligibility is part of the update condition: the stored claim time must be
    /// missing, at or before the epoch, or at least one cooldown window in the past.
    ///
    /// # Returns
    /// - `Ok(true)` - Reward credited and timestamp set to `now`
    /// - `Ok(false)` - Cooldown still active (or account missing); nothing changed
    /// - `Err(AppError)` - Database error
    pub async fn claim_reward(
        &self,
        user_id: u64,
        reward: RewardKind,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let column = match reward {
            RewardKind::Daily => entity::user::Column::LastDaily,
            RewardKind::Work => entity::user::Column::LastWork,
            RewardKind::Ad => entity::user::Column::LastAdReward,
        };
        let cutoff = now - reward.cooldown();

        let result = entity::prelude::User::update_many()
            .col_expr(
                entity::user::Column::Balance,
                Expr::col(entity::user::Column::Balance).add(amount),
            )
            .col_expr(column, Expr::value(now))
            .filter(entity::user::Column::DiscordId.eq(user_id.to_string()))
            .filter(
                Condition::any()
                    .add(column.is_null())
                    .add(column.lte(DateTime::<Utc>::UNIX_EPOCH))
                    .add(column.lte(cutoff)),
            )
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Sets the account tier.
    ///
    /// # Returns
    /// - `Ok(true)` - Tier updated
    /// - `Ok(false)` - No account for the user
    pub async fn set_tier(&self, user_id: u64, tier: Tier) -> Result<bool, AppError> {
        let result = entity::prelude::User::update_many()
            .col_expr(entity::user::Column::Tier, Expr::value(tier.as_str()))
            .filter(entity::user::Column::DiscordId.eq(user_id.to_string()))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Sets the platform admin flag.
    ///
    /// # Returns
    /// - `Ok(true)` - Flag updated
    /// - `Ok(false)` - No account for the user
    pub async fn set_admin(&self, user_id: u64, admin: bool) -> Result<bool, AppError> {
        let result = entity::prelude::User::update_many()
            .col_expr(entity::user::Column::Admin, Expr::value(admin))
            .filter(entity::user::Column::DiscordId.eq(user_id.to_string()))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
