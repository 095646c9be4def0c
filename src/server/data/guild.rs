//! Guild treasury repository.
//!
//! Every treasury mutation updates `balance` together with `total_deposits` or
//! `total_spent` in a single statement, keeping `balance == total_deposits - total_spent`
//! true for every committed row.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, ExprTrait},
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder,
};

use crate::server::{
    error::AppError,
    model::guild::{CreateGuildParam, Guild, GuildMember},
};

pub struct GuildRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> GuildRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts a guild with zero balance and its owner as the first member.
    ///
    /// Must run inside a transaction so a failed member insert leaves no guild behind.
    ///
    /// # Returns
    /// - `Ok(Guild)` - The created guild
    /// - `Err(AppError::DbErr)` - Database error, including a unique violation on the ID
    pub async fn create(&self, param: CreateGuildParam) -> Result<Guild, AppError> {
        let entity = entity::guild::ActiveModel {
            id: ActiveValue::Set(param.id.clone()),
            display_name: ActiveValue::Set(param.display_name),
            owner_id: ActiveValue::Set(param.owner_id.to_string()),
            balance: ActiveValue::Set(0),
            total_deposits: ActiveValue::Set(0),
            total_spent: ActiveValue::Set(0),
            member_count: ActiveValue::Set(1),
            created_at: ActiveValue::Set(param.now),
        }
        .insert(self.db)
        .await?;

        self.insert_member(&param.id, param.owner_id, param.now)
            .await?;

        Guild::from_entity(entity)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Guild>, AppError> {
        let entity = entity::prelude::Guild::find_by_id(id.to_string())
            .one(self.db)
            .await?;

        entity.map(Guild::from_entity).transpose()
    }

    /// Lists the guilds a user belongs to.
    pub async fn list_for_user(&self, user_id: u64) -> Result<Vec<Guild>, AppError> {
        let guild_ids: Vec<String> = entity::prelude::GuildMember::find()
            .filter(entity::guild_member::Column::UserId.eq(user_id.to_string()))
            .all(self.db)
            .await?
            .into_iter()
            .map(|member| member.guild_id)
            .collect();

        if guild_ids.is_empty() {
            return Ok(Vec::new());
        }

        let entities = entity::prelude::Guild::find()
            .filter(entity::guild::Column::Id.is_in(guild_ids))
            .order_by_asc(entity::guild::Column::DisplayName)
            .all(self.db)
            .await?;

        entities.into_iter().map(Guild::from_entity).collect()
    }

    pub async fn find_member(
        &self,
        guild_id: &str,
        user_id: u64,
    ) -> Result<Option<GuildMember>, AppError> {
        let entity = entity::prelude::GuildMember::find()
            .filter(entity::guild_member::Column::GuildId.eq(guild_id))
            .filter(entity::guild_member::Column::UserId.eq(user_id.to_string()))
            .one(self.db)
            .await?;

        entity.map(GuildMember::from_entity).transpose()
    }

    /// Lists members ordered by their deposits, largest contributor first.
    pub async fn members_by_deposits(&self, guild_id: &str) -> Result<Vec<GuildMember>, AppError> {
        let entities = entity::prelude::GuildMember::find()
            .filter(entity::guild_member::Column::GuildId.eq(guild_id))
            .order_by_desc(entity::guild_member::Column::TotalDeposits)
            .order_by_asc(entity::guild_member::Column::JoinedAt)
            .all(self.db)
            .await?;

        entities.into_iter().map(GuildMember::from_entity).collect()
    }

    /// Adds a member and increments the guild's member count.
    ///
    /// Must run inside a transaction.
    pub async fn add_member(
        &self,
        guild_id: &str,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<GuildMember, AppError> {
        let member = self.insert_member(guild_id, user_id, now).await?;

        entity::prelude::Guild::update_many()
            .col_expr(
                entity::guild::Column::MemberCount,
                Expr::col(entity::guild::Column::MemberCount).add(1),
            )
            .filter(entity::guild::Column::Id.eq(guild_id))
            .exec(self.db)
            .await?;

        Ok(member)
    }

    /// Credits a deposit to the guild and to the depositing member's tally.
    ///
    /// Must run inside a transaction together with the matching ledger debit.
    ///
    /// # Returns
    /// - `Ok(true)` - Guild and member updated
    /// - `Ok(false)` - Guild or membership missing; the caller must roll back
    pub async fn deposit(&self, guild_id: &str, user_id: u64, amount: i64) -> Result<bool, AppError> {
        let guild = entity::prelude::Guild::update_many()
            .col_expr(
                entity::guild::Column::Balance,
                Expr::col(entity::guild::Column::Balance).add(amount),
            )
            .col_expr(
                entity::guild::Column::TotalDeposits,
                Expr::col(entity::guild::Column::TotalDeposits).add(amount),
            )
            .filter(entity::guild::Column::Id.eq(guild_id))
            .exec(self.db)
            .await?;

        let member = entity::prelude::GuildMember::update_many()
            .col_expr(
                entity::guild_member::Column::TotalDeposits,
                Expr::col(entity::guild_member::Column::TotalDeposits).add(amount),
            )
            .filter(entity::guild_member::Column::GuildId.eq(guild_id))
            .filter(entity::guild_member::Column::UserId.eq(user_id.to_string()))
            .exec(self.db)
            .await?;

        Ok(guild.rows_affected == 1 && member.rows_affected == 1)
    }

    /// Spends from the treasury if the balance covers `amount`.
    ///
    /// # Returns
    /// - `Ok(true)` - Balance decreased and `total_spent` increased by `amount`
    /// - `Ok(false)` - Guild missing or balance too low; nothing changed
    pub async fn spend(&self, guild_id: &str, amount: i64) -> Result<bool, AppError> {
        let result = entity::prelude::Guild::update_many()
            .col_expr(
                entity::guild::Column::Balance,
                Expr::col(entity::guild::Column::Balance).sub(amount),
            )
            .col_expr(
                entity::guild::Column::TotalSpent,
                Expr::col(entity::guild::Column::TotalSpent).add(amount),
            )
            .filter(entity::guild::Column::Id.eq(guild_id))
            .filter(entity::guild::Column::Balance.gte(amount))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Reverses a previous spend, used when a guild-funded server fails to provision.
    ///
    /// # Returns
    /// - `Ok(true)` - Balance restored and `total_spent` reduced by `amount`
    /// - `Ok(false)` - Guild missing or less than `amount` was ever spent
    pub async fn refund(&self, guild_id: &str, amount: i64) -> Result<bool, AppError> {
        let result = entity::prelude::Guild::update_many()
            .col_expr(
                entity::guild::Column::Balance,
                Expr::col(entity::guild::Column::Balance).add(amount),
            )
            .col_expr(
                entity::guild::Column::TotalSpent,
                Expr::col(entity::guild::Column::TotalSpent).sub(amount),
            )
            .filter(entity::guild::Column::Id.eq(guild_id))
            .filter(entity::guild::Column::TotalSpent.gte(amount))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn insert_member(
        &self,
        guild_id: &str,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<GuildMember, AppError> {
        let entity = entity::guild_member::ActiveModel {
            id: ActiveValue::NotSet,
            guild_id: ActiveValue::Set(guild_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
            total_deposits: ActiveValue::Set(0),
            joined_at: ActiveValue::Set(now),
        }
        .insert(self.db)
        .await?;

        GuildMember::from_entity(entity)
    }
}
