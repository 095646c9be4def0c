//! Guild member factory for creating test memberships.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr};

/// Inserts a membership row without touching the guild's `member_count`.
///
/// Use this when a test needs a member row directly; service-level tests should go
/// through the treasury service so the counters stay consistent.
///
/// # Arguments
/// - `db` - Database connection
/// - `guild_id` - Guild the member belongs to
/// - `user_id` - Member's Discord ID
/// - `total_deposits` - Attributed deposit total
pub async fn create_guild_member(
    db: &DatabaseConnection,
    guild_id: impl Into<String>,
    user_id: impl Into<String>,
    total_deposits: i64,
) -> Result<entity::guild_member::Model, DbErr> {
    entity::guild_member::ActiveModel {
        id: ActiveValue::NotSet,
        guild_id: ActiveValue::Set(guild_id.into()),
        user_id: ActiveValue::Set(user_id.into()),
        total_deposits: ActiveValue::Set(total_deposits),
        joined_at: ActiveValue::Set(Utc::now()),
    }
    .insert(db)
    .await
}

