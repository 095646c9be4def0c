//! Guild treasury domain models.
//!
//! A guild pools credits from its members to fund shared servers. Deposits are
//! irrevocable, so `balance == total_deposits - total_spent` holds for every stored row.

use chrono::{DateTime, Utc};

use crate::server::{error::AppError, util::parse::parse_u64_from_string};

/// A guild treasury.
#[derive(Debug, Clone, PartialEq)]
pub struct Guild {
    /// Slug derived from the display name at creation.
    pub id: String,
    pub display_name: String,
    pub owner_id: u64,
    pub balance: i64,
    /// Sum of all deposits; never decreases.
    pub total_deposits: i64,
    pub total_spent: i64,
    pub member_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Guild {
    /// Converts an entity model to a guild domain model at the repository boundary.
    ///
    /// # Returns
    /// - `Ok(Guild)` - The converted guild
    /// - `Err(AppError::InternalErr)` - Stored owner ID is not a valid u64
    pub fn from_entity(entity: entity::guild::Model) -> Result<Self, AppError> {
        Ok(Self {
            id: entity.id,
            display_name: entity.display_name,
            owner_id: parse_u64_from_string(entity.owner_id)?,
            balance: entity.balance,
            total_deposits: entity.total_deposits,
            total_spent: entity.total_spent,
            member_count: entity.member_count,
            created_at: entity.created_at,
        })
    }
}

/// Membership of a user in a guild.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildMember {
    pub guild_id: String,
    pub user_id: u64,
    /// Credits this member has deposited into the guild.
    pub total_deposits: i64,
    pub joined_at: DateTime<Utc>,
}

impl GuildMember {
    /// Converts an entity model to a member domain model at the repository boundary.
    pub fn from_entity(entity: entity::guild_member::Model) -> Result<Self, AppError> {
        Ok(Self {
            guild_id: entity.guild_id,
            user_id: parse_u64_from_string(entity.user_id)?,
            total_deposits: entity.total_deposits,
            joined_at: entity.joined_at,
        })
    }
}

/// Parameters for creating a guild.
#[derive(Debug, Clone)]
pub struct CreateGuildParam {
    pub id: String,
    pub display_name: String,
    pub owner_id: u64,
    pub now: DateTime<Utc>,
}
