//! Ledger account domain models.
//!
//! Provides the credit account of a Discord user together with the reward kinds that
//! can be claimed against wall-clock cooldowns.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

use crate::{
    model::reward::{AccountDto, RewardClaimDto},
    server::{
        error::{internal::InternalError, AppError},
        util::parse::parse_u64_from_string,
    },
};

/// Account class affecting reward multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    /// Value stored in the `tier` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    /// Parses a stored or user-supplied tier name, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cooldown-gated rewards a user can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    Daily,
    Work,
    Ad,
}

impl RewardKind {
    /// Minimum time between two claims of this reward.
    ///
    /// The daily window is fixed at 24 hours and is not configurable.
    pub fn cooldown(&self) -> Duration {
        match self {
            Self::Daily => Duration::hours(24),
            Self::Work => Duration::hours(1),
            Self::Ad => Duration::minutes(10),
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "Daily",
            Self::Work => "Work",
            Self::Ad => "Ad",
        })
    }
}

/// Credit account of a Discord user.
///
/// Created lazily on first interaction and never deleted. The balance is never
/// negative; every mutation goes through a guarded update in `UserRepository`.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Discord ID of the account holder.
    pub user_id: u64,
    /// Current credit balance.
    pub balance: i64,
    /// Account tier.
    pub tier: Tier,
    /// Whether the user is a platform admin.
    pub admin: bool,
    /// Last daily claim (`None` when never claimed).
    pub last_daily: Option<DateTime<Utc>>,
    /// Last work claim (`None` when never claimed).
    pub last_work: Option<DateTime<Utc>>,
    /// Last rewarded-ad claim (`None` when never claimed).
    pub last_ad_reward: Option<DateTime<Utc>>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Converts an entity model to an account domain model at the repository boundary.
    ///
    /// # Returns
    /// - `Ok(Account)` - The converted account
    /// - `Err(AppError::InternalErr)` - Stored Discord ID or tier is invalid
    pub fn from_entity(entity: entity::user::Model) -> Result<Self, AppError> {
        let tier = Tier::parse(&entity.tier).ok_or_else(|| InternalError::UnknownStoredValue {
            column: "user.tier",
            value: entity.tier.clone(),
        })?;

        Ok(Self {
            user_id: parse_u64_from_string(entity.discord_id)?,
            balance: entity.balance,
            tier,
            admin: entity.admin,
            last_daily: entity.last_daily,
            last_work: entity.last_work,
            last_ad_reward: entity.last_ad_reward,
            created_at: entity.created_at,
        })
    }

    /// Timestamp of the last claim of `reward`.
    pub fn last_claim(&self, reward: RewardKind) -> Option<DateTime<Utc>> {
        match reward {
            RewardKind::Daily => self.last_daily,
            RewardKind::Work => self.last_work,
            RewardKind::Ad => self.last_ad_reward,
        }
    }

    /// Earliest moment `reward` can be claimed, or `None` if it can be claimed now.
    ///
    /// A missing timestamp, or one at or before the Unix epoch (legacy zero value),
    /// always counts as never claimed.
    pub fn next_claim_at(&self, reward: RewardKind, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let last = self.last_claim(reward)?;
        if last.timestamp() <= 0 {
            return None;
        }

        let available_at = last + reward.cooldown();
        (now < available_at).then_some(available_at)
    }
}

/// Result of a successful reward claim.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardClaim {
    /// Which reward was claimed.
    pub reward: RewardKind,
    /// Credits added to the balance.
    pub amount: i64,
    /// Account state after the claim.
    pub account: Account,
}

impl Account {
    pub fn into_dto(self) -> AccountDto {
        AccountDto {
            user_id: self.user_id.to_string(),
            balance: self.balance,
            tier: self.tier.as_str().to_string(),
        }
    }
}

impl RewardClaim {
    pub fn into_dto(self, claimed_at: DateTime<Utc>) -> RewardClaimDto {
        RewardClaimDto {
            reward: self.reward.to_string(),
            amount: self.amount,
            account: self.account.into_dto(),
            claimed_at,
        }
    }
}
