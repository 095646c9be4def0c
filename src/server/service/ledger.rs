//! Credit ledger service.
//!
//! This module provides the `LedgerService`, the only entry point for changing a user's
//! credit balance outside of server provisioning and guild deposits. Balances never go
//! negative: every debit is a guarded update that fails without side effects when the
//! balance cannot cover it. Reward claims are gated on wall-clock cooldowns checked in
//! the same statement that credits the reward.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    data::user::UserRepository,
    error::{ledger::LedgerError, AppError},
    model::user::{Account, RewardClaim, RewardKind, Tier},
};

/// Credits granted by a daily claim.
pub const DAILY_BASE: i64 = 100;
/// Extra daily credits for premium accounts.
pub const DAILY_PREMIUM_BONUS: i64 = 50;
/// Credits granted by a work claim before the tier multiplier.
pub const WORK_BASE: i64 = 25;
/// Work multiplier for premium accounts.
pub const PREMIUM_WORK_MULTIPLIER: i64 = 2;
/// Credits granted per verified rewarded-ad view.
pub const AD_REWARD: i64 = 15;

/// Credits a claim of `reward` is worth for an account of `tier`.
pub fn reward_amount(reward: RewardKind, tier: Tier) -> i64 {
    match (reward, tier) {
        (RewardKind::Daily, Tier::Free) => DAILY_BASE,
        (RewardKind::Daily, Tier::Premium) => DAILY_BASE + DAILY_PREMIUM_BONUS,
        (RewardKind::Work, Tier::Free) => WORK_BASE,
        (RewardKind::Work, Tier::Premium) => WORK_BASE * PREMIUM_WORK_MULTIPLIER,
        (RewardKind::Ad, _) => AD_REWARD,
    }
}

pub struct LedgerService<'a> {
    db: &'a DatabaseConnection,
    audit: &'a dyn AuditSink,
}

impl<'a> LedgerService<'a> {
    /// Creates a new LedgerService instance.
    ///
    /// # Arguments
    /// - `db` - Reference to the database connection
    /// - `audit` - Sink receiving one event per balance mutation
    pub fn new(db: &'a DatabaseConnection, audit: &'a dyn AuditSink) -> Self {
        Self { db, audit }
    }

    /// Returns the user's account, creating an empty one on first interaction.
    ///
    /// Never fails for a new ID apart from database errors.
    pub async fn get_or_create(&self, user_id: u64) -> Result<Account, AppError> {
        UserRepository::new(self.db)
            .get_or_create(user_id, Utc::now())
            .await
    }

    /// Adds `amount` to the user's balance.
    ///
    /// Negative amounts are administrative debits. The check and the write happen in one
    /// guarded statement, so concurrent debits can never overdraw the account.
    ///
    /// # Arguments
    /// - `user_id` - Account to change
    /// - `amount` - Signed credit delta, non-zero
    /// - `actor` - Who requested the change, for the audit trail
    ///
    /// # Returns
    /// - `Ok(Account)` - Account after the change
    /// - `Err(AppError::LedgerErr(InsufficientCredits))` - Debit exceeds the balance;
    ///   nothing changed
    /// - `Err(AppError::LedgerErr(InvalidAmount))` - `amount` is zero or `i64::MIN`
    pub async fn credit(
        &self,
        user_id: u64,
        amount: i64,
        actor: Option<u64>,
    ) -> Result<Account, AppError> {
        if amount == 0 || amount == i64::MIN {
            return Err(LedgerError::InvalidAmount(amount).into());
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;
        let repo = UserRepository::new(&txn);
        repo.get_or_create(user_id, now).await?;

        if !repo.adjust_balance(user_id, amount).await? {
            let current = repo.get_or_create(user_id, now).await?;
            return Err(LedgerError::InsufficientCredits {
                required: -amount,
                available: current.balance,
            }
            .into());
        }

        // Read inside the write transaction, so `after - amount` is exactly the value the
        // guarded update replaced.
        let after = repo.get_or_create(user_id, now).await?;
        txn.commit().await?;
        let before = after.balance - amount;

        tracing::info!(
            user_id,
            amount,
            before,
            balance = after.balance,
            "Adjusted credit balance"
        );

        let mut event = AuditEvent::new(
            AuditChannel::Audit,
            "ledger.credit",
            format!("user:{}", user_id),
        )
        .detail("amount", amount)
        .detail("before", before)
        .detail("after", after.balance);
        if let Some(actor) = actor {
            event = event.actor(actor);
        }
        self.audit.record(event);

        Ok(after)
    }

    /// Claims the daily reward: `DAILY_BASE`, plus `DAILY_PREMIUM_BONUS` for premium.
    ///
    /// # Returns
    /// - `Ok(RewardClaim)` - Reward credited and claim time set to `now`
    /// - `Err(AppError::LedgerErr(CooldownActive))` - Claimed less than 24 hours ago
    pub async fn claim_daily(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<RewardClaim, AppError> {
        self.claim(user_id, RewardKind::Daily, now).await
    }

    /// Claims the work reward: `WORK_BASE`, doubled for premium.
    ///
    /// # Returns
    /// - `Ok(RewardClaim)` - Reward credited and claim time set to `now`
    /// - `Err(AppError::LedgerErr(CooldownActive))` - Claimed less than an hour ago
    pub async fn claim_work(&self, user_id: u64, now: DateTime<Utc>) -> Result<RewardClaim, AppError> {
        self.claim(user_id, RewardKind::Work, now).await
    }

    /// Credits a verified rewarded-ad view.
    ///
    /// # Returns
    /// - `Ok(RewardClaim)` - `AD_REWARD` credited
    /// - `Err(AppError::LedgerErr(CooldownActive))` - Last ad reward was under 10 minutes ago
    pub async fn claim_ad_reward(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<RewardClaim, AppError> {
        self.claim(user_id, RewardKind::Ad, now).await
    }

    /// Changes the account tier.
    ///
    /// Callers are responsible for checking that `actor` is a platform admin.
    pub async fn set_tier(&self, actor: u64, user_id: u64, tier: Tier) -> Result<Account, AppError> {
        let repo = UserRepository::new(self.db);
        let before = repo.get_or_create(user_id, Utc::now()).await?;

        repo.set_tier(user_id, tier).await?;

        self.audit.record(
            AuditEvent::new(AuditChannel::Mod, "ledger.set_tier", format!("user:{}", user_id))
                .actor(actor)
                .detail("before", before.tier)
                .detail("after", tier),
        );

        Ok(Account { tier, ..before })
    }

    async fn claim(
        &self,
        user_id: u64,
        reward: RewardKind,
        now: DateTime<Utc>,
    ) -> Result<RewardClaim, AppError> {
        let repo = UserRepository::new(self.db);
        let account = repo.get_or_create(user_id, now).await?;
        let amount = reward_amount(reward, account.tier);

        if !repo.claim_reward(user_id, reward, amount, now).await? {
            let current = repo.get_or_create(user_id, now).await?;
            let available_at = current
                .next_claim_at(reward, now)
                .unwrap_or(now + reward.cooldown());

            return Err(LedgerError::CooldownActive {
                reward,
                available_at,
            }
            .into());
        }

        let account = repo.get_or_create(user_id, now).await?;

        tracing::info!(user_id, %reward, amount, balance = account.balance, "Reward claimed");
        self.audit.record(
            AuditEvent::new(AuditChannel::User, "ledger.claim", format!("user:{}", user_id))
                .actor(user_id)
                .detail("reward", reward)
                .detail("amount", amount)
                .detail("before", account.balance - amount)
                .detail("after", account.balance),
        );

        Ok(RewardClaim {
            reward,
            amount,
            account,
        })
    }
}
