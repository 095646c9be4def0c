//! Guild treasury service.
//!
//! Guilds pool credits from their members to fund shared servers. Deposits move credits
//! from a member's personal balance into the treasury and are irreversible; the treasury
//! only shrinks through server spend. Every operation keeps
//! `balance == total_deposits - total_spent`.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    data::{guild::GuildRepository, is_unique_violation, user::UserRepository},
    error::{guild::GuildError, ledger::LedgerError, AppError},
    model::guild::{CreateGuildParam, Guild, GuildMember},
    util::slug::derive_guild_id,
};

pub struct GuildTreasuryService<'a> {
    db: &'a DatabaseConnection,
    audit: &'a dyn AuditSink,
}

impl<'a> GuildTreasuryService<'a> {
    pub fn new(db: &'a DatabaseConnection, audit: &'a dyn AuditSink) -> Self {
        Self { db, audit }
    }

    /// Creates a guild with the owner as its first member.
    ///
    /// The ID is derived from the display name. Creation fails rather than suffixing
    /// when the derived ID is taken.
    ///
    /// # Returns
    /// - `Ok(Guild)` - The created guild with zero balance
    /// - `Err(AppError::GuildErr(AlreadyExists))` - Derived ID already in use
    pub async fn create_guild(
        &self,
        display_name: &str,
        owner_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Guild, AppError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(AppError::BadRequest("Guild name cannot be empty".to_string()));
        }

        let id = derive_guild_id(display_name, now);

        let txn = self.db.begin().await?;
        let guilds = GuildRepository::new(&txn);

        if guilds.find_by_id(&id).await?.is_some() {
            return Err(GuildError::AlreadyExists(id).into());
        }

        UserRepository::new(&txn).get_or_create(owner_id, now).await?;

        let guild = match guilds
            .create(CreateGuildParam {
                id: id.clone(),
                display_name: display_name.to_string(),
                owner_id,
                now,
            })
            .await
        {
            Ok(guild) => guild,
            Err(AppError::DbErr(e)) if is_unique_violation(&e) => {
                return Err(GuildError::AlreadyExists(id).into())
            }
            Err(e) => return Err(e),
        };

        txn.commit().await?;

        tracing::info!(guild_id = %guild.id, owner_id, "Created guild");
        self.audit.record(
            AuditEvent::new(AuditChannel::User, "guild.create", format!("guild:{}", guild.id))
                .actor(owner_id)
                .detail("name", &guild.display_name),
        );

        Ok(guild)
    }

    /// Adds a member on invitation.
    ///
    /// Only the guild owner or a platform admin may invite.
    ///
    /// # Arguments
    /// - `guild_id` - Guild to join
    /// - `target_id` - User being invited
    /// - `inviter_id` - User sending the invite
    /// - `inviter_is_admin` - Whether the inviter holds the platform admin capability
    ///
    /// # Returns
    /// - `Ok(GuildMember)` - The new membership
    /// - `Err(AppError::NotFound)` - Unknown guild
    /// - `Err(AppError::Forbidden)` - Inviter is neither owner nor admin
    /// - `Err(AppError::GuildErr(AlreadyMember))` - Target already belongs to the guild
    pub async fn add_member(
        &self,
        guild_id: &str,
        target_id: u64,
        inviter_id: u64,
        inviter_is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<GuildMember, AppError> {
        let txn = self.db.begin().await?;
        let guilds = GuildRepository::new(&txn);

        let guild = guilds
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| not_found(guild_id))?;

        if guild.owner_id != inviter_id && !inviter_is_admin {
            return Err(AppError::Forbidden(
                "Only the guild owner can invite members".to_string(),
            ));
        }

        if guilds.find_member(guild_id, target_id).await?.is_some() {
            return Err(GuildError::AlreadyMember {
                guild_id: guild_id.to_string(),
                user_id: target_id,
            }
            .into());
        }

        UserRepository::new(&txn).get_or_create(target_id, now).await?;

        let member = match guilds.add_member(guild_id, target_id, now).await {
            Ok(member) => member,
            Err(AppError::DbErr(e)) if is_unique_violation(&e) => {
                return Err(GuildError::AlreadyMember {
                    guild_id: guild_id.to_string(),
                    user_id: target_id,
                }
                .into())
            }
            Err(e) => return Err(e),
        };

        txn.commit().await?;

        self.audit.record(
            AuditEvent::new(AuditChannel::User, "guild.add_member", format!("guild:{}", guild_id))
                .actor(inviter_id)
                .detail("member", target_id)
                .detail("members_after", guild.member_count + 1),
        );

        Ok(member)
    }

    /// Moves credits from a member's balance into the treasury.
    ///
    /// The ledger debit and the treasury credit commit together.
    ///
    /// # Returns
    /// - `Ok(Guild)` - Treasury after the deposit
    /// - `Err(AppError::GuildErr(InvalidAmount))` - `amount` is not positive
    /// - `Err(AppError::GuildErr(NotMember))` - Depositor is not a member
    /// - `Err(AppError::LedgerErr(InsufficientCredits))` - Depositor cannot cover `amount`
    /// - `Err(AppError::NotFound)` - Unknown guild
    pub async fn deposit(
        &self,
        guild_id: &str,
        user_id: u64,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Guild, AppError> {
        if amount <= 0 {
            return Err(GuildError::InvalidAmount(amount).into());
        }

        let txn = self.db.begin().await?;
        let guilds = GuildRepository::new(&txn);
        let users = UserRepository::new(&txn);

        let before = guilds
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| not_found(guild_id))?;

        if guilds.find_member(guild_id, user_id).await?.is_none() {
            return Err(GuildError::NotMember {
                guild_id: guild_id.to_string(),
                user_id,
            }
            .into());
        }

        let account = users.get_or_create(user_id, now).await?;
        if !users.adjust_balance(user_id, -amount).await? {
            return Err(LedgerError::InsufficientCredits {
                required: amount,
                available: account.balance,
            }
            .into());
        }

        if !guilds.deposit(guild_id, user_id, amount).await? {
            return Err(AppError::InternalError(format!(
                "Deposit into guild '{}' matched no rows",
                guild_id
            )));
        }

        txn.commit().await?;

        let after = self.get_guild(guild_id).await?;

        tracing::info!(guild_id, user_id, amount, balance = after.balance, "Guild deposit");
        self.audit.record(
            AuditEvent::new(AuditChannel::Audit, "guild.deposit", format!("guild:{}", guild_id))
                .actor(user_id)
                .detail("amount", amount)
                .detail("before", before.balance)
                .detail("after", after.balance),
        );

        Ok(after)
    }

    /// Spends treasury credits, e.g. for an administrative charge.
    ///
    /// Server provisioning spends inside its own transaction and does not go through
    /// this method.
    ///
    /// # Returns
    /// - `Ok(Guild)` - Treasury after the spend
    /// - `Err(AppError::GuildErr(InsufficientFunds))` - `amount` exceeds the balance;
    ///   nothing changed
    /// - `Err(AppError::NotFound)` - Unknown guild
    pub async fn spend(
        &self,
        guild_id: &str,
        amount: i64,
        actor: Option<u64>,
    ) -> Result<Guild, AppError> {
        if amount <= 0 {
            return Err(GuildError::InvalidAmount(amount).into());
        }

        let txn = self.db.begin().await?;
        let repo = GuildRepository::new(&txn);

        if !repo.spend(guild_id, amount).await? {
            let current = repo
                .find_by_id(guild_id)
                .await?
                .ok_or_else(|| not_found(guild_id))?;
            return Err(GuildError::InsufficientFunds {
                required: amount,
                available: current.balance,
            }
            .into());
        }

        let after = repo
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| not_found(guild_id))?;
        txn.commit().await?;
        let before = after.balance + amount;

        tracing::info!(guild_id, amount, balance = after.balance, "Guild spend");
        let mut event =
            AuditEvent::new(AuditChannel::Audit, "guild.spend", format!("guild:{}", guild_id))
                .detail("amount", amount)
                .detail("before", before)
                .detail("after", after.balance);
        if let Some(actor) = actor {
            event = event.actor(actor);
        }
        self.audit.record(event);

        Ok(after)
    }

    /// # Returns
    /// - `Ok(Guild)` - The guild
    /// - `Err(AppError::NotFound)` - Unknown guild
    pub async fn get_guild(&self, guild_id: &str) -> Result<Guild, AppError> {
        GuildRepository::new(self.db)
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| not_found(guild_id))
    }

    /// Members ordered by total deposits, top contributors first.
    pub async fn get_members(&self, guild_id: &str) -> Result<Vec<GuildMember>, AppError> {
        self.get_guild(guild_id).await?;

        GuildRepository::new(self.db)
            .members_by_deposits(guild_id)
            .await
    }

    /// Guilds the user belongs to.
    pub async fn list_for_user(&self, user_id: u64) -> Result<Vec<Guild>, AppError> {
        GuildRepository::new(self.db).list_for_user(user_id).await
    }
}

fn not_found(guild_id: &str) -> AppError {
    AppError::NotFound(format!("Guild '{}' not found", guild_id))
}
