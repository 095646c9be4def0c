//! Game server registry.
//!
//! Owns the server record set and its status state machine. Every status change is a
//! compare-and-swap against the statuses the change is valid from, so concurrent
//! commands on the same server resolve to a single winner. Operations that move money
//! (create, restart) run the charge and the status change in one transaction.
//!
//! This service never talks to the orchestrator; see
//! [`LifecycleService`](crate::server::service::lifecycle::LifecycleService) for the
//! debit-then-provision flows built on top of it.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    data::{
        game_server::GameServerRepository, guild::GuildRepository, is_unique_violation,
        schedule::ScheduleRepository, user::UserRepository,
    },
    error::{guild::GuildError, ledger::LedgerError, server::ServerError, AppError},
    model::game_server::{
        CreateServerParam, GameServer, Payer, ProvisionedAddress, ServerStatus, StatusChange,
        StopOutcome, CLEANUP_RETENTION, RESTART_FEE,
    },
    service::pricing::PricingService,
};

/// Longest accepted server name.
pub const MAX_SERVER_NAME_LEN: usize = 32;

pub struct ServerRegistryService<'a> {
    db: &'a DatabaseConnection,
    audit: &'a dyn AuditSink,
}

impl<'a> ServerRegistryService<'a> {
    /// Creates a new ServerRegistryService instance.
    ///
    /// # Arguments
    /// - `db` - Reference to the database connection
    /// - `audit` - Sink receiving one event per state change
    pub fn new(db: &'a DatabaseConnection, audit: &'a dyn AuditSink) -> Self {
        Self { db, audit }
    }

    /// Creates a server paid from the owner's credits.
    ///
    /// Looks up the live price, then in one transaction checks the name is free and the
    /// balance covers the game type's required balance, debits one hour and inserts the
    /// record in `creating`. Nothing is written when any check fails.
    ///
    /// # Arguments
    /// - `owner_id` - Discord ID of the owner
    /// - `game_type` - Catalog key, case-insensitive
    /// - `name` - Server name, unique per owner
    /// - `now` - Creation time
    ///
    /// # Returns
    /// - `Ok(GameServer)` - The new server in `creating`
    /// - `Err(AppError::ServerErr(DuplicateName))` - Owner already has a server with that name
    /// - `Err(AppError::LedgerErr(InsufficientCredits))` - Balance below the required amount
    /// - `Err(AppError::NotFound)` - Unknown or disabled game type
    /// - `Err(AppError::BadRequest)` - Invalid name
    pub async fn create(
        &self,
        owner_id: u64,
        game_type: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let name = validate_server_name(name)?;
        let pricing = PricingService::new(self.db, self.audit)
            .get_pricing(game_type)
            .await?;

        let txn = self.db.begin().await?;
        let users = UserRepository::new(&txn);
        let servers = GameServerRepository::new(&txn);

        let account = users.get_or_create(owner_id, now).await?;

        if servers
            .find_by_owner_and_name(owner_id, &name)
            .await?
            .is_some()
        {
            return Err(ServerError::DuplicateName { name }.into());
        }

        let required = pricing.required_balance();
        if account.balance < required
            || !users
                .adjust_balance(owner_id, -pricing.cost_per_hour)
                .await?
        {
            return Err(LedgerError::InsufficientCredits {
                required,
                available: account.balance,
            }
            .into());
        }

        let server = insert_server(
            &servers,
            CreateServerParam {
                owner_id,
                guild_id: None,
                name,
                game_type: pricing.game_type,
                cost_per_hour: pricing.cost_per_hour,
                now,
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            server_id = server.id,
            owner_id,
            game_type = %server.game_type,
            cost = server.cost_per_hour,
            "Created game server"
        );
        self.audit.record(
            AuditEvent::new(AuditChannel::User, "server.create", format!("server:{}", server.id))
                .actor(owner_id)
                .detail("name", &server.name)
                .detail("game", &server.game_type)
                .detail("cost", server.cost_per_hour)
                .detail("before", account.balance)
                .detail("after", account.balance - server.cost_per_hour),
        );

        Ok(server)
    }

    /// Creates a server paid from a guild treasury.
    ///
    /// The requester must be a member. The first hour is spent from the treasury in the
    /// same transaction as the insert.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - The new server in `creating`, owned by the requester
    /// - `Err(AppError::GuildErr(NotMember))` - Requester is not a member
    /// - `Err(AppError::GuildErr(InsufficientFunds))` - Treasury below the required amount
    /// - `Err(AppError::ServerErr(DuplicateName))` - Requester already has that name
    /// - `Err(AppError::NotFound)` - Unknown guild or game type
    pub async fn create_for_guild(
        &self,
        guild_id: &str,
        owner_id: u64,
        game_type: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let name = validate_server_name(name)?;
        let pricing = PricingService::new(self.db, self.audit)
            .get_pricing(game_type)
            .await?;

        let txn = self.db.begin().await?;
        let guilds = GuildRepository::new(&txn);
        let servers = GameServerRepository::new(&txn);

        let guild = guilds
            .find_by_id(guild_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Guild '{}' not found", guild_id)))?;

        if guilds.find_member(guild_id, owner_id).await?.is_none() {
            return Err(GuildError::NotMember {
                guild_id: guild_id.to_string(),
                user_id: owner_id,
            }
            .into());
        }

        UserRepository::new(&txn).get_or_create(owner_id, now).await?;

        if servers
            .find_by_owner_and_name(owner_id, &name)
            .await?
            .is_some()
        {
            return Err(ServerError::DuplicateName { name }.into());
        }

        let required = pricing.required_balance();
        if guild.balance < required || !guilds.spend(guild_id, pricing.cost_per_hour).await? {
            return Err(GuildError::InsufficientFunds {
                required,
                available: guild.balance,
            }
            .into());
        }

        let server = insert_server(
            &servers,
            CreateServerParam {
                owner_id,
                guild_id: Some(guild.id.clone()),
                name,
                game_type: pricing.game_type,
                cost_per_hour: pricing.cost_per_hour,
                now,
            },
        )
        .await?;

        txn.commit().await?;

        tracing::info!(
            server_id = server.id,
            owner_id,
            guild_id,
            cost = server.cost_per_hour,
            "Created guild game server"
        );
        self.audit.record(
            AuditEvent::new(AuditChannel::Audit, "server.create", format!("server:{}", server.id))
                .actor(owner_id)
                .detail("name", &server.name)
                .detail("guild", guild_id)
                .detail("cost", server.cost_per_hour)
                .detail("before", guild.balance)
                .detail("after", guild.balance - server.cost_per_hour),
        );

        Ok(server)
    }

    /// Fetches a server by ID.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - The server
    /// - `Err(AppError::NotFound)` - No server with that ID
    pub async fn get(&self, server_id: i32) -> Result<GameServer, AppError> {
        GameServerRepository::new(self.db)
            .find_by_id(server_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Server {} not found", server_id)))
    }

    /// Fetches one of the owner's servers by name.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - The server
    /// - `Err(AppError::NotFound)` - The owner has no server with that name
    pub async fn find_owned(&self, owner_id: u64, name: &str) -> Result<GameServer, AppError> {
        GameServerRepository::new(self.db)
            .find_by_owner_and_name(owner_id, name.trim())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("You have no server named '{}'", name.trim())))
    }

    pub async fn list_by_owner(&self, owner_id: u64) -> Result<Vec<GameServer>, AppError> {
        GameServerRepository::new(self.db)
            .list_by_owner(owner_id)
            .await
    }

    /// Every server, for moderation.
    pub async fn list_all(&self) -> Result<Vec<GameServer>, AppError> {
        GameServerRepository::new(self.db).list_all().await
    }

    /// Servers listed in the public lobby.
    pub async fn list_public(&self) -> Result<Vec<GameServer>, AppError> {
        GameServerRepository::new(self.db).list_public().await
    }

    pub async fn list_by_status(
        &self,
        statuses: &[ServerStatus],
    ) -> Result<Vec<GameServer>, AppError> {
        GameServerRepository::new(self.db)
            .list_by_status(statuses)
            .await
    }

    /// Moves a server to `stopping` and delists it.
    ///
    /// # Returns
    /// - `Ok(StopOutcome::AlreadyStopped)` - Server was stopped or stopping; nothing changed
    /// - `Ok(StopOutcome::Stopping)` - Server is now `stopping`
    pub async fn stop(&self, server: &GameServer, actor: Option<u64>) -> Result<StopOutcome, AppError> {
        if matches!(
            server.status,
            ServerStatus::Stopped | ServerStatus::Stopping
        ) {
            return Ok(StopOutcome::AlreadyStopped(server.clone()));
        }

        let moved = GameServerRepository::new(self.db)
            .transition(
                server.id,
                &[
                    ServerStatus::Creating,
                    ServerStatus::Running,
                    ServerStatus::Ready,
                    ServerStatus::Error,
                ],
                StatusChange::stopping(),
            )
            .await?;

        let current = self.get(server.id).await?;
        if !moved {
            return Ok(StopOutcome::AlreadyStopped(current));
        }

        self.record_transition(
            "server.stop",
            actor,
            &current,
            server.status,
            ServerStatus::Stopping,
        );

        Ok(StopOutcome::Stopping(current))
    }

    /// Completes a stop once compute has been released.
    pub async fn mark_stopped(
        &self,
        server_id: i32,
        actor: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let before = self.get(server_id).await?;

        if !GameServerRepository::new(self.db)
            .transition(
                server_id,
                &[ServerStatus::Stopping, ServerStatus::Error],
                StatusChange::stopped(now),
            )
            .await?
        {
            return Err(invalid_state(&before, "stop"));
        }

        let server = self.get(server_id).await?;
        self.record_transition(
            "server.stopped",
            actor,
            &server,
            before.status,
            ServerStatus::Stopped,
        );

        Ok(server)
    }

    /// Moves a stopped server back to `creating`.
    ///
    /// Nothing is charged up front; the billing job charges from `now`. The payer must
    /// still be able to cover one hour.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - Server in `creating`
    /// - `Err(AppError::ServerErr(InvalidState))` - Server is not stopped
    /// - `Err(AppError::LedgerErr(InsufficientCredits))` /
    ///   `Err(AppError::GuildErr(InsufficientFunds))` - Payer cannot cover an hour
    pub async fn start(
        &self,
        server: &GameServer,
        actor: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        if server.status != ServerStatus::Stopped {
            return Err(invalid_state(server, "start"));
        }

        let available = payer_balance(self.db, &server.payer(), now).await?;
        if available < server.cost_per_hour {
            return Err(shortfall(&server.payer(), server.cost_per_hour, available));
        }

        let paid_through = server.last_billed_at.max(now);
        if !GameServerRepository::new(self.db)
            .transition(
                server.id,
                &[ServerStatus::Stopped],
                StatusChange::creating().billed_through(paid_through),
            )
            .await?
        {
            let current = self.get(server.id).await?;
            return Err(invalid_state(&current, "start"));
        }

        let started = self.get(server.id).await?;
        self.record_transition(
            "server.start",
            actor,
            &started,
            ServerStatus::Stopped,
            ServerStatus::Creating,
        );

        Ok(started)
    }

    /// Charges the restart fee and moves a running server back to `creating`.
    ///
    /// The fee and the status change commit together: a payer who cannot cover the fee
    /// leaves the server exactly as it was.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - Server in `creating`
    /// - `Err(AppError::ServerErr(InvalidState))` - Server is not running or ready
    /// - `Err(AppError::LedgerErr(InsufficientCredits))` /
    ///   `Err(AppError::GuildErr(InsufficientFunds))` - Fee not covered
    pub async fn restart(
        &self,
        server: &GameServer,
        actor: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        if !server.status.is_active() {
            return Err(invalid_state(server, "restart"));
        }

        let txn = self.db.begin().await?;

        charge(&txn, &server.payer(), RESTART_FEE, now).await?;

        if !GameServerRepository::new(&txn)
            .transition(
                server.id,
                &[ServerStatus::Running, ServerStatus::Ready],
                StatusChange::creating(),
            )
            .await?
        {
            drop(txn);
            let current = self.get(server.id).await?;
            return Err(invalid_state(&current, "restart"));
        }

        txn.commit().await?;

        let restarted = self.get(server.id).await?;
        self.record_transition(
            "server.restart",
            actor,
            &restarted,
            server.status,
            ServerStatus::Creating,
        );
        self.audit.record(
            AuditEvent::new(AuditChannel::Audit, "server.restart_fee", format!("server:{}", server.id))
                .detail("payer", server.payer())
                .detail("amount", RESTART_FEE),
        );

        Ok(restarted)
    }

    /// Adds the server to or removes it from the public lobby.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - Updated server
    /// - `Err(AppError::ServerErr(InvalidState))` - Listing a server that is not running
    ///   or ready
    pub async fn set_public(
        &self,
        server: &GameServer,
        actor: u64,
        is_public: bool,
    ) -> Result<GameServer, AppError> {
        if is_public && !server.status.is_active() {
            return Err(invalid_state(server, "list"));
        }

        if !GameServerRepository::new(self.db)
            .set_public(server.id, is_public)
            .await?
        {
            let current = self.get(server.id).await?;
            return Err(invalid_state(&current, "list"));
        }

        self.audit.record(
            AuditEvent::new(AuditChannel::User, "server.set_public", format!("server:{}", server.id))
                .actor(actor)
                .detail("before", server.is_public)
                .detail("after", is_public),
        );

        self.get(server.id).await
    }

    /// Records the address assigned by the orchestrator.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - Server with its address recorded
    /// - `Err(AppError::ServerErr(InvalidState))` - Server left `creating` while the
    ///   orchestrator was provisioning; the caller owns the returned compute
    /// - `Err(AppError::NotFound)` - Server was deleted meanwhile
    pub async fn record_provisioned(
        &self,
        server_id: i32,
        provisioned: ProvisionedAddress,
    ) -> Result<GameServer, AppError> {
        if !GameServerRepository::new(self.db)
            .set_provisioned(server_id, provisioned)
            .await?
        {
            let current = self.get(server_id).await?;
            return Err(invalid_state(&current, "provision"));
        }

        self.get(server_id).await
    }

    /// Moves a server to `error` with a reason, from any state.
    pub async fn mark_failed(&self, server_id: i32, reason: &str) -> Result<GameServer, AppError> {
        let before = self.get(server_id).await?;

        GameServerRepository::new(self.db)
            .transition(server_id, &[], StatusChange::failed(reason))
            .await?;

        let server = self.get(server_id).await?;
        tracing::warn!(server_id, reason, "Game server moved to error");
        self.audit.record(
            AuditEvent::new(AuditChannel::Error, "server.failed", format!("server:{}", server_id))
                .detail("before", before.status)
                .detail("reason", reason),
        );

        Ok(server)
    }

    /// Applies a status change only if the state machine allows it from the current
    /// status.
    ///
    /// A running or ready server whose compute the orchestrator reports gone moves to
    /// `error` with the reason stored; billing does not charge servers in `error`.
    ///
    /// # Returns
    /// - `Ok(true)` - Status changed
    /// - `Ok(false)` - Transition not allowed or lost a race; nothing changed
    pub async fn apply_observed_status(
        &self,
        server: &GameServer,
        observed: ServerStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let (observed, change) = match observed {
            ServerStatus::Stopped if server.status.is_active() => (
                ServerStatus::Error,
                StatusChange::failed("Compute is no longer running on the orchestrator"),
            ),
            ServerStatus::Stopped => (observed, StatusChange::stopped(now)),
            ServerStatus::Error => (
                observed,
                StatusChange::failed("Orchestrator reported an error"),
            ),
            other => (other, StatusChange::to(other)),
        };

        if server.status == observed || !server.status.can_transition_to(observed) {
            return Ok(false);
        }

        let moved = GameServerRepository::new(self.db)
            .transition(server.id, &[server.status], change)
            .await?;

        if moved {
            self.record_transition("server.reconcile", None, server, server.status, observed);
        }

        Ok(moved)
    }

    /// Sets any status, bypassing the state machine.
    ///
    /// Moderator override. The caller checks the moderator capability.
    pub async fn update_status(
        &self,
        server_id: i32,
        status: ServerStatus,
        actor: u64,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let before = self.get(server_id).await?;

        let change = match status {
            ServerStatus::Stopped => StatusChange::stopped(now),
            ServerStatus::Stopping => StatusChange::stopping(),
            ServerStatus::Creating => StatusChange::creating(),
            ServerStatus::Error => StatusChange::failed("Set by moderator"),
            other => StatusChange::to(other),
        };

        GameServerRepository::new(self.db)
            .transition(server_id, &[], change)
            .await?;

        let server = self.get(server_id).await?;

        tracing::info!(server_id, actor, before = %before.status, after = %status, "Status override");
        self.audit.record(
            AuditEvent::new(AuditChannel::Mod, "server.update_status", format!("server:{}", server_id))
                .actor(actor)
                .detail("before", before.status)
                .detail("after", status),
        );

        Ok(server)
    }

    /// Hard-removes a stopped server together with its schedules.
    ///
    /// Callers are responsible for the confirmation step. The stopped check is part of
    /// the delete statement, so a server started after the caller looked at it survives.
    ///
    /// # Returns
    /// - `Ok(())` - Server and schedules removed
    /// - `Err(AppError::ServerErr(InvalidState))` - Server is no longer stopped; nothing
    ///   changed
    /// - `Err(AppError::NotFound)` - Server already gone
    pub async fn delete(&self, server: &GameServer, actor: Option<u64>) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let schedules = ScheduleRepository::new(&txn)
            .delete_by_server(server.id)
            .await?;
        if !GameServerRepository::new(&txn)
            .delete_stopped(server.id)
            .await?
        {
            drop(txn);
            let current = self.get(server.id).await?;
            return Err(invalid_state(&current, "delete"));
        }

        txn.commit().await?;

        tracing::info!(server_id = server.id, schedules, "Deleted game server");
        let mut event =
            AuditEvent::new(AuditChannel::User, "server.delete", format!("server:{}", server.id))
                .detail("name", &server.name)
                .detail("owner", server.owner_id)
                .detail("schedules", schedules);
        if let Some(actor) = actor {
            event = event.actor(actor);
        }
        self.audit.record(event);

        Ok(())
    }

    /// Servers stopped for longer than [`CLEANUP_RETENTION`]. Read-only.
    pub async fn cleanup_candidates(&self, now: DateTime<Utc>) -> Result<Vec<GameServer>, AppError> {
        GameServerRepository::new(self.db)
            .list_stopped_before(now - CLEANUP_RETENTION)
            .await
    }

    /// Returns `amount` to the server's payer after a failed operation.
    pub async fn refund(&self, server: &GameServer, amount: i64, reason: &str) -> Result<(), AppError> {
        if amount <= 0 {
            return Ok(());
        }

        let payer = server.payer();
        let refunded = match &payer {
            Payer::User(user_id) => {
                UserRepository::new(self.db)
                    .adjust_balance(*user_id, amount)
                    .await?
            }
            Payer::Guild(guild_id) => GuildRepository::new(self.db).refund(guild_id, amount).await?,
        };

        if !refunded {
            return Err(AppError::InternalError(format!(
                "Failed to refund {} credits to {}",
                amount, payer
            )));
        }

        tracing::info!(server_id = server.id, %payer, amount, reason, "Refunded credits");
        self.audit.record(
            AuditEvent::new(AuditChannel::Audit, "server.refund", format!("server:{}", server.id))
                .detail("payer", payer)
                .detail("amount", amount)
                .detail("reason", reason),
        );

        Ok(())
    }

    fn record_transition(
        &self,
        action: &'static str,
        actor: Option<u64>,
        server: &GameServer,
        before: ServerStatus,
        after: ServerStatus,
    ) {
        tracing::info!(server_id = server.id, %before, %after, "{}", action);

        let mut event = AuditEvent::new(AuditChannel::User, action, format!("server:{}", server.id))
            .detail("name", &server.name)
            .detail("before", before)
            .detail("after", after);
        if let Some(actor) = actor {
            event = event.actor(actor);
        }
        self.audit.record(event);
    }
}

/// Debits `amount` from a payer inside the caller's connection or transaction.
///
/// # Returns
/// - `Ok(())` - Charged
/// - `Err(AppError::LedgerErr(InsufficientCredits))` - User balance too low
/// - `Err(AppError::GuildErr(InsufficientFunds))` - Treasury balance too low
pub(crate) async fn charge<C: ConnectionTrait>(
    db: &C,
    payer: &Payer,
    amount: i64,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let charged = match payer {
        Payer::User(user_id) => {
            UserRepository::new(db)
                .adjust_balance(*user_id, -amount)
                .await?
        }
        Payer::Guild(guild_id) => GuildRepository::new(db).spend(guild_id, amount).await?,
    };

    if !charged {
        let available = payer_balance(db, payer, now).await?;
        return Err(shortfall(payer, amount, available));
    }

    Ok(())
}

async fn payer_balance<C: ConnectionTrait>(
    db: &C,
    payer: &Payer,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    match payer {
        Payer::User(user_id) => Ok(UserRepository::new(db)
            .get_or_create(*user_id, now)
            .await?
            .balance),
        Payer::Guild(guild_id) => Ok(GuildRepository::new(db)
            .find_by_id(guild_id)
            .await?
            .map(|guild| guild.balance)
            .unwrap_or(0)),
    }
}

fn shortfall(payer: &Payer, required: i64, available: i64) -> AppError {
    match payer {
        Payer::User(_) => LedgerError::InsufficientCredits {
            required,
            available,
        }
        .into(),
        Payer::Guild(_) => GuildError::InsufficientFunds {
            required,
            available,
        }
        .into(),
    }
}

fn invalid_state(server: &GameServer, action: &'static str) -> AppError {
    ServerError::InvalidState {
        server: server.name.clone(),
        status: server.status,
        action,
    }
    .into()
}

async fn insert_server<C: ConnectionTrait>(
    servers: &GameServerRepository<'_, C>,
    param: CreateServerParam,
) -> Result<GameServer, AppError> {
    let name = param.name.clone();

    match servers.create(param).await {
        Err(AppError::DbErr(e)) if is_unique_violation(&e) => {
            Err(ServerError::DuplicateName { name }.into())
        }
        result => result,
    }
}

/// Trims a server name and checks it is usable as a hostname label.
pub fn validate_server_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();

    if name.is_empty() || name.len() > MAX_SERVER_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Server names must be 1 to {} characters",
            MAX_SERVER_NAME_LEN
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(
            "Server names may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }

    Ok(name.to_string())
}
