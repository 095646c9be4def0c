//! Server lifecycle flows spanning the registry and the orchestrator.
//!
//! Money and status always move first, inside the registry's transactions; the
//! orchestrator is called afterwards and every call is bounded by a timeout. When
//! provisioning fails the server is left in `error` with the reason stored and whatever
//! was charged for the attempt is refunded to the payer. Compute that comes back after
//! the server already left `creating` is terminated instead of recorded.

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::{future::Future, time::Duration};

use crate::server::{
    audit::{AuditChannel, AuditEvent, AuditSink},
    error::{orchestrator::OrchestratorError, server::ServerError, AppError},
    model::game_server::{DeleteConfirmation, GameServer, ServerStatus, StopOutcome, RESTART_FEE},
    orchestrator::{ExportService, Orchestrator, ProvisionSpec},
    service::{delete_confirmation::DeleteConfirmationService, server_registry::ServerRegistryService},
};

/// Statuses whose orchestrator phase is polled by [`LifecycleService::reconcile_statuses`].
const RECONCILED_STATUSES: [ServerStatus; 4] = [
    ServerStatus::Creating,
    ServerStatus::Running,
    ServerStatus::Ready,
    ServerStatus::Stopping,
];

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

pub struct LifecycleService<'a> {
    db: &'a DatabaseConnection,
    orchestrator: &'a dyn Orchestrator,
    exports: &'a dyn ExportService,
    audit: &'a dyn AuditSink,
    confirmations: &'a DeleteConfirmationService,
    timeout: Duration,
}

impl<'a> LifecycleService<'a> {
    /// Creates a new LifecycleService instance.
    ///
    /// # Arguments
    /// - `db` - Reference to the database connection
    /// - `orchestrator` - Compute provisioning collaborator
    /// - `exports` - Save export collaborator used before deletion
    /// - `audit` - Audit event sink
    /// - `confirmations` - Shared delete confirmation store
    /// - `timeout` - Upper bound for every orchestrator or export call
    pub fn new(
        db: &'a DatabaseConnection,
        orchestrator: &'a dyn Orchestrator,
        exports: &'a dyn ExportService,
        audit: &'a dyn AuditSink,
        confirmations: &'a DeleteConfirmationService,
        timeout: Duration,
    ) -> Self {
        Self {
            db,
            orchestrator,
            exports,
            audit,
            confirmations,
            timeout,
        }
    }

    pub fn registry(&self) -> ServerRegistryService<'a> {
        ServerRegistryService::new(self.db, self.audit)
    }

    /// Creates a user-funded server and provisions it.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - Server with its orchestrator address recorded
    /// - `Err(AppError::ServerErr(ProvisioningFailed))` - Provisioning failed or timed
    ///   out; the server is in `error` and the hour was refunded
    /// - Any error of [`ServerRegistryService::create`]
    pub async fn create(
        &self,
        owner_id: u64,
        game_type: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let server = self.registry().create(owner_id, game_type, name, now).await?;
        let refund = server.cost_per_hour;

        self.provision(server, refund).await
    }

    /// Creates a guild-funded server and provisions it.
    ///
    /// On provisioning failure the hour is refunded to the treasury.
    pub async fn create_for_guild(
        &self,
        guild_id: &str,
        owner_id: u64,
        game_type: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let server = self
            .registry()
            .create_for_guild(guild_id, owner_id, game_type, name, now)
            .await?;
        let refund = server.cost_per_hour;

        self.provision(server, refund).await
    }

    /// Starts a stopped server and provisions fresh compute.
    pub async fn start(
        &self,
        server: &GameServer,
        actor: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let server = self.registry().start(server, actor, now).await?;

        self.provision(server, 0).await
    }

    /// Restarts a running server: one fee, old compute released, new compute provisioned.
    ///
    /// Releasing the old compute is best-effort; a failure is logged and reported to
    /// the error channel but does not stop the restart.
    pub async fn restart(
        &self,
        server: &GameServer,
        actor: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let restarted = self.registry().restart(server, actor, now).await?;

        if let Some(external_id) = &server.external_id {
            if let Err(e) = self.bounded(self.orchestrator.terminate(external_id)).await {
                tracing::warn!(server_id = server.id, "Failed to release compute on restart: {}", e);
                self.audit.record(
                    AuditEvent::new(AuditChannel::Error, "server.terminate", format!("server:{}", server.id))
                        .detail("external_id", external_id)
                        .detail("error", e),
                );
            }
        }

        self.provision(restarted, RESTART_FEE).await
    }

    /// Stops a server and releases its compute.
    ///
    /// # Returns
    /// - `Ok(StopOutcome::AlreadyStopped)` - Nothing to do
    /// - `Ok(StopOutcome::Stopped)` - Compute released, server `stopped`
    /// - `Err(AppError::OrchestratorErr)` - Release failed; the server was moved to `error`
    pub async fn stop(
        &self,
        server: &GameServer,
        actor: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<StopOutcome, AppError> {
        let registry = self.registry();

        let stopping = match registry.stop(server, actor).await? {
            StopOutcome::Stopping(stopping) => stopping,
            outcome => return Ok(outcome),
        };

        if let Some(external_id) = &stopping.external_id {
            if let Err(e) = self.bounded(self.orchestrator.terminate(external_id)).await {
                registry
                    .mark_failed(stopping.id, &format!("Failed to stop: {}", e))
                    .await?;
                return Err(e.into());
            }
        }

        let stopped = registry.mark_stopped(stopping.id, actor, now).await?;

        Ok(StopOutcome::Stopped(stopped))
    }

    /// First phase of deletion: issues a confirmation token for a stopped server.
    ///
    /// Nothing is mutated.
    ///
    /// # Returns
    /// - `Ok(DeleteConfirmation)` - Token to echo back, with the server for display
    /// - `Err(AppError::ServerErr(InvalidState))` - Server is not stopped
    /// - `Err(AppError::NotFound)` - Owner has no server with that name
    pub async fn request_delete(
        &self,
        owner_id: u64,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<DeleteConfirmation, AppError> {
        let server = self.registry().find_owned(owner_id, name).await?;

        if server.status != ServerStatus::Stopped {
            return Err(ServerError::InvalidState {
                server: server.name.clone(),
                status: server.status,
                action: "delete",
            }
            .into());
        }

        let (token, expires_at) = self.confirmations.issue(server.id, owner_id, now).await;

        Ok(DeleteConfirmation {
            token,
            server,
            expires_at,
        })
    }

    /// Second phase of deletion: redeems the token, exports the save and removes the
    /// server and its schedules.
    ///
    /// # Returns
    /// - `Ok(GameServer)` - The deleted server
    /// - `Err(AppError::ServerErr(ConfirmationNotFound))` - Token unknown, expired or
    ///   issued to someone else
    /// - `Err(AppError::ServerErr(InvalidState))` - Server was started in the meantime,
    ///   including while its save was being exported
    pub async fn confirm_delete(
        &self,
        owner_id: u64,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<GameServer, AppError> {
        let server_id = self
            .confirmations
            .consume(token.trim(), owner_id, now)
            .await
            .ok_or(ServerError::ConfirmationNotFound)?;

        let registry = self.registry();
        let server = registry.get(server_id).await?;

        if server.status != ServerStatus::Stopped {
            return Err(ServerError::InvalidState {
                server: server.name.clone(),
                status: server.status,
                action: "delete",
            }
            .into());
        }

        self.export_best_effort(&server).await;
        registry.delete(&server, Some(owner_id)).await?;

        Ok(server)
    }

    /// Deletes every server stopped for longer than the retention window.
    ///
    /// Administrative action. Each save is exported first, best-effort.
    ///
    /// # Returns
    /// - `Ok(Vec<GameServer>)` - Servers that were deleted
    pub async fn purge_stopped(
        &self,
        actor: Option<u64>,
        now: DateTime<Utc>,
    ) -> Result<Vec<GameServer>, AppError> {
        let registry = self.registry();
        let candidates = registry.cleanup_candidates(now).await?;
        let mut purged = Vec::with_capacity(candidates.len());

        for server in candidates {
            self.export_best_effort(&server).await;
            match registry.delete(&server, actor).await {
                Ok(()) => purged.push(server),
                Err(AppError::ServerErr(ServerError::InvalidState { status, .. })) => {
                    tracing::info!(server_id = server.id, %status, "Skipped purge of a server no longer stopped");
                }
                Err(AppError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if !purged.is_empty() {
            tracing::info!("Purged {} stopped servers", purged.len());
            let mut event = AuditEvent::new(AuditChannel::Mod, "server.purge", "servers")
                .detail("count", purged.len());
            if let Some(actor) = actor {
                event = event.actor(actor);
            }
            self.audit.record(event);
        }

        Ok(purged)
    }

    /// Aligns stored statuses with the orchestrator's live phases.
    ///
    /// Only transitions the state machine allows are applied; anything else is left for
    /// a moderator. Lookup failures are counted and skipped.
    pub async fn reconcile_statuses(&self, now: DateTime<Utc>) -> Result<ReconcileReport, AppError> {
        let registry = self.registry();
        let servers = registry.list_by_status(&RECONCILED_STATUSES).await?;
        let mut report = ReconcileReport::default();

        for server in servers {
            let Some(external_id) = server.external_id.as_deref() else {
                continue;
            };
            report.checked += 1;

            let phase = match self.bounded(self.orchestrator.get_status(external_id)).await {
                Ok(phase) => phase,
                Err(e) => {
                    tracing::warn!(server_id = server.id, "Failed to fetch orchestrator status: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            if registry
                .apply_observed_status(&server, phase.normalize(), now)
                .await?
            {
                report.updated += 1;
            }
        }

        Ok(report)
    }

    async fn provision(&self, server: GameServer, refund: i64) -> Result<GameServer, AppError> {
        let registry = self.registry();
        let spec = ProvisionSpec::for_server(&server);

        match self.bounded(self.orchestrator.provision(&spec)).await {
            Ok(address) => {
                tracing::info!(
                    server_id = server.id,
                    external_id = %address.external_id,
                    "Provisioned game server"
                );
                let external_id = address.external_id.clone();

                match registry.record_provisioned(server.id, address).await {
                    Ok(server) => Ok(server),
                    Err(e) => {
                        self.release_unrecorded(server.id, &external_id).await;
                        Err(e)
                    }
                }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::error!(server_id = server.id, "Provisioning failed: {}", reason);

                registry.mark_failed(server.id, &reason).await?;
                registry
                    .refund(&server, refund, "provisioning failed")
                    .await?;

                Err(ServerError::ProvisioningFailed {
                    server_id: server.id,
                    reason,
                }
                .into())
            }
        }
    }

    /// Terminates compute the record could not take, e.g. because the server was stopped
    /// while provisioning.
    async fn release_unrecorded(&self, server_id: i32, external_id: &str) {
        match self.bounded(self.orchestrator.terminate(external_id)).await {
            Ok(()) => {
                tracing::info!(server_id, external_id, "Released compute of a superseded provisioning run");
            }
            Err(e) => {
                tracing::error!(server_id, external_id, "Failed to release unrecorded compute: {}", e);
                self.audit.record(
                    AuditEvent::new(AuditChannel::Error, "server.terminate", format!("server:{}", server_id))
                        .detail("external_id", external_id)
                        .detail("error", e),
                );
            }
        }
    }

    async fn export_best_effort(&self, server: &GameServer) {
        match self.bounded(self.exports.export_save(server)).await {
            Ok(export) => {
                tracing::info!(
                    server_id = server.id,
                    path = %export.path,
                    size = export.size_bytes,
                    "Exported save before deletion"
                );
                self.audit.record(
                    AuditEvent::new(AuditChannel::User, "server.export", format!("server:{}", server.id))
                        .detail("path", export.path)
                        .detail("size", export.size_bytes)
                        .detail("expires_at", export.expires_at),
                );
            }
            Err(e) => {
                tracing::warn!(server_id = server.id, "Save export failed: {}", e);
                self.audit.record(
                    AuditEvent::new(AuditChannel::Error, "server.export", format!("server:{}", server.id))
                        .detail("error", e),
                );
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, OrchestratorError>
    where
        F: Future<Output = Result<T, OrchestratorError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| OrchestratorError::Timeout(self.timeout.as_secs()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{
        audit::RecordingAuditSink,
        data::{guild::GuildRepository, user::UserRepository},
        orchestrator::{
            mock::{MockExportService, MockOrchestrator},
            OrchestratorPhase,
        },
    };
    use chrono::Duration as ChronoDuration;
    use test_utils::{
        builder::TestBuilder,
        factory::{
            game_server::GameServerFactory, guild::GuildFactory, pricing::PricingFactory,
            user::UserFactory,
        },
    };

    const TIMEOUT: Duration = Duration::from_secs(5);

    async fn balance_of(db: &DatabaseConnection, user_id: u64) -> Result<i64, AppError> {
        Ok(UserRepository::new(db)
            .get_or_create(user_id, Utc::now())
            .await?
            .balance)
    }

    /// Tests a successful create.
    ///
    /// Expected: orchestrator called once and the address recorded on the server
    #[tokio::test]
    async fn create_records_address() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        PricingFactory::new(db, "minecraft").build().await?;
        let user = UserFactory::new(db).balance(20).build().await?;
        let owner = user.discord_id.parse::<u64>().unwrap();

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let server = lifecycle.create(owner, "minecraft", "box1", Utc::now()).await?;

        assert_eq!(server.status, ServerStatus::Creating);
        assert_eq!(server.external_id, Some(format!("gs-{}", server.id)));
        assert!(server.connect_address().is_some());
        assert_eq!(orchestrator.provisioned().len(), 1);
        assert_eq!(balance_of(db, owner).await?, 15);

        Ok(())
    }

    /// Tests provisioning failure after the debit committed.
    ///
    /// Expected: ProvisioningFailed, server kept in error with a reason, hour refunded,
    /// error audit event emitted
    #[tokio::test]
    async fn failed_provisioning_refunds_and_keeps_error_record() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::failing_provision();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        PricingFactory::new(db, "minecraft").build().await?;
        let user = UserFactory::new(db).balance(20).build().await?;
        let owner = user.discord_id.parse::<u64>().unwrap();

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let result = lifecycle.create(owner, "minecraft", "box1", Utc::now()).await;

        assert!(matches!(
            result,
            Err(AppError::ServerErr(ServerError::ProvisioningFailed { .. }))
        ));

        let server = lifecycle.registry().find_owned(owner, "box1").await?;
        assert_eq!(server.status, ServerStatus::Error);
        assert!(server.error_message.is_some());
        assert_eq!(balance_of(db, owner).await?, 20);
        assert_eq!(audit.with_action("server.failed")[0].channel, AuditChannel::Error);
        assert_eq!(audit.with_action("server.refund").len(), 1);

        Ok(())
    }

    /// Tests a provisioning call exceeding the timeout.
    ///
    /// Expected: ProvisioningFailed and the server in error
    #[tokio::test]
    async fn provisioning_timeout_fails_server() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::slow_provision(Duration::from_millis(500));
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        PricingFactory::new(db, "minecraft").build().await?;
        let user = UserFactory::new(db).balance(20).build().await?;
        let owner = user.discord_id.parse::<u64>().unwrap();

        let lifecycle = LifecycleService::new(
            db,
            &orchestrator,
            &exports,
            &audit,
            &confirmations,
            Duration::from_millis(20),
        );
        let result = lifecycle.create(owner, "minecraft", "box1", Utc::now()).await;

        assert!(matches!(
            result,
            Err(AppError::ServerErr(ServerError::ProvisioningFailed { .. }))
        ));
        let server = lifecycle.registry().find_owned(owner, "box1").await?;
        assert_eq!(server.status, ServerStatus::Error);
        assert_eq!(balance_of(db, owner).await?, 20);

        Ok(())
    }

    /// Tests a guild server whose provisioning fails.
    ///
    /// Expected: the hour returns to the treasury and the balance invariant holds
    #[tokio::test]
    async fn failed_guild_provisioning_refunds_treasury() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_all_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::failing_provision();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        PricingFactory::new(db, "minecraft").build().await?;
        let owner = UserFactory::new(db).build().await?;
        let guild = GuildFactory::new(db, &owner.discord_id)
            .balance(50)
            .build()
            .await?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        assert!(lifecycle
            .create_for_guild(
                &guild.id,
                owner.discord_id.parse().unwrap(),
                "minecraft",
                "box1",
                Utc::now()
            )
            .await
            .is_err());

        let treasury = GuildRepository::new(db).find_by_id(&guild.id).await?.unwrap();
        assert_eq!(treasury.balance, 50);
        assert_eq!(treasury.total_spent, 0);
        assert_eq!(treasury.balance, treasury.total_deposits - treasury.total_spent);

        Ok(())
    }

    /// Tests stopping a provisioned server.
    ///
    /// Expected: compute terminated, server stopped with a stop time
    #[tokio::test]
    async fn stop_terminates_and_marks_stopped() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        let user = UserFactory::new(db).build().await?;
        let entity = GameServerFactory::new(db, &user.discord_id)
            .status("running")
            .external_id(Some("gs-x".to_string()))
            .build()
            .await?;
        let server = GameServer::from_entity(entity)?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let outcome = lifecycle.stop(&server, Some(server.owner_id), Utc::now()).await?;

        match outcome {
            StopOutcome::Stopped(stopped) => {
                assert_eq!(stopped.status, ServerStatus::Stopped);
                assert!(stopped.stopped_at.is_some());
            }
            other => panic!("expected Stopped, got {:?}", other),
        }
        assert_eq!(orchestrator.terminated(), vec!["gs-x".to_string()]);

        Ok(())
    }

    /// Tests a terminate failure during stop.
    ///
    /// Expected: OrchestratorErr and the server in error
    #[tokio::test]
    async fn stop_terminate_failure_marks_error() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::failing_terminate();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        let user = UserFactory::new(db).build().await?;
        let entity = GameServerFactory::new(db, &user.discord_id)
            .status("ready")
            .external_id(Some("gs-y".to_string()))
            .build()
            .await?;
        let server = GameServer::from_entity(entity)?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let result = lifecycle.stop(&server, None, Utc::now()).await;

        assert!(matches!(result, Err(AppError::OrchestratorErr(_))));
        assert_eq!(
            lifecycle.registry().get(server.id).await?.status,
            ServerStatus::Error
        );

        Ok(())
    }

    /// Tests restarting a running server.
    ///
    /// Expected: old compute terminated, new compute provisioned, one credit charged
    #[tokio::test]
    async fn restart_replaces_compute() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        let user = UserFactory::new(db).balance(5).build().await?;
        let entity = GameServerFactory::new(db, &user.discord_id)
            .status("running")
            .external_id(Some("old".to_string()))
            .build()
            .await?;
        let server = GameServer::from_entity(entity)?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let restarted = lifecycle.restart(&server, Some(server.owner_id), Utc::now()).await?;

        assert_eq!(restarted.status, ServerStatus::Creating);
        assert_eq!(restarted.external_id, Some(format!("gs-{}", server.id)));
        assert_eq!(orchestrator.terminated(), vec!["old".to_string()]);
        assert_eq!(balance_of(db, server.owner_id).await?, 4);

        Ok(())
    }

    /// Tests the two-phase delete flow with a failing export.
    ///
    /// Expected: token issued without mutation, confirm deletes despite the export
    /// failure, token cannot be reused
    #[tokio::test]
    async fn delete_flow_with_token() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::failing();
        let confirmations = DeleteConfirmationService::new();
        let now = Utc::now();

        let user = UserFactory::new(db).build().await?;
        let owner = user.discord_id.parse::<u64>().unwrap();
        GameServerFactory::new(db, &user.discord_id)
            .name("box1")
            .status("stopped")
            .stopped_at(Some(now))
            .build()
            .await?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);

        let confirmation = lifecycle.request_delete(owner, "box1", now).await?;
        assert_eq!(confirmation.server.name, "box1");
        assert!(lifecycle.registry().find_owned(owner, "box1").await.is_ok());

        assert!(matches!(
            lifecycle.confirm_delete(owner + 1, &confirmation.token, now).await,
            Err(AppError::ServerErr(ServerError::ConfirmationNotFound))
        ));

        let deleted = lifecycle
            .confirm_delete(owner, &confirmation.token, now)
            .await?;
        assert_eq!(deleted.name, "box1");
        assert!(matches!(
            lifecycle.registry().find_owned(owner, "box1").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(audit.with_action("server.export")[0].channel, AuditChannel::Error);

        assert!(matches!(
            lifecycle.confirm_delete(owner, &confirmation.token, now).await,
            Err(AppError::ServerErr(ServerError::ConfirmationNotFound))
        ));

        Ok(())
    }

    /// Tests requesting deletion of a running server.
    ///
    /// Expected: Err(InvalidState)
    #[tokio::test]
    async fn request_delete_requires_stopped() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        let user = UserFactory::new(db).build().await?;
        GameServerFactory::new(db, &user.discord_id)
            .name("box1")
            .status("running")
            .build()
            .await?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let result = lifecycle
            .request_delete(user.discord_id.parse().unwrap(), "box1", Utc::now())
            .await;

        assert!(matches!(
            result,
            Err(AppError::ServerErr(ServerError::InvalidState { .. }))
        ));

        Ok(())
    }

    /// Tests purging long-stopped servers.
    ///
    /// Expected: only the server past retention is exported and deleted
    #[tokio::test]
    async fn purge_deletes_only_expired() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();
        let now = Utc::now();

        let user = UserFactory::new(db).build().await?;
        let old = GameServerFactory::new(db, &user.discord_id)
            .status("stopped")
            .stopped_at(Some(now - ChronoDuration::hours(5)))
            .build()
            .await?;
        let recent = GameServerFactory::new(db, &user.discord_id)
            .status("stopped")
            .stopped_at(Some(now - ChronoDuration::minutes(10)))
            .build()
            .await?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let purged = lifecycle.purge_stopped(Some(1), now).await?;

        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].id, old.id);
        assert_eq!(exports.exported(), vec![old.id]);
        assert!(lifecycle.registry().get(recent.id).await.is_ok());

        Ok(())
    }

    /// Tests reconciliation against orchestrator phases.
    ///
    /// Expected: allocated creating server becomes running; a creating server reported
    /// missing is left alone since creating cannot jump to stopped
    #[tokio::test]
    async fn reconcile_applies_allowed_transitions() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        let user = UserFactory::new(db).build().await?;
        let allocated = GameServerFactory::new(db, &user.discord_id)
            .status("creating")
            .external_id(Some("a".to_string()))
            .build()
            .await?;
        let missing = GameServerFactory::new(db, &user.discord_id)
            .status("creating")
            .external_id(Some("b".to_string()))
            .build()
            .await?;
        GameServerFactory::new(db, &user.discord_id)
            .status("creating")
            .build()
            .await?;
        orchestrator.set_phase("a", OrchestratorPhase::Allocated);

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let report = lifecycle.reconcile_statuses(Utc::now()).await?;

        assert_eq!(
            report,
            ReconcileReport {
                checked: 2,
                updated: 1,
                failed: 0
            }
        );
        let registry = lifecycle.registry();
        assert_eq!(registry.get(allocated.id).await?.status, ServerStatus::Running);
        assert_eq!(registry.get(missing.id).await?.status, ServerStatus::Creating);

        Ok(())
    }

    /// Tests a stop that lands while the create is still provisioning.
    ///
    /// Expected: the server ends stopped without an address, the late compute is
    /// terminated and the create reports InvalidState
    #[tokio::test]
    async fn stop_during_create_releases_late_compute() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::slow_provision(Duration::from_millis(300));
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();
        let now = Utc::now();

        PricingFactory::new(db, "minecraft").build().await?;
        let user = UserFactory::new(db).balance(20).build().await?;
        let owner = user.discord_id.parse::<u64>().unwrap();

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let (created, stopped) = tokio::join!(
            lifecycle.create(owner, "minecraft", "box1", now),
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let server = lifecycle.registry().find_owned(owner, "box1").await?;
                Ok::<StopOutcome, AppError>(lifecycle.stop(&server, Some(owner), now).await?)
            }
        );

        assert!(matches!(
            created,
            Err(AppError::ServerErr(ServerError::InvalidState { .. }))
        ));
        assert!(matches!(stopped?, StopOutcome::Stopped(_)));

        let server = lifecycle.registry().find_owned(owner, "box1").await?;
        assert_eq!(server.status, ServerStatus::Stopped);
        assert!(server.external_id.is_none());
        assert_eq!(orchestrator.terminated(), vec![format!("gs-{}", server.id)]);

        Ok(())
    }

    /// Tests a stop racing a restart of the same running server.
    ///
    /// Expected: one final state, stopped, with both the old and the new compute
    /// released
    #[tokio::test]
    async fn stop_racing_restart_ends_stopped() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::slow_provision(Duration::from_millis(200));
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();
        let now = Utc::now();

        let user = UserFactory::new(db).balance(5).build().await?;
        let entity = GameServerFactory::new(db, &user.discord_id)
            .status("running")
            .external_id(Some("old".to_string()))
            .build()
            .await?;
        let server = GameServer::from_entity(entity)?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let (restarted, stopped) = tokio::join!(
            lifecycle.restart(&server, Some(server.owner_id), now),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                lifecycle.stop(&server, Some(server.owner_id), now).await
            }
        );

        assert!(matches!(
            restarted,
            Err(AppError::ServerErr(ServerError::InvalidState { .. }))
        ));
        assert!(matches!(stopped?, StopOutcome::Stopped(_)));

        let current = lifecycle.registry().get(server.id).await?;
        assert_eq!(current.status, ServerStatus::Stopped);
        let terminated = orchestrator.terminated();
        assert!(terminated.contains(&"old".to_string()));
        assert!(terminated.contains(&format!("gs-{}", server.id)));

        Ok(())
    }

    /// Tests a start that lands while the confirmed delete is exporting the save.
    ///
    /// Expected: the delete fails with InvalidState and the started server survives
    #[tokio::test]
    async fn start_during_delete_export_keeps_server() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::slow(Duration::from_millis(200));
        let confirmations = DeleteConfirmationService::new();
        let now = Utc::now();

        let user = UserFactory::new(db).balance(50).build().await?;
        let owner = user.discord_id.parse::<u64>().unwrap();
        GameServerFactory::new(db, &user.discord_id)
            .name("box1")
            .status("stopped")
            .stopped_at(Some(now))
            .build()
            .await?;

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let confirmation = lifecycle.request_delete(owner, "box1", now).await?;

        let (deleted, started) = tokio::join!(
            lifecycle.confirm_delete(owner, &confirmation.token, now),
            async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                lifecycle.start(&confirmation.server, Some(owner), now).await
            }
        );

        assert!(matches!(
            deleted,
            Err(AppError::ServerErr(ServerError::InvalidState { .. }))
        ));
        let started = started?;

        let server = lifecycle.registry().find_owned(owner, "box1").await?;
        assert_eq!(server.status, ServerStatus::Creating);
        assert_eq!(server.external_id, started.external_id);
        assert!(orchestrator.terminated().is_empty());
        assert!(audit.with_action("server.delete").is_empty());

        Ok(())
    }

    /// Tests reconciliation of a running server whose compute disappeared.
    ///
    /// Expected: the server moves to error with a reason and is no longer billable
    #[tokio::test]
    async fn reconcile_fails_running_server_without_compute() -> Result<(), AppError> {
        let test = TestBuilder::new()
            .with_server_tables()
            .build()
            .await
            .unwrap();
        let db = test.db.as_ref().unwrap();
        let audit = RecordingAuditSink::new();
        let orchestrator = MockOrchestrator::new();
        let exports = MockExportService::new();
        let confirmations = DeleteConfirmationService::new();

        let user = UserFactory::new(db).build().await?;
        let missing = GameServerFactory::new(db, &user.discord_id)
            .status("running")
            .external_id(Some("gone".to_string()))
            .build()
            .await?;
        let shut_down = GameServerFactory::new(db, &user.discord_id)
            .status("ready")
            .external_id(Some("down".to_string()))
            .build()
            .await?;
        orchestrator.set_phase("down", OrchestratorPhase::Shutdown);

        let lifecycle =
            LifecycleService::new(db, &orchestrator, &exports, &audit, &confirmations, TIMEOUT);
        let report = lifecycle.reconcile_statuses(Utc::now()).await?;

        assert_eq!(report.updated, 2);
        for id in [missing.id, shut_down.id] {
            let server = lifecycle.registry().get(id).await?;
            assert_eq!(server.status, ServerStatus::Error);
            assert!(server.error_message.is_some());
            assert!(!server.status.is_billable());
        }

        Ok(())
    }
}
