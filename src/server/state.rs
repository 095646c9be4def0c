//! Application state shared by the bot, the scheduler jobs and the HTTP handlers.
//!
//! The state is initialized once during startup and then cloned into each consumer.
//! Every field is cheap to clone: the database connection is a pool, the HTTP client
//! and collaborators are reference counted, and the confirmation store shares its map.

use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};

use crate::server::{
    audit::AuditSink,
    orchestrator::{ExportService, Orchestrator},
    service::{delete_confirmation::DeleteConfirmationService, lifecycle::LifecycleService},
};

#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DatabaseConnection,

    /// HTTP client for external API requests.
    pub http_client: reqwest::Client,

    /// Provisions and terminates game servers.
    pub orchestrator: Arc<dyn Orchestrator>,

    /// Exports save files before deletion.
    pub exports: Arc<dyn ExportService>,

    /// Receives one event per state-mutating operation.
    pub audit: Arc<dyn AuditSink>,

    /// Outstanding delete confirmation tokens.
    pub confirmations: DeleteConfirmationService,

    /// Upper bound on a single orchestrator call.
    pub orchestrator_timeout: Duration,

    /// Shared secret the ad network presents on reward callbacks.
    pub ad_reward_secret: String,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        http_client: reqwest::Client,
        orchestrator: Arc<dyn Orchestrator>,
        exports: Arc<dyn ExportService>,
        audit: Arc<dyn AuditSink>,
        orchestrator_timeout: Duration,
        ad_reward_secret: String,
    ) -> Self {
        Self {
            db,
            http_client,
            orchestrator,
            exports,
            audit,
            confirmations: DeleteConfirmationService::new(),
            orchestrator_timeout,
            ad_reward_secret,
        }
    }

    /// Lifecycle service wired to this state's collaborators.
    pub fn lifecycle(&self) -> LifecycleService<'_> {
        LifecycleService::new(
            &self.db,
            self.orchestrator.as_ref(),
            self.exports.as_ref(),
            self.audit.as_ref(),
            &self.confirmations,
            self.orchestrator_timeout,
        )
    }
}
